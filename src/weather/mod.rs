//! Weather scraping from the Naver search results page.
//!
//! [`WeatherCrawler`] fetches the page for a location and
//! [`parse_weather_html`] extracts the current temperature, sky status and
//! air quality into a [`WeatherReport`](crate::models::WeatherReport).

mod crawler;
mod parser;

pub use crawler::WeatherCrawler;
pub use parser::{DEFAULT_AIR_QUALITY, parse_weather_html};

use thiserror::Error;
use tokio::task::JoinError;

use crate::{db::DbError, http::ApiError};

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to fetch weather page: {0}")]
    Fetch(#[from] ApiError),

    #[error("Weather page has no element matching '{0}'; the page layout may have changed")]
    MissingElement(&'static str),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: &'static str, reason: String },

    #[error("Invalid crawler configuration: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}
