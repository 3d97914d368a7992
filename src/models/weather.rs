use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Id;

/// Fields scraped from the weather page for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeatherReport {
    pub location: String,
    pub current_temp: String,
    pub weather_status: String,
    pub air_quality: String,
}

/// A stored weather report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeatherSnapshot {
    pub id: Id,
    pub location: String,
    pub current_temp: Option<String>,
    pub weather_status: Option<String>,
    pub air_quality: Option<String>,
    /// UTC time the snapshot was stored.
    #[schema(value_type = String, format = DateTime)]
    pub crawled_at: NaiveDateTime,
}
