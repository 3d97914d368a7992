//! Data models shared by the ingestion jobs, the database layer and the API.
//!
//! # Key Types
//!
//! - [`PetClinic`] - One licensed animal hospital from the Seoul open-data feed
//! - [`WeatherReport`] - Fields scraped from the weather page
//! - [`WeatherSnapshot`] - A stored [`WeatherReport`] with its id and timestamp

pub mod pet_clinic;
pub use pet_clinic::PetClinic;
pub mod weather;
pub use weather::{WeatherReport, WeatherSnapshot};

/// Database primary key type (SQLite integer).
pub type Id = i64;
