//! Pet clinic ingestion from the Seoul open-data API.
//!
//! [`SeoulOpenApi`] fetches one window of feed rows through the generic
//! [`ApiClient`](crate::http::ApiClient); [`PetClinicLoader`] maps those rows to
//! [`PetClinic`](crate::models::PetClinic) records and upserts them by
//! management number, so overlapping windows can be re-run safely.

mod error;
mod pet_clinics;

pub use error::IngestError;
pub use pet_clinics::{LoadedWindow, MAX_WINDOW, PetClinicLoader, SeoulOpenApi, extract_rows, map_rows};
