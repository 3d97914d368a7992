//! Generic JSON API client.
//!
//! This module provides one call path for `GET`/`POST`/`PUT`/`DELETE`/`PATCH`
//! requests against a configured base URL, with uniform header merging, query
//! encoding and response classification. It is used by the pet-clinic
//! ingestion and by the weather scraper.
//!
//! # Architecture
//!
//! - [`ApiClient`] - lazily opened, shareable client with scoped sessions
//! - [`ApiError`] / [`ApiErrorKind`] - the closed failure taxonomy
//! - [`QueryParams`] and [`build_url`] - URL construction
//!
//! # Example
//!
//! ```rust,no_run
//! use petple::http::{ApiClient, QueryParams};
//!
//! # async fn example() -> Result<(), petple::http::ApiError> {
//! let client = ApiClient::new("https://api.example.com/");
//! let session = client.session()?;
//!
//! let params = QueryParams::new().with("page", 1);
//! let body = session.get("/items", Some(&params), None).await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every failure is a single [`ApiError`]; see [`ApiErrorKind`] for how
//! statuses and transport failures are classified.

mod error;
mod http_client;
mod types;
mod utils;

pub use error::{ApiError, ApiErrorKind, ApiErrorSource, ApiResult};
pub use http_client::{ApiClient, ApiSession, DEFAULT_TIMEOUT_SECS};
pub use types::QueryParams;
pub use utils::build_url;
