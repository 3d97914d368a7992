pub mod api;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod db;
pub mod http;
pub mod ingest;
pub mod log;
pub mod models;
pub mod tasks;
pub mod weather;

pub use crate::api::ApiDoc;
pub use crate::db::init_db;
pub use crate::http::{ApiClient, ApiError, ApiErrorKind};
