use thiserror::Error;
use tokio::task::JoinError;

use crate::{db::DbError, http::ApiError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] ApiError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("No data returned from API for rows {start}..={end}")]
    NoData { start: u32, end: u32 },

    #[error("Invalid row window {start}..={end}")]
    InvalidWindow { start: u32, end: u32 },

    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}
