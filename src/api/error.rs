use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinError;
use utoipa::ToSchema;

use crate::{db::DbError, ingest::IngestError};

/// Error returned by route handlers, rendered as `{"error": "<message>"}`.
#[derive(Debug, Error, ToSchema)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEntry(msg) => ServiceError::BadRequest(format!("Duplicate entry: {msg}")),
            other => ServiceError::DbError(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(err: r2d2::Error) -> Self {
        ServiceError::DbError(err.to_string())
    }
}

impl From<JoinError> for ServiceError {
    fn from(err: JoinError) -> Self {
        ServiceError::InternalServerError(err.to_string())
    }
}

impl From<IngestError> for ServiceError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoData { .. } => ServiceError::NotFound("No data returned from API".to_string()),
            IngestError::InvalidWindow { .. } => ServiceError::BadRequest(err.to_string()),
            IngestError::Upstream(e) => ServiceError::Upstream(e.to_string()),
            IngestError::Db(e) => e.into(),
            IngestError::Task(e) => e.into(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ServiceError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServiceError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ServiceError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ServiceError::DbError(msg) | ServiceError::InternalServerError(msg) => {
                error!(error:% = msg; "Request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
