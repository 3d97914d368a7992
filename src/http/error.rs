//! Error types for [`ApiClient`](super::ApiClient) operations.
//!
//! Every failure of the client is reported as a single [`ApiError`]. The
//! [`ApiErrorKind`] tag tells the failure modes apart, so callers can either
//! treat all failures uniformly or `match` on the kind to single one out.
//!
//! # Error Categories
//!
//! - **Transport**: [`Connection`](ApiErrorKind::Connection),
//!   [`Timeout`](ApiErrorKind::Timeout). No status code is attached.
//! - **Protocol**: [`Client`](ApiErrorKind::Client) for 4xx responses,
//!   [`Api`](ApiErrorKind::Api) for every other non-success status and for
//!   transport failures that are neither a refused connection nor a timeout.
//! - **Caller input**: [`Validation`](ApiErrorKind::Validation), never raised
//!   by the client itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use petple::http::{ApiClient, ApiErrorKind};
//!
//! # async fn example() {
//! let client = ApiClient::new("https://api.example.com");
//! match client.get("items", None, None).await {
//!     Ok(body) => println!("{body}"),
//!     Err(e) if e.kind() == ApiErrorKind::Timeout => eprintln!("slow upstream: {e}"),
//!     Err(e) => eprintln!("request failed ({:?}): {e}", e.status_code()),
//! }
//! # }
//! ```

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Result alias used throughout the HTTP layer.
pub type ApiResult<T> = Result<T, ApiError>;

/// Discriminates the failure modes of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Generic failure: 3xx/5xx responses, malformed requests, protocol
    /// violations, undecodable bodies.
    Api,
    /// The server answered with a 4xx status.
    Client,
    /// The connection to the server could not be established.
    Connection,
    /// The request exceeded the configured timeout.
    Timeout,
    /// Caller-side input validation failed.
    Validation,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Api => write!(f, "api_error"),
            ApiErrorKind::Client => write!(f, "client_error"),
            ApiErrorKind::Connection => write!(f, "connection_error"),
            ApiErrorKind::Timeout => write!(f, "timeout_error"),
            ApiErrorKind::Validation => write!(f, "validation_error"),
        }
    }
}

/// Underlying cause carried by an [`ApiError`].
#[derive(Debug, Error)]
pub enum ApiErrorSource {
    #[error(transparent)]
    Transport(#[from] reqwest_middleware::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A failed API call.
///
/// The message always carries enough context to log the failure on its own:
/// the target URL for transport failures, the status code for HTTP failures.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    status_code: Option<u16>,
    payload: Value,
    #[source]
    source: Option<ApiErrorSource>,
}

impl ApiError {
    fn new(kind: ApiErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            status_code: None,
            payload: empty_payload(),
            source: None,
        }
    }

    fn with_source(mut self, source: impl Into<ApiErrorSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A 4xx response.
    pub fn client(status_code: u16, payload: Value) -> Self {
        Self {
            status_code: Some(status_code),
            payload,
            ..Self::new(ApiErrorKind::Client, format!("Client error: {}", status_code))
        }
    }

    /// A non-success, non-4xx response.
    pub fn status(status_code: u16, payload: Value) -> Self {
        let message = if status_code >= 500 {
            format!("Server error: {}", status_code)
        } else {
            format!("Unexpected response status: {}", status_code)
        };
        Self {
            status_code: Some(status_code),
            payload,
            ..Self::new(ApiErrorKind::Api, message)
        }
    }

    pub fn connection(url: &str, source: impl Into<ApiErrorSource>) -> Self {
        let source = source.into();
        Self::new(
            ApiErrorKind::Connection,
            format!("Failed to connect to {}: {}", url, source),
        )
        .with_source(source)
    }

    pub fn timeout(url: &str, source: impl Into<ApiErrorSource>) -> Self {
        let source = source.into();
        Self::new(ApiErrorKind::Timeout, format!("Request timeout for {}: {}", url, source)).with_source(source)
    }

    /// Any other transport-level failure.
    pub fn request(url: &str, source: impl Into<ApiErrorSource>) -> Self {
        let source = source.into();
        Self::new(ApiErrorKind::Api, format!("Request failed for {}: {}", url, source)).with_source(source)
    }

    /// A failure while processing a response that did arrive.
    pub fn unexpected(url: &str, source: impl Into<ApiErrorSource>) -> Self {
        let source = source.into();
        Self::new(ApiErrorKind::Api, format!("Unexpected error for {}: {}", url, source)).with_source(source)
    }

    /// Caller-side validation failure. The client never returns this itself.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message.into())
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the failed response; `None` for transport failures.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Body of the failed response, or an empty JSON object.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

pub(crate) fn empty_payload() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use serde_json::json;

    use super::*;

    #[test]
    fn client_error_carries_status_and_payload() {
        let err = ApiError::client(404, json!({"error": "missing"}));
        assert_eq!(err.kind(), ApiErrorKind::Client);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.payload()["error"], "missing");
        assert_eq!(err.to_string(), "Client error: 404");
        assert!(err.source().is_none());
    }

    #[test]
    fn status_error_distinguishes_server_and_other_codes() {
        let server = ApiError::status(503, empty_payload());
        assert_eq!(server.kind(), ApiErrorKind::Api);
        assert!(server.message().contains("503"));
        assert!(server.message().starts_with("Server error"));

        let redirect = ApiError::status(302, empty_payload());
        assert_eq!(redirect.kind(), ApiErrorKind::Api);
        assert!(redirect.message().contains("302"));
    }

    #[test]
    fn validation_error_has_no_status() {
        let err = ApiError::validation("page size must be positive");
        assert_eq!(err.kind(), ApiErrorKind::Validation);
        assert_eq!(err.status_code(), None);
        assert_eq!(err.payload(), &json!({}));
    }

    #[test]
    fn decode_failure_keeps_source_and_url() {
        let cause = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err = ApiError::unexpected("http://test.api.com/x", cause);
        assert_eq!(err.kind(), ApiErrorKind::Api);
        assert!(err.message().contains("http://test.api.com/x"));
        assert!(err.source().is_some());
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ApiErrorKind::Timeout.to_string(), "timeout_error");
        assert_eq!(ApiErrorKind::Client.to_string(), "client_error");
    }
}
