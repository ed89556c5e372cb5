//! Error types for the fetch service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Unified error type surfaced to HTTP callers.
///
/// Lock contention is not represented here: the read path recovers from it
/// locally (wait-and-recheck) and never reports it to the caller.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Identifier failed to parse as an integer
    #[error("Invalid record id: {0}")]
    InvalidArgument(String),

    /// Record does not exist in the backing store
    #[error("Record not found: {0}")]
    NotFound(i64),

    /// Any other failure from the cache, lock manager, or store
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            FetchError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            FetchError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            FetchError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch service.
pub type Result<T> = std::result::Result<T, FetchError>;
