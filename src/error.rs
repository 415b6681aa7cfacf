//! Error types for client-facing key operations.
//!
//! Peer-to-peer failures never surface here directly: they are absorbed at
//! the call site and only show up as `Unreachable` once every candidate
//! replica has been tried.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::protocol::KeyResponse;

/// Result type alias using KvsError
pub type Result<T> = std::result::Result<T, KvsError>;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvsError {
    #[error("Value is missing")]
    ValueMissing,

    #[error("Key is too long")]
    KeyTooLong,

    #[error("Key does not exist")]
    KeyNotFound,

    #[error("Unable to satisfy request")]
    Unreachable,

    #[error("Invalid view: {0}")]
    InvalidView(String),

    #[error("Shard does not exist: {0}")]
    UnknownShard(String),
}

impl KvsError {
    pub fn status(&self) -> StatusCode {
        match self {
            KvsError::ValueMissing | KvsError::KeyTooLong | KvsError::InvalidView(_) => {
                StatusCode::BAD_REQUEST
            }
            KvsError::KeyNotFound | KvsError::UnknownShard(_) => StatusCode::NOT_FOUND,
            KvsError::Unreachable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for KvsError {
    fn into_response(self) -> Response {
        (self.status(), Json(KeyResponse::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(KvsError::ValueMissing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(KvsError::KeyTooLong.status(), StatusCode::BAD_REQUEST);
        assert_eq!(KvsError::KeyNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            KvsError::Unreachable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_client_error_messages() {
        assert_eq!(KvsError::ValueMissing.to_string(), "Value is missing");
        assert_eq!(KvsError::KeyTooLong.to_string(), "Key is too long");
        assert_eq!(KvsError::KeyNotFound.to_string(), "Key does not exist");
    }
}
