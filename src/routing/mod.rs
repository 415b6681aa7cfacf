//! Request Routing Module
//!
//! Decides, per request, whether a key is served from the local store or
//! forwarded to the replicas of the shard that owns it.
//!
//! ## Request paths
//! - **Local GET**: serve the local record unless a client has seen a newer version,
//!   in which case pull it from a shard-mate or refuse with `503`.
//! - **Local PUT**: stamp, store, push to shard-mates, answer `201`/`200`.
//! - **Remote GET**: ask the owning replicas in order; first value wins.
//! - **Remote PUT**: place new keys first, then send the write to every owning
//!   replica and adopt the first answer.
//!
//! Every response carries a causal context merged with this node's own write times.

pub mod get;
pub mod handlers;
pub mod put;


use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::causal::context::CausalContext;
use crate::error::{KvsError, Result};
use crate::storage::memory::WriteOutcome;
use crate::storage::protocol::KeyResponse;

/// Longest key accepted, in characters.
pub const MAX_KEY_LENGTH: usize = 50;

/// Status and body of a key operation.
#[derive(Debug, Clone)]
pub struct KeyReply {
    pub status: StatusCode,
    pub body: KeyResponse,
}

impl KeyReply {
    pub fn retrieved(value: serde_json::Value, context: CausalContext) -> Self {
        Self {
            status: StatusCode::OK,
            body: KeyResponse::retrieved(value, context),
        }
    }

    pub fn written(outcome: WriteOutcome, context: CausalContext) -> Self {
        match outcome {
            WriteOutcome::Created => Self {
                status: StatusCode::CREATED,
                body: KeyResponse::added(context),
            },
            WriteOutcome::Updated | WriteOutcome::Stale => Self {
                status: StatusCode::OK,
                body: KeyResponse::updated(context),
            },
        }
    }
}

impl IntoResponse for KeyReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Client input checks shared by the local path and pre-flight validation.
pub fn validate_write(key: &str, value: Option<serde_json::Value>) -> Result<serde_json::Value> {
    let value = value.ok_or(KvsError::ValueMissing)?;
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(KvsError::KeyTooLong);
    }
    Ok(value)
}
