//! Storage Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) exchanged between
//! clients and nodes, and between nodes themselves.
//!
//! These structures are serialized as JSON and sent over HTTP. Field names follow
//! the established client contract (`causal-context`, `key-count`, `doesExist`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::memory::Record;
use crate::causal::context::CausalContext;
use crate::clock::Timestamp;
use crate::error::KvsError;
use crate::membership::types::ShardId;

// --- API Endpoints ---

/// Client-facing read/write of a single key. Followed by `/{key}`.
pub const ENDPOINT_KEYS: &str = "/kvs/keys";
/// Local key count and shard id.
pub const ENDPOINT_KEY_COUNT: &str = "/kvs/key-count";
/// Directory patch: "key X now belongs to shard Y".
pub const ENDPOINT_UPDATE_KEY: &str = "/kvs/updateKey";
/// Replace view and replication factor.
pub const ENDPOINT_UPDATE_VIEW: &str = "/kvs/updateView";
/// Replace the whole directory.
pub const ENDPOINT_UPDATE_KEY_SHARD: &str = "/kvs/updateKeyShard";
/// Migrate local keys whose owning shard changed.
pub const ENDPOINT_REARRANGE_KEYS: &str = "/kvs/rearrangeKeys";
/// Pre-flight validation before a new key is committed to a shard. Followed by `/{key}`.
pub const ENDPOINT_VALIDATE: &str = "/kvs/isRequestValidToShard";
/// Peer pull of a replica's record. Followed by `/{key}`.
pub const ENDPOINT_PULL_RECORD: &str = "/kvs/getKeyWithContext";
/// Anti-entropy push.
pub const ENDPOINT_GOSSIP: &str = "/kvs/gossipCheck";
/// Shard introspection.
pub const ENDPOINT_SHARDS: &str = "/kvs/shards";
/// Administrator entry point for reconfiguration.
pub const ENDPOINT_VIEW_CHANGE: &str = "/kvs/view-change";

// --- Key operations ---

/// Body of GET and PUT on `/kvs/keys/{key}`.
///
/// `timestamp` marks an internal replica write: the receiver stores the value
/// with that version instead of routing it. `forwarded` marks a request already
/// routed by a peer, which the receiver must answer from its own store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub value: Option<serde_json::Value>,

    #[serde(rename = "causal-context", default)]
    pub causal_context: CausalContext,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forwarded: bool,
}

/// Response of every key operation, successful or not.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeyResponse {
    pub message: String,

    #[serde(rename = "doesExist", default, skip_serializing_if = "Option::is_none")]
    pub does_exist: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Replica that served a forwarded request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(
        rename = "causal-context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub causal_context: Option<CausalContext>,
}

impl KeyResponse {
    pub fn retrieved(value: serde_json::Value, context: CausalContext) -> Self {
        Self {
            message: "Retrieved successfully".to_string(),
            does_exist: Some(true),
            value: Some(value),
            causal_context: Some(context),
            ..Self::default()
        }
    }

    pub fn added(context: CausalContext) -> Self {
        Self {
            message: "Added successfully".to_string(),
            replaced: Some(false),
            causal_context: Some(context),
            ..Self::default()
        }
    }

    pub fn updated(context: CausalContext) -> Self {
        Self {
            message: "Updated successfully".to_string(),
            replaced: Some(true),
            causal_context: Some(context),
            ..Self::default()
        }
    }

    pub fn error(err: &KvsError) -> Self {
        let message = match err {
            KvsError::ValueMissing | KvsError::KeyTooLong => "Error in PUT",
            KvsError::KeyNotFound => "Error in GET",
            _ => "Error in request",
        };
        Self {
            message: message.to_string(),
            does_exist: matches!(err, KvsError::KeyNotFound).then_some(false),
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Answer to `isRequestValidToShard`; `rejection` is empty when the write
/// would be accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    #[serde(default)]
    pub rejection: Option<KvsError>,
}

/// Answer to `getKeyWithContext`: the replica's own record, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRecordResponse {
    pub record: Option<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyCountResponse {
    pub message: String,
    #[serde(rename = "key-count")]
    pub key_count: usize,
    #[serde(rename = "shard-id")]
    pub shard_id: Option<ShardId>,
}

// --- Directory and view broadcasts ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateKeyRequest {
    pub key: String,
    pub shard: ShardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateViewRequest {
    pub view: Vec<String>,
    #[serde(rename = "repl-factor")]
    pub repl_factor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateKeyShardRequest {
    pub directory: HashMap<String, ShardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}

// --- Gossip ---

/// Anti-entropy push. `records` is only filled for shard-mates; every other
/// node receives the directory alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipRequest {
    pub sender: String,
    #[serde(rename = "shard-id")]
    pub shard_id: Option<ShardId>,
    #[serde(default)]
    pub records: HashMap<String, Record>,
    #[serde(default)]
    pub directory: HashMap<String, ShardId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GossipResponse {
    pub repaired: usize,
    #[serde(rename = "directory-added")]
    pub directory_added: usize,
}

// --- View change and introspection ---

/// The view may be sent as a comma-separated string or as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewSpec {
    List(Vec<String>),
    Csv(String),
}

impl ViewSpec {
    pub fn into_nodes(self) -> Vec<String> {
        match self {
            ViewSpec::List(nodes) => nodes
                .into_iter()
                .map(|addr| addr.trim().to_string())
                .filter(|addr| !addr.is_empty())
                .collect(),
            ViewSpec::Csv(raw) => crate::config::parse_view(&raw),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewChangeRequest {
    pub view: ViewSpec,
    #[serde(rename = "repl-factor")]
    pub repl_factor: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShardSummary {
    #[serde(rename = "shard-id")]
    pub shard_id: ShardId,
    pub replicas: Vec<String>,
    /// `None` when no replica of the shard answered.
    #[serde(rename = "key-count")]
    pub key_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewChangeResponse {
    pub message: String,
    pub shards: Vec<ShardSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardListResponse {
    pub message: String,
    pub shards: Vec<ShardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardInfoResponse {
    pub message: String,
    #[serde(flatten)]
    pub shard: ShardSummary,
}
