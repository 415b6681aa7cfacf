//! Client-carried causal context.
//!
//! A context maps each key to the newest write the client has observed for
//! it. Servers fold contexts into their own knowledge and hand back a context
//! that is never older than the one presented.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clock::Timestamp;
use crate::membership::types::ShardId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    pub timestamp: Timestamp,
    #[serde(rename = "shard-id")]
    pub shard_id: ShardId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CausalContext(pub HashMap<String, ContextEntry>);

impl CausalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ContextEntry> {
        self.0.get(key)
    }

    pub fn timestamp(&self, key: &str) -> Option<Timestamp> {
        self.0.get(key).map(|entry| entry.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextEntry)> {
        self.0.iter()
    }

    /// Records `(timestamp, shard)` for `key` unless the context already
    /// holds an equal or newer entry. Returns whether the entry changed.
    pub fn record(&mut self, key: &str, timestamp: Timestamp, shard_id: &ShardId) -> bool {
        match self.0.get(key) {
            Some(existing) if existing.timestamp >= timestamp => false,
            _ => {
                self.0.insert(
                    key.to_string(),
                    ContextEntry {
                        timestamp,
                        shard_id: shard_id.clone(),
                    },
                );
                true
            }
        }
    }

    /// Pointwise maximum with `other`.
    pub fn absorb(&mut self, other: &CausalContext) {
        for (key, entry) in other.iter() {
            self.record(key, entry.timestamp, &entry.shard_id);
        }
    }
}

/// Folds this node's local write times into `incoming`.
///
/// For every key the node holds a timestamp for, an absent or older entry in
/// `incoming` is replaced by `(local timestamp, local shard)`; newer entries
/// are left untouched.
pub fn merge_context<'a, I>(incoming: &mut CausalContext, local: I, local_shard: &ShardId)
where
    I: IntoIterator<Item = (&'a String, Timestamp)>,
{
    for (key, timestamp) in local {
        incoming.record(key, timestamp, local_shard);
    }
}
