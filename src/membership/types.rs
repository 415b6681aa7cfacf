use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a shard (`shard1`, `shard2`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ShardId(pub String);

impl ShardId {
    /// Shards are numbered from 1 in view order.
    pub fn from_index(index: usize) -> Self {
        Self(format!("shard{}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A shard together with its replica set, in view order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shard {
    pub id: ShardId,
    pub replicas: Vec<String>,
}

/// Immutable cluster configuration as seen by one node.
///
/// Built once per view change and swapped in whole, so request handlers
/// always route against either the old or the new placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterView {
    /// Ordered node addresses, as supplied by the administrator.
    pub nodes: Vec<String>,
    pub repl_factor: usize,
    /// Shards in creation order. Trailing nodes that do not fill a whole
    /// shard are in `nodes` but in no shard.
    pub shards: Vec<Shard>,
    /// Shard of the local node, if it has one under this view.
    pub self_shard: Option<ShardId>,
}

impl ClusterView {
    pub fn shard(&self, id: &ShardId) -> Option<&Shard> {
        self.shards.iter().find(|shard| &shard.id == id)
    }

    pub fn replicas(&self, id: &ShardId) -> &[String] {
        self.shard(id)
            .map(|shard| shard.replicas.as_slice())
            .unwrap_or(&[])
    }

    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.shards.iter().map(|shard| shard.id.clone()).collect()
    }

    pub fn shard_of(&self, address: &str) -> Option<&ShardId> {
        self.shards
            .iter()
            .find(|shard| shard.replicas.iter().any(|a| a == address))
            .map(|shard| &shard.id)
    }

    pub fn is_local_shard(&self, id: &ShardId) -> bool {
        self.self_shard.as_ref() == Some(id)
    }

    /// Other replicas of the local node's shard.
    pub fn shard_mates(&self, local_address: &str) -> Vec<String> {
        match &self.self_shard {
            Some(id) => self
                .replicas(id)
                .iter()
                .filter(|addr| addr.as_str() != local_address)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every node in the view except the local one.
    pub fn other_nodes(&self, local_address: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|addr| addr.as_str() != local_address)
            .cloned()
            .collect()
    }
}
