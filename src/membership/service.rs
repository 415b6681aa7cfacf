use parking_lot::RwLock;
use std::sync::Arc;

use super::types::{ClusterView, ShardId};
use crate::storage::partitioner::compute_shard_membership;

/// Holds this node's identity and the current cluster view.
///
/// The view is an immutable snapshot behind a pointer swap: readers take a
/// cheap `Arc` clone once per request and never observe a half-installed
/// view.
pub struct MembershipService {
    pub local_address: String,
    current: RwLock<Arc<ClusterView>>,
}

impl MembershipService {
    pub fn new(local_address: impl Into<String>, nodes: Vec<String>, repl_factor: usize) -> Arc<Self> {
        let local_address = local_address.into();
        let view = build_view(&local_address, nodes, repl_factor);

        tracing::info!(
            "Initial view: {} nodes, {} shards, local shard {:?}",
            view.nodes.len(),
            view.shards.len(),
            view.self_shard
        );

        Arc::new(Self {
            local_address,
            current: RwLock::new(Arc::new(view)),
        })
    }

    pub fn snapshot(&self) -> Arc<ClusterView> {
        self.current.read().clone()
    }

    pub fn self_shard(&self) -> Option<ShardId> {
        self.current.read().self_shard.clone()
    }

    /// Recomputes placement for `nodes` and swaps it in.
    ///
    /// Idempotent: installing the same view twice yields the same snapshot,
    /// so duplicated or reordered `updateView` broadcasts are harmless.
    pub fn install(&self, nodes: Vec<String>, repl_factor: usize) -> Arc<ClusterView> {
        let next = Arc::new(build_view(&self.local_address, nodes, repl_factor));
        let previous = std::mem::replace(&mut *self.current.write(), next.clone());

        if previous.self_shard != next.self_shard {
            tracing::info!(
                "Local shard changed: {:?} -> {:?}",
                previous.self_shard,
                next.self_shard
            );
        }
        tracing::info!(
            "Installed view: {} nodes, repl factor {}, {} shards",
            next.nodes.len(),
            next.repl_factor,
            next.shards.len()
        );

        next
    }
}

/// Builds the full snapshot for one node: placement plus its own shard.
pub fn build_view(local_address: &str, nodes: Vec<String>, repl_factor: usize) -> ClusterView {
    let shards = compute_shard_membership(&nodes, repl_factor);
    let self_shard = shards
        .iter()
        .find(|shard| shard.replicas.iter().any(|addr| addr == local_address))
        .map(|shard| shard.id.clone());

    if self_shard.is_none() && nodes.iter().any(|addr| addr == local_address) {
        tracing::warn!(
            "Node {} is in the view but left without a shard (view of {} with repl factor {})",
            local_address,
            nodes.len(),
            repl_factor
        );
    }

    ClusterView {
        nodes,
        repl_factor,
        shards,
        self_shard,
    }
}
