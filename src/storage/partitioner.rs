use std::time::Duration;

use crate::membership::types::{ClusterView, Shard, ShardId};
use crate::peer::{self, client::PeerClient};

/// Partitions `nodes` in order: each successive run of `repl_factor`
/// addresses forms the next shard. Addresses past the last full shard are
/// left unassigned.
///
/// Deterministic, because every node runs it independently and they must
/// agree on the result.
pub fn compute_shard_membership(nodes: &[String], repl_factor: usize) -> Vec<Shard> {
    if repl_factor == 0 {
        return Vec::new();
    }

    nodes
        .chunks_exact(repl_factor)
        .enumerate()
        .map(|(index, replicas)| Shard {
            id: ShardId::from_index(index),
            replicas: replicas.to_vec(),
        })
        .collect()
}

/// Picks the shard for a brand-new key: the one reporting the fewest keys.
///
/// The local shard (with `local_count`) is the incumbent; each other shard is
/// asked through its first reachable replica within its slice of `budget`.
/// Ties and failures keep the incumbent, so placement never blocks a write.
/// Returns `None` only when the view has no shards at all.
pub async fn choose_shard_for_new_key(
    view: &ClusterView,
    local_count: usize,
    peers: &PeerClient,
    budget: Duration,
) -> Option<ShardId> {
    let candidates: Vec<&Shard> = view
        .shards
        .iter()
        .filter(|shard| !view.is_local_shard(&shard.id))
        .collect();

    let (mut best_shard, mut best_count) = match &view.self_shard {
        Some(id) => (id.clone(), Some(local_count)),
        // A node outside every shard has no count of its own to offer.
        None => (view.shards.first()?.id.clone(), None),
    };

    let per_shard = peer::slice(budget, candidates.len());

    for shard in candidates {
        let Some(count) = shard_key_count(peers, &shard.replicas, per_shard).await else {
            tracing::debug!("No replica of {} answered key-count, skipping", shard.id);
            continue;
        };

        if best_count.is_none_or(|best| count < best) {
            best_shard = shard.id.clone();
            best_count = Some(count);
        }
    }

    tracing::debug!(
        "Placement chose {} ({:?} keys)",
        best_shard,
        best_count
    );
    Some(best_shard)
}

/// Key count of a shard as reported by its first reachable replica.
pub async fn shard_key_count(
    peers: &PeerClient,
    replicas: &[String],
    budget: Duration,
) -> Option<usize> {
    let per_replica = peer::slice(budget, replicas.len());
    for addr in replicas {
        match peers.key_count(addr, per_replica).await {
            Ok(reply) => return Some(reply.key_count),
            Err(e) => tracing::debug!("Key count from {} failed: {}", addr, e),
        }
    }
    None
}
