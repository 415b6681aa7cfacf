use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::membership::types::ClusterView;
use crate::node::KvsNode;
use crate::storage::memory::Record;
use crate::storage::protocol::{ENDPOINT_GOSSIP, GossipRequest, GossipResponse};

/// Starts the anti-entropy loop for `node`.
///
/// The first round is delayed by a random fraction of the interval so nodes
/// started together do not gossip in lockstep. A round that finds records
/// left behind by an earlier migration retries moving them before the next
/// tick.
pub fn spawn_gossip(node: Arc<KvsNode>) -> JoinHandle<()> {
    let period = node.config.gossip_interval.max(Duration::from_millis(1));
    let offset = Duration::from_millis(rand::thread_rng().gen_range(0..period.as_millis() as u64));

    tokio::spawn(async move {
        tokio::time::sleep(offset).await;
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            node.gossip_round();

            let misplaced = node.misplaced_keys();
            if !misplaced.is_empty() {
                tracing::info!("Retrying migration of {} misplaced keys", misplaced.len());
                let report = node.rearrange_keys().await;
                tracing::debug!(
                    "Retry finished: {} migrated, {} stranded",
                    report.migrated,
                    report.stranded
                );
            }
        }
    })
}

impl KvsNode {
    /// Sends one round of gossip. Never blocks on peers.
    pub fn gossip_round(&self) {
        let view = self.membership.snapshot();
        let mates = view.shard_mates(self.address());
        let others: Vec<String> = view
            .other_nodes(self.address())
            .into_iter()
            .filter(|addr| !mates.contains(addr))
            .collect();

        let directory = self.directory.snapshot();
        let broadcaster = self.broadcaster.with_timeout(self.config.request_timeout);

        tracing::debug!(
            "Gossip round: {} shard-mates, {} other nodes, {} directory entries",
            mates.len(),
            others.len(),
            directory.len()
        );

        if !mates.is_empty() {
            broadcaster.broadcast(
                mates,
                ENDPOINT_GOSSIP,
                &GossipRequest {
                    sender: self.address().to_string(),
                    shard_id: view.self_shard.clone(),
                    records: self.owned_records(&view),
                    directory: directory.clone(),
                },
            );
        }

        if !others.is_empty() {
            broadcaster.broadcast(
                others,
                ENDPOINT_GOSSIP,
                &GossipRequest {
                    sender: self.address().to_string(),
                    shard_id: view.self_shard.clone(),
                    records: Default::default(),
                    directory,
                },
            );
        }
    }

    /// Local records this node's shard owns. Keys without a directory entry
    /// count as owned; keys the directory assigns elsewhere are waiting to be
    /// migrated and must not spread inside the old shard.
    pub fn owned_records(&self, view: &ClusterView) -> HashMap<String, Record> {
        let mut records = self.store.snapshot();
        records.retain(|key, _| {
            self.directory
                .get(key)
                .is_none_or(|owner| view.is_local_shard(&owner))
        });
        records
    }

    /// Keys stored here that the directory assigns to another shard.
    pub fn misplaced_keys(&self) -> Vec<String> {
        let view = self.membership.snapshot();
        self.store
            .timestamps()
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| {
                self.directory
                    .get(key)
                    .is_some_and(|owner| !view.is_local_shard(&owner))
            })
            .collect()
    }

    /// Folds an incoming gossip message into local state.
    ///
    /// Records are only taken from a member of this node's own shard; a
    /// sender still on an older view could otherwise hand over keys this
    /// shard no longer owns.
    pub fn apply_gossip(&self, request: GossipRequest) -> GossipResponse {
        let view = self.membership.snapshot();
        let same_shard = view.self_shard.is_some() && request.shard_id == view.self_shard;

        let mut repaired = 0;
        if same_shard {
            for (key, record) in request.records {
                if self.store.merge(&key, record) {
                    repaired += 1;
                }
            }
        } else if !request.records.is_empty() {
            tracing::debug!(
                "Ignoring {} records from {} ({:?} is not our shard)",
                request.records.len(),
                request.sender,
                request.shard_id
            );
        }

        let directory_added = self.directory.fill_missing(request.directory);

        if repaired > 0 || directory_added > 0 {
            tracing::info!(
                "Gossip from {}: {} records repaired, {} directory entries added",
                request.sender,
                repaired,
                directory_added
            );
        }

        GossipResponse {
            repaired,
            directory_added,
        }
    }
}
