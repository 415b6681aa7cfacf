use futures::future::join_all;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{KvsError, Result};
use crate::membership::types::{ClusterView, Shard, ShardId};
use crate::node::KvsNode;
use crate::peer::{self, broadcast::to_json};
use crate::storage::directory::rebuild_directory;
use crate::storage::memory::Record;
use crate::storage::partitioner::shard_key_count;
use crate::storage::protocol::{
    ENDPOINT_REARRANGE_KEYS, ENDPOINT_UPDATE_KEY_SHARD, ENDPOINT_UPDATE_VIEW, KeyRequest,
    ShardSummary, UpdateKeyShardRequest, UpdateViewRequest,
};

/// Counts from one `rearrange_keys` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RearrangeReport {
    pub migrated: usize,
    pub kept: usize,
    /// Keys that should have moved but no new owner acknowledged them.
    pub stranded: usize,
}

impl KvsNode {
    /// Runs a full view change from this node.
    ///
    /// The new view and the rebuilt directory are installed locally first,
    /// then pushed to every old and new node as one ordered, fire-and-forget
    /// pipeline per peer. After the convergence delay the resulting shard
    /// occupancy is collected, best effort.
    pub async fn view_change(
        self: &Arc<Self>,
        nodes: Vec<String>,
        repl_factor: usize,
    ) -> Result<Vec<ShardSummary>> {
        validate_view(&nodes, repl_factor)?;

        let old = self.membership.snapshot();
        let old_directory = self.directory.snapshot();
        let targets = broadcast_targets(&old, &nodes, self.address());

        tracing::info!(
            "View change: {} -> {} nodes, repl factor {} -> {}",
            old.nodes.len(),
            nodes.len(),
            old.repl_factor,
            repl_factor
        );

        let next = self.membership.install(nodes.clone(), repl_factor);
        let directory = rebuild_directory(&old_directory, &next.shard_ids());
        self.directory.replace(directory.clone());

        self.broadcaster.pipeline(
            targets,
            vec![
                (
                    ENDPOINT_UPDATE_VIEW.to_string(),
                    to_json(&UpdateViewRequest {
                        view: nodes,
                        repl_factor,
                    }),
                ),
                (
                    ENDPOINT_UPDATE_KEY_SHARD.to_string(),
                    to_json(&UpdateKeyShardRequest { directory }),
                ),
                (
                    ENDPOINT_REARRANGE_KEYS.to_string(),
                    serde_json::json!({}),
                ),
            ],
        );

        self.spawn_rearrange();

        tokio::time::sleep(self.config.convergence_delay).await;
        Ok(self.shard_summaries(&next).await)
    }

    /// `updateView` receiver: recompute placement and own shard.
    pub fn apply_view(&self, nodes: Vec<String>, repl_factor: usize) {
        self.membership.install(nodes, repl_factor);
    }

    /// `updateKeyShard` receiver: replace the directory wholesale.
    pub fn apply_directory(&self, directory: HashMap<String, ShardId>) {
        tracing::info!("Directory replaced: {} keys", directory.len());
        self.directory.replace(directory);
    }

    /// Runs `rearrange_keys` on its own task so it outlives the request that
    /// triggered it.
    pub fn spawn_rearrange(self: &Arc<Self>) {
        let node = self.clone();
        tokio::spawn(async move {
            let report = node.rearrange_keys().await;
            tracing::info!(
                "Rearrange finished: {} migrated, {} kept, {} stranded",
                report.migrated,
                report.kept,
                report.stranded
            );
        });
    }

    /// Moves every local key whose directory owner is another shard to that
    /// shard's replicas and drops the local copy once one of them has it.
    /// Keys that stay are re-pushed to shard-mates.
    pub async fn rearrange_keys(&self) -> RearrangeReport {
        let view = self.membership.snapshot();
        let directory = self.directory.snapshot();
        let mut report = RearrangeReport::default();

        for (key, record) in self.store.snapshot() {
            let Some(owner) = directory.get(&key) else {
                tracing::debug!("Rearrange: {} has no directory entry, keeping", key);
                report.kept += 1;
                continue;
            };

            if view.is_local_shard(owner) {
                self.push_to_shard_mates(&view, &key, record.value, record.timestamp);
                report.kept += 1;
                continue;
            }

            let replicas = view.replicas(owner);
            if self.migrate(replicas, &key, &record).await {
                if self.store.remove_if_unchanged(&key, record.timestamp) {
                    tracing::debug!("Migrated {} to {}", key, owner);
                }
                report.migrated += 1;
            } else {
                tracing::warn!("No replica of {} accepted {}, keeping local copy", owner, key);
                report.stranded += 1;
            }
        }

        report
    }

    /// Sends one record, with its original timestamp, to all `replicas` in
    /// parallel. True if at least one stored it.
    async fn migrate(&self, replicas: &[String], key: &str, record: &Record) -> bool {
        let request = KeyRequest {
            value: Some(record.value.clone()),
            timestamp: Some(record.timestamp),
            forwarded: true,
            ..KeyRequest::default()
        };

        let results = join_all(replicas.iter().map(|addr| {
            self.peers
                .forward_key(Method::PUT, addr, key, &request, self.config.request_timeout)
        }))
        .await;

        results
            .into_iter()
            .any(|result| matches!(result, Ok((status, _)) if status.is_success()))
    }

    /// Replica list and observed key count of every shard in `view`.
    pub async fn shard_summaries(&self, view: &ClusterView) -> Vec<ShardSummary> {
        let per_shard = peer::slice(self.config.request_timeout, view.shards.len());
        let mut summaries = Vec::with_capacity(view.shards.len());
        for shard in &view.shards {
            summaries.push(self.shard_summary(view, shard, per_shard).await);
        }
        summaries
    }

    pub async fn shard_summary(
        &self,
        view: &ClusterView,
        shard: &Shard,
        budget: std::time::Duration,
    ) -> ShardSummary {
        let key_count = if view.is_local_shard(&shard.id) {
            Some(self.store.len())
        } else {
            shard_key_count(&self.peers, &shard.replicas, budget).await
        };

        ShardSummary {
            shard_id: shard.id.clone(),
            replicas: shard.replicas.clone(),
            key_count,
        }
    }
}

pub fn validate_view(nodes: &[String], repl_factor: usize) -> Result<()> {
    if nodes.is_empty() {
        return Err(KvsError::InvalidView("view is empty".to_string()));
    }
    if repl_factor == 0 {
        return Err(KvsError::InvalidView(
            "replication factor must be at least 1".to_string(),
        ));
    }
    if repl_factor > nodes.len() {
        return Err(KvsError::InvalidView(format!(
            "replication factor {} exceeds view of {} nodes",
            repl_factor,
            nodes.len()
        )));
    }
    Ok(())
}

/// Union of the old and new views, first-seen order, without `local`.
pub fn broadcast_targets(old: &ClusterView, nodes: &[String], local: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for addr in old.nodes.iter().chain(nodes.iter()) {
        if addr != local && !targets.contains(addr) {
            targets.push(addr.clone());
        }
    }
    targets
}
