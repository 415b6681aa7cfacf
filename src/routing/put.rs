use futures::StreamExt;
use futures::stream::FuturesUnordered;
use reqwest::Method;
use std::sync::Arc;

use super::{KeyReply, validate_write};
use crate::causal::context::CausalContext;
use crate::clock::{Timestamp, now_ns};
use crate::error::{KvsError, Result};
use crate::membership::types::{ClusterView, ShardId};
use crate::node::KvsNode;
use crate::peer;
use crate::storage::memory::{Record, WriteOutcome};
use crate::storage::partitioner::choose_shard_for_new_key;
use crate::storage::protocol::{ENDPOINT_KEYS, ENDPOINT_UPDATE_KEY, KeyRequest, UpdateKeyRequest};

impl KvsNode {
    pub async fn put_key(&self, key: &str, request: KeyRequest) -> Result<KeyReply> {
        self.tracker.observe(&request.causal_context, key);

        if let Some(timestamp) = request.timestamp {
            return self.replica_write(key, request, timestamp);
        }

        let value = validate_write(key, request.value)?;
        let context = request.causal_context;
        let view = self.membership.snapshot();

        let owner = match self.directory.get(key) {
            Some(owner) => owner,
            None => self.place_new_key(&view, key, &value).await?,
        };

        if view.is_local_shard(&owner) {
            Ok(self.local_put(&view, key, value, context))
        } else {
            self.remote_put(&view, &owner, key, value, context).await
        }
    }

    /// Stores a write that already carries its version. Used for fan-out,
    /// shard-mate pushes and migration; never re-routed.
    fn replica_write(&self, key: &str, request: KeyRequest, timestamp: Timestamp) -> Result<KeyReply> {
        let value = request.value.ok_or(KvsError::ValueMissing)?;
        let outcome = self.store.write(key, Record { value, timestamp });

        if outcome == WriteOutcome::Stale {
            tracing::debug!("Dropped stale replica write of {} (ts={})", key, timestamp);
        }

        let view = self.membership.snapshot();
        let mut context = request.causal_context;
        self.merge_local_context(&view, &mut context);
        Ok(KeyReply::written(outcome, context))
    }

    fn local_put(
        &self,
        view: &ClusterView,
        key: &str,
        value: serde_json::Value,
        mut context: CausalContext,
    ) -> KeyReply {
        let floor = context.timestamp(key).map_or(0, |ts| ts.saturating_add(1));
        let (outcome, timestamp) = self.store.write_latest(key, value.clone(), floor);

        tracing::debug!("PUT {}: stored locally ({:?}, ts={})", key, outcome, timestamp);
        self.push_to_shard_mates(view, key, value, timestamp);

        self.merge_local_context(view, &mut context);
        KeyReply::written(outcome, context)
    }

    /// Best-effort copy of a local write to the rest of the shard; gossip
    /// repairs whatever this misses.
    pub(crate) fn push_to_shard_mates(
        &self,
        view: &ClusterView,
        key: &str,
        value: serde_json::Value,
        timestamp: Timestamp,
    ) {
        let mates = view.shard_mates(self.address());
        if mates.is_empty() {
            return;
        }
        let request = KeyRequest {
            value: Some(value),
            timestamp: Some(timestamp),
            forwarded: true,
            ..KeyRequest::default()
        };
        self.broadcaster
            .broadcast(mates, &format!("{}/{}", ENDPOINT_KEYS, key), &request);
    }

    /// Chooses a shard for a key nobody owns yet, checks the write with that
    /// shard and announces the new directory entry.
    async fn place_new_key(
        &self,
        view: &ClusterView,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ShardId> {
        let shard = choose_shard_for_new_key(
            view,
            self.store.len(),
            &self.peers,
            self.config.request_timeout,
        )
        .await
        .ok_or(KvsError::Unreachable)?;

        if !view.is_local_shard(&shard) {
            self.validate_on_shard(view, &shard, key, value).await?;
        }

        self.directory.insert(key.to_string(), shard.clone());
        self.broadcaster.broadcast(
            view.other_nodes(self.address()),
            ENDPOINT_UPDATE_KEY,
            &UpdateKeyRequest {
                key: key.to_string(),
                shard: shard.clone(),
            },
        );

        tracing::info!("New key {} placed on {}", key, shard);
        Ok(shard)
    }

    /// Pre-flight check against every replica of `shard`. One active
    /// rejection fails the write; no answer at all is `Unreachable`.
    async fn validate_on_shard(
        &self,
        view: &ClusterView,
        shard: &ShardId,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        let replicas = view.replicas(shard);
        let per_replica = peer::slice(self.config.request_timeout, replicas.len());
        let request = KeyRequest {
            value: Some(value.clone()),
            ..KeyRequest::default()
        };

        let mut reachable = false;
        for addr in replicas {
            match self.peers.validate(addr, key, &request, per_replica).await {
                Ok(reply) => match reply.rejection {
                    Some(rejection) => {
                        tracing::debug!("{} rejected new key {}: {}", addr, key, rejection);
                        return Err(rejection);
                    }
                    None => reachable = true,
                },
                Err(e) => tracing::debug!("Validation on {} failed: {}", addr, e),
            }
        }

        if reachable {
            Ok(())
        } else {
            tracing::warn!("No replica of {} reachable to accept {}", shard, key);
            Err(KvsError::Unreachable)
        }
    }

    /// Sends the write, stamped once here, to every replica of `owner` and
    /// answers with the first reply. The other calls keep running on their
    /// own tasks.
    async fn remote_put(
        &self,
        view: &ClusterView,
        owner: &ShardId,
        key: &str,
        value: serde_json::Value,
        context: CausalContext,
    ) -> Result<KeyReply> {
        let replicas = view.replicas(owner);
        if replicas.is_empty() {
            return Err(KvsError::Unreachable);
        }

        let floor = context.timestamp(key).map_or(0, |ts| ts.saturating_add(1));
        let request = Arc::new(KeyRequest {
            value: Some(value),
            causal_context: context.clone(),
            timestamp: Some(now_ns().max(floor)),
            forwarded: true,
        });

        let mut pending: FuturesUnordered<_> = replicas
            .iter()
            .map(|addr| {
                let peers = self.peers.clone();
                let request = request.clone();
                let addr = addr.clone();
                let key = key.to_string();
                let timeout = self.config.request_timeout;

                tokio::spawn(async move {
                    let result = peers
                        .forward_key(Method::PUT, &addr, &key, &request, timeout)
                        .await;
                    (addr, result)
                })
            })
            .collect();

        while let Some(joined) = pending.next().await {
            let (addr, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!("Forwarding task for {} failed: {}", key, e);
                    continue;
                }
            };

            match result {
                Ok((status, mut body)) => {
                    let mut merged = body.causal_context.take().unwrap_or_default();
                    merged.absorb(&context);
                    self.merge_local_context(view, &mut merged);
                    body.causal_context = Some(merged);
                    body.address = Some(addr.clone());

                    tracing::debug!("PUT {}: {} answered {}", key, addr, status);
                    return Ok(KeyReply { status, body });
                }
                Err(e) => tracing::warn!("PUT {}: replica {} unreachable: {}", key, addr, e),
            }
        }

        Err(KvsError::Unreachable)
    }
}
