use reqwest::{Method, StatusCode};

use super::KeyReply;
use crate::causal::context::CausalContext;
use crate::clock::Timestamp;
use crate::error::{KvsError, Result};
use crate::membership::types::{ClusterView, ShardId};
use crate::node::KvsNode;
use crate::peer;
use crate::storage::memory::Record;
use crate::storage::protocol::KeyRequest;

impl KvsNode {
    pub async fn get_key(&self, key: &str, request: KeyRequest) -> Result<KeyReply> {
        let context = request.causal_context;
        // Mark as it stood before this request: used to tell whether anyone
        // besides this client has shown a newer version.
        let high_water = self.tracker.observe(&context, key);
        let view = self.membership.snapshot();

        if request.forwarded {
            return self.local_get(&view, key, context, high_water).await;
        }

        match self.directory.get(key) {
            Some(owner) if view.is_local_shard(&owner) => {
                self.local_get(&view, key, context, high_water).await
            }
            Some(owner) => self.remote_get(&view, &owner, key, context).await,
            // Gossip delivered the record before the directory entry.
            None if self.store.contains(key) => {
                self.local_get(&view, key, context, high_water).await
            }
            None => {
                tracing::debug!("GET {}: not in directory", key);
                Err(KvsError::KeyNotFound)
            }
        }
    }

    async fn local_get(
        &self,
        view: &ClusterView,
        key: &str,
        mut context: CausalContext,
        high_water: Option<Timestamp>,
    ) -> Result<KeyReply> {
        let Some(mut record) = self.store.get(key) else {
            return Err(KvsError::KeyNotFound);
        };

        if let Some(client_ts) = context.timestamp(key)
            && client_ts > record.timestamp
        {
            if high_water.is_none_or(|seen| record.timestamp >= seen) {
                tracing::debug!(
                    "GET {}: client is ahead but no newer version is known here, serving local copy",
                    key
                );
            } else {
                let required = client_ts.max(high_water.unwrap_or_default());
                record = self
                    .pull_from_shard_mates(view, key, &context, required)
                    .await
                    .ok_or(KvsError::Unreachable)?;
            }
        }

        self.merge_local_context(view, &mut context);
        Ok(KeyReply::retrieved(record.value, context))
    }

    /// Asks shard-mates for a version of `key` at least as new as `required`
    /// and adopts it locally.
    async fn pull_from_shard_mates(
        &self,
        view: &ClusterView,
        key: &str,
        context: &CausalContext,
        required: Timestamp,
    ) -> Option<Record> {
        let mates = view.shard_mates(self.address());
        let per_mate = peer::slice(self.config.request_timeout, mates.len());
        let request = KeyRequest {
            causal_context: context.clone(),
            ..KeyRequest::default()
        };

        for addr in &mates {
            match self.peers.pull_record(addr, key, &request, per_mate).await {
                Ok(Some(record)) if record.timestamp >= required => {
                    if self.store.merge(key, record.clone()) {
                        tracing::info!("Repaired {} from {} (ts={})", key, addr, record.timestamp);
                    }
                    return Some(record);
                }
                Ok(_) => tracing::debug!("{} has no version of {} new enough", addr, key),
                Err(e) => tracing::debug!("Pull of {} from {} failed: {}", key, addr, e),
            }
        }

        tracing::warn!(
            "GET {}: no shard-mate supplied a version >= {}, refusing stale read",
            key,
            required
        );
        None
    }

    async fn remote_get(
        &self,
        view: &ClusterView,
        owner: &ShardId,
        key: &str,
        context: CausalContext,
    ) -> Result<KeyReply> {
        let replicas = view.replicas(owner);
        let per_replica = peer::slice(self.config.request_timeout, replicas.len());
        let request = KeyRequest {
            causal_context: context.clone(),
            forwarded: true,
            ..KeyRequest::default()
        };

        let mut saw_missing = false;
        for addr in replicas {
            match self
                .peers
                .forward_key(Method::GET, addr, key, &request, per_replica)
                .await
            {
                Ok((StatusCode::OK, mut body)) => {
                    let mut merged = body.causal_context.take().unwrap_or_default();
                    merged.absorb(&context);
                    self.merge_local_context(view, &mut merged);
                    body.causal_context = Some(merged);
                    body.address = Some(addr.clone());

                    tracing::debug!("GET {}: served by {} ({})", key, addr, owner);
                    return Ok(KeyReply {
                        status: StatusCode::OK,
                        body,
                    });
                }
                Ok((StatusCode::NOT_FOUND, _)) => {
                    tracing::debug!("GET {}: {} does not have it yet", key, addr);
                    saw_missing = true;
                }
                Ok((status, _)) => tracing::debug!("GET {}: {} answered {}", key, addr, status),
                Err(e) => tracing::warn!("GET {}: replica {} unreachable: {}", key, addr, e),
            }
        }

        if saw_missing {
            Err(KvsError::KeyNotFound)
        } else {
            Err(KvsError::Unreachable)
        }
    }
}
