use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::client::PeerClient;

/// Non-blocking broadcast.
///
/// Each target gets its own spawned task bounded by `timeout`; the outcome is
/// logged and discarded and the caller never waits. Delivery is unordered
/// across targets and unacknowledged.
#[derive(Clone)]
pub struct Broadcaster {
    client: PeerClient,
    timeout: Duration,
}

impl Broadcaster {
    pub fn new(client: PeerClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            client: self.client.clone(),
            timeout,
        }
    }

    pub fn broadcast<B: Serialize>(&self, targets: Vec<String>, path: &str, body: &B) {
        self.pipeline(targets, vec![(path.to_string(), to_json(body))]);
    }

    /// Sends `steps` to every target in order, one target per task.
    ///
    /// A failed step does not stop the remaining ones: a peer that misses
    /// the first message may still take the next.
    pub fn pipeline(&self, targets: Vec<String>, steps: Vec<(String, serde_json::Value)>) {
        if targets.is_empty() || steps.is_empty() {
            return;
        }
        let steps = Arc::new(steps);

        for target in targets {
            let client = self.client.clone();
            let steps = steps.clone();
            let timeout = self.timeout;

            tokio::spawn(async move {
                for (path, body) in steps.iter() {
                    if let Err(e) = client.put_unit(&target, path, body, timeout).await {
                        tracing::debug!("Broadcast {} to {} dropped: {}", path, target, e);
                    }
                }
            });
        }
    }
}

pub fn to_json<B: Serialize>(body: &B) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize broadcast payload: {}", e);
        serde_json::Value::Null
    })
}
