use dashmap::DashMap;

use super::context::CausalContext;
use crate::clock::Timestamp;

/// Per-key high-water mark of timestamps seen in any inbound causal context.
///
/// Authoritative local write times live with the records in `LocalStore`;
/// this tracker only remembers what clients claim to have seen, which is how
/// a replica notices it is behind before gossip has repaired it.
#[derive(Default)]
pub struct CausalTracker {
    latest_seen: DashMap<String, Timestamp>,
}

impl CausalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_seen(&self, key: &str) -> Option<Timestamp> {
        self.latest_seen.get(key).map(|entry| *entry)
    }

    /// Folds every entry of `context` into the high-water marks and returns
    /// the mark `key` had before this fold.
    pub fn observe(&self, context: &CausalContext, key: &str) -> Option<Timestamp> {
        let previous = self.latest_seen(key);
        for (seen_key, entry) in context.iter() {
            self.bump(seen_key, entry.timestamp);
        }
        previous
    }

    /// Raises the mark for `key` to `timestamp`; never lowers it.
    pub fn bump(&self, key: &str, timestamp: Timestamp) {
        self.latest_seen
            .entry(key.to_string())
            .and_modify(|seen| {
                if timestamp > *seen {
                    *seen = timestamp;
                }
            })
            .or_insert(timestamp);
    }
}
