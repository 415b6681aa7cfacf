use parking_lot::RwLock;
use std::collections::HashMap;

use crate::membership::types::ShardId;

/// Eventually-consistent key -> shard index.
///
/// Kept behind one lock rather than a concurrent map because a view change
/// replaces it wholesale and that swap must be atomic for readers.
#[derive(Default)]
pub struct Directory {
    entries: RwLock<HashMap<String, ShardId>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ShardId> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Explicit placement of one key (new key or `updateKey` broadcast).
    pub fn insert(&self, key: String, shard: ShardId) {
        self.entries.write().insert(key, shard);
    }

    pub fn replace(&self, entries: HashMap<String, ShardId>) {
        *self.entries.write() = entries;
    }

    /// Gossip merge: adds keys this node does not know yet and never
    /// overwrites an existing mapping. Returns how many keys were added.
    pub fn fill_missing(&self, incoming: HashMap<String, ShardId>) -> usize {
        let mut entries = self.entries.write();
        let mut added = 0;
        for (key, shard) in incoming {
            if let std::collections::hash_map::Entry::Vacant(slot) = entries.entry(key) {
                slot.insert(shard);
                added += 1;
            }
        }
        added
    }

    pub fn snapshot(&self) -> HashMap<String, ShardId> {
        self.entries.read().clone()
    }
}

/// Re-assigns every known key to the new shards round-robin, walking keys in
/// sorted order so every node that runs this computes the same directory.
pub fn rebuild_directory(
    old: &HashMap<String, ShardId>,
    shards: &[ShardId],
) -> HashMap<String, ShardId> {
    if shards.is_empty() {
        return HashMap::new();
    }

    let mut keys: Vec<&String> = old.keys().collect();
    keys.sort();

    keys.into_iter()
        .enumerate()
        .map(|(index, key)| (key.clone(), shards[index % shards.len()].clone()))
        .collect()
}
