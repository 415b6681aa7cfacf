use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clock::{Timestamp, now_ns};

/// A stored value together with the logical time of the write that made it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub value: serde_json::Value,
    pub timestamp: Timestamp,
}

/// How a write changed the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// The store already held a newer version; nothing changed.
    Stale,
}

/// Records for keys owned by this node's shard.
///
/// Every read-compare-write on a key happens inside a single `DashMap` entry
/// guard, so concurrent client writes, replica writes and gossip repairs on
/// the same key cannot lose updates.
#[derive(Default)]
pub struct LocalStore {
    data: DashMap<String, Record>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stores a client write with a fresh timestamp.
    ///
    /// The timestamp is the current time, raised if needed so that it is
    /// strictly newer than both the stored version and `floor`.
    pub fn write_latest(
        &self,
        key: &str,
        value: serde_json::Value,
        floor: Timestamp,
    ) -> (WriteOutcome, Timestamp) {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let after_stored = entry.get().timestamp.saturating_add(1);
                let timestamp = now_ns().max(floor).max(after_stored);
                entry.insert(Record { value, timestamp });
                (WriteOutcome::Updated, timestamp)
            }
            Entry::Vacant(entry) => {
                let timestamp = now_ns().max(floor);
                entry.insert(Record { value, timestamp });
                (WriteOutcome::Created, timestamp)
            }
        }
    }

    /// Stores a write that already carries its version.
    ///
    /// A record older than the stored one is dropped (`Stale`); an equal one
    /// overwrites, which makes re-delivery of the same write harmless.
    pub fn write(&self, key: &str, record: Record) -> WriteOutcome {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().timestamp > record.timestamp {
                    WriteOutcome::Stale
                } else {
                    entry.insert(record);
                    WriteOutcome::Updated
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                WriteOutcome::Created
            }
        }
    }

    /// Last-write-wins merge used by gossip and repair pulls: adopts `record`
    /// only if the key is absent or strictly older. Returns whether it did.
    pub fn merge(&self, key: &str, record: Record) -> bool {
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().timestamp < record.timestamp {
                    entry.insert(record);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                true
            }
        }
    }

    /// Removes `key` only if it still holds the version `timestamp`, so a
    /// write that raced a migration is not thrown away.
    pub fn remove_if_unchanged(&self, key: &str, timestamp: Timestamp) -> bool {
        self.data
            .remove_if(key, |_, record| record.timestamp == timestamp)
            .is_some()
    }

    pub fn timestamps(&self) -> Vec<(String, Timestamp)> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().timestamp))
            .collect()
    }

    pub fn snapshot(&self) -> HashMap<String, Record> {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
