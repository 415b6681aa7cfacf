//! Gossip Tests
//!
//! Exercises `apply_gossip` directly; the periodic loop is covered by the
//! cluster integration tests.

#[cfg(test)]
mod tests {
    use crate::config::NodeConfig;
    use crate::membership::types::ShardId;
    use crate::node::KvsNode;
    use crate::storage::memory::Record;
    use crate::storage::protocol::{GossipRequest, GossipResponse};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    const LOCAL: &str = "127.0.0.1:2";
    const MATE: &str = "127.0.0.1:3";
    const OTHER: &str = "127.0.0.1:4";

    fn node() -> Arc<KvsNode> {
        // shard1 = [LOCAL, MATE], shard2 = [OTHER, 127.0.0.1:5]
        KvsNode::new(NodeConfig::new(
            LOCAL,
            vec![
                LOCAL.to_string(),
                MATE.to_string(),
                OTHER.to_string(),
                "127.0.0.1:5".to_string(),
            ],
            2,
        ))
    }

    fn record(value: &str, timestamp: u64) -> Record {
        Record {
            value: json!(value),
            timestamp,
        }
    }

    fn gossip(sender: &str, shard: &str, records: Vec<(&str, Record)>) -> GossipRequest {
        GossipRequest {
            sender: sender.to_string(),
            shard_id: Some(ShardId::from(shard)),
            records: records
                .into_iter()
                .map(|(key, record)| (key.to_string(), record))
                .collect(),
            directory: HashMap::new(),
        }
    }

    #[test]
    fn test_shard_mate_records_merge_last_write_wins() {
        let node = node();
        node.store.write("kept", record("local", 10));
        node.store.write("stale", record("local", 10));

        let response = node.apply_gossip(gossip(
            MATE,
            "shard1",
            vec![
                ("kept", record("remote", 5)),
                ("stale", record("remote", 20)),
                ("new", record("remote", 1)),
            ],
        ));

        assert_eq!(response.repaired, 2);
        assert_eq!(node.store.get("kept").unwrap().value, json!("local"));
        assert_eq!(node.store.get("stale").unwrap().value, json!("remote"));
        assert_eq!(node.store.get("new").unwrap().timestamp, 1);
    }

    #[test]
    fn test_records_from_other_shard_are_ignored() {
        let node = node();
        let response = node.apply_gossip(gossip(OTHER, "shard2", vec![("x", record("v", 1))]));

        assert_eq!(response.repaired, 0);
        assert!(node.store.get("x").is_none());
    }

    #[test]
    fn test_directory_gossip_only_fills_gaps() {
        let node = node();
        node.directory.insert("a".to_string(), ShardId::from("shard1"));

        let mut request = gossip(OTHER, "shard2", vec![]);
        request.directory = HashMap::from([
            ("a".to_string(), ShardId::from("shard2")),
            ("b".to_string(), ShardId::from("shard2")),
        ]);

        let response = node.apply_gossip(request);

        assert_eq!(
            response,
            GossipResponse {
                repaired: 0,
                directory_added: 1,
            }
        );
        assert_eq!(node.directory.get("a"), Some(ShardId::from("shard1")));
        assert_eq!(node.directory.get("b"), Some(ShardId::from("shard2")));
    }

    #[test]
    fn test_repeated_gossip_is_idempotent() {
        let node = node();
        let first = node.apply_gossip(gossip(MATE, "shard1", vec![("k", record("v", 7))]));
        let second = node.apply_gossip(gossip(MATE, "shard1", vec![("k", record("v", 7))]));

        assert_eq!(first.repaired, 1);
        assert_eq!(second.repaired, 0);
        assert_eq!(node.store.len(), 1);
    }

    #[test]
    fn test_misplaced_records_stay_out_of_shard_gossip() {
        let node = node();
        node.store.write("mine", record("v", 1));
        node.store.write("loose", record("v", 2));
        node.store.write("moved", record("v", 3));
        node.directory.insert("mine".to_string(), ShardId::from("shard1"));
        node.directory.insert("moved".to_string(), ShardId::from("shard2"));

        let view = node.membership.snapshot();
        let records = node.owned_records(&view);

        assert_eq!(records.len(), 2);
        assert!(records.contains_key("mine"));
        assert!(records.contains_key("loose"));
        assert_eq!(node.misplaced_keys(), vec!["moved".to_string()]);
    }
}
