//! Reconfiguration Tests
//!
//! Single-node checks of view validation and migration bookkeeping. Peers are
//! addressed on ports nothing listens on, so every remote call fails fast.

#[cfg(test)]
mod tests {
    use crate::config::NodeConfig;
    use crate::error::KvsError;
    use crate::membership::service::build_view;
    use crate::membership::types::ShardId;
    use crate::node::KvsNode;
    use crate::reconfig::view_change::{RearrangeReport, broadcast_targets, validate_view};
    use crate::storage::memory::Record;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const LOCAL: &str = "127.0.0.1:2";
    const DEAD: &str = "127.0.0.1:1";

    fn node(view: &[&str], repl_factor: usize) -> Arc<KvsNode> {
        let mut config = NodeConfig::new(
            LOCAL,
            view.iter().map(|addr| addr.to_string()).collect(),
            repl_factor,
        );
        config.request_timeout = Duration::from_millis(200);
        config.broadcast_timeout = Duration::from_millis(100);
        config.convergence_delay = Duration::from_millis(10);
        KvsNode::new(config)
    }

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|addr| addr.to_string()).collect()
    }

    #[test]
    fn test_validate_view_rejects_bad_input() {
        assert!(matches!(validate_view(&[], 1), Err(KvsError::InvalidView(_))));
        assert!(matches!(
            validate_view(&addrs(&["a", "b"]), 0),
            Err(KvsError::InvalidView(_))
        ));
        assert!(matches!(
            validate_view(&addrs(&["a", "b"]), 3),
            Err(KvsError::InvalidView(_))
        ));
        assert!(validate_view(&addrs(&["a", "b"]), 2).is_ok());
    }

    #[test]
    fn test_broadcast_targets_union_without_self() {
        let old = build_view("a", addrs(&["a", "b", "c"]), 1);
        let targets = broadcast_targets(&old, &addrs(&["c", "d", "a"]), "a");
        assert_eq!(targets, addrs(&["b", "c", "d"]));
    }

    #[tokio::test]
    async fn test_view_change_rejects_invalid_factor() {
        let node = node(&[LOCAL], 1);
        let err = node.view_change(addrs(&[LOCAL]), 2).await.unwrap_err();
        assert!(matches!(err, KvsError::InvalidView(_)));
        // Nothing was installed.
        assert_eq!(node.membership.snapshot().repl_factor, 1);
    }

    #[tokio::test]
    async fn test_view_change_rebuilds_directory_round_robin() {
        let node = node(&[LOCAL], 1);
        for key in ["a", "b", "c", "d"] {
            node.directory.insert(key.to_string(), ShardId::from("shard1"));
        }

        // The dead peer cannot ack anything, so every record stays put.
        let shards = node.view_change(addrs(&[LOCAL, DEAD]), 1).await.unwrap();

        assert_eq!(shards.len(), 2);
        assert_eq!(shards[0].shard_id, ShardId::from("shard1"));
        assert_eq!(shards[0].replicas, addrs(&[LOCAL]));
        assert_eq!(shards[0].key_count, Some(0));
        assert_eq!(shards[1].replicas, addrs(&[DEAD]));
        assert_eq!(shards[1].key_count, None);

        assert_eq!(node.directory.get("a"), Some(ShardId::from("shard1")));
        assert_eq!(node.directory.get("b"), Some(ShardId::from("shard2")));
        assert_eq!(node.directory.get("c"), Some(ShardId::from("shard1")));
        assert_eq!(node.directory.get("d"), Some(ShardId::from("shard2")));
    }

    #[tokio::test]
    async fn test_rearrange_keeps_records_nobody_accepted() {
        let node = node(&[LOCAL, DEAD], 1);
        let record = |ts| Record {
            value: json!("v"),
            timestamp: ts,
        };

        node.store.write("mine", record(1));
        node.store.write("theirs", record(2));
        node.store.write("orphan", record(3));
        node.directory.insert("mine".to_string(), ShardId::from("shard1"));
        node.directory.insert("theirs".to_string(), ShardId::from("shard2"));

        let report = node.rearrange_keys().await;

        assert_eq!(
            report,
            RearrangeReport {
                migrated: 0,
                kept: 2,
                stranded: 1,
            }
        );
        assert_eq!(node.store.len(), 3);
        assert_eq!(node.store.get("theirs").unwrap().timestamp, 2);
    }

    #[test]
    fn test_apply_view_moves_own_shard() {
        let node = node(&[LOCAL], 1);
        assert_eq!(node.membership.self_shard(), Some(ShardId::from("shard1")));

        node.apply_view(addrs(&[DEAD, LOCAL]), 1);
        assert_eq!(node.membership.self_shard(), Some(ShardId::from("shard2")));

        node.apply_view(addrs(&[DEAD, "127.0.0.1:3", LOCAL]), 2);
        assert_eq!(node.membership.self_shard(), None);
    }
}
