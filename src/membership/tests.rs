//! Membership Module Tests
//!
//! Validates snapshot construction and the view swap.

#[cfg(test)]
mod tests {
    use crate::membership::service::{MembershipService, build_view};
    use crate::membership::types::ShardId;

    fn nodes(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("10.0.0.{}:13800", i)).collect()
    }

    // ============================================================
    // SNAPSHOT TESTS
    // ============================================================

    #[test]
    fn test_local_shard_is_resolved() {
        let view = build_view("10.0.0.3:13800", nodes(4), 2);

        assert_eq!(view.shards.len(), 2);
        assert_eq!(view.self_shard, Some(ShardId::from("shard2")));
        assert_eq!(view.shard_mates("10.0.0.3:13800"), vec!["10.0.0.4:13800"]);
    }

    #[test]
    fn test_trailing_node_has_no_shard() {
        let view = build_view("10.0.0.5:13800", nodes(5), 2);

        assert_eq!(view.shards.len(), 2);
        assert!(view.self_shard.is_none());
        assert!(view.shard_mates("10.0.0.5:13800").is_empty());
        // Still a member of the view, so it keeps receiving broadcasts.
        assert_eq!(view.other_nodes("10.0.0.5:13800").len(), 4);
    }

    #[test]
    fn test_node_outside_view() {
        let view = build_view("192.168.0.1:13800", nodes(2), 1);
        assert!(view.self_shard.is_none());
        assert_eq!(view.other_nodes("192.168.0.1:13800").len(), 2);
    }

    #[test]
    fn test_shard_lookup_helpers() {
        let view = build_view("10.0.0.1:13800", nodes(4), 2);

        let shard2 = ShardId::from("shard2");
        assert_eq!(view.replicas(&shard2), ["10.0.0.3:13800", "10.0.0.4:13800"]);
        assert_eq!(view.shard_of("10.0.0.4:13800"), Some(&shard2));
        assert!(view.replicas(&ShardId::from("shard9")).is_empty());
        assert!(view.is_local_shard(&ShardId::from("shard1")));
        assert!(!view.is_local_shard(&shard2));
    }

    // ============================================================
    // SWAP TESTS
    // ============================================================

    #[test]
    fn test_install_swaps_snapshot() {
        let service = MembershipService::new("10.0.0.2:13800", nodes(1), 1);
        let before = service.snapshot();
        assert!(before.self_shard.is_none());

        service.install(nodes(2), 1);

        let after = service.snapshot();
        assert_eq!(after.self_shard, Some(ShardId::from("shard2")));
        // Old snapshot held by an in-flight request is untouched.
        assert_eq!(before.shards.len(), 1);
        assert_eq!(after.shards.len(), 2);
    }

    #[test]
    fn test_install_is_idempotent() {
        let service = MembershipService::new("10.0.0.1:13800", nodes(2), 1);

        let first = service.install(nodes(4), 2);
        let second = service.install(nodes(4), 2);

        assert_eq!(*first, *second);
        assert_eq!(service.self_shard(), Some(ShardId::from("shard1")));
    }
}
