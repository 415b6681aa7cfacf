//! Causal Module Tests
//!
//! Context merging must never hand a client an entry older than the one it
//! presented, and the tracker's high-water mark must never move backwards.

#[cfg(test)]
mod tests {
    use crate::causal::context::{CausalContext, merge_context};
    use crate::causal::tracker::CausalTracker;
    use crate::membership::types::ShardId;
    use std::collections::HashMap;

    fn shard(name: &str) -> ShardId {
        ShardId::from(name)
    }

    // ============================================================
    // CONTEXT TESTS
    // ============================================================

    #[test]
    fn test_record_keeps_newer_entry() {
        let mut ctx = CausalContext::new();
        assert!(ctx.record("foo", 10, &shard("shard1")));
        assert!(!ctx.record("foo", 5, &shard("shard2")));
        assert!(!ctx.record("foo", 10, &shard("shard2")));

        let entry = ctx.get("foo").unwrap();
        assert_eq!(entry.timestamp, 10);
        assert_eq!(entry.shard_id, shard("shard1"));
    }

    #[test]
    fn test_merge_fills_missing_and_older() {
        let mut incoming = CausalContext::new();
        incoming.record("older", 1, &shard("shard2"));
        incoming.record("newer", 100, &shard("shard2"));

        let local: HashMap<String, u64> = HashMap::from([
            ("older".to_string(), 50),
            ("newer".to_string(), 60),
            ("unseen".to_string(), 7),
        ]);

        merge_context(
            &mut incoming,
            local.iter().map(|(k, ts)| (k, *ts)),
            &shard("shard1"),
        );

        assert_eq!(incoming.timestamp("older"), Some(50));
        assert_eq!(incoming.get("older").unwrap().shard_id, shard("shard1"));
        // The client already knew something newer: untouched.
        assert_eq!(incoming.timestamp("newer"), Some(100));
        assert_eq!(incoming.get("newer").unwrap().shard_id, shard("shard2"));
        assert_eq!(incoming.timestamp("unseen"), Some(7));
    }

    #[test]
    fn test_absorb_is_pointwise_max() {
        let mut a = CausalContext::new();
        a.record("x", 3, &shard("shard1"));
        a.record("y", 9, &shard("shard1"));

        let mut b = CausalContext::new();
        b.record("x", 8, &shard("shard2"));
        b.record("y", 2, &shard("shard2"));
        b.record("z", 1, &shard("shard2"));

        a.absorb(&b);

        assert_eq!(a.timestamp("x"), Some(8));
        assert_eq!(a.timestamp("y"), Some(9));
        assert_eq!(a.timestamp("z"), Some(1));
    }

    #[test]
    fn test_context_wire_format() {
        let mut ctx = CausalContext::new();
        ctx.record("foo", 42, &shard("shard1"));

        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"foo": {"timestamp": 42, "shard-id": "shard1"}})
        );

        let parsed: CausalContext = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ctx);
    }

    // ============================================================
    // TRACKER TESTS
    // ============================================================

    #[test]
    fn test_tracker_is_monotone() {
        let tracker = CausalTracker::new();

        let mut ctx = CausalContext::new();
        ctx.record("foo", 20, &shard("shard1"));
        assert_eq!(tracker.observe(&ctx, "foo"), None);
        assert_eq!(tracker.latest_seen("foo"), Some(20));

        let mut older = CausalContext::new();
        older.record("foo", 5, &shard("shard1"));
        assert_eq!(tracker.observe(&older, "foo"), Some(20));
        assert_eq!(tracker.latest_seen("foo"), Some(20));

        tracker.bump("foo", 30);
        assert_eq!(tracker.latest_seen("foo"), Some(30));
    }

    #[test]
    fn test_tracker_folds_every_key() {
        let tracker = CausalTracker::new();

        let mut ctx = CausalContext::new();
        ctx.record("a", 1, &shard("shard1"));
        ctx.record("b", 2, &shard("shard2"));
        tracker.observe(&ctx, "a");

        assert_eq!(tracker.latest_seen("a"), Some(1));
        assert_eq!(tracker.latest_seen("b"), Some(2));
        assert_eq!(tracker.latest_seen("c"), None);
    }
}
