//! Logical write clock.
//!
//! Wall-clock nanoseconds are enough to order writes in this store: a
//! timestamp is only compared against other timestamps for the same key.

use std::time::{SystemTime, UNIX_EPOCH};

/// Logical timestamp attached to every stored value.
pub type Timestamp = u64;

/// Current time in nanoseconds since the unix epoch.
pub fn now_ns() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as Timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_non_decreasing() {
        let a = now_ns();
        let b = now_ns();
        assert!(b >= a);
        assert!(a > 0);
    }
}
