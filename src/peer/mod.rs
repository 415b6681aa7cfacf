//! Peer Communication Module
//!
//! Two call classes reach other nodes:
//! - **Answer-bearing calls** (`PeerClient`): awaited, each bounded by a slice of
//!   a request-wide budget, never retried. A failure means "that candidate is down".
//! - **Fire-and-forget broadcasts** (`Broadcaster`): spawned and forgotten.

pub mod broadcast;
pub mod client;

use std::time::Duration;

/// Floor for a per-candidate timeout slice.
pub const MIN_SLICE: Duration = Duration::from_millis(100);

/// Splits `budget` evenly across `candidates`, never below `MIN_SLICE`.
pub fn slice(budget: Duration, candidates: usize) -> Duration {
    let parts = candidates.max(1) as u32;
    (budget / parts).max(MIN_SLICE)
}
