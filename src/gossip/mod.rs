//! Gossip Module
//!
//! Periodic anti-entropy between nodes.
//!
//! Every interval, each node pushes its records and directory to its
//! shard-mates and its directory alone to everybody else. Receivers keep the
//! newer record per key and only ever add directory entries they lack, so
//! rounds can be lost, duplicated or reordered without harm.

pub mod handlers;
pub mod service;

#[cfg(test)]
mod tests;
