//! Storage Module
//!
//! Per-node data structures and the placement logic that decides where keys live.
//!
//! ## Core Concepts
//! - **Local store**: `LocalStore` holds `(value, timestamp)` records for keys owned by
//!   this node's shard, with last-write-wins by timestamp.
//! - **Directory**: `Directory` maps every known key to its owning shard. It is filled
//!   by broadcasts and gossip and rebuilt on a view change.
//! - **Placement**: `partitioner` splits the view into shards and chooses the least
//!   loaded shard for a new key.
//! - **Protocol**: endpoint paths and JSON bodies shared by clients and peers.

pub mod directory;
pub mod memory;
pub mod partitioner;
pub mod protocol;
