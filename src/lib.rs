//! Sharded Key-Value Store Library
//!
//! A cluster of identical nodes that partitions keys into shards, replicates
//! each shard across a fixed number of nodes and keeps replicas converging
//! through gossip. Clients carry a causal context between requests so a read
//! never returns something older than what the same client already saw.
//!
//! ## Architecture Modules
//! - **`membership`**: The cluster view. Splits the ordered node list into shards and
//!   swaps the whole snapshot atomically on a view change.
//! - **`storage`**: Local records with last-write-wins versions, the key-to-shard
//!   directory, shard placement and the JSON protocol.
//! - **`causal`**: Causal contexts exchanged with clients and the per-key high-water
//!   marks used to detect stale local replicas.
//! - **`routing`**: Client GET/PUT handling, forwarding to owning shards and new-key
//!   placement.
//! - **`reconfig`**: View changes and key migration between shards.
//! - **`gossip`**: Periodic anti-entropy for records and the directory.
//! - **`peer`**: Node-to-node HTTP calls with per-call timeouts and fire-and-forget
//!   broadcast.
//! - **`server`**: The route table and serve loop.

pub mod causal;
pub mod clock;
pub mod config;
pub mod error;
pub mod gossip;
pub mod membership;
pub mod node;
pub mod peer;
pub mod reconfig;
pub mod routing;
pub mod server;
pub mod storage;
