//! Node configuration.
//!
//! Every setting can come from a command-line flag or from the environment,
//! so a node can be started either by hand or by a container runtime that
//! only sets `ADDRESS`, `VIEW` and `REPL_FACTOR`.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "sharded-kvs", about = "Sharded, replicated key-value store node")]
pub struct Args {
    /// This node's identity as seen by peers (host:port).
    #[arg(long, env = "ADDRESS")]
    pub address: String,

    /// Initial view: comma-separated list of node addresses.
    #[arg(long, env = "VIEW", default_value = "")]
    pub view: String,

    /// Number of replicas per shard.
    #[arg(long, env = "REPL_FACTOR", default_value_t = 1)]
    pub repl_factor: usize,

    /// Local socket the HTTP server binds to.
    #[arg(long, env = "BIND", default_value = "0.0.0.0:13800")]
    pub bind: SocketAddr,

    #[arg(long, env = "GOSSIP_INTERVAL_MS", default_value_t = 3000)]
    pub gossip_interval_ms: u64,

    /// Budget for calls whose answer matters, split across candidates.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 2000)]
    pub request_timeout_ms: u64,

    /// Upper bound on a fire-and-forget call's background task.
    #[arg(long, env = "BROADCAST_TIMEOUT_MS", default_value_t = 500)]
    pub broadcast_timeout_ms: u64,

    /// Time a view change waits before collecting shard key counts.
    #[arg(long, env = "CONVERGENCE_DELAY_MS", default_value_t = 1000)]
    pub convergence_delay_ms: u64,
}

/// Runtime settings shared by every subsystem of a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub address: String,
    pub view: Vec<String>,
    pub repl_factor: usize,
    pub gossip_interval: Duration,
    pub request_timeout: Duration,
    pub broadcast_timeout: Duration,
    pub convergence_delay: Duration,
}

impl NodeConfig {
    pub fn new(address: impl Into<String>, view: Vec<String>, repl_factor: usize) -> Self {
        Self {
            address: address.into(),
            view,
            repl_factor,
            ..Self::default()
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            view: Vec::new(),
            repl_factor: 1,
            gossip_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(2),
            broadcast_timeout: Duration::from_millis(500),
            convergence_delay: Duration::from_secs(1),
        }
    }
}

impl From<&Args> for NodeConfig {
    fn from(args: &Args) -> Self {
        Self {
            address: args.address.clone(),
            view: parse_view(&args.view),
            repl_factor: args.repl_factor,
            gossip_interval: Duration::from_millis(args.gossip_interval_ms),
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            broadcast_timeout: Duration::from_millis(args.broadcast_timeout_ms),
            convergence_delay: Duration::from_millis(args.convergence_delay_ms),
        }
    }
}

/// Splits a comma-separated view, dropping blanks and surrounding spaces.
pub fn parse_view(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}
