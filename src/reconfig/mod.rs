//! Reconfiguration Module
//!
//! Replaces the cluster view at runtime and moves data to match it.
//!
//! ## Protocol
//! 1. The node receiving `view-change` validates the request, installs the new view
//!    and rebuilds the directory round-robin over the new shards.
//! 2. Every node of the old and new view gets `updateView`, `updateKeyShard` and
//!    `rearrangeKeys`, in that order, without the coordinator waiting.
//! 3. Each node migrates the records it no longer owns, with their original
//!    timestamps, and deletes its copy once a new owner has stored it.
//! 4. After a fixed convergence delay the coordinator reports the new shards and
//!    their key counts.
//!
//! Requests arriving mid-change may see either view; the client's causal context
//! and gossip cover the gap.

pub mod handlers;
pub mod view_change;

#[cfg(test)]
mod tests;
