//! Cluster Membership Module
//!
//! Tracks which nodes form the cluster and which shard each one serves.
//!
//! ## Core Concepts
//! - **View**: An administrator-supplied, ordered list of node addresses.
//! - **Snapshot**: `ClusterView` bundles the view, replication factor, shard table and
//!   the local shard id into one immutable value.
//! - **Atomic swap**: `MembershipService` replaces the whole snapshot on a view change,
//!   so routing never sees a mix of old and new placement.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
