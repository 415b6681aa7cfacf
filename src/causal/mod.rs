//! Causal Versioning Module
//!
//! Every value carries the logical time of the write that produced it. Clients
//! carry a `CausalContext` (key -> newest timestamp observed) on each request;
//! nodes fold it into a `CausalTracker` high-water mark and merge their own
//! write times back into the context they return.

pub mod context;
pub mod tracker;

#[cfg(test)]
mod tests;
