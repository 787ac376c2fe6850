//! sling-assets — map Sling replication streams to asset keys.
//!
//! Reads a replication config, sanitizes stream names into hierarchical
//! asset keys, and assembles the asset specs an orchestrator registers.

pub mod cli;
pub mod core;
