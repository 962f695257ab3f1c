//! Dependency graph module.
//!
//! ## Pipeline
//!
//! ```text
//! EdgeSet (sweep-core)
//!        ↓  build::DependencyGraph::from_edges()
//! DependencyGraph (DiGraph, cycles allowed)
//!        ├─ propagate::propagate()      → per-node Liveness
//!        └─ cycles::find_cycles()       → CycleReport list
//! ```
//!
//! ## Cache Invalidation
//!
//! [`DependencyGraph::content_hash`] is a BLAKE3 hash of the edge set and
//! markings. Compare it against a stored value to skip reclassification.

pub mod build;
pub mod cycles;

pub use build::DependencyGraph;
pub use cycles::{CycleReport, find_cycles};
