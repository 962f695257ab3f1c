#![forbid(unsafe_code)]
//! sweep-liveness library.
//!
//! Turns the edge set built by `sweep-core` into a three-way liveness
//! classification, and answers "why is this kept?" and "where are the
//! cycles?" over the same graph.
//!
//! # Conventions
//!
//! - **Errors**: nothing here fails; unknown ids read as `None`.
//! - **Logging**: Use `tracing` macros (`debug!`, `trace!`).

pub mod classify;
pub mod explain;
pub mod graph;
pub mod propagate;

use sweep_core::edge::EdgeSet;
use sweep_core::model::{ComponentId, Scene};
use sweep_core::{BuildReport, GraphBuilder};
use tracing::instrument;

pub use classify::{Classification, Liveness, Summary};
pub use explain::{Explanation, Step, explain};
pub use graph::{CycleReport, DependencyGraph, find_cycles};

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub edges: EdgeSet,
    pub report: BuildReport,
    pub graph: DependencyGraph,
    pub classification: Classification,
}

impl Analysis {
    /// Build edges for `scene` with `builder`, then classify.
    #[instrument(skip_all)]
    pub fn run(builder: &GraphBuilder<'_>, scene: &Scene) -> Self {
        let built = builder.build(scene);
        Self::from_parts(built.edges, built.report)
    }

    /// Classify an already built edge set.
    #[must_use]
    pub fn from_parts(edges: EdgeSet, report: BuildReport) -> Self {
        let graph = DependencyGraph::from_edges(&edges);
        let classification = Classification::from_graph(&graph);
        tracing::debug!(
            hash = %graph.content_hash,
            summary = ?classification.summary(),
            "classified components"
        );
        Self {
            edges,
            report,
            graph,
            classification,
        }
    }

    #[must_use]
    pub fn liveness(&self, id: ComponentId) -> Option<Liveness> {
        self.classification.get(id)
    }

    #[must_use]
    pub fn explain(&self, id: ComponentId) -> Option<Explanation> {
        explain(&self.graph, &self.classification, id)
    }

    #[must_use]
    pub fn cycles(&self) -> Vec<CycleReport> {
        find_cycles(&self.graph)
    }
}
