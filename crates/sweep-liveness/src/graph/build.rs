//! Graph construction from a built [`EdgeSet`].
//!
//! # Overview
//!
//! Every component becomes one petgraph node, whether or not it has edges,
//! so the classification covers the full component set. Edges keep their
//! direction: `A → B` means "A depends on B", and liveness flows along it.
//!
//! ## Cache Invalidation
//!
//! The graph carries a content hash (BLAKE3 of the sorted edge list plus
//! the entry-point and can-be-enabled markings). Two graphs with the same
//! hash classify identically.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use petgraph::graph::{DiGraph, NodeIndex};
use sweep_core::edge::{Dependency, EdgeSet};
use sweep_core::model::ComponentId;
use tracing::instrument;

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// An immutable directed dependency graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Nodes are component ids; edge weights are the merged dependency.
    pub graph: DiGraph<ComponentId, Dependency>,
    /// Mapping from component id to petgraph `NodeIndex`.
    pub node_map: HashMap<ComponentId, NodeIndex>,
    /// Entry points, indexed by `NodeIndex::index()`.
    pub entry_points: FixedBitSet,
    /// Components that are enabled or may become enabled at runtime.
    pub can_enable: FixedBitSet,
    /// BLAKE3 content hash used for cache invalidation.
    pub content_hash: String,
}

impl DependencyGraph {
    /// Build a [`DependencyGraph`] from an extracted edge set.
    ///
    /// Nodes are added in ascending component id order, so `NodeIndex`
    /// assignment is deterministic for a given edge set.
    #[instrument(skip_all, fields(components = edges.component_count()))]
    pub fn from_edges(edges: &EdgeSet) -> Self {
        let count = edges.component_count();
        let mut graph = DiGraph::with_capacity(count, edges.edge_count());
        let mut node_map = HashMap::with_capacity(count);
        let mut entry_points = FixedBitSet::with_capacity(count);
        let mut can_enable = FixedBitSet::with_capacity(count);

        for (id, record) in edges.records() {
            let idx = graph.add_node(id);
            node_map.insert(id, idx);
            entry_points.set(idx.index(), record.entry_point);
            can_enable.set(idx.index(), record.can_be_enabled());
        }

        for edge in edges.edges() {
            // The edge set never holds edges to unregistered components.
            let (Some(&from), Some(&to)) = (
                node_map.get(&edge.dependent),
                node_map.get(&edge.dependency),
            ) else {
                continue;
            };
            graph.add_edge(from, to, edge.kind);
        }

        let content_hash = compute_content_hash(edges);

        Self {
            graph,
            node_map,
            entry_points,
            can_enable,
            content_hash,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, id: ComponentId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }

    #[must_use]
    pub fn component_id(&self, idx: NodeIndex) -> Option<ComponentId> {
        self.graph.node_weight(idx).copied()
    }

    #[must_use]
    pub fn is_entry_point(&self, idx: NodeIndex) -> bool {
        self.entry_points.contains(idx.index())
    }

    #[must_use]
    pub fn can_be_enabled(&self, idx: NodeIndex) -> bool {
        self.can_enable.contains(idx.index())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute_content_hash(edges: &EdgeSet) -> String {
    let mut hasher = blake3::Hasher::new();
    for edge in edges.edges() {
        hasher.update(&edge.dependent.0.to_le_bytes());
        hasher.update(&edge.dependency.0.to_le_bytes());
        hasher.update(&[edge.kind.flags.bits(), edge.kind.tags.bits()]);
    }
    hasher.update(b"\xff");
    for (id, record) in edges.records() {
        let marks = u8::from(record.entry_point) | (u8::from(record.can_be_enabled()) << 1);
        hasher.update(&id.0.to_le_bytes());
        hasher.update(&[marks]);
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
