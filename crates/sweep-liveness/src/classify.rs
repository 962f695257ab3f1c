//! Liveness classification result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sweep_core::edge::EdgeSet;
use sweep_core::model::ComponentId;

use crate::graph::DependencyGraph;
use crate::propagate::propagate;

/// How strongly a component is needed. Ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// Can be deleted without changing observable behavior.
    Removable,
    /// Only needed while it is active; may be disabled or deleted if it
    /// never becomes active.
    RequiredWhileActive,
    /// Must be kept.
    Required,
}

impl Liveness {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Removable => "removable",
            Self::RequiredWhileActive => "required_while_active",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub required: usize,
    pub required_while_active: usize,
    pub removable: usize,
}

/// Liveness of every component of one scene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Classification {
    levels: BTreeMap<ComponentId, Liveness>,
}

impl Classification {
    /// Classify the nodes of `graph`.
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let levels = propagate(graph);
        let levels = graph
            .graph
            .node_indices()
            .filter_map(|idx| Some((graph.component_id(idx)?, levels[idx.index()])))
            .collect();
        Self { levels }
    }

    /// Classify directly from an edge set.
    #[must_use]
    pub fn from_edges(edges: &EdgeSet) -> Self {
        Self::from_graph(&DependencyGraph::from_edges(edges))
    }

    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<Liveness> {
        self.levels.get(&id).copied()
    }

    /// `(id, liveness)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, Liveness)> + '_ {
        self.levels.iter().map(|(id, level)| (*id, *level))
    }

    /// Components at exactly `level`, in ascending id order.
    pub fn at(&self, level: Liveness) -> impl Iterator<Item = ComponentId> + '_ {
        self.iter()
            .filter(move |(_, l)| *l == level)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for level in self.levels.values() {
            match level {
                Liveness::Required => summary.required += 1,
                Liveness::RequiredWhileActive => summary.required_while_active += 1,
                Liveness::Removable => summary.removable += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::edge::Dependency;
    use sweep_core::model::Kind;

    #[test]
    fn levels_are_ordered_weakest_first() {
        assert!(Liveness::Removable < Liveness::RequiredWhileActive);
        assert!(Liveness::RequiredWhileActive < Liveness::Required);
    }

    #[test]
    fn liveness_serializes_snake_case() {
        let json = serde_json::to_string(&Liveness::RequiredWhileActive).expect("serialize");
        assert_eq!(json, "\"required_while_active\"");
    }

    #[test]
    fn summary_counts_each_level() {
        let mut edges = EdgeSet::new();
        for id in 0..4 {
            edges.insert_component(ComponentId(id), Kind::new("Any"), id != 2);
        }
        edges.mark_entry_point(ComponentId(0));
        edges.add_edge(ComponentId(0), ComponentId(1), Dependency::always());
        edges.add_edge(ComponentId(0), ComponentId(2), Dependency::active().if_target_enabled());

        let classification = Classification::from_edges(&edges);
        assert_eq!(
            classification.summary(),
            Summary {
                required: 2,
                required_while_active: 1,
                removable: 1,
            }
        );
        assert_eq!(
            classification.at(Liveness::Removable).collect::<Vec<_>>(),
            vec![ComponentId(3)]
        );
    }
}
