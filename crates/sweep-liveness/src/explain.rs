//! "Why is this component kept?"
//!
//! Walks edges backward from a component, through live dependents only,
//! to the nearest entry point. Breadth-first, so the chain is a shortest
//! one; ties go to the lowest component id.

use std::collections::{HashMap, VecDeque};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use sweep_core::edge::Dependency;
use sweep_core::model::ComponentId;

use crate::classify::{Classification, Liveness};
use crate::graph::DependencyGraph;

/// One hop in an explanation chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub component: ComponentId,
    pub liveness: Liveness,
    /// The edge from the previous step to this one; `None` for the first
    /// step, which is an entry point.
    pub via: Option<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub component: ComponentId,
    pub liveness: Liveness,
    /// Entry point first, the explained component last. Empty for removable
    /// components.
    pub chain: Vec<Step>,
}

/// Explain `id`'s classification. `None` if `id` is not in the graph.
#[must_use]
pub fn explain(
    graph: &DependencyGraph,
    classification: &Classification,
    id: ComponentId,
) -> Option<Explanation> {
    let target = graph.node_index(id)?;
    let liveness = classification.get(id)?;
    let level_of = |idx: NodeIndex| {
        graph
            .component_id(idx)
            .and_then(|c| classification.get(c))
            .unwrap_or(Liveness::Removable)
    };

    let mut explanation = Explanation {
        component: id,
        liveness,
        chain: Vec::new(),
    };
    if liveness == Liveness::Removable {
        return Some(explanation);
    }

    // next_hop[n] = (successor toward target, edge n → successor)
    let mut next_hop: HashMap<NodeIndex, (NodeIndex, Dependency)> = HashMap::new();
    let mut queue = VecDeque::from([target]);
    let mut found = None;

    while let Some(node) = queue.pop_front() {
        if graph.is_entry_point(node) {
            found = Some(node);
            break;
        }
        let mut dependents: Vec<(NodeIndex, Dependency)> = graph
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.source(), *edge.weight()))
            .filter(|(source, _)| level_of(*source) > Liveness::Removable)
            .collect();
        dependents.sort_unstable_by_key(|(source, _)| graph.component_id(*source));

        for (source, dependency) in dependents {
            if source == target || next_hop.contains_key(&source) {
                continue;
            }
            next_hop.insert(source, (node, dependency));
            queue.push_back(source);
        }
    }

    let Some(mut cursor) = found else {
        return Some(explanation);
    };
    let mut via = None;
    loop {
        if let Some(component) = graph.component_id(cursor) {
            explanation.chain.push(Step {
                component,
                liveness: level_of(cursor),
                via,
            });
        }
        let Some(&(next, dependency)) = next_hop.get(&cursor) else {
            break;
        };
        via = Some(dependency);
        cursor = next;
    }
    Some(explanation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::edge::EdgeSet;
    use sweep_core::model::Kind;

    fn setup(edges: &[(u32, u32, Dependency)], entry: &[u32], count: u32) -> (DependencyGraph, Classification) {
        let mut set = EdgeSet::new();
        for id in 0..count {
            set.insert_component(ComponentId(id), Kind::new("Any"), true);
        }
        for &id in entry {
            set.mark_entry_point(ComponentId(id));
        }
        for &(a, b, dep) in edges {
            set.add_edge(ComponentId(a), ComponentId(b), dep);
        }
        let graph = DependencyGraph::from_edges(&set);
        let classification = Classification::from_graph(&graph);
        (graph, classification)
    }

    fn chain_ids(explanation: &Explanation) -> Vec<u32> {
        explanation.chain.iter().map(|s| s.component.0).collect()
    }

    #[test]
    fn chain_runs_from_entry_point_to_target() {
        let always = Dependency::always();
        let (graph, classification) = setup(&[(0, 1, always), (1, 2, always)], &[0], 3);
        let explanation = explain(&graph, &classification, ComponentId(2)).expect("known id");

        assert_eq!(chain_ids(&explanation), vec![0, 1, 2]);
        assert_eq!(explanation.chain[0].via, None);
        assert_eq!(explanation.chain[2].via, Some(always));
    }

    #[test]
    fn shortest_chain_wins() {
        let always = Dependency::always();
        let (graph, classification) = setup(
            &[(0, 1, always), (1, 2, always), (2, 3, always), (0, 3, always)],
            &[0],
            4,
        );
        let explanation = explain(&graph, &classification, ComponentId(3)).expect("known id");
        assert_eq!(chain_ids(&explanation), vec![0, 3]);
    }

    #[test]
    fn entry_points_explain_themselves() {
        let (graph, classification) = setup(&[], &[0], 1);
        let explanation = explain(&graph, &classification, ComponentId(0)).expect("known id");
        assert_eq!(chain_ids(&explanation), vec![0]);
    }

    #[test]
    fn removable_components_have_no_chain() {
        let (graph, classification) = setup(&[(1, 0, Dependency::always())], &[], 2);
        let explanation = explain(&graph, &classification, ComponentId(0)).expect("known id");
        assert_eq!(explanation.liveness, Liveness::Removable);
        assert!(explanation.chain.is_empty());
        assert!(explain(&graph, &classification, ComponentId(9)).is_none());
    }
}
