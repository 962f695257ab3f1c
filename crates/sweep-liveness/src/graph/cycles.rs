//! Dependency cycle diagnostics.
//!
//! Cycles are legal in a dependency graph (a skin and its bones point at
//! each other) and propagation terminates on them. They are reported for
//! inspection only.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use sweep_core::model::ComponentId;

use crate::graph::DependencyGraph;

/// One strongly connected component with more than one member, or a
/// component that depends on itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Sorted member ids.
    pub members: Vec<ComponentId>,
    /// `(dependent, dependency)` back-edges found by a DFS inside the cycle.
    /// Without them the members would be acyclic.
    pub back_edges: Vec<(ComponentId, ComponentId)>,
}

/// Find every dependency cycle, sorted by member list.
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<CycleReport> {
    let mut reports: Vec<CycleReport> = tarjan_scc(&graph.graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.graph.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut members: Vec<ComponentId> = component
                .iter()
                .filter_map(|&idx| graph.component_id(idx))
                .collect();
            members.sort_unstable();
            let back_edges = back_edges_in(graph, &component);
            CycleReport {
                members,
                back_edges,
            }
        })
        .collect();

    reports.sort_unstable_by(|a, b| a.members.cmp(&b.members));
    reports
}

/// Iterative DFS restricted to `component`, started from members in id
/// order, collecting edges that point back at the current path.
fn back_edges_in(graph: &DependencyGraph, component: &[NodeIndex]) -> Vec<(ComponentId, ComponentId)> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let mut starts = component.to_vec();
    starts.sort_unstable_by_key(|&idx| graph.component_id(idx));

    let successors = |node: NodeIndex| -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = graph
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|n| members.contains(n))
            .collect();
        next.sort_unstable_by_key(|&idx| graph.component_id(idx));
        next.dedup();
        next
    };

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut on_path: HashSet<NodeIndex> = HashSet::new();
    let mut back_edges = Vec::new();

    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        on_path.insert(start);
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = vec![(start, successors(start), 0)];

        while let Some((current, next, cursor)) = stack.last_mut() {
            let current = *current;
            let Some(&neighbor) = next.get(*cursor) else {
                on_path.remove(&current);
                stack.pop();
                continue;
            };
            *cursor += 1;

            if on_path.contains(&neighbor) {
                if let (Some(from), Some(to)) = (graph.component_id(current), graph.component_id(neighbor)) {
                    back_edges.push((from, to));
                }
            } else if visited.insert(neighbor) {
                on_path.insert(neighbor);
                stack.push((neighbor, successors(neighbor), 0));
            }
        }
    }

    back_edges.sort_unstable();
    back_edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::edge::{Dependency, EdgeSet};
    use sweep_core::model::Kind;

    fn graph(ids: &[u32], edges: &[(u32, u32)]) -> DependencyGraph {
        let mut set = EdgeSet::new();
        for &id in ids {
            set.insert_component(ComponentId(id), Kind::new("Any"), true);
        }
        for &(a, b) in edges {
            set.add_edge(ComponentId(a), ComponentId(b), Dependency::active());
        }
        DependencyGraph::from_edges(&set)
    }

    fn ids(raw: &[u32]) -> Vec<ComponentId> {
        raw.iter().copied().map(ComponentId).collect()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        assert!(find_cycles(&graph(&[1, 2, 3], &[(1, 2), (2, 3)])).is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let cycles = find_cycles(&graph(&[1], &[(1, 1)]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].members, ids(&[1]));
        assert_eq!(cycles[0].back_edges, vec![(ComponentId(1), ComponentId(1))]);
    }

    #[test]
    fn two_node_cycle_has_one_back_edge() {
        let cycles = find_cycles(&graph(&[1, 2, 3], &[(1, 2), (2, 1), (2, 3)]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].members, ids(&[1, 2]));
        assert_eq!(cycles[0].back_edges, vec![(ComponentId(2), ComponentId(1))]);
    }

    #[test]
    fn independent_cycles_are_sorted() {
        let cycles = find_cycles(&graph(
            &[1, 2, 3, 4, 5],
            &[(4, 5), (5, 4), (1, 2), (2, 3), (3, 1)],
        ));
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].members, ids(&[1, 2, 3]));
        assert_eq!(cycles[0].back_edges, vec![(ComponentId(3), ComponentId(1))]);
        assert_eq!(cycles[1].members, ids(&[4, 5]));
    }
}
