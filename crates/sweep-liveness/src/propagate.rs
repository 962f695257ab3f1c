//! Fixed-point liveness propagation.
//!
//! # Algorithm
//!
//! Every entry point starts at [`Liveness::Required`]; everything else at
//! [`Liveness::Removable`]. A worklist pops a node `d` and, for each edge
//! `d → t`, computes the level the edge can give `t` ([`edge_reach`]). If
//! that beats `t`'s current level, `t` is raised and re-enqueued.
//!
//! Levels only ever rise, and each node is enqueued at most once per level
//! (one [`FixedBitSet`] per level records it), so the loop ends after at most
//! `2 × nodes` pops, cycles included.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use sweep_core::edge::Dependency;
use tracing::instrument;

use crate::classify::Liveness;
use crate::graph::DependencyGraph;

/// Level an edge `d → t` can give `t`, given `d`'s current level.
///
/// - Definite (→ `Required`): `d` is `Required` and the edge holds whether or
///   not `d` is enabled, or `d` can be enabled; or `d` is only
///   `RequiredWhileActive` but the edge holds even while `d` is disabled.
/// - Potential (→ `RequiredWhileActive`): any other edge out of a live `d`.
/// - An edge that needs `t` enabled is at most potential when `t` can never
///   be enabled.
#[must_use]
pub fn edge_reach(
    dependent: Liveness,
    dependent_can_enable: bool,
    target_can_enable: bool,
    dependency: Dependency,
) -> Liveness {
    let holds_when_disabled = dependency.holds_even_if_dependent_disabled();
    let reach = match dependent {
        Liveness::Removable => return Liveness::Removable,
        Liveness::Required if holds_when_disabled || dependent_can_enable => Liveness::Required,
        Liveness::RequiredWhileActive if holds_when_disabled => Liveness::Required,
        Liveness::Required | Liveness::RequiredWhileActive => Liveness::RequiredWhileActive,
    };

    if !dependency.requires_target_even_if_disabled() && !target_can_enable {
        reach.min(Liveness::RequiredWhileActive)
    } else {
        reach
    }
}

/// Compute the level of every node, indexed by `NodeIndex::index()`.
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn propagate(graph: &DependencyGraph) -> Vec<Liveness> {
    let count = graph.node_count();
    let mut levels = vec![Liveness::Removable; count];
    let mut queued_active = FixedBitSet::with_capacity(count);
    let mut queued_required = FixedBitSet::with_capacity(count);
    let mut worklist: VecDeque<NodeIndex> = VecDeque::new();

    for idx in graph.entry_points.ones() {
        levels[idx] = Liveness::Required;
        queued_required.insert(idx);
        worklist.push_back(NodeIndex::new(idx));
    }

    let mut pops = 0usize;
    while let Some(node) = worklist.pop_front() {
        pops += 1;
        let level = levels[node.index()];
        let can_enable = graph.can_be_enabled(node);

        for edge in graph.graph.edges(node) {
            let target = edge.target();
            let t = target.index();
            let reach = edge_reach(level, can_enable, graph.can_be_enabled(target), *edge.weight());
            if reach <= levels[t] {
                continue;
            }
            levels[t] = reach;
            let queued = if reach == Liveness::Required {
                &mut queued_required
            } else {
                &mut queued_active
            };
            if !queued.put(t) {
                worklist.push_back(target);
            }
        }
    }

    tracing::debug!(pops, "liveness propagation reached a fixed point");
    levels
}
