use proptest::prelude::*;
use sweep_core::edge::{Dependency, DependencyFlags, EdgeSet, EdgeTags};
use sweep_core::model::{ComponentId, Kind};

fn arb_dependency() -> impl Strategy<Value = Dependency> {
    (any::<bool>(), any::<bool>(), 0u8..16).prop_map(|(target, dependent, tags)| {
        let mut flags = DependencyFlags::NONE;
        if target {
            flags |= DependencyFlags::EVEN_IF_TARGET_DISABLED;
        }
        if dependent {
            flags |= DependencyFlags::EVEN_IF_DEPENDENT_DISABLED;
        }
        let mut tag_set = EdgeTags::NONE;
        for (bit, tag) in [
            EdgeTags::NORMAL,
            EdgeTags::PARENT,
            EdgeTags::OWNS_TRANSFORM,
            EdgeTags::BONE,
        ]
        .into_iter()
        .enumerate()
        {
            if tags & (1 << bit) != 0 {
                tag_set = tag_set | tag;
            }
        }
        Dependency::new(flags, tag_set)
    })
}

fn arb_edges() -> impl Strategy<Value = Vec<(u32, u32, Dependency)>> {
    prop::collection::vec((0u32..6, 0u32..6, arb_dependency()), 0..24)
}

fn edge_set(edges: &[(u32, u32, Dependency)]) -> EdgeSet {
    let mut set = EdgeSet::new();
    for id in 0..6 {
        set.insert_component(ComponentId(id), Kind::new("Any"), true);
    }
    for (dependent, dependency, kind) in edges {
        set.add_edge(ComponentId(*dependent), ComponentId(*dependency), *kind);
    }
    set
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn merge_commutative(a in arb_dependency(), b in arb_dependency()) {
        prop_assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn merge_associative(a in arb_dependency(), b in arb_dependency(), c in arb_dependency()) {
        prop_assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
    }

    #[test]
    fn merge_idempotent(a in arb_dependency()) {
        prop_assert_eq!(a.merge(a), a);
    }

    #[test]
    fn insertion_order_does_not_matter(edges in arb_edges()) {
        let forward = edge_set(&edges);
        let mut reversed = edges.clone();
        reversed.reverse();
        prop_assert_eq!(forward, edge_set(&reversed));
    }

    #[test]
    fn duplicating_every_edge_changes_nothing(edges in arb_edges()) {
        let mut doubled = edges.clone();
        doubled.extend(edges.iter().copied());
        prop_assert_eq!(edge_set(&edges), edge_set(&doubled));
    }
}
