use graphiti_ir::*;
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn arb_graph(max_order: usize) -> impl Strategy<Value = Graph> {
    (0..=max_order).prop_flat_map(|n| {
        prop::collection::vec(any::<bool>(), n * n.saturating_sub(1) / 2).prop_map(move |bits| {
            let mut g = Graph::with_order(n);
            let pairs = (0..n).flat_map(|a| (a + 1..n).map(move |b| (a, b)));
            for ((a, b), on) in pairs.zip(bits) {
                if on { g.add_edge(a, b).unwrap(); }
            }
            g
        })
    })
}

/// A graph together with a shuffled copy of it and the relabeling that produced the copy.
fn arb_relabeled(max_order: usize) -> impl Strategy<Value = (Graph, Graph, Permutation)> {
    arb_graph(max_order).prop_flat_map(|g| {
        let labels: Vec<usize> = (0..g.order()).collect();
        (Just(g), Just(labels).prop_shuffle()).prop_map(|(g, labels)| {
            let p = Permutation::try_from(labels).unwrap();
            let mut h = g.clone();
            h.apply_permutation(&p).unwrap();
            (g, h, p)
        })
    })
}

fn degree_partition(union: &DisjointUnion) -> Partition {
    Partition::from_colors((0..union.len()).map(|v| union.degree(v)).collect())
}

fn factorial(n: usize) -> u128 {
    (1..=n as u128).product()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_refine_is_idempotent(g in arb_graph(9)) {
        init_logging();
        let union = DisjointUnion::new([&g]);
        for strategy in [RefineStrategy::FullRescan, RefineStrategy::Worklist] {
            let stable = refine(&union, degree_partition(&union), strategy);
            let again = refine(&union, stable.clone(), strategy);
            prop_assert_eq!(again, stable);
        }
    }

    #[test]
    fn prop_strategies_agree(g in arb_graph(9), h in arb_graph(9)) {
        let union = DisjointUnion::new([&g, &h]);
        let full = refine(&union, degree_partition(&union), RefineStrategy::FullRescan);
        let worklist = refine(&union, degree_partition(&union), RefineStrategy::Worklist);
        prop_assert!(full.same_cells(&worklist));
    }

    #[test]
    fn prop_refine_ignores_color_names(g in arb_graph(9)) {
        let union = DisjointUnion::new([&g]);
        let renamed = Partition::from_colors((0..union.len()).map(|v| 100 - 3 * union.degree(v)).collect());
        let a = refine(&union, degree_partition(&union), RefineStrategy::FullRescan);
        let b = refine(&union, renamed, RefineStrategy::FullRescan);
        prop_assert!(a.same_cells(&b));
    }

    #[test]
    fn prop_stable_cells_are_equitable(g in arb_graph(9)) {
        let union = DisjointUnion::new([&g]);
        let stable = refine(&union, Partition::unit(union.len()), RefineStrategy::Worklist);
        for (_, cell) in stable.cells() {
            for (_, target) in stable.cells() {
                let hits = |v: usize| union.neighbors(v).iter().filter(|u| target.contains(u)).count();
                let first = hits(cell[0]);
                prop_assert!(cell.iter().all(|&v| hits(v) == first));
            }
        }
    }

    #[test]
    fn prop_relabeled_graphs_are_isomorphic((g, h, _) in arb_relabeled(8)) {
        init_logging();
        prop_assert!(are_isomorphic(&g, &h));
        let iso = g.get_isomorphism(&h).unwrap();
        let mut moved = g.clone();
        moved.apply_permutation(&iso).unwrap();
        prop_assert_eq!(moved, h.clone());

        let c = classify(&[g, h]);
        prop_assert!(c.are_equivalent(0, 1));
        prop_assert_eq!(c.signature(0), c.signature(1));
    }

    #[test]
    fn prop_classes_respect_isomorphism(graphs in prop::collection::vec(arb_graph(5), 1..6)) {
        let c = classify(&graphs);
        for a in 0..graphs.len() {
            for b in a + 1..graphs.len() {
                prop_assert_eq!(c.are_equivalent(a, b), count_isomorphisms(&graphs[a], &graphs[b]) > 0);
            }
        }
        let mut seen: Vec<usize> = c.classes().iter().flat_map(|class| class.members.iter().copied()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..graphs.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_order_matches_count(g in arb_graph(7)) {
        init_logging();
        let expected = count_isomorphisms(&g, &g);
        for pruning in [true, false] {
            for filter in [true, false] {
                let config = SearchConfig::default().with_orbit_pruning(pruning).with_membership_filter(filter);
                prop_assert_eq!(Search::new(config).automorphisms(&g).order(), expected);
            }
        }
    }

    #[test]
    fn prop_generators_are_members(g in arb_graph(8)) {
        let aut = automorphisms(&g);
        prop_assert!(aut.order() >= 1);
        prop_assert_eq!(factorial(g.order()) % aut.order(), 0);
        for p in aut.generators() {
            prop_assert!(!p.is_identity());
            prop_assert!(g.is_automorphism(p));
            prop_assert!(aut.contains(p));
            prop_assert!(aut.contains(&p.inverse()));
        }
        prop_assert!(aut.contains(&Permutation::identity(g.order())));
    }

    #[test]
    fn prop_membership_matches_automorphism_check((g, _, p) in arb_relabeled(7)) {
        let aut = automorphisms(&g);
        prop_assert_eq!(aut.contains(&p), g.is_automorphism(&p));
    }

    #[test]
    fn prop_relabeling_keeps_order((g, h, _) in arb_relabeled(7)) {
        prop_assert_eq!(automorphisms(&g).order(), automorphisms(&h).order());
    }
}
