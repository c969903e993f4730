use std::collections::BTreeSet;

use pmotifs::{randomize, GraphInstance, GraphLoader};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Simple graphs over nodes 1..=n with distinct, loop-free edges.
fn simple_graph_strategy() -> impl Strategy<Value = GraphInstance> {
    (4u64..24).prop_flat_map(|n| {
        proptest::collection::btree_set((1..=n, 1..=n), 1..(3 * n as usize))
            .prop_map(|pairs| {
                let edges: BTreeSet<(u64, u64)> = pairs
                    .into_iter()
                    .filter(|(a, b)| a != b)
                    .map(|(a, b)| (a.min(b), a.max(b)))
                    .collect();
                GraphLoader::from_edges("random", edges).expect("simple edges")
            })
            .prop_filter("needs at least one edge", |graph| graph.edge_count() > 0)
    })
}

fn node_set(graph: &GraphInstance) -> BTreeSet<u64> {
    graph.nodes().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn randomization_preserves_nodes_and_degrees(
        graph in simple_graph_strategy(),
        seed in any::<u64>(),
        rounds in 1usize..5,
    ) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let randomized = randomize(&graph, rounds, 10, &mut rng);
        prop_assert_eq!(node_set(&randomized), node_set(&graph));
        for node in graph.nodes() {
            prop_assert_eq!(randomized.degree(node), graph.degree(node), "node {}", node);
        }
        prop_assert_eq!(randomized.edge_count(), graph.edge_count());
    }

    #[test]
    fn randomization_keeps_the_graph_simple(
        graph in simple_graph_strategy(),
        seed in any::<u64>(),
    ) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let randomized = randomize(&graph, 3, 10, &mut rng);
        prop_assert!(randomized.validate().is_ok());

        let mut seen = BTreeSet::new();
        for (a, b) in randomized.edges() {
            prop_assert_ne!(a, b);
            prop_assert!(seen.insert((a.min(b), a.max(b))), "parallel edge {}-{}", a, b);
        }
    }
}
