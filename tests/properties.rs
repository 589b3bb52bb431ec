use proptest::prelude::*;
use ptp_solver::exact::{HeldKarp, MetricClosure};
use ptp_solver::generator::TreeInstanceGenerator;
use ptp_solver::graph::{Graph, Network};
use ptp_solver::instance::Instance;
use ptp_solver::solver::{Solver, Variant};
use ptp_solver::tour::walk_cost;

/// Cheapest closed tour from position 0 by trying every order of the others
fn brute_force(closure: &MetricClosure) -> f64 {
    fn search(closure: &MetricClosure, last: usize, remaining: &mut Vec<usize>, cost: f64, best: &mut f64) {
        if remaining.is_empty() {
            *best = best.min(cost + closure.weight(last, 0));
            return;
        }
        for i in 0..remaining.len() {
            let next = remaining.remove(i);
            search(closure, next, remaining, cost + closure.weight(last, next), best);
            remaining.insert(i, next);
        }
    }

    let mut remaining: Vec<usize> = (1..closure.size()).collect();
    let mut best = f64::INFINITY;
    search(closure, 0, &mut remaining, 0.0, &mut best);
    best
}

fn symmetric_weights(max_size: usize) -> impl Strategy<Value = (usize, Vec<u32>)> {
    (2..=max_size).prop_flat_map(|n| (Just(n), prop::collection::vec(1u32..100, n * n)))
}

/// Connected graph with cycles and zero-weight edges: a random spanning tree
/// plus extra chords. Homes may repeat and may include the depot.
fn connected_graph() -> impl Strategy<Value = (Graph, Vec<usize>)> {
    (2usize..12)
        .prop_flat_map(|n| {
            let tree = prop::collection::vec((any::<prop::sample::Index>(), 0u32..20), n - 1);
            let chords = prop::collection::vec((0..n, 0..n, 0u32..20), 0..2 * n);
            let homes = prop::collection::vec(0..n, 0..8);
            (Just(n), tree, chords, homes)
        })
        .prop_map(|(n, tree, chords, homes)| {
            let mut graph = Graph::new(n);
            for (i, (parent, w)) in tree.into_iter().enumerate() {
                let v = i + 1;
                graph.add_edge(parent.index(v), v, w as f64).unwrap();
            }
            for (u, v, w) in chords {
                graph.add_edge(u, v, w as f64).unwrap();
            }
            (graph, homes)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn held_karp_matches_brute_force((n, raw) in symmetric_weights(8)) {
        let closure = MetricClosure::from_fn(n, |i, j| {
            if i == j { 0.0 } else { raw[i.min(j) * n + i.max(j)] as f64 }
        });

        let cycle = HeldKarp::new().solve(&closure).unwrap();

        prop_assert_eq!(cycle.positions.len(), n + 1);
        prop_assert_eq!(cycle.positions[0], 0);
        prop_assert_eq!(cycle.positions[n], 0);
        let mut seen = cycle.positions[..n].to_vec();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());

        prop_assert!((cycle.cost - brute_force(&closure)).abs() < 1e-9);
        prop_assert!((closure.cycle_cost(&cycle.positions) - cycle.cost).abs() < 1e-9);
    }

    #[test]
    fn routing_tour_is_a_closed_walk(nodes in 2usize..30, homes in 0usize..9, seed in any::<u64>()) {
        let homes = homes.min(nodes - 1);
        let instance = TreeInstanceGenerator::new(nodes, homes, 1.0, seed).generate().unwrap();

        let solution = Solver::default().solve_instance(&instance, Variant::Routing).unwrap();

        prop_assert_eq!(solution.tour.first(), Some(&instance.depot));
        prop_assert_eq!(solution.tour.last(), Some(&instance.depot));
        for home in &instance.homes {
            prop_assert!(solution.tour.contains(home));
        }
        let cost = walk_cost(&instance.graph, &solution.tour);
        prop_assert!(cost.is_some());
        prop_assert!((cost.unwrap_or(f64::NAN) - solution.driving_cost).abs() < 1e-6);
    }

    #[test]
    fn mixed_never_costs_more_than_routing(
        nodes in 2usize..30,
        homes in 0usize..9,
        alpha in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let homes = homes.min(nodes - 1);
        let instance = TreeInstanceGenerator::new(nodes, homes, alpha, seed).generate().unwrap();
        let solver = Solver::default();

        let routing = solver.solve_instance(&instance, Variant::Routing).unwrap();
        let mixed = solver.solve_instance(&instance, Variant::Mixed).unwrap();
        let report = mixed.analyze(&instance);

        prop_assert!(report.valid, "{:?}", report.issues);
        prop_assert!(mixed.total_cost <= routing.total_cost + 1e-6);
        prop_assert!((report.total_cost - mixed.total_cost).abs() < 1e-6);

        // every pickup is the home or one of its neighbors
        for (&home, &pickup) in &mixed.pickups {
            prop_assert!(pickup == home || instance.graph.edge_weight(home, pickup).is_some());
        }
    }

    #[test]
    fn mixed_never_costs_more_than_routing_on_cyclic_graphs(
        (graph, homes) in connected_graph(),
        alpha in 0.0f64..=1.0,
    ) {
        let instance = Instance::new("cyclic", graph, homes, alpha);
        let solver = Solver::default();

        let routing = solver.solve_instance(&instance, Variant::Routing).unwrap();
        prop_assert!(routing.analyze(&instance).valid);

        let mixed = solver.solve_instance(&instance, Variant::Mixed).unwrap();
        let report = mixed.analyze(&instance);

        prop_assert!(report.valid, "{:?}", report.issues);
        prop_assert!(mixed.total_cost <= routing.total_cost + 1e-6);
        prop_assert!((report.total_cost - mixed.total_cost).abs() < 1e-6);
    }
}
