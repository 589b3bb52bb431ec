use ptp_solver::distance::{DistanceOracle, ShortestPathMethod};
use ptp_solver::generator::TreeInstanceGenerator;
use ptp_solver::graph::Graph;
use ptp_solver::instance::Instance;
use ptp_solver::solver::{solve_mixed, solve_routing, Solver, SolverConfig, Variant};
use ptp_solver::tour::walk_cost;
use ptp_solver::SolveError;

/// Depot 0 in the middle, homes 1..=5 on spokes of weight 5
fn create_star() -> Graph {
    let edges: Vec<(usize, usize, f64)> = (1..=5).map(|leaf| (0, leaf, 5.0)).collect();
    Graph::from_edges(6, &edges).unwrap()
}

#[test]
fn test_star_routing_visits_every_spoke() {
    let graph = create_star();
    let tour = solve_routing(&graph, 0, &[1, 2, 3, 4, 5]).unwrap();

    assert_eq!(walk_cost(&graph, &tour), Some(50.0));
    assert_eq!(tour.len(), 11);
    assert_eq!(tour.iter().filter(|&&n| n == 0).count(), 6);
}

#[test]
fn test_star_mixed_depends_on_alpha() {
    let graph = create_star();
    let homes = [1, 2, 3, 4, 5];

    // dropping a spoke saves alpha * 10 of driving for 5 of walking
    let cheap = solve_mixed(&graph, 0, &homes, 0.4).unwrap();
    assert_eq!(cheap.driving_cost, 50.0);
    assert_eq!(cheap.walking_cost, 0.0);
    assert!((cheap.total_cost - 20.0).abs() < 1e-9);

    let expensive = solve_mixed(&graph, 0, &homes, 1.0).unwrap();
    assert_eq!(expensive.tour, vec![0, 0]);
    assert!(expensive.pickups.values().all(|&p| p == 0));
    assert_eq!(expensive.driving_cost, 0.0);
    assert_eq!(expensive.total_cost, 25.0);
}

#[test]
fn test_square_instance_end_to_end() {
    let instance: Instance = "0.5\n4 2\n1 3\n0 2\n1 10\n3 10\n1 1\n2 10\n2 1\n3 10\n3 0\n"
        .parse()
        .unwrap();
    let solver = Solver::default();

    let routing = solver.solve_instance(&instance, Variant::Routing).unwrap();
    assert_eq!(routing.driving_cost, 40.0);
    assert_eq!(routing.total_cost, 20.0);
    assert!(routing.analyze(&instance).valid);

    let mixed = solver.solve_instance(&instance, Variant::Mixed).unwrap();
    let report = mixed.analyze(&instance);
    assert!(report.valid, "{:?}", report.issues);
    assert!(mixed.total_cost <= routing.total_cost + 1e-9);
    assert!((report.total_cost - mixed.total_cost).abs() < 1e-9);
}

#[test]
fn test_methods_agree_on_generated_instances() {
    for seed in 0..5 {
        let instance = TreeInstanceGenerator::new(25, 7, 0.6, seed).generate().unwrap();
        let dijkstra = Solver::default().solve_instance(&instance, Variant::Mixed).unwrap();
        let floyd = Solver::new(SolverConfig {
            shortest_paths: ShortestPathMethod::FloydWarshall,
            ..Default::default()
        })
        .solve_instance(&instance, Variant::Mixed)
        .unwrap();

        assert!((dijkstra.total_cost - floyd.total_cost).abs() < 1e-6);
    }
}

#[test]
fn test_disconnected_home_is_reported() {
    let graph = Graph::from_edges(4, &[(0, 1, 1.0), (2, 3, 1.0)]).unwrap();
    let oracle = DistanceOracle::dijkstra(&graph);
    assert!(!oracle.is_reachable(0, 3));

    assert_eq!(
        solve_routing(&graph, 0, &[1, 3]),
        Err(SolveError::DisconnectedInstance { from: 0, to: 3 })
    );
}
