//! Pickup-tour solver library
//!
//! Exact depot-to-depot tours over a weighted road network, with an optional
//! mixed variant where a home may walk to an adjacent pickup point.
//!
//! # Features
//!
//! - Shortest-path distance tables (Dijkstra or Floyd-Warshall) with witness paths
//! - Exact Held-Karp TSP over the metric closure of the depot and homes
//! - Pickup-point refinement trading driving cost against walking cost
//! - Instance files, a random tree generator and a batch benchmark harness
//!
//! # Example
//!
//! ```no_run
//! use ptp_solver::instance::Instance;
//! use ptp_solver::solver::{Solver, Variant};
//!
//! let instance = Instance::from_file("instance.in").unwrap();
//! let solution = Solver::default().solve_instance(&instance, Variant::Mixed).unwrap();
//!
//! println!("Solution cost: {:.2}", solution.total_cost);
//! ```

pub mod benchmark;
pub mod distance;
pub mod error;
pub mod exact;
pub mod generator;
pub mod graph;
pub mod heuristics;
pub mod instance;
pub mod solution;
pub mod solver;
pub mod tour;

pub use error::{InstanceError, SolveError};
pub use graph::{Graph, Network};
pub use instance::Instance;
pub use solution::Solution;
pub use solver::{solve_mixed, solve_routing, solve_tsp, MixedRoute, Solver, SolverConfig, Variant};
