//! Solve pipelines and their configuration.
//!
//! Routing: distance table -> metric closure over depot and homes -> exact
//! TSP -> expansion. Mixed: the same exact tour is refined by moving pickup
//! points before expansion.

use crate::distance::{DistanceOracle, ShortestPathMethod};
use crate::error::{InstanceError, SolveError};
use crate::exact::held_karp::{HeldKarp, DEFAULT_MAX_POSITIONS};
use crate::exact::metric_closure::{MetricClosure, RequiredIndex};
use crate::graph::Network;
use crate::heuristics::pickup::{PickupRefinement, RefinementConfig};
use crate::instance::Instance;
use crate::solution::Solution;
use crate::tour::expand_tour;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

/// Problem variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Every home is driven to
    Routing,
    /// Homes may walk to a neighboring pickup point
    Mixed,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Routing => write!(f, "routing"),
            Variant::Mixed => write!(f, "mixed"),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub shortest_paths: ShortestPathMethod,
    /// Largest number of required positions (depot included) solved exactly
    pub max_required: usize,
    pub refinement: RefinementConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            shortest_paths: ShortestPathMethod::default(),
            max_required: DEFAULT_MAX_POSITIONS,
            refinement: RefinementConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Load a JSON config; missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Result of the routing variant
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Concrete walk on the base graph, `[depot, ..., depot]`
    pub tour: Vec<usize>,
    /// Order in which the required nodes are visited
    pub stops: Vec<usize>,
    pub driving_cost: f64,
}

/// Result of the mixed driving/walking variant
#[derive(Debug, Clone, PartialEq)]
pub struct MixedRoute {
    pub tour: Vec<usize>,
    pub stops: Vec<usize>,
    /// Home -> pickup node (the home itself or one of its neighbors)
    pub pickups: BTreeMap<usize, usize>,
    pub driving_cost: f64,
    pub walking_cost: f64,
    /// `alpha * driving_cost + walking_cost`
    pub total_cost: f64,
    pub rounds: usize,
}

impl MixedRoute {
    pub fn into_parts(self) -> (Vec<usize>, BTreeMap<usize, usize>) {
        (self.tour, self.pickups)
    }
}

/// Exact TSP over a metric closure, returned as graph nodes.
pub fn solve_tsp(closure: &MetricClosure, index: &RequiredIndex) -> Result<Vec<usize>, SolveError> {
    debug_assert_eq!(closure.size(), index.len());
    let cycle = HeldKarp::new().solve(closure)?;
    Ok(index.to_nodes(&cycle.positions))
}

/// Tour from `depot` through every home and back, with default settings.
pub fn solve_routing<G: Network + ?Sized>(graph: &G, depot: usize, homes: &[usize]) -> Result<Vec<usize>, SolveError> {
    Solver::default().route(graph, depot, homes).map(|route| route.tour)
}

/// Tour plus pickup assignment for the mixed variant, with default settings.
pub fn solve_mixed<G: Network + ?Sized>(
    graph: &G,
    depot: usize,
    homes: &[usize],
    alpha: f64,
) -> Result<MixedRoute, SolveError> {
    Solver::default().route_with_pickups(graph, depot, homes, alpha)
}

/// Configured entry point for both variants
#[derive(Debug, Clone, Default)]
pub struct Solver {
    pub config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver { config }
    }

    fn exact(&self) -> HeldKarp {
        HeldKarp::with_limit(self.config.max_required)
    }

    /// Validate the input and build the required index and distance table.
    fn prepare<G: Network + ?Sized>(
        &self,
        graph: &G,
        depot: usize,
        homes: &[usize],
    ) -> Result<(RequiredIndex, Option<DistanceOracle>), SolveError> {
        let node_count = graph.node_count();
        for &node in std::iter::once(&depot).chain(homes) {
            if !graph.contains(node) {
                return Err(SolveError::UnknownNode { node, node_count });
            }
        }

        let index = RequiredIndex::new(depot, homes);
        let limit = self.exact().max_positions;
        if index.len() > limit {
            return Err(SolveError::TooManyRequiredNodes {
                count: index.len(),
                limit,
            });
        }
        if index.home_count() == 0 {
            return Ok((index, None));
        }

        let oracle = DistanceOracle::build(graph, self.config.shortest_paths);
        Ok((index, Some(oracle)))
    }

    pub fn route<G: Network + ?Sized>(&self, graph: &G, depot: usize, homes: &[usize]) -> Result<Route, SolveError> {
        let (index, oracle) = self.prepare(graph, depot, homes)?;
        let Some(oracle) = oracle else {
            return Ok(Route {
                tour: vec![depot, depot],
                stops: vec![depot, depot],
                driving_cost: 0.0,
            });
        };

        let closure = MetricClosure::build(&oracle, &index)?;
        let cycle = self.exact().solve(&closure)?;
        let stops = index.to_nodes(&cycle.positions);
        let tour = expand_tour(&oracle, &stops)?;

        log::info!(
            "Routing tour over {} homes: cost {:.2}, {} nodes",
            index.home_count(),
            cycle.cost,
            tour.len()
        );

        Ok(Route {
            tour,
            stops,
            driving_cost: cycle.cost,
        })
    }

    pub fn route_with_pickups<G: Network + ?Sized>(
        &self,
        graph: &G,
        depot: usize,
        homes: &[usize],
        alpha: f64,
    ) -> Result<MixedRoute, SolveError> {
        let (index, oracle) = self.prepare(graph, depot, homes)?;
        let Some(oracle) = oracle else {
            return Ok(MixedRoute {
                tour: vec![depot, depot],
                stops: vec![depot, depot],
                pickups: BTreeMap::new(),
                driving_cost: 0.0,
                walking_cost: 0.0,
                total_cost: 0.0,
                rounds: 0,
            });
        };

        let exact = self.exact();
        let closure = MetricClosure::build(&oracle, &index)?;
        let cycle = exact.solve(&closure)?;
        let initial_stops = index.to_nodes(&cycle.positions);

        let refinement = PickupRefinement::with_config(alpha, self.config.refinement.clone());
        let plan = refinement.refine(graph, &oracle, &index, initial_stops, &exact)?;
        let tour = expand_tour(&oracle, &plan.stops)?;

        log::info!(
            "Mixed tour over {} homes (alpha {}): driving {:.2}, walking {:.2}, total {:.2}",
            index.home_count(),
            alpha,
            plan.driving_cost,
            plan.walking_cost,
            plan.total_cost
        );

        Ok(MixedRoute {
            tour,
            stops: plan.stops,
            pickups: plan.pickups,
            driving_cost: plan.driving_cost,
            walking_cost: plan.walking_cost,
            total_cost: plan.total_cost,
            rounds: plan.rounds,
        })
    }

    /// Solve `instance` and package the result as a timed [`Solution`].
    pub fn solve_instance(&self, instance: &Instance, variant: Variant) -> Result<Solution, SolveError> {
        let start = Instant::now();
        let mut solution = match variant {
            Variant::Routing => {
                let route = self.route(&instance.graph, instance.depot, &instance.homes)?;
                let pickups = RequiredIndex::new(instance.depot, &instance.homes)
                    .homes()
                    .iter()
                    .map(|&h| (h, h))
                    .collect();
                Solution {
                    tour: route.tour,
                    pickups,
                    driving_cost: route.driving_cost,
                    walking_cost: 0.0,
                    total_cost: instance.alpha * route.driving_cost,
                    algorithm: "HeldKarp".to_string(),
                    computation_time: 0.0,
                    rounds: None,
                }
            }
            Variant::Mixed => {
                let route = self.route_with_pickups(&instance.graph, instance.depot, &instance.homes, instance.alpha)?;
                Solution {
                    tour: route.tour,
                    pickups: route.pickups,
                    driving_cost: route.driving_cost,
                    walking_cost: route.walking_cost,
                    total_cost: route.total_cost,
                    algorithm: "HeldKarp+PickupRefinement".to_string(),
                    computation_time: 0.0,
                    rounds: Some(route.rounds),
                }
            }
        };
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}
