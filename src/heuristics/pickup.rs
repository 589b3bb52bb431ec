//! Pickup refinement for the mixed driving/walking variant.
//!
//! Starts from the exact tour over the depot and all homes, with everybody
//! picked up at home, and lets each home move its pickup point to a graph
//! neighbor when that lowers `alpha * driving + walking`. The stop cycle always
//! holds the depot plus the nodes that serve at least one home: a pickup point
//! nobody uses any more is dropped, and a new one is spliced in by cheapest
//! insertion.
//!
//! This is a bounded local search: `max_rounds` and `time_limit` cap running
//! time and carry no optimality meaning.

use crate::distance::DistanceOracle;
use crate::error::SolveError;
use crate::exact::held_karp::HeldKarp;
use crate::exact::metric_closure::{MetricClosure, RequiredIndex};
use crate::graph::Network;
use crate::tour::stop_cycle_cost;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;

/// Refinement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    /// Maximum number of passes over all homes
    pub max_rounds: usize,
    /// Minimum gain for a move to count as an improvement
    pub tolerance: f64,
    /// Also offer the home itself as a candidate once its pickup has moved
    pub include_home: bool,
    /// Re-run the exact solver over the final pickup points
    pub reoptimize: bool,
    /// Optional wall-clock cap in seconds
    pub time_limit: Option<f64>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        RefinementConfig {
            max_rounds: 2,
            tolerance: 1e-9,
            include_home: true,
            reoptimize: true,
            time_limit: None,
        }
    }
}

/// Stop cycle and pickup assignment produced by the refinement
#[derive(Debug, Clone)]
pub struct PickupPlan {
    /// Closed sequence of graph nodes where the vehicle stops, `[depot, ..., depot]`
    pub stops: Vec<usize>,
    /// Home -> node where that home is picked up
    pub pickups: BTreeMap<usize, usize>,
    pub driving_cost: f64,
    pub walking_cost: f64,
    /// `alpha * driving_cost + walking_cost`
    pub total_cost: f64,
    /// Rounds executed
    pub rounds: usize,
    /// Pickup moves accepted
    pub moves: usize,
}

#[derive(Debug, Clone, Copy)]
struct PickupMove {
    pickup: usize,
    insert_at: Option<usize>,
    total: f64,
}

/// Local search over pickup points
pub struct PickupRefinement {
    pub alpha: f64,
    pub config: RefinementConfig,
}

impl PickupRefinement {
    pub fn new(alpha: f64) -> Self {
        PickupRefinement {
            alpha,
            config: RefinementConfig::default(),
        }
    }

    pub fn with_config(alpha: f64, config: RefinementConfig) -> Self {
        PickupRefinement { alpha, config }
    }

    /// Refine the all-at-home assignment whose stop cycle is `initial_stops`.
    ///
    /// `initial_stops` must be a closed cycle over the depot and every home of
    /// `index`; `exact` is used for the optional final re-optimization.
    pub fn refine<G: Network + ?Sized>(
        &self,
        graph: &G,
        oracle: &DistanceOracle,
        index: &RequiredIndex,
        initial_stops: Vec<usize>,
        exact: &HeldKarp,
    ) -> Result<PickupPlan, SolveError> {
        let depot = index.depot();
        let homes = index.homes();

        if homes.is_empty() {
            return Ok(PickupPlan {
                stops: vec![depot, depot],
                pickups: BTreeMap::new(),
                driving_cost: 0.0,
                walking_cost: 0.0,
                total_cost: 0.0,
                rounds: 0,
                moves: 0,
            });
        }

        let start = Instant::now();
        let mut stops = initial_stops;
        let mut on_tour: HashSet<usize> = stops.iter().copied().collect();
        let mut pickups: BTreeMap<usize, usize> = homes.iter().map(|&h| (h, h)).collect();

        let mut driving = stop_cycle_cost(oracle, &stops);
        let mut walking = walking_cost(oracle, &pickups);
        let mut total = self.alpha * driving + walking;
        let initial_total = total;

        let mut rounds = 0;
        let mut moves = 0;
        let mut out_of_time = false;

        for round in 0..self.config.max_rounds {
            rounds += 1;
            let mut improved = false;

            for &home in homes {
                if self.time_exceeded(start) {
                    out_of_time = true;
                    break;
                }

                let current = pickups[&home];
                // the current pickup leaves the cycle once nobody else uses it
                let released = current != depot && pickups.values().filter(|&&p| p == current).count() == 1;
                let (base_stops, base_driving) = if released {
                    remove_stop(oracle, &stops, current, driving)
                } else {
                    (stops.clone(), driving)
                };

                let mut best: Option<PickupMove> = None;
                let mut best_total = total;

                for candidate in self.candidates(graph, home, current) {
                    let walk = walking - oracle.distance(home, current) + oracle.distance(home, candidate);
                    let (drive, insert_at) = if on_tour.contains(&candidate) {
                        (base_driving, None)
                    } else {
                        let (position, delta) = cheapest_insertion(oracle, &base_stops, candidate);
                        (base_driving + delta, Some(position))
                    };

                    let candidate_total = self.alpha * drive + walk;
                    if candidate_total + self.config.tolerance < best_total {
                        best_total = candidate_total;
                        best = Some(PickupMove {
                            pickup: candidate,
                            insert_at,
                            total: candidate_total,
                        });
                    }
                }

                if let Some(mv) = best {
                    stops = base_stops;
                    if released {
                        on_tour.remove(&current);
                    }
                    if let Some(position) = mv.insert_at {
                        stops.insert(position, mv.pickup);
                        on_tour.insert(mv.pickup);
                    }
                    pickups.insert(home, mv.pickup);
                    driving = stop_cycle_cost(oracle, &stops);
                    walking = walking_cost(oracle, &pickups);
                    total = self.alpha * driving + walking;
                    moves += 1;
                    improved = true;
                    log::debug!(
                        "Round {}: home {} now picked up at {} (total {:.2})",
                        round + 1,
                        home,
                        mv.pickup,
                        mv.total
                    );
                }
            }

            if out_of_time || !improved {
                break;
            }
        }

        if self.config.reoptimize && moves > 0 {
            if let Some((new_stops, new_driving)) = reoptimize(oracle, depot, &pickups, exact)? {
                if new_driving <= driving {
                    log::debug!("Re-optimized stop cycle: {:.2} -> {:.2}", driving, new_driving);
                    stops = new_stops;
                    driving = new_driving;
                    total = self.alpha * driving + walking;
                }
            }
        }

        log::info!(
            "Pickup refinement: {} moves in {} rounds, cost {:.2} -> {:.2}",
            moves,
            rounds,
            initial_total,
            total
        );

        Ok(PickupPlan {
            stops,
            pickups,
            driving_cost: driving,
            walking_cost: walking,
            total_cost: total,
            rounds,
            moves,
        })
    }

    /// Candidate pickup points for `home`, in evaluation order: the home
    /// itself, then neighbors by ascending id. The current pickup is skipped.
    fn candidates<G: Network + ?Sized>(&self, graph: &G, home: usize, current: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = graph.neighbors(home).iter().map(|&(n, _)| n).collect();
        neighbors.sort_unstable();
        neighbors.dedup();

        let mut candidates = Vec::with_capacity(neighbors.len() + 1);
        if self.config.include_home {
            candidates.push(home);
        }
        candidates.extend(neighbors);
        candidates.retain(|&c| c != current);
        candidates
    }

    fn time_exceeded(&self, start: Instant) -> bool {
        self.config
            .time_limit
            .map_or(false, |limit| start.elapsed().as_secs_f64() > limit)
    }
}

/// Best slot for `node` in the closed cycle `stops`.
///
/// Returns the insertion index and the cost increase
/// `d(prev, node) + d(node, next) - d(prev, next)`; the earliest slot wins ties.
pub fn cheapest_insertion(oracle: &DistanceOracle, stops: &[usize], node: usize) -> (usize, f64) {
    let mut best = (1, f64::INFINITY);
    for (i, leg) in stops.windows(2).enumerate() {
        let (prev, next) = (leg[0], leg[1]);
        let delta = oracle.distance(prev, node) + oracle.distance(node, next) - oracle.distance(prev, next);
        if delta < best.1 {
            best = (i + 1, delta);
        }
    }
    best
}

/// Drop `node` from the closed cycle `stops`, returning the shorter cycle
/// and its driving cost. The endpoints are never removed.
fn remove_stop(oracle: &DistanceOracle, stops: &[usize], node: usize, driving: f64) -> (Vec<usize>, f64) {
    let last = stops.len() - 1;
    match stops[1..last].iter().position(|&s| s == node).map(|p| p + 1) {
        Some(i) => {
            let (prev, next) = (stops[i - 1], stops[i + 1]);
            let saving = oracle.distance(prev, node) + oracle.distance(node, next) - oracle.distance(prev, next);
            let mut reduced = stops.to_vec();
            reduced.remove(i);
            (reduced, driving - saving)
        }
        None => (stops.to_vec(), driving),
    }
}

/// Sum of home-to-pickup distances
pub fn walking_cost(oracle: &DistanceOracle, pickups: &BTreeMap<usize, usize>) -> f64 {
    pickups.iter().map(|(&home, &pickup)| oracle.distance(home, pickup)).sum()
}

/// Exact cycle over the depot and the nodes that still serve somebody.
fn reoptimize(
    oracle: &DistanceOracle,
    depot: usize,
    pickups: &BTreeMap<usize, usize>,
    exact: &HeldKarp,
) -> Result<Option<(Vec<usize>, f64)>, SolveError> {
    let servers: BTreeSet<usize> = pickups.values().copied().filter(|&p| p != depot).collect();
    let servers: Vec<usize> = servers.into_iter().collect();

    let index = RequiredIndex::new(depot, &servers);
    if index.len() > exact.max_positions {
        return Ok(None);
    }
    let closure = MetricClosure::build(oracle, &index)?;
    let cycle = exact.solve(&closure)?;
    Ok(Some((index.to_nodes(&cycle.positions), cycle.cost)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::ShortestPathMethod;
    use crate::graph::Graph;

    /// Depot 0 with a cheap hub 1; homes 2, 3, 4 hang off the hub with weight 1.
    /// Driving to each home costs an extra out-and-back of 2.
    fn create_hub_graph() -> Graph {
        Graph::from_edges(5, &[(0, 1, 10.0), (1, 2, 1.0), (1, 3, 1.0), (1, 4, 1.0)]).unwrap()
    }

    fn initial_stops(oracle: &DistanceOracle, homes: &[usize]) -> (RequiredIndex, Vec<usize>) {
        let index = RequiredIndex::new(0, homes);
        let closure = MetricClosure::build(oracle, &index).unwrap();
        let cycle = HeldKarp::new().solve(&closure).unwrap();
        let stops = index.to_nodes(&cycle.positions);
        (index, stops)
    }

    #[test]
    fn test_homes_walk_to_hub_when_driving_is_expensive() {
        let graph = create_hub_graph();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::Dijkstra);
        let (index, stops) = initial_stops(&oracle, &[2, 3, 4]);

        // all-at-home: driving 0-1-2-1-3-1-4-1-0 = 26
        assert_eq!(stop_cycle_cost(&oracle, &stops), 26.0);

        let refinement = PickupRefinement::new(1.0);
        let plan = refinement.refine(&graph, &oracle, &index, stops, &HeldKarp::new()).unwrap();

        assert!(plan.pickups.values().all(|&p| p == 1));
        assert_eq!(plan.walking_cost, 3.0);
        assert_eq!(plan.driving_cost, 20.0);
        assert_eq!(plan.total_cost, 23.0);
        assert_eq!(plan.stops, vec![0, 1, 0]);
        assert!(plan.moves >= 3);
    }

    #[test]
    fn test_cheap_driving_keeps_everyone_home() {
        let graph = create_hub_graph();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::Dijkstra);
        let (index, stops) = initial_stops(&oracle, &[2, 3, 4]);

        // with alpha 0.1 saving 0.2 of driving never pays one unit of walking
        let plan = PickupRefinement::new(0.1)
            .refine(&graph, &oracle, &index, stops.clone(), &HeldKarp::new())
            .unwrap();

        assert!(plan.pickups.iter().all(|(h, p)| h == p));
        assert_eq!(plan.moves, 0);
        assert_eq!(plan.stops, stops);
        assert!((plan.total_cost - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_homes_returns_depot_loop() {
        let graph = create_hub_graph();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::Dijkstra);
        let index = RequiredIndex::new(0, &[]);

        let plan = PickupRefinement::new(0.5)
            .refine(&graph, &oracle, &index, vec![0, 0], &HeldKarp::new())
            .unwrap();

        assert_eq!(plan.stops, vec![0, 0]);
        assert!(plan.pickups.is_empty());
        assert_eq!(plan.total_cost, 0.0);
    }

    #[test]
    fn test_zero_rounds_keeps_initial_solution() {
        let graph = create_hub_graph();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::Dijkstra);
        let (index, stops) = initial_stops(&oracle, &[2, 3]);

        let config = RefinementConfig {
            max_rounds: 0,
            ..Default::default()
        };
        let plan = PickupRefinement::with_config(1.0, config)
            .refine(&graph, &oracle, &index, stops.clone(), &HeldKarp::new())
            .unwrap();

        assert_eq!(plan.stops, stops);
        assert_eq!(plan.rounds, 0);
        assert_eq!(plan.walking_cost, 0.0);
    }

    #[test]
    fn test_cheapest_insertion_picks_first_minimum() {
        let graph = Graph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]).unwrap();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::FloydWarshall);

        // node 1 lies on both legs of 0 -> 2 -> 0 at zero extra cost
        assert_eq!(cheapest_insertion(&oracle, &[0, 2, 0], 1), (1, 0.0));
        // both legs detour 2 to reach node 3
        assert_eq!(cheapest_insertion(&oracle, &[0, 2, 0], 3), (1, 2.0));
    }

    #[test]
    fn test_cheapest_insertion_unique_slot() {
        // square 0-1-2-3-0: node 3 sits on the closing leg 2 -> 0
        let graph = Graph::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]).unwrap();
        let oracle = DistanceOracle::build(&graph, ShortestPathMethod::Dijkstra);

        assert_eq!(cheapest_insertion(&oracle, &[0, 1, 2, 0], 3), (3, 0.0));
    }
}
