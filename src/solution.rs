//! Solution representation and checking.
//!
//! A solution is a concrete walk on the base graph plus the node where each
//! home is picked up. The checker rebuilds every cost from the instance so a
//! solution file can be verified on its own.

use crate::distance::DistanceOracle;
use crate::exact::metric_closure::RequiredIndex;
use crate::graph::Network;
use crate::instance::Instance;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Represents a solution to a pickup-tour instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// The walk as a sequence of graph nodes (starting and ending at the depot)
    pub tour: Vec<usize>,
    /// Home -> node where the home is picked up
    pub pickups: BTreeMap<usize, usize>,
    pub driving_cost: f64,
    pub walking_cost: f64,
    /// `alpha * driving_cost + walking_cost`
    pub total_cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Refinement rounds (mixed variant only)
    pub rounds: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            tour: Vec::new(),
            pickups: BTreeMap::new(),
            driving_cost: f64::INFINITY,
            walking_cost: 0.0,
            total_cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            rounds: None,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::error::InstanceError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), crate::error::InstanceError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Pickup node -> homes picked up there
    pub fn pickup_groups(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (&home, &pickup) in &self.pickups {
            groups.entry(pickup).or_default().push(home);
        }
        groups
    }

    /// Check the solution against `instance` and recompute its costs.
    ///
    /// An empty pickup map is read as "everybody is picked up at home".
    pub fn analyze(&self, instance: &Instance) -> SolutionReport {
        let graph = &instance.graph;
        let node_count = graph.node_count();
        let mut issues = Vec::new();

        match (self.tour.first(), self.tour.last()) {
            (Some(&first), Some(&last)) => {
                if first != instance.depot || last != instance.depot || self.tour.len() < 2 {
                    issues.push(SolutionIssue::WrongEndpoints {
                        first,
                        last,
                        depot: instance.depot,
                    });
                }
            }
            _ => issues.push(SolutionIssue::EmptyTour),
        }

        let mut driving_cost = 0.0;
        for &node in &self.tour {
            if node >= node_count {
                issues.push(SolutionIssue::UnknownNode(node));
            }
        }
        if issues.iter().all(|i| !matches!(i, SolutionIssue::UnknownNode(_))) {
            for leg in self.tour.windows(2) {
                let (u, v) = (leg[0], leg[1]);
                if u == v {
                    continue;
                }
                match graph.edge_weight(u, v) {
                    Some(w) => driving_cost += w,
                    None => issues.push(SolutionIssue::MissingEdge { from: u, to: v }),
                }
            }
        }

        let index = RequiredIndex::new(instance.depot, &instance.homes);
        let visited: HashSet<usize> = self.tour.iter().copied().collect();
        let oracle = DistanceOracle::dijkstra(graph);

        let mut walking_cost = 0.0;
        for &home in index.homes() {
            let pickup = if self.pickups.is_empty() {
                home
            } else {
                match self.pickups.get(&home) {
                    Some(&p) => p,
                    None => {
                        issues.push(SolutionIssue::MissingPickup(home));
                        continue;
                    }
                }
            };

            if pickup >= node_count {
                issues.push(SolutionIssue::UnknownNode(pickup));
                continue;
            }
            if pickup != home && graph.edge_weight(home, pickup).is_none() {
                issues.push(SolutionIssue::PickupTooFar { home, pickup });
            }
            if !visited.contains(&pickup) {
                issues.push(SolutionIssue::PickupNotVisited { home, pickup });
            }
            walking_cost += oracle.distance(home, pickup);
        }

        for &home in self.pickups.keys() {
            // position 0 is the depot, which is never a home
            if index.position(home).map_or(true, |p| p == 0) {
                issues.push(SolutionIssue::UnexpectedPickup(home));
            }
        }

        SolutionReport {
            valid: issues.is_empty(),
            issues,
            driving_cost,
            walking_cost,
            total_cost: instance.alpha * driving_cost + walking_cost,
        }
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Driving cost: {:.2}", self.driving_cost)?;
        writeln!(f, "  Walking cost: {:.2}", self.walking_cost)?;
        writeln!(f, "  Total cost: {:.2}", self.total_cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(rounds) = self.rounds {
            writeln!(f, "  Rounds: {}", rounds)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

/// Problems found by [`Solution::analyze`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolutionIssue {
    #[error("tour is empty")]
    EmptyTour,
    #[error("tour runs {first} -> {last}, expected to start and end at depot {depot}")]
    WrongEndpoints { first: usize, last: usize, depot: usize },
    #[error("node {0} is not in the graph")]
    UnknownNode(usize),
    #[error("tour uses missing edge {from}-{to}")]
    MissingEdge { from: usize, to: usize },
    #[error("home {0} has no pickup point")]
    MissingPickup(usize),
    #[error("home {home} is picked up at {pickup}, which is not adjacent")]
    PickupTooFar { home: usize, pickup: usize },
    #[error("pickup point {pickup} of home {home} is not on the tour")]
    PickupNotVisited { home: usize, pickup: usize },
    #[error("pickup listed for non-home node {0}")]
    UnexpectedPickup(usize),
}

/// Outcome of checking a solution
#[derive(Debug, Clone)]
pub struct SolutionReport {
    pub valid: bool,
    pub issues: Vec<SolutionIssue>,
    pub driving_cost: f64,
    pub walking_cost: f64,
    pub total_cost: f64,
}
