//! All-pairs shortest paths over the base graph.
//!
//! The oracle keeps a dense row-major distance table and a predecessor table:
//! `pred[s][v]` is the node before `v` on the chosen shortest path from `s`.
//! Witness paths are rebuilt on demand instead of being stored per pair.

use crate::error::SolveError;
use crate::graph::Network;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const NO_NODE: usize = usize::MAX;

/// Algorithm used to fill the distance table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShortestPathMethod {
    /// One Dijkstra run per source node (better on sparse graphs)
    #[default]
    Dijkstra,
    /// Floyd-Warshall triple loop
    FloydWarshall,
}

/// Shortest-path distances and witnesses for one solve.
#[derive(Debug, Clone)]
pub struct DistanceOracle {
    size: usize,
    dist: Vec<f64>,
    pred: Vec<usize>,
}

impl DistanceOracle {
    pub fn build<G: Network + ?Sized>(graph: &G, method: ShortestPathMethod) -> Self {
        let oracle = match method {
            ShortestPathMethod::Dijkstra => Self::dijkstra(graph),
            ShortestPathMethod::FloydWarshall => Self::floyd_warshall(graph),
        };
        log::debug!("Distance table built for {} nodes ({:?})", oracle.size, method);
        oracle
    }

    fn empty(size: usize) -> Self {
        DistanceOracle {
            size,
            dist: vec![f64::INFINITY; size * size],
            pred: vec![NO_NODE; size * size],
        }
    }

    /// Repeated single-source Dijkstra
    pub fn dijkstra<G: Network + ?Sized>(graph: &G) -> Self {
        let n = graph.node_count();
        let mut oracle = Self::empty(n);
        let mut heap = BinaryHeap::new();

        for source in 0..n {
            let row = source * n;
            oracle.dist[row + source] = 0.0;
            oracle.pred[row + source] = source;
            heap.push(Reverse((OrderedFloat(0.0), source)));

            while let Some(Reverse((OrderedFloat(d), u))) = heap.pop() {
                if d > oracle.dist[row + u] {
                    continue; // stale entry
                }
                for &(v, w) in graph.neighbors(u) {
                    let candidate = d + w;
                    if candidate < oracle.dist[row + v] {
                        oracle.dist[row + v] = candidate;
                        oracle.pred[row + v] = u;
                        heap.push(Reverse((OrderedFloat(candidate), v)));
                    }
                }
            }
        }

        oracle
    }

    /// Floyd-Warshall with predecessor tracking
    pub fn floyd_warshall<G: Network + ?Sized>(graph: &G) -> Self {
        let n = graph.node_count();
        let mut oracle = Self::empty(n);

        for u in 0..n {
            oracle.dist[u * n + u] = 0.0;
            oracle.pred[u * n + u] = u;
            for &(v, w) in graph.neighbors(u) {
                if w < oracle.dist[u * n + v] {
                    oracle.dist[u * n + v] = w;
                    oracle.pred[u * n + v] = u;
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                let dik = oracle.dist[i * n + k];
                if !dik.is_finite() {
                    continue;
                }
                for j in 0..n {
                    let candidate = dik + oracle.dist[k * n + j];
                    if candidate < oracle.dist[i * n + j] {
                        oracle.dist[i * n + j] = candidate;
                        oracle.pred[i * n + j] = oracle.pred[k * n + j];
                    }
                }
            }
        }

        oracle
    }

    /// Number of nodes covered by the table
    pub fn size(&self) -> usize {
        self.size
    }

    /// Shortest distance, `f64::INFINITY` when `v` is unreachable from `u`.
    #[inline]
    pub fn distance(&self, u: usize, v: usize) -> f64 {
        self.dist[u * self.size + v]
    }

    pub fn is_reachable(&self, u: usize, v: usize) -> bool {
        self.distance(u, v).is_finite()
    }

    /// Shortest distance, failing on unknown nodes or disconnected pairs.
    pub fn try_distance(&self, u: usize, v: usize) -> Result<f64, SolveError> {
        self.check_node(u)?;
        self.check_node(v)?;
        let d = self.distance(u, v);
        if d.is_finite() {
            Ok(d)
        } else {
            Err(SolveError::DisconnectedInstance { from: u, to: v })
        }
    }

    /// Concrete shortest path from `u` to `v`, both endpoints included.
    pub fn path(&self, u: usize, v: usize) -> Result<Vec<usize>, SolveError> {
        self.try_distance(u, v)?;

        let row = u * self.size;
        let mut path = vec![v];
        let mut current = v;
        while current != u {
            current = self.pred[row + current];
            // a broken chain would mean the tables disagree
            if current == NO_NODE || path.len() > self.size {
                return Err(SolveError::DisconnectedInstance { from: u, to: v });
            }
            path.push(current);
        }
        path.reverse();
        Ok(path)
    }

    fn check_node(&self, node: usize) -> Result<(), SolveError> {
        if node < self.size {
            Ok(())
        } else {
            Err(SolveError::UnknownNode { node, node_count: self.size })
        }
    }
}
