//! Projection of the base graph onto the depot and its homes.

use crate::distance::DistanceOracle;
use crate::error::SolveError;
use std::collections::HashMap;

/// Bidirectional map between graph nodes and compact DP positions.
///
/// Position 0 is always the depot; homes follow in ascending node order.
#[derive(Debug, Clone)]
pub struct RequiredIndex {
    nodes: Vec<usize>,
    positions: HashMap<usize, usize>,
}

impl RequiredIndex {
    /// Build the index for `depot` and `homes`.
    ///
    /// Homes are sorted and deduplicated, and a home equal to the depot is
    /// dropped (it is served by leaving the depot).
    pub fn new(depot: usize, homes: &[usize]) -> Self {
        let mut sorted: Vec<usize> = homes.iter().copied().filter(|&h| h != depot).collect();
        sorted.sort_unstable();
        sorted.dedup();

        if sorted.len() != homes.len() {
            log::warn!(
                "Normalized home list: {} entries given, {} distinct non-depot homes kept",
                homes.len(),
                sorted.len()
            );
        }

        let mut nodes = Vec::with_capacity(sorted.len() + 1);
        nodes.push(depot);
        nodes.extend(sorted);

        let positions = nodes.iter().enumerate().map(|(pos, &node)| (node, pos)).collect();
        RequiredIndex { nodes, positions }
    }

    #[inline]
    pub fn depot(&self) -> usize {
        self.nodes[0]
    }

    /// Number of positions, depot included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the depot occupies position 0.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn home_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Homes in position order (position 1 onward)
    pub fn homes(&self) -> &[usize] {
        &self.nodes[1..]
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn position(&self, node: usize) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Translate a sequence of positions into graph nodes.
    pub fn to_nodes(&self, positions: &[usize]) -> Vec<usize> {
        positions.iter().map(|&p| self.nodes[p]).collect()
    }
}

/// Complete weighted graph over DP positions.
///
/// Missing edges are represented by `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct MetricClosure {
    size: usize,
    weights: Vec<f64>,
}

impl MetricClosure {
    /// Weights taken from base-graph shortest distances between required nodes.
    pub fn build(oracle: &DistanceOracle, index: &RequiredIndex) -> Result<Self, SolveError> {
        let nodes = index.nodes();
        let n = nodes.len();
        let mut weights = vec![0.0; n * n];

        for i in 0..n {
            for j in i + 1..n {
                let d = oracle.try_distance(nodes[i], nodes[j])?;
                weights[i * n + j] = d;
                weights[j * n + i] = d;
            }
        }

        Ok(MetricClosure { size: n, weights })
    }

    /// Complete graph with caller-supplied weights.
    pub fn from_fn<F: Fn(usize, usize) -> f64>(size: usize, weight: F) -> Self {
        let mut weights = vec![0.0; size * size];
        for i in 0..size {
            for j in 0..size {
                if i != j {
                    weights[i * size + j] = weight(i, j);
                }
            }
        }
        MetricClosure { size, weights }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i * self.size + j]
    }

    /// Total weight of a closed sequence of positions.
    pub fn cycle_cost(&self, positions: &[usize]) -> f64 {
        positions.windows(2).map(|w| self.weight(w[0], w[1])).sum()
    }
}
