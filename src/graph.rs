//! Weighted road network.
//!
//! Nodes are dense indices `0..node_count`. Edges are undirected for routing
//! purposes: every edge is stored in both endpoint adjacency lists.

use crate::error::InstanceError;
use serde::{Deserialize, Serialize};

/// Read-only view of a weighted graph used by the solver core.
pub trait Network {
    /// Number of nodes; valid node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Neighbors of `node` with the weight of the connecting edge.
    fn neighbors(&self, node: usize) -> &[(usize, f64)];

    /// Weight of the edge `u - v`, if present.
    fn edge_weight(&self, u: usize, v: usize) -> Option<f64> {
        self.neighbors(u)
            .iter()
            .find(|&&(n, _)| n == v)
            .map(|&(_, w)| w)
    }

    fn contains(&self, node: usize) -> bool {
        node < self.node_count()
    }
}

/// Adjacency-list graph with non-negative edge weights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "AdjacencyRecord")]
pub struct Graph {
    adjacency: Vec<Vec<(usize, f64)>>,
}

/// Serialized shape of [`Graph`]; every edge is re-checked on load.
#[derive(Deserialize)]
struct AdjacencyRecord {
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl TryFrom<AdjacencyRecord> for Graph {
    type Error = InstanceError;

    fn try_from(record: AdjacencyRecord) -> Result<Self, Self::Error> {
        let mut graph = Graph::new(record.adjacency.len());
        for (u, list) in record.adjacency.into_iter().enumerate() {
            for (v, w) in list {
                graph.add_edge(u, v, w)?;
            }
        }
        Ok(graph)
    }
}

impl Graph {
    pub fn new(node_count: usize) -> Self {
        Graph {
            adjacency: vec![Vec::new(); node_count],
        }
    }

    /// Build a graph from an undirected edge list.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Result<Self, InstanceError> {
        let mut graph = Graph::new(node_count);
        for &(u, v, w) in edges {
            graph.add_edge(u, v, w)?;
        }
        Ok(graph)
    }

    /// Add the undirected edge `u - v`.
    ///
    /// When the edge already exists the lighter weight is kept. Self-loops are
    /// ignored since they never shorten a route.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<(), InstanceError> {
        let node_count = self.node_count();
        for node in [u, v] {
            if node >= node_count {
                return Err(InstanceError::UnknownNode { node, node_count });
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(InstanceError::InvalidWeight { from: u, to: v, weight });
        }
        if u == v {
            return Ok(());
        }

        self.upsert(u, v, weight);
        self.upsert(v, u, weight);
        Ok(())
    }

    fn upsert(&mut self, from: usize, to: usize, weight: f64) {
        let list = &mut self.adjacency[from];
        match list.iter_mut().find(|(n, _)| *n == to) {
            Some(entry) => entry.1 = entry.1.min(weight),
            None => list.push((to, weight)),
        }
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Iterate every undirected edge once as `(u, v, w)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, list)| {
            list.iter()
                .filter(move |&&(v, _)| u < v)
                .map(move |&(v, w)| (u, v, w))
        })
    }
}

impl Network for Graph {
    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adjacency[node]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_symmetric() {
        let graph = Graph::from_edges(3, &[(0, 1, 4.0), (1, 2, 2.5)]).unwrap();

        assert_eq!(graph.edge_weight(0, 1), Some(4.0));
        assert_eq!(graph.edge_weight(1, 0), Some(4.0));
        assert_eq!(graph.edge_weight(0, 2), None);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(1), 2);
    }

    #[test]
    fn test_parallel_edge_keeps_lighter_weight() {
        let mut graph = Graph::new(2);
        graph.add_edge(0, 1, 7.0).unwrap();
        graph.add_edge(1, 0, 3.0).unwrap();
        graph.add_edge(0, 1, 9.0).unwrap();

        assert_eq!(graph.edge_weight(0, 1), Some(3.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_rejects_bad_edges() {
        let mut graph = Graph::new(2);
        assert!(matches!(
            graph.add_edge(0, 5, 1.0),
            Err(InstanceError::UnknownNode { node: 5, node_count: 2 })
        ));
        assert!(matches!(
            graph.add_edge(0, 1, -1.0),
            Err(InstanceError::InvalidWeight { .. })
        ));
        assert!(matches!(
            graph.add_edge(0, 1, f64::NAN),
            Err(InstanceError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_json_load_checks_edges() {
        let graph = Graph::from_edges(3, &[(0, 1, 4.0), (1, 2, 0.0)]).unwrap();
        let loaded: Graph = serde_json::from_str(&serde_json::to_string(&graph).unwrap()).unwrap();
        assert_eq!(loaded.edge_weight(2, 1), Some(0.0));
        assert_eq!(loaded.edge_count(), 2);

        let negative = r#"{ "adjacency": [[[1, -2.0]], [[0, -2.0]]] }"#;
        assert!(serde_json::from_str::<Graph>(negative).is_err());
        let dangling = r#"{ "adjacency": [[[4, 1.0]]] }"#;
        assert!(serde_json::from_str::<Graph>(dangling).is_err());
    }

    #[test]
    fn test_self_loop_ignored() {
        let mut graph = Graph::new(1);
        graph.add_edge(0, 0, 1.0).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }
}
