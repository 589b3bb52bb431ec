//! Error types shared by the solver core and the instance layer.

use thiserror::Error;

/// Failures raised while solving an instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// A pair of nodes the tour needs has no connecting path.
    #[error("no path between node {from} and node {to}")]
    DisconnectedInstance { from: usize, to: usize },
    /// The DP could not close a Hamiltonian cycle over the required positions.
    #[error("no Hamiltonian cycle closes over {positions} required positions")]
    InfeasibleTour { positions: usize },
    #[error("{count} required positions exceed the exact solver limit of {limit}")]
    TooManyRequiredNodes { count: usize, limit: usize },
    #[error("node {node} is outside the graph ({node_count} nodes)")]
    UnknownNode { node: usize, node_count: usize },
}

/// Failures raised while reading, writing or building an instance.
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("edge {from}-{to} has weight {weight}, expected a finite non-negative number")]
    InvalidWeight { from: usize, to: usize, weight: f64 },
    #[error("node {node} is outside the graph ({node_count} nodes)")]
    UnknownNode { node: usize, node_count: usize },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cannot draw {homes} distinct homes from a graph of {nodes} nodes")]
    InvalidGenerator { nodes: usize, homes: usize },
}
