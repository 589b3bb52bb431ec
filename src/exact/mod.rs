//! Exact solvers module.
//!
//! The routing core: a metric closure over the required nodes and a
//! Held-Karp dynamic program that returns an optimal cycle over it.

pub mod held_karp;
pub mod metric_closure;

pub use held_karp::{HamiltonianCycle, HeldKarp, DEFAULT_MAX_POSITIONS};
pub use metric_closure::{MetricClosure, RequiredIndex};
