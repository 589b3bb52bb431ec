//! Heuristics module.
//!
//! Improvement steps applied on top of the exact routing tour.

pub mod pickup;

pub use pickup::{PickupPlan, PickupRefinement, RefinementConfig};
