//! Expansion of abstract tours into concrete walks on the base graph.

use crate::distance::DistanceOracle;
use crate::error::SolveError;
use crate::graph::Network;

/// Replace each leg `u -> v` of `stops` with its shortest-path witness.
///
/// The first node of the tour is emitted once; every later segment skips its
/// starting node, which is already the previous segment's terminus. Legs with
/// `u == v` contribute nothing.
pub fn expand_tour(oracle: &DistanceOracle, stops: &[usize]) -> Result<Vec<usize>, SolveError> {
    let Some(&first) = stops.first() else {
        return Ok(Vec::new());
    };

    let mut tour = vec![first];
    for leg in stops.windows(2) {
        let (u, v) = (leg[0], leg[1]);
        if u == v {
            continue;
        }
        let segment = oracle.path(u, v)?;
        tour.extend_from_slice(&segment[1..]);
    }

    // a degenerate loop such as [depot, depot] keeps its closing node
    if stops.len() > 1 && tour.len() == 1 {
        tour.push(first);
    }

    Ok(tour)
}

/// Length of a closed stop sequence measured with shortest-path distances.
pub fn stop_cycle_cost(oracle: &DistanceOracle, stops: &[usize]) -> f64 {
    stops.windows(2).map(|w| oracle.distance(w[0], w[1])).sum()
}

/// Length of a concrete walk measured on base-graph edges.
///
/// Returns `None` when two consecutive distinct nodes are not adjacent.
pub fn walk_cost<G: Network + ?Sized>(graph: &G, walk: &[usize]) -> Option<f64> {
    walk.windows(2)
        .map(|w| if w[0] == w[1] { Some(0.0) } else { graph.edge_weight(w[0], w[1]) })
        .sum()
}
