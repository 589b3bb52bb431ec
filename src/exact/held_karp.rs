//! Held-Karp dynamic program for the exact TSP on a metric closure.
//!
//! State `(mask, j)`: cheapest path leaving position 0 that has visited exactly
//! the positions in `mask` and currently stands at `j`. Position `p >= 1` maps
//! to bit `p - 1`; the depot is implicit. Both tables are dense arenas of
//! `2^(n-1) * n` entries indexed by `mask * n + j`.

use crate::error::SolveError;
use crate::exact::metric_closure::MetricClosure;

/// Default cap on positions (depot + 20 homes)
pub const DEFAULT_MAX_POSITIONS: usize = 21;

/// Parents are stored as `u8`, and masks must stay well inside `usize`.
const HARD_MAX_POSITIONS: usize = 32;

const NO_PARENT: u8 = u8::MAX;

/// Closed tour over positions, `[0, ..., 0]`
#[derive(Debug, Clone, PartialEq)]
pub struct HamiltonianCycle {
    pub positions: Vec<usize>,
    pub cost: f64,
}

/// Exact bitmask DP solver
#[derive(Debug, Clone)]
pub struct HeldKarp {
    /// Largest closure (depot included) the solver will allocate tables for
    pub max_positions: usize,
}

impl HeldKarp {
    pub fn new() -> Self {
        HeldKarp {
            max_positions: DEFAULT_MAX_POSITIONS,
        }
    }

    pub fn with_limit(max_positions: usize) -> Self {
        HeldKarp {
            max_positions: max_positions.min(HARD_MAX_POSITIONS),
        }
    }

    /// Minimum-cost Hamiltonian cycle starting and ending at position 0.
    ///
    /// Ties are broken towards the lowest position, so results are
    /// reproducible for a given closure.
    pub fn solve(&self, closure: &MetricClosure) -> Result<HamiltonianCycle, SolveError> {
        let n = closure.size();
        let limit = self.max_positions.min(HARD_MAX_POSITIONS);
        if n > limit {
            return Err(SolveError::TooManyRequiredNodes { count: n, limit });
        }
        match n {
            0 => return Err(SolveError::InfeasibleTour { positions: 0 }),
            1 => {
                return Ok(HamiltonianCycle {
                    positions: vec![0, 0],
                    cost: 0.0,
                })
            }
            _ => {}
        }

        let subsets = 1usize << (n - 1);
        let full = subsets - 1;
        log::debug!("Held-Karp over {} positions: {} DP states", n, subsets * n);

        let mut cost = vec![f64::INFINITY; subsets * n];
        let mut parent = vec![NO_PARENT; subsets * n];

        for j in 1..n {
            let state = bit(j) * n + j;
            cost[state] = closure.weight(0, j);
            parent[state] = 0;
        }

        // every successor mask is numerically larger, so ascending order is topological
        for mask in 1..subsets {
            let remaining = full ^ mask;
            for j in 1..n {
                if mask & bit(j) == 0 {
                    continue;
                }
                let current = cost[mask * n + j];
                if !current.is_finite() {
                    continue;
                }
                for k in 1..n {
                    if remaining & bit(k) == 0 {
                        continue;
                    }
                    let candidate = current + closure.weight(j, k);
                    let next = (mask | bit(k)) * n + k;
                    if candidate < cost[next] {
                        cost[next] = candidate;
                        parent[next] = j as u8;
                    }
                }
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for j in 1..n {
            let total = cost[full * n + j] + closure.weight(j, 0);
            if total.is_finite() && best.map_or(true, |(_, c)| total < c) {
                best = Some((j, total));
            }
        }
        let (last, total) = best.ok_or(SolveError::InfeasibleTour { positions: n })?;

        let mut positions = Vec::with_capacity(n + 1);
        let mut mask = full;
        let mut at = last;
        while at != 0 {
            positions.push(at);
            let prev = parent[mask * n + at];
            if prev == NO_PARENT {
                return Err(SolveError::InfeasibleTour { positions: n });
            }
            mask ^= bit(at);
            at = prev as usize;
        }
        positions.push(0);
        positions.reverse();
        positions.push(0);

        Ok(HamiltonianCycle {
            positions,
            cost: total,
        })
    }
}

impl Default for HeldKarp {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bit(position: usize) -> usize {
    1 << (position - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn brute_force(closure: &MetricClosure) -> f64 {
        fn permute(closure: &MetricClosure, rest: &mut Vec<usize>, k: usize, best: &mut f64) {
            if k == rest.len() {
                let mut cycle = vec![0];
                cycle.extend(rest.iter().copied());
                cycle.push(0);
                *best = best.min(closure.cycle_cost(&cycle));
                return;
            }
            for i in k..rest.len() {
                rest.swap(k, i);
                permute(closure, rest, k + 1, best);
                rest.swap(k, i);
            }
        }

        let mut rest: Vec<usize> = (1..closure.size()).collect();
        let mut best = f64::INFINITY;
        permute(closure, &mut rest, 0, &mut best);
        best
    }

    fn random_euclidean(n: usize, seed: u64) -> MetricClosure {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        MetricClosure::from_fn(n, |i, j| {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            (dx * dx + dy * dy).sqrt()
        })
    }

    #[test]
    fn test_single_position() {
        let closure = MetricClosure::from_fn(1, |_, _| 0.0);
        let cycle = HeldKarp::new().solve(&closure).unwrap();

        assert_eq!(cycle.positions, vec![0, 0]);
        assert_eq!(cycle.cost, 0.0);
    }

    #[test]
    fn test_two_positions() {
        let closure = MetricClosure::from_fn(2, |_, _| 4.0);
        let cycle = HeldKarp::new().solve(&closure).unwrap();

        assert_eq!(cycle.positions, vec![0, 1, 0]);
        assert_eq!(cycle.cost, 8.0);
    }

    #[test]
    fn test_square_prefers_perimeter() {
        // unit square corners 0,1,2,3 in order; diagonals cost 1.5
        let closure = MetricClosure::from_fn(4, |i, j| if (i + j) % 2 == 1 { 1.0 } else { 1.5 });
        let cycle = HeldKarp::new().solve(&closure).unwrap();

        assert_eq!(cycle.cost, 4.0);
        // both orientations tie; the lowest closing position wins
        assert_eq!(cycle.positions, vec![0, 3, 2, 1, 0]);
    }

    #[test]
    fn test_matches_brute_force() {
        for n in 2..=8 {
            for seed in 0..5 {
                let closure = random_euclidean(n, seed * 31 + n as u64);
                let cycle = HeldKarp::new().solve(&closure).unwrap();

                assert_eq!(cycle.positions.len(), n + 1);
                let mut seen = cycle.positions[..n].to_vec();
                seen.sort_unstable();
                assert_eq!(seen, (0..n).collect::<Vec<_>>());
                assert!((cycle.cost - closure.cycle_cost(&cycle.positions)).abs() < 1e-9);
                assert!((cycle.cost - brute_force(&closure)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_missing_edges_are_infeasible() {
        // one missing edge still leaves 0-1-2-3-0
        let closure = MetricClosure::from_fn(4, |i, j| {
            if (i == 0 && j == 2) || (i == 2 && j == 0) {
                f64::INFINITY
            } else {
                1.0
            }
        });
        let cycle = HeldKarp::new().solve(&closure).unwrap();
        assert_eq!(cycle.cost, 4.0);

        // position 2 is isolated, so no cycle can close

        let closure = MetricClosure::from_fn(3, |i, j| if i == 2 || j == 2 { f64::INFINITY } else { 1.0 });
        assert_eq!(
            HeldKarp::new().solve(&closure),
            Err(SolveError::InfeasibleTour { positions: 3 })
        );
    }

    #[test]
    fn test_size_guard() {
        let closure = MetricClosure::from_fn(6, |_, _| 1.0);
        assert_eq!(
            HeldKarp::with_limit(5).solve(&closure),
            Err(SolveError::TooManyRequiredNodes { count: 6, limit: 5 })
        );
    }
}
