//! Random instance generation.
//!
//! Instances are random weighted trees: node `v` hangs off a uniformly chosen
//! earlier node, so every node is reachable from the depot.

use crate::error::InstanceError;
use crate::graph::Graph;
use crate::instance::Instance;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

/// Generator for tree-shaped instances
#[derive(Debug, Clone)]
pub struct TreeInstanceGenerator {
    pub num_nodes: usize,
    /// Number of distinct homes drawn from `1..num_nodes`
    pub num_homes: usize,
    pub alpha: f64,
    /// Edge weights are drawn from `1..=max_weight`
    pub max_weight: u32,
    pub seed: u64,
}

impl TreeInstanceGenerator {
    pub fn new(num_nodes: usize, num_homes: usize, alpha: f64, seed: u64) -> Self {
        TreeInstanceGenerator {
            num_nodes,
            num_homes,
            alpha,
            max_weight: 1000,
            seed,
        }
    }

    /// Name used for generated files, e.g. `20_03` for 20 nodes at alpha 0.3
    pub fn name(&self) -> String {
        format!("{}_{:02}", self.num_nodes, (self.alpha * 10.0).round() as i64)
    }

    pub fn generate(&self) -> Result<Instance, InstanceError> {
        // homes come from 1..num_nodes, so the depot must exist and leave room
        if self.num_nodes == 0 || self.num_homes >= self.num_nodes {
            return Err(InstanceError::InvalidGenerator {
                nodes: self.num_nodes,
                homes: self.num_homes,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut graph = Graph::new(self.num_nodes);
        for v in 1..self.num_nodes {
            let parent = rng.gen_range(0..v);
            let weight = rng.gen_range(1..=self.max_weight.max(1));
            graph.add_edge(parent, v, weight as f64)?;
        }

        let candidates: Vec<usize> = (1..self.num_nodes).collect();
        let mut homes: Vec<usize> = candidates
            .choose_multiple(&mut rng, self.num_homes)
            .copied()
            .collect();
        homes.sort_unstable();

        log::debug!(
            "Generated tree instance {} ({} nodes, {} homes, seed {})",
            self.name(),
            self.num_nodes,
            homes.len(),
            self.seed
        );

        Ok(Instance::new(&self.name(), graph, homes, self.alpha))
    }
}

/// The four reference instances: 20 and 40 nodes at alpha 0.3 and 1.0
pub fn standard_suite() -> Vec<TreeInstanceGenerator> {
    vec![
        TreeInstanceGenerator::new(20, 10, 0.3, 2030),
        TreeInstanceGenerator::new(20, 10, 1.0, 2010),
        TreeInstanceGenerator::new(40, 20, 0.3, 4030),
        TreeInstanceGenerator::new(40, 20, 1.0, 4010),
    ]
}

/// Write the standard suite to `dir` as `<name>.in` files.
pub fn write_suite<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, InstanceError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for generator in standard_suite() {
        let instance = generator.generate()?;
        let path = dir.join(format!("{}.in", instance.name));
        instance.to_file(&path)?;
        log::info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
