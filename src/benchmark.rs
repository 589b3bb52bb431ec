//! Batch solving and experiment reporting.
//!
//! Runs the solver over a set of instances, checks every solution against
//! its instance and aggregates the results per variant.

use crate::error::InstanceError;
use crate::instance::Instance;
use crate::solver::{Solver, SolverConfig, Variant};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of running one variant on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub instance: String,
    pub variant: Variant,
    pub nodes: usize,
    pub homes: usize,
    pub alpha: f64,
    pub driving_cost: f64,
    pub walking_cost: f64,
    pub total_cost: f64,
    /// Whether the checker accepted the solution
    pub valid: bool,
    /// Computation time in seconds
    pub time: f64,
    pub rounds: Option<usize>,
    /// Solver error, if the run failed
    pub error: Option<String>,
}

/// Aggregated statistics for a variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStatistics {
    pub variant: Variant,
    pub num_instances: usize,
    pub num_valid: usize,
    pub avg_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub std_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Variants solved on every instance
    pub variants: Vec<Variant>,
    /// Solve instances on the rayon pool
    pub parallel: bool,
    pub show_progress: bool,
    pub solver: SolverConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            variants: vec![Variant::Routing, Variant::Mixed],
            parallel: true,
            show_progress: true,
            solver: SolverConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    }

    /// Run every configured variant on one instance
    fn run_instance(solver: &Solver, variants: &[Variant], instance: &Instance) -> Vec<RunResult> {
        log::info!("Running benchmark on instance: {}", instance.name);

        variants
            .iter()
            .map(|&variant| {
                let mut result = RunResult {
                    instance: instance.name.clone(),
                    variant,
                    nodes: instance.node_count(),
                    homes: instance.homes.len(),
                    alpha: instance.alpha,
                    driving_cost: f64::NAN,
                    walking_cost: f64::NAN,
                    total_cost: f64::NAN,
                    valid: false,
                    time: 0.0,
                    rounds: None,
                    error: None,
                };

                match solver.solve_instance(instance, variant) {
                    Ok(solution) => {
                        let report = solution.analyze(instance);
                        for issue in &report.issues {
                            log::warn!("{} ({}): {}", instance.name, variant, issue);
                        }
                        result.driving_cost = solution.driving_cost;
                        result.walking_cost = solution.walking_cost;
                        result.total_cost = solution.total_cost;
                        result.valid = report.valid;
                        result.time = solution.computation_time;
                        result.rounds = solution.rounds;
                    }
                    Err(e) => {
                        log::error!("{} ({}): {}", instance.name, variant, e);
                        result.error = Some(e.to_string());
                    }
                }
                result
            })
            .collect()
    }

    /// Run the benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[Instance]) {
        let solver = Solver::new(self.config.solver.clone());
        let variants = self.config.variants.clone();
        let bar = self.progress_bar(instances.len());

        let mut results: Vec<RunResult> = if self.config.parallel {
            instances
                .par_iter()
                .flat_map_iter(|instance| {
                    let results = Self::run_instance(&solver, &variants, instance);
                    bar.inc(1);
                    results
                })
                .collect()
        } else {
            instances
                .iter()
                .flat_map(|instance| {
                    bar.set_message(instance.name.clone());
                    let results = Self::run_instance(&solver, &variants, instance);
                    bar.inc(1);
                    results
                })
                .collect()
        };
        bar.finish_and_clear();

        self.results.append(&mut results);
    }

    /// Compute statistics for each variant over its valid runs
    pub fn compute_statistics(&self) -> Vec<VariantStatistics> {
        let mut by_variant: BTreeMap<String, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            by_variant.entry(result.variant.to_string()).or_default().push(result);
        }

        let mut statistics = Vec::new();
        for results in by_variant.values() {
            let valid: Vec<&&RunResult> = results.iter().filter(|r| r.valid).collect();
            if valid.is_empty() {
                continue;
            }

            let costs: Vec<f64> = valid.iter().map(|r| r.total_cost).collect();
            let times: Vec<f64> = valid.iter().map(|r| r.time).collect();
            let std_cost = if costs.len() > 1 {
                costs.iter().std_dev()
            } else {
                0.0
            };

            statistics.push(VariantStatistics {
                variant: results[0].variant,
                num_instances: results.len(),
                num_valid: valid.len(),
                avg_cost: costs.iter().mean(),
                best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                std_cost,
                avg_time: times.iter().mean(),
                total_time: times.iter().sum(),
            });
        }

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), InstanceError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result).map_err(std::io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), InstanceError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat).map_err(std::io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Pickup Tour Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        report.push_str("Variant Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<12} {:>10} {:>12} {:>12} {:>12} {:>10}\n",
            "Variant", "Valid", "Avg Cost", "Best Cost", "Std Cost", "Avg Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<12} {:>10} {:>12.2} {:>12.2} {:>12.2} {:>10.4}\n",
                stat.variant.to_string(),
                format!("{}/{}", stat.num_valid, stat.num_instances),
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        report.push_str("\nRuns:\n");
        for result in &self.results {
            let status = if result.valid { "✓ PASS" } else { "✗ FAIL" };
            match &result.error {
                Some(error) => report.push_str(&format!(
                    "  {} {} ({}): {}\n",
                    status, result.instance, result.variant, error
                )),
                None => report.push_str(&format!(
                    "  {} {} ({}): driving {:.2}, walking {:.2}, total {:.2}\n",
                    status, result.instance, result.variant, result.driving_cost, result.walking_cost, result.total_cost
                )),
            }
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// True when every run produced a valid solution
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.valid)
    }
}

/// Load every `*.in` instance in a directory, sorted by name.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>, InstanceError> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "in").unwrap_or(false) {
            match Instance::from_file(&path) {
                Ok(instance) => instances.push(instance),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    instances.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(instances)
}
