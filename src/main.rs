//! Pickup Tour Solver - Command Line Interface
//!
//! Exact driving tours over a road network, with optional walking to pickup points.

use clap::{Parser, Subcommand, ValueEnum};
use ptp_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use ptp_solver::distance::ShortestPathMethod;
use ptp_solver::generator::{write_suite, TreeInstanceGenerator};
use ptp_solver::instance::Instance;
use ptp_solver::solution::Solution;
use ptp_solver::solver::{Solver, SolverConfig};

use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ptp-solver")]
#[command(version = "1.0")]
#[command(about = "Exact depot tours with optional walking to pickup points")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Problem variant
        #[arg(short, long, value_enum, default_value = "mixed")]
        variant: Variant,

        /// Override the instance's driving/walking tradeoff
        #[arg(long)]
        alpha: Option<f64>,

        /// JSON solver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Shortest-path algorithm for the distance table
        #[arg(long, value_enum)]
        shortest_paths: Option<ShortestPaths>,

        /// Refinement rounds for the mixed variant
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(long)]
        verbose: bool,
    },

    /// Solve every instance in a directory and write a report
    Batch {
        /// Directory containing `.in` files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Variant to run; both when omitted
        #[arg(short, long, value_enum)]
        variant: Option<Variant>,

        /// JSON solver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Solve instances one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Generate random tree instances
    Generate {
        /// Output directory
        #[arg(short, long, default_value = "instances")]
        output: PathBuf,

        /// Number of nodes; the standard suite is written when omitted
        #[arg(short, long)]
        nodes: Option<usize>,

        /// Number of homes
        #[arg(long, default_value = "10")]
        homes: usize,

        #[arg(short, long, default_value = "1.0")]
        alpha: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Check a solution file against its instance
    Check {
        #[arg(short, long)]
        instance: PathBuf,

        /// Solution JSON written by `solve`
        #[arg(short, long)]
        solution: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Variant {
    /// Drive to every home
    Routing,
    /// Let homes walk to an adjacent pickup point
    Mixed,
}

impl From<Variant> for ptp_solver::solver::Variant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Routing => ptp_solver::solver::Variant::Routing,
            Variant::Mixed => ptp_solver::solver::Variant::Mixed,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum ShortestPaths {
    /// One Dijkstra run per source
    Dijkstra,
    /// Dense Floyd-Warshall
    FloydWarshall,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            variant,
            alpha,
            config,
            shortest_paths,
            max_rounds,
            output,
            verbose,
        } => {
            let mut solver_config = load_config(config.as_deref());
            if let Some(method) = shortest_paths {
                solver_config.shortest_paths = match method {
                    ShortestPaths::Dijkstra => ShortestPathMethod::Dijkstra,
                    ShortestPaths::FloydWarshall => ShortestPathMethod::FloydWarshall,
                };
            }
            if let Some(rounds) = max_rounds {
                solver_config.refinement.max_rounds = rounds;
            }
            solve_instance(&instance, variant, alpha, solver_config, output, verbose);
        }

        Commands::Batch {
            dir,
            output,
            variant,
            config,
            sequential,
        } => {
            let solver_config = load_config(config.as_deref());
            run_batch(&dir, &output, variant, solver_config, sequential);
        }

        Commands::Generate {
            output,
            nodes,
            homes,
            alpha,
            seed,
        } => {
            generate_instances(&output, nodes, homes, alpha, seed);
        }

        Commands::Analyze { instance } => {
            let instance = load_instance(&instance);
            println!("{}", instance.statistics());
        }

        Commands::Check { instance, solution } => {
            check_solution(&instance, &solution);
        }
    }
}

fn fail(context: &str, error: impl Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

fn load_config(path: Option<&Path>) -> SolverConfig {
    match path {
        Some(path) => SolverConfig::from_file(path).unwrap_or_else(|e| fail("Error loading config", e)),
        None => SolverConfig::default(),
    }
}

fn load_instance(path: &Path) -> Instance {
    Instance::from_file(path).unwrap_or_else(|e| fail("Error loading instance", e))
}

fn solve_instance(
    path: &Path,
    variant: Variant,
    alpha: Option<f64>,
    config: SolverConfig,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let mut instance = load_instance(path);
    if let Some(alpha) = alpha {
        instance.alpha = alpha;
    }

    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Solving {:?} variant...", variant);
    let solver = Solver::new(config);
    let solution = solver
        .solve_instance(&instance, variant.into())
        .unwrap_or_else(|e| fail("Solver error", e));

    println!("\n========== Results ==========");
    print!("{}", solution);

    if verbose {
        for (pickup, homes) in solution.pickup_groups() {
            println!("  Pickup {} serves {:?}", pickup, homes);
        }
    }

    if let Some(out_path) = output {
        solution
            .to_file(&out_path)
            .unwrap_or_else(|e| fail("Failed to write output", e));
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn run_batch(dir: &Path, output: &Path, variant: Option<Variant>, solver: SolverConfig, sequential: bool) {
    let instances = load_instances_from_dir(dir).unwrap_or_else(|e| fail("Error reading instances", e));
    println!("Loaded {} instances from {:?}", instances.len(), dir);

    let variants = match variant {
        Some(v) => vec![v.into()],
        None => BenchmarkConfig::default().variants,
    };
    let mut benchmark = Benchmark::new(BenchmarkConfig {
        variants,
        parallel: !sequential,
        show_progress: true,
        solver,
    });
    benchmark.run_on_instances(&instances);

    std::fs::create_dir_all(output).unwrap_or_else(|e| fail("Failed to create output directory", e));
    benchmark
        .export_to_csv(output.join("results.csv"))
        .unwrap_or_else(|e| fail("Failed to write results", e));
    benchmark
        .export_statistics_csv(output.join("statistics.csv"))
        .unwrap_or_else(|e| fail("Failed to write statistics", e));

    let report = benchmark.generate_report();
    std::fs::write(output.join("report.txt"), &report).unwrap_or_else(|e| fail("Failed to write report", e));
    println!("{}", report);
    println!("Results saved to {:?}", output);

    if !benchmark.passed() {
        std::process::exit(1);
    }
}

fn generate_instances(output: &Path, nodes: Option<usize>, homes: usize, alpha: f64, seed: u64) {
    let Some(nodes) = nodes else {
        let paths = write_suite(output).unwrap_or_else(|e| fail("Failed to generate suite", e));
        println!("Wrote {} instances to {:?}", paths.len(), output);
        return;
    };

    let instance = TreeInstanceGenerator::new(nodes, homes, alpha, seed)
        .generate()
        .unwrap_or_else(|e| fail("Failed to generate instance", e));
    let path = output.join(format!("{}.in", instance.name));
    instance
        .to_file(&path)
        .unwrap_or_else(|e| fail("Failed to write instance", e));
    println!("Instance saved to {:?}", path);
}

fn check_solution(instance_path: &Path, solution_path: &Path) {
    let instance = load_instance(instance_path);
    let solution = Solution::from_file(solution_path).unwrap_or_else(|e| fail("Error loading solution", e));
    let report = solution.analyze(&instance);

    println!("Driving cost: {:.2}", report.driving_cost);
    println!("Walking cost: {:.2}", report.walking_cost);
    println!("Total cost: {:.2}", report.total_cost);

    if report.valid {
        println!("✓ Solution is valid");
    } else {
        for issue in &report.issues {
            println!("✗ {}", issue);
        }
        std::process::exit(1);
    }
}
