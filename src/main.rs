//! Restock Optimizer - Command Line Interface
//!
//! Loads a product catalog from CSV and chooses order quantities with a
//! genetic algorithm, ant colony optimization, or both.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use restock_optimizer::benchmark::{Benchmark, BenchmarkConfig};
use restock_optimizer::comparison::Comparison;
use restock_optimizer::heuristics::{
    ACOConfig, AntColonyOptimization, GAConfig, GeneticAlgorithm, SearchContext, SearchStrategy,
};
use restock_optimizer::loader::{load_products_from_path, ColumnMapping};
use restock_optimizer::visualization::Visualizer;
use restock_optimizer::{Limits, OptimizationResult, Problem};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "restock-optimizer")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Chooses product order quantities under budget, shelf and demand limits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize order quantities for a catalog
    Solve {
        #[command(flatten)]
        input: InputArgs,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "both")]
        algorithm: Algorithm,

        /// Random seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Bits per product in the GA encoding (default: computed from demand)
        #[arg(long)]
        bits: Option<u32>,

        /// GA population size
        #[arg(long)]
        population: Option<usize>,

        /// GA generations
        #[arg(long)]
        generations: Option<usize>,

        /// Number of ants
        #[arg(long)]
        ants: Option<usize>,

        /// ACO iterations
        #[arg(long)]
        iterations: Option<usize>,

        /// ACO iterations without improvement before stopping (0 disables)
        #[arg(long)]
        patience: Option<usize>,

        /// Score candidates on all cores
        #[arg(long)]
        parallel: bool,

        /// Write the result(s) as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for SVG charts
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Hide the progress bar
        #[arg(long)]
        quiet: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run both algorithms over several seeds
    Benchmark {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first run
        #[arg(long, default_value = "0")]
        seed_base: u64,

        /// Run sequentially
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze a catalog
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Catalog, limits and column options shared by every subcommand
#[derive(Args)]
struct InputArgs {
    /// Product CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// JSON file with `limits`, `columns`, `ga` and `aco` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    production_budget: Option<f64>,

    #[arg(long)]
    marketing_budget: Option<f64>,

    #[arg(long)]
    logistics_budget: Option<f64>,

    #[arg(long)]
    shelf_capacity: Option<f64>,

    /// Discount applied to the oldest, most stocked product
    #[arg(long)]
    discount_base: Option<f64>,

    /// Column overrides as FIELD=HEADER (e.g. demand=Forecast)
    #[arg(long = "column", value_name = "FIELD=HEADER")]
    columns: Vec<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Genetic Algorithm
    Ga,
    /// Ant Colony Optimization
    Aco,
    /// Both, followed by a comparison
    Both,
}

/// Contents of the `--config` file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    limits: Option<Limits>,
    columns: ColumnMapping,
    ga: GAConfig,
    aco: ACOConfig,
    /// `ga.bits_per_product` was present in the file
    #[serde(skip)]
    bits_from_file: bool,
}

impl FileConfig {
    fn from_json(text: &str) -> CliResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let bits_from_file = value.pointer("/ga/bits_per_product").is_some();
        let mut config: FileConfig = serde_json::from_value(value)?;
        config.bits_from_file = bits_from_file;
        Ok(config)
    }

    fn load(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
                Self::from_json(&text)
            }
            None => Ok(FileConfig::default()),
        }
    }
}

/// A loaded problem plus the algorithm settings from the config file
struct Session {
    problem: Problem,
    ga: GAConfig,
    aco: ACOConfig,
    bits_from_file: bool,
}

impl InputArgs {
    fn limits(&self, base: Option<Limits>) -> CliResult<Limits> {
        let pick = |flag: Option<f64>, from_file: Option<f64>, name: &str| -> CliResult<f64> {
            flag.or(from_file)
                .ok_or_else(|| format!("missing limit `{}` (pass --{} or set it in --config)", name, name.replace('_', "-")).into())
        };

        Ok(Limits {
            production_budget: pick(self.production_budget, base.map(|l| l.production_budget), "production_budget")?,
            marketing_budget: pick(self.marketing_budget, base.map(|l| l.marketing_budget), "marketing_budget")?,
            logistics_budget: pick(self.logistics_budget, base.map(|l| l.logistics_budget), "logistics_budget")?,
            shelf_capacity: pick(self.shelf_capacity, base.map(|l| l.shelf_capacity), "shelf_capacity")?,
            discount_base: self
                .discount_base
                .or(base.map(|l| l.discount_base))
                .unwrap_or_default(),
        })
    }

    fn column_mapping(&self, mut mapping: ColumnMapping) -> CliResult<ColumnMapping> {
        for entry in &self.columns {
            let (field, header) = entry
                .split_once('=')
                .ok_or_else(|| format!("column override `{}` is not FIELD=HEADER", entry))?;
            let slot = match field.trim() {
                "name" => &mut mapping.name,
                "price" => &mut mapping.price,
                "production_cost" => &mut mapping.production_cost,
                "marketing_cost" => &mut mapping.marketing_cost,
                "logistics_cost" => &mut mapping.logistics_cost,
                "shelf_cost" => &mut mapping.shelf_cost,
                "age" => &mut mapping.age,
                "stock" => &mut mapping.stock,
                "shelf_space" => &mut mapping.shelf_space,
                "demand" => &mut mapping.demand,
                other => return Err(format!("unknown product field `{}`", other).into()),
            };
            *slot = header.to_string();
        }
        Ok(mapping)
    }

    fn load(&self) -> CliResult<Session> {
        let file = FileConfig::load(self.config.as_deref())?;
        let bits_from_file = file.bits_from_file;

        let mapping = self.column_mapping(file.columns)?;
        let limits = self.limits(file.limits)?;

        println!("Loading products from {:?}...", self.input);
        let products = load_products_from_path(&self.input, &mapping)?;
        let problem = Problem::new(products, limits)?;

        Ok(Session {
            problem,
            ga: file.ga,
            aco: file.aco,
            bits_from_file,
        })
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            input,
            algorithm,
            seed,
            bits,
            population,
            generations,
            ants,
            iterations,
            patience,
            parallel,
            output,
            svg,
            quiet,
            verbose,
        } => input.load().and_then(|mut session| {
            if let Some(seed) = seed {
                session.ga.seed = seed;
                session.aco.seed = seed;
            }
            match bits {
                Some(bits) => session.ga.bits_per_product = bits,
                None if !session.bits_from_file => {
                    session.ga.bits_per_product = GAConfig::bits_for(&session.problem)
                }
                None => {}
            }
            if let Some(population) = population {
                session.ga.population_size = population;
            }
            if let Some(generations) = generations {
                session.ga.max_generations = generations;
            }
            if let Some(ants) = ants {
                session.aco.num_ants = ants;
            }
            if let Some(iterations) = iterations {
                session.aco.max_iterations = iterations;
            }
            if let Some(patience) = patience {
                session.aco.max_no_improve = patience;
            }
            if parallel {
                session.ga.parallel = true;
                session.aco.parallel = true;
            }
            solve(&session, algorithm, output.as_deref(), svg.as_deref(), quiet, verbose)
        }),

        Commands::Benchmark {
            input,
            output,
            runs,
            seed_base,
            sequential,
        } => input.load().and_then(|mut session| {
            if !session.bits_from_file {
                session.ga.bits_per_product = GAConfig::bits_for(&session.problem);
            }
            let config = BenchmarkConfig {
                num_runs: runs,
                seed_base,
                parallel: !sequential,
                ga: session.ga,
                aco: session.aco,
            };
            run_benchmark(&session.problem, config, &output)
        }),

        Commands::Analyze { input } => input.load().map(|session| analyze(&session.problem)),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn progress_bar(label: &str, total: usize) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());
    Ok(pb)
}

fn run_strategy(
    strategy: &dyn SearchStrategy,
    problem: &Problem,
    seed: u64,
    total: usize,
    quiet: bool,
) -> CliResult<OptimizationResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let pb = if quiet { ProgressBar::hidden() } else { progress_bar(strategy.name(), total)? };

    let observer = |algorithm: &str, iteration: usize, total: usize, best: f64| {
        pb.set_length(total as u64);
        pb.set_position(iteration as u64);
        pb.set_message(format!("{} best {:.2}", algorithm, best));
    };
    let ctx = SearchContext::new().with_observer(&observer);

    let result = strategy.run_with(problem, &mut rng, &ctx)?;
    pb.finish_and_clear();
    Ok(result)
}

fn print_result(result: &OptimizationResult, verbose: bool) {
    println!("\n========== {} ==========", result.algorithm);
    println!("{}", result);
    if verbose {
        println!("Quantities: {:?}", result.quantities);
        println!(
            "Usage: production {:.2}, marketing {:.2}, logistics {:.2}, shelf {:.2}",
            result.usage.production, result.usage.marketing, result.usage.logistics, result.usage.shelf
        );
    }
}

fn solve(
    session: &Session,
    algorithm: Algorithm,
    output: Option<&Path>,
    svg_dir: Option<&Path>,
    quiet: bool,
    verbose: bool,
) -> CliResult<()> {
    let problem = &session.problem;
    if verbose {
        println!("{}", problem.statistics());
        println!("GA bits per product: {}", session.ga.bits_per_product);
    }

    let mut results = Vec::new();
    if matches!(algorithm, Algorithm::Ga | Algorithm::Both) {
        let ga = GeneticAlgorithm::new(session.ga.clone());
        let result = run_strategy(&ga, problem, session.ga.seed, session.ga.max_generations, quiet)?;
        print_result(&result, verbose);
        results.push(result);
    }
    if matches!(algorithm, Algorithm::Aco | Algorithm::Both) {
        let aco = AntColonyOptimization::new(session.aco.clone());
        let result = run_strategy(&aco, problem, session.aco.seed, session.aco.max_iterations, quiet)?;
        print_result(&result, verbose);
        results.push(result);
    }

    let comparison = match results.as_slice() {
        [ga, aco] => {
            let comparison = Comparison::new(ga, aco);
            println!("\n{}", comparison);
            Some(comparison)
        }
        _ => None,
    };

    if let Some(out_path) = output {
        let json = match &comparison {
            Some(comparison) => serde_json::to_string_pretty(&serde_json::json!({
                "results": results,
                "comparison": comparison,
            }))?,
            None => serde_json::to_string_pretty(&results)?,
        };
        std::fs::write(out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(dir) = svg_dir {
        std::fs::create_dir_all(dir)?;
        let viz = Visualizer::new();

        let refs: Vec<&OptimizationResult> = results.iter().collect();
        let convergence_path = dir.join("convergence.svg");
        viz.save_svg(&viz.generate_convergence_svg(&refs), &convergence_path)?;
        println!("Convergence chart saved to {:?}", convergence_path);

        for result in &results {
            let path = dir.join(format!("quantities_{}.svg", result.algorithm.to_lowercase()));
            viz.save_svg(&viz.generate_quantity_svg(problem, result), &path)?;
            println!("Quantity chart saved to {:?}", path);
        }
    }

    Ok(())
}

fn run_benchmark(problem: &Problem, config: BenchmarkConfig, output: &Path) -> CliResult<()> {
    println!(
        "Benchmarking GA and ACO on {} products ({} runs each)...",
        problem.len(),
        config.num_runs
    );

    std::fs::create_dir_all(output)?;

    let mut benchmark = Benchmark::new(config);
    benchmark.run(problem)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);
    Ok(())
}

fn analyze(problem: &Problem) {
    println!("========== Catalog Analysis ==========\n");
    println!("{}", problem.statistics());

    println!("Penalty factors:");
    println!("  {:<24} {:>8} {:>10} {:>10} {:>10}", "Product", "Age", "Stock", "Margin", "Factor");
    for (i, p) in problem.products().iter().enumerate() {
        let factor = problem.penalty_factor(i);
        if factor > 0.0 {
            println!(
                "  {:<24} {:>8.1} {:>10.0} {:>10.2} {:>10.4}",
                p.name,
                p.age,
                p.stock,
                p.unit_profit(),
                factor
            );
        }
    }

    let losing: Vec<&str> = problem
        .products()
        .iter()
        .filter(|p| p.unit_profit() <= 0.0)
        .map(|p| p.name.as_str())
        .collect();
    if !losing.is_empty() {
        println!("\nProducts never worth ordering: {}", losing.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_keeps_explicit_bit_width() {
        let explicit = FileConfig::from_json(r#"{"ga": {"bits_per_product": 10, "seed": 7}}"#).unwrap();
        assert!(explicit.bits_from_file);
        assert_eq!(explicit.ga.bits_per_product, 10);
        assert_eq!(explicit.ga.seed, 7);

        let implicit = FileConfig::from_json(r#"{"ga": {"population_size": 20}}"#).unwrap();
        assert!(!implicit.bits_from_file);
        assert_eq!(implicit.ga.population_size, 20);
        assert!(implicit.limits.is_none());
    }

    #[test]
    fn test_file_config_reads_limits_and_columns() {
        let text = r#"{
            "limits": {
                "production_budget": 500.0,
                "marketing_budget": 100.0,
                "logistics_budget": 80.0,
                "shelf_capacity": 300.0
            },
            "columns": {"demand": "Forecast"},
            "aco": {"num_ants": 12, "infeasible_ants": "discard"}
        }"#;
        let config = FileConfig::from_json(text).unwrap();

        let limits = config.limits.unwrap();
        assert_eq!(limits.production_budget, 500.0);
        assert_eq!(limits.discount_base, 0.0);
        assert_eq!(config.columns.demand, "Forecast");
        assert_eq!(config.columns.price, "Price");
        assert_eq!(config.aco.num_ants, 12);
        assert_eq!(config.aco.infeasible_ants, restock_optimizer::heuristics::InfeasibleAnts::Discard);
    }
}
