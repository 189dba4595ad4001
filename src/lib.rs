//! Restock Optimizer Library
//!
//! Chooses how many units of each product to order so that the discounted
//! profit is as large as possible while three budgets (production, marketing,
//! logistics), the shelf capacity and every product's expected demand are
//! respected.
//!
//! # Features
//!
//! - Validated problem model with age/stock discount factors
//! - Shared feasibility evaluator and greedy repair operator
//! - Genetic Algorithm (bit-encoded quantities, tournament selection, elitism)
//! - Ant Colony Optimization (per-product pheromone trails, early stopping)
//! - CSV loading with column mapping, GA vs ACO comparison, benchmarking and
//!   SVG charts
//!
//! # Example
//!
//! ```no_run
//! use restock_optimizer::loader::{load_products_from_path, ColumnMapping};
//! use restock_optimizer::problem::{Limits, Problem};
//! use restock_optimizer::heuristics::GAConfig;
//!
//! let products = load_products_from_path("products.csv", &ColumnMapping::default()).unwrap();
//! let limits = Limits {
//!     production_budget: 5_000.0,
//!     marketing_budget: 1_500.0,
//!     logistics_budget: 1_000.0,
//!     shelf_capacity: 800.0,
//!     discount_base: 0.2,
//! };
//! let problem = Problem::new(products, limits).unwrap();
//!
//! let config = GAConfig::default().with_bits_for(&problem);
//! let result = restock_optimizer::run_ga(&problem, &config).unwrap();
//! println!("{}", result);
//! ```

pub mod error;
pub mod problem;
pub mod evaluation;
pub mod solution;
pub mod heuristics;
pub mod loader;
pub mod comparison;
pub mod benchmark;
pub mod visualization;

pub use error::{ConfigError, LoadError};
pub use problem::{Limits, ProductParams, Problem};
pub use solution::{OptimizationResult, Outcome, ProductReport};

use heuristics::{ACOConfig, AntColonyOptimization, GAConfig, GeneticAlgorithm, SearchStrategy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Run the genetic algorithm with a generator seeded from `config.seed`.
pub fn run_ga(problem: &Problem, config: &GAConfig) -> Result<OptimizationResult, ConfigError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    GeneticAlgorithm::new(config.clone()).run(problem, &mut rng)
}

/// Run ant colony optimization with a generator seeded from `config.seed`.
pub fn run_aco(problem: &Problem, config: &ACOConfig) -> Result<OptimizationResult, ConfigError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    AntColonyOptimization::new(config.clone()).run(problem, &mut rng)
}
