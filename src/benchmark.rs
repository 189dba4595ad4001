//! Benchmarking module for the restocking optimizer.
//!
//! Runs both strategies over a range of seeds, collects one row per run and
//! aggregates the rows per algorithm.

use crate::error::ConfigError;
use crate::heuristics::aco::ACOConfig;
use crate::heuristics::genetic::GAConfig;
use crate::problem::Problem;
use crate::solution::{OptimizationResult, Outcome};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Algorithms covered by the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    GA,
    ACO,
}

/// Outcome of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Run index
    pub run: usize,
    /// Seed of the run
    pub seed: u64,
    pub outcome: Outcome,
    /// Undiscounted total profit
    pub raw_profit: f64,
    /// Discounted total profit
    pub penalized_profit: f64,
    /// Units ordered
    pub units: u64,
    /// Generations or iterations executed
    pub iterations: usize,
    /// Computation time in seconds
    pub time: f64,
}

impl AlgorithmResult {
    fn from_result(result: &OptimizationResult, run: usize, seed: u64) -> Self {
        AlgorithmResult {
            algorithm: result.algorithm.clone(),
            run,
            seed,
            outcome: result.outcome,
            raw_profit: result.raw_profit,
            penalized_profit: result.penalized_profit,
            units: result.total_units(),
            iterations: result.iterations,
            time: result.computation_time,
        }
    }
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Number of feasible results
    pub num_feasible: usize,
    /// Mean profit over feasible runs
    pub mean_profit: f64,
    /// Sample standard deviation of the profit (0 for a single run)
    pub std_profit: f64,
    pub best_profit: f64,
    pub worst_profit: f64,
    /// Average time
    pub mean_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Number of runs per algorithm
    pub num_runs: usize,
    /// Seed of the first run; run `r` uses `seed_base + r`
    pub seed_base: u64,
    /// Run in parallel
    pub parallel: bool,
    pub ga: GAConfig,
    pub aco: ACOConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            seed_base: 0,
            parallel: true,
            ga: GAConfig::default(),
            aco: ACOConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn run_single(&self, problem: &Problem, algorithm: Algorithm, run: usize) -> Result<AlgorithmResult, ConfigError> {
        let seed = self.config.seed_base + run as u64;
        let result = match algorithm {
            Algorithm::GA => {
                let config = GAConfig { seed, ..self.config.ga.clone() };
                crate::run_ga(problem, &config)?
            }
            Algorithm::ACO => {
                let config = ACOConfig { seed, ..self.config.aco.clone() };
                crate::run_aco(problem, &config)?
            }
        };
        Ok(AlgorithmResult::from_result(&result, run, seed))
    }

    /// Run every algorithm `num_runs` times on `problem`.
    pub fn run(&mut self, problem: &Problem) -> Result<(), ConfigError> {
        self.config.ga.validate()?;
        self.config.aco.validate()?;

        log::info!(
            "Running benchmark: {} run(s) per algorithm on {} product(s)",
            self.config.num_runs,
            problem.len()
        );

        let jobs: Vec<(Algorithm, usize)> = [Algorithm::GA, Algorithm::ACO]
            .into_iter()
            .flat_map(|a| (0..self.config.num_runs).map(move |r| (a, r)))
            .collect();

        let results: Result<Vec<AlgorithmResult>, ConfigError> = if self.config.parallel {
            jobs.par_iter()
                .map(|&(a, r)| self.run_single(problem, a, r))
                .collect()
        } else {
            jobs.iter()
                .map(|&(a, r)| self.run_single(problem, a, r))
                .collect()
        };

        self.results.extend(results?);
        Ok(())
    }

    /// Compute statistics for each algorithm, best mean profit first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: BTreeMap<&str, Vec<&AlgorithmResult>> = BTreeMap::new();
        for result in &self.results {
            stats_map.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let feasible: Vec<&AlgorithmResult> = results
                .iter()
                .copied()
                .filter(|r| r.outcome == Outcome::Feasible)
                .collect();

            if feasible.is_empty() {
                log::warn!("{}: no feasible run, skipped in statistics", algo);
                continue;
            }

            let profits: Vec<f64> = feasible.iter().map(|r| r.raw_profit).collect();
            let times: Vec<f64> = feasible.iter().map(|r| r.time).collect();

            let std_profit = if profits.len() > 1 { profits.iter().std_dev() } else { 0.0 };

            statistics.push(AlgorithmStatistics {
                algorithm: algo.to_string(),
                num_runs: results.len(),
                num_feasible: feasible.len(),
                mean_profit: profits.iter().mean(),
                std_profit,
                best_profit: Statistics::max(profits.iter()),
                worst_profit: Statistics::min(profits.iter()),
                mean_time: times.iter().mean(),
                total_time: times.iter().sum(),
            });
        }

        statistics.sort_by_key(|s| std::cmp::Reverse(OrderedFloat(s.mean_profit)));
        statistics
    }

    /// Write one CSV row per run
    pub fn write_results<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for result in &self.results {
            writer.serialize(result)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        self.write_results(File::create(path)?)
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Restock Optimizer Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<10} {:>10} {:>14} {:>12} {:>14} {:>14}\n",
            "Algorithm", "Feasible", "Mean Profit", "Std", "Best Profit", "Mean Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<10} {:>10} {:>14.2} {:>12.2} {:>14.2} {:>13.4}s\n",
                stat.algorithm,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.mean_profit,
                stat.std_profit,
                stat.best_profit,
                stat.mean_time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        let best = self
            .results
            .iter()
            .filter(|r| r.outcome == Outcome::Feasible)
            .max_by_key(|r| OrderedFloat(r.raw_profit));
        if let Some(best) = best {
            report.push_str(&format!(
                "\nBest run: {} seed {} with profit {:.2}\n",
                best.algorithm, best.seed, best.raw_profit
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}
