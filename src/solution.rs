//! Result representation for an optimization run.
//!
//! An [`OptimizationResult`] carries the chosen quantity vector, both profit
//! figures, a per-product breakdown and bookkeeping about the run itself.

use crate::evaluation::ResourceUsage;
use crate::problem::Problem;
use serde::{Deserialize, Serialize};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The quantity vector satisfies every constraint
    Feasible,
    /// The best vector found still violates a constraint
    Infeasible,
    /// No candidate was ever accepted
    NoSolution,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::Feasible => "feasible",
            Outcome::Infeasible => "infeasible",
            Outcome::NoSolution => "no solution",
        };
        f.write_str(label)
    }
}

/// One line of the per-product breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    pub name: String,
    /// Units to order
    pub quantity: u32,
    pub price: f64,
    pub unit_cost: f64,
    pub profit_per_unit: f64,
    /// `profit_per_unit · quantity`, undiscounted
    pub total_profit: f64,
    /// `unit_cost · quantity`
    pub total_cost: f64,
    pub penalty_factor: f64,
}

/// Best quantity vector found by a run, with its breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Algorithm that produced this result
    pub algorithm: String,
    pub outcome: Outcome,
    /// Order quantity per product, empty when there is no solution
    pub quantities: Vec<u32>,
    /// Undiscounted total profit, the reported figure
    pub raw_profit: f64,
    /// Discounted total profit, the search objective
    pub penalized_profit: f64,
    pub products: Vec<ProductReport>,
    pub usage: ResourceUsage,
    /// Generations or iterations actually executed
    pub iterations: usize,
    /// Stopped early because the best score stopped improving
    pub stagnated: bool,
    /// Stopped early on an external cancellation request
    pub cancelled: bool,
    /// Best score after each generation or iteration
    pub history: Vec<f64>,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl OptimizationResult {
    /// Build a result from a quantity vector, evaluating it against `problem`.
    pub fn from_quantities(problem: &Problem, quantities: Vec<u32>, algorithm: &str) -> Self {
        let outcome = if problem.is_feasible(&quantities) {
            Outcome::Feasible
        } else {
            Outcome::Infeasible
        };

        let products = problem
            .products()
            .iter()
            .zip(&quantities)
            .enumerate()
            .map(|(i, (p, &qty))| {
                let unit_cost = p.unit_cost();
                ProductReport {
                    name: p.name.clone(),
                    quantity: qty,
                    price: p.price,
                    unit_cost,
                    profit_per_unit: p.unit_profit(),
                    total_profit: p.unit_profit() * qty as f64,
                    total_cost: unit_cost * qty as f64,
                    penalty_factor: problem.penalty_factor(i),
                }
            })
            .collect();

        OptimizationResult {
            algorithm: algorithm.to_string(),
            outcome,
            raw_profit: problem.raw_profit(&quantities),
            penalized_profit: problem.penalized_profit(&quantities),
            usage: problem.usage(&quantities),
            quantities,
            products,
            iterations: 0,
            stagnated: false,
            cancelled: false,
            history: Vec::new(),
            computation_time: 0.0,
        }
    }

    /// Result for a run in which no candidate was ever accepted.
    pub fn no_solution(algorithm: &str) -> Self {
        OptimizationResult {
            algorithm: algorithm.to_string(),
            outcome: Outcome::NoSolution,
            quantities: Vec::new(),
            raw_profit: 0.0,
            penalized_profit: 0.0,
            products: Vec::new(),
            usage: ResourceUsage::default(),
            iterations: 0,
            stagnated: false,
            cancelled: false,
            history: Vec::new(),
            computation_time: 0.0,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.outcome == Outcome::Feasible
    }

    /// Total units ordered
    pub fn total_units(&self) -> u64 {
        self.quantities.iter().map(|&q| q as u64).sum()
    }

    /// Total spending on the ordered units
    pub fn total_cost(&self) -> f64 {
        self.products.iter().map(|p| p.total_cost).sum()
    }
}

impl std::fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Result ({})", self.algorithm)?;
        writeln!(f, "  Outcome: {}", self.outcome)?;
        writeln!(f, "  Total profit: {:.2}", self.raw_profit)?;
        writeln!(f, "  Penalized profit: {:.2}", self.penalized_profit)?;
        writeln!(f, "  Units ordered: {}", self.total_units())?;
        writeln!(
            f,
            "  Spending: production {:.2}, marketing {:.2}, logistics {:.2}",
            self.usage.production, self.usage.marketing, self.usage.logistics
        )?;
        writeln!(f, "  Shelf used: {:.2}", self.usage.shelf)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        if self.stagnated {
            writeln!(f, "  Stopped early: no improvement")?;
        }
        if self.cancelled {
            writeln!(f, "  Stopped early: cancelled")?;
        }
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;

        for p in self.products.iter().filter(|p| p.quantity > 0) {
            writeln!(
                f,
                "    {:<24} qty {:>6}  profit/unit {:>9.2}  total {:>11.2}",
                p.name, p.quantity, p.profit_per_unit, p.total_profit
            )?;
        }
        Ok(())
    }
}
