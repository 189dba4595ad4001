//! Side-by-side comparison of a GA result and an ACO result.

use crate::solution::{OptimizationResult, ProductReport};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Number of products listed in each ranking
pub const TOP_PRODUCTS: usize = 5;

/// Headline figures of both runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub ga_profit: f64,
    pub aco_profit: f64,
    /// `aco_profit - ga_profit`
    pub difference: f64,
    pub ga_units: u64,
    pub aco_units: u64,
    pub ga_feasible: bool,
    pub aco_feasible: bool,
    pub best_method: String,
}

/// Quantities and profits of one product under both runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComparison {
    pub name: String,
    pub ga_quantity: u32,
    pub aco_quantity: u32,
    pub ga_profit: f64,
    pub aco_profit: f64,
    /// `aco_quantity - ga_quantity`
    pub quantity_difference: i64,
    /// `aco_profit - ga_profit`
    pub profit_difference: f64,
}

/// Best ordered products of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopProducts {
    pub by_total_profit: Vec<ProductReport>,
    pub by_profit_per_unit: Vec<ProductReport>,
}

impl TopProducts {
    fn from_result(result: &OptimizationResult) -> Self {
        let ordered: Vec<&ProductReport> = result.products.iter().filter(|p| p.quantity > 0).collect();

        let mut by_total = ordered.clone();
        by_total.sort_by_key(|p| Reverse(OrderedFloat(p.total_profit)));
        let mut by_unit = ordered;
        by_unit.sort_by_key(|p| Reverse(OrderedFloat(p.profit_per_unit)));

        TopProducts {
            by_total_profit: by_total.into_iter().take(TOP_PRODUCTS).cloned().collect(),
            by_profit_per_unit: by_unit.into_iter().take(TOP_PRODUCTS).cloned().collect(),
        }
    }
}

/// Full GA vs ACO comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    /// One entry per product name, sorted by name
    pub products: Vec<ProductComparison>,
    pub ga_top: TopProducts,
    pub aco_top: TopProducts,
}

impl Comparison {
    pub fn new(ga: &OptimizationResult, aco: &OptimizationResult) -> Self {
        // A feasible plan beats one that is not; then the higher profit wins, GA on ties.
        let rank = |r: &OptimizationResult| (r.is_feasible(), OrderedFloat(r.raw_profit));
        let best_method = if rank(aco) > rank(ga) { &aco.algorithm } else { &ga.algorithm };

        let summary = ComparisonSummary {
            ga_profit: ga.raw_profit,
            aco_profit: aco.raw_profit,
            difference: aco.raw_profit - ga.raw_profit,
            ga_units: ga.total_units(),
            aco_units: aco.total_units(),
            ga_feasible: ga.is_feasible(),
            aco_feasible: aco.is_feasible(),
            best_method: best_method.clone(),
        };

        let mut joined: BTreeMap<&str, (Option<&ProductReport>, Option<&ProductReport>)> = BTreeMap::new();
        for p in &ga.products {
            joined.entry(p.name.as_str()).or_default().0 = Some(p);
        }
        for p in &aco.products {
            joined.entry(p.name.as_str()).or_default().1 = Some(p);
        }

        let products = joined
            .into_iter()
            .map(|(name, (g, a))| {
                let ga_quantity = g.map_or(0, |p| p.quantity);
                let aco_quantity = a.map_or(0, |p| p.quantity);
                let ga_profit = g.map_or(0.0, |p| p.total_profit);
                let aco_profit = a.map_or(0.0, |p| p.total_profit);
                ProductComparison {
                    name: name.to_string(),
                    ga_quantity,
                    aco_quantity,
                    ga_profit,
                    aco_profit,
                    quantity_difference: aco_quantity as i64 - ga_quantity as i64,
                    profit_difference: aco_profit - ga_profit,
                }
            })
            .collect();

        Comparison {
            summary,
            products,
            ga_top: TopProducts::from_result(ga),
            aco_top: TopProducts::from_result(aco),
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.summary;
        writeln!(f, "GA vs ACO")?;
        writeln!(f, "  GA profit:  {:>12.2} ({} units, feasible: {})", s.ga_profit, s.ga_units, s.ga_feasible)?;
        writeln!(f, "  ACO profit: {:>12.2} ({} units, feasible: {})", s.aco_profit, s.aco_units, s.aco_feasible)?;
        writeln!(f, "  Difference (ACO - GA): {:.2}", s.difference)?;
        writeln!(f, "  Best method: {}", s.best_method)?;
        writeln!(f)?;
        writeln!(
            f,
            "  {:<24} {:>8} {:>8} {:>12} {:>12}",
            "Product", "GA qty", "ACO qty", "GA profit", "ACO profit"
        )?;
        for p in self.products.iter().filter(|p| p.ga_quantity > 0 || p.aco_quantity > 0) {
            writeln!(
                f,
                "  {:<24} {:>8} {:>8} {:>12.2} {:>12.2}",
                p.name, p.ga_quantity, p.aco_quantity, p.ga_profit, p.aco_profit
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::{ample_limits, product};
    use crate::problem::{Limits, Problem};

    fn create_test_problem() -> Problem {
        let products = vec![
            product("milk", 10.0, 4.0, 100.0),
            product("bread", 5.0, 1.0, 100.0),
            product("eggs", 8.0, 2.0, 100.0),
        ];
        Problem::new(products, ample_limits()).unwrap()
    }

    #[test]
    fn test_summary_and_join() {
        let problem = create_test_problem();
        let ga = OptimizationResult::from_quantities(&problem, vec![10, 0, 5], "GA");
        let aco = OptimizationResult::from_quantities(&problem, vec![10, 20, 0], "ACO");

        let cmp = Comparison::new(&ga, &aco);
        assert_eq!(cmp.summary.ga_profit, 90.0);
        assert_eq!(cmp.summary.aco_profit, 140.0);
        assert_eq!(cmp.summary.difference, 50.0);
        assert_eq!(cmp.summary.best_method, "ACO");

        let names: Vec<&str> = cmp.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bread", "eggs", "milk"]);
        assert_eq!(cmp.products[0].quantity_difference, 20);
        assert_eq!(cmp.products[1].quantity_difference, -5);
    }

    #[test]
    fn test_ties_and_feasibility_decide_best_method() {
        let problem = create_test_problem();
        let ga = OptimizationResult::from_quantities(&problem, vec![10, 0, 0], "GA");
        let aco = OptimizationResult::from_quantities(&problem, vec![10, 0, 0], "ACO");
        assert_eq!(Comparison::new(&ga, &aco).summary.best_method, "GA");

        let tight = Problem::new(
            vec![product("milk", 10.0, 4.0, 100.0)],
            Limits { production_budget: 8.0, ..ample_limits() },
        )
        .unwrap();
        let infeasible = OptimizationResult::from_quantities(&tight, vec![50], "GA");
        let feasible = OptimizationResult::from_quantities(&tight, vec![2], "ACO");
        assert_eq!(Comparison::new(&infeasible, &feasible).summary.best_method, "ACO");
    }

    #[test]
    fn test_no_solution_side_counts_as_zero() {
        let problem = create_test_problem();
        let ga = OptimizationResult::from_quantities(&problem, vec![1, 2, 3], "GA");
        let aco = OptimizationResult::no_solution("ACO");

        let cmp = Comparison::new(&ga, &aco);
        assert_eq!(cmp.products.len(), 3);
        assert!(cmp.products.iter().all(|p| p.aco_quantity == 0 && p.aco_profit == 0.0));
        assert!(cmp.aco_top.by_total_profit.is_empty());
        assert_eq!(cmp.summary.best_method, "GA");
    }

    #[test]
    fn test_top_products_rankings() {
        let problem = create_test_problem();
        let ga = OptimizationResult::from_quantities(&problem, vec![1, 30, 2], "GA");
        let top = TopProducts::from_result(&ga);

        let by_total: Vec<&str> = top.by_total_profit.iter().map(|p| p.name.as_str()).collect();
        let by_unit: Vec<&str> = top.by_profit_per_unit.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(by_total, vec!["bread", "eggs", "milk"]);
        assert_eq!(by_unit, vec!["milk", "eggs", "bread"]);
    }
}
