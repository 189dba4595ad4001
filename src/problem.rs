//! Problem model for the restocking optimizer.
//!
//! A [`Problem`] is an immutable snapshot of the product catalog and the
//! global limits for one run. Construction validates every field and derives
//! the constants shared by the evaluator: the oldest product age, the total
//! existing stock and the per-product penalty factors.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Economic parameters of a single product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductParams {
    /// Display name, only used in reports
    pub name: String,
    /// Selling price per unit
    pub price: f64,
    /// Production cost per unit
    pub production_cost: f64,
    /// Marketing cost per unit
    pub marketing_cost: f64,
    /// Logistics cost per unit
    pub logistics_cost: f64,
    /// Shelf-handling cost per unit
    pub shelf_cost: f64,
    /// Age of the stock already on hand
    pub age: f64,
    /// Units already in stock
    pub stock: f64,
    /// Expected demand, the ceiling for stock plus new units
    pub demand: f64,
    /// Shelf space occupied by one unit
    pub shelf_space: f64,
}

impl ProductParams {
    /// Sum of the four per-unit cost components.
    #[inline]
    pub fn unit_cost(&self) -> f64 {
        self.production_cost + self.marketing_cost + self.logistics_cost + self.shelf_cost
    }

    /// Price minus unit cost.
    #[inline]
    pub fn unit_profit(&self) -> f64 {
        self.price - self.unit_cost()
    }

    fn numeric_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("price", self.price),
            ("production_cost", self.production_cost),
            ("marketing_cost", self.marketing_cost),
            ("logistics_cost", self.logistics_cost),
            ("shelf_cost", self.shelf_cost),
            ("age", self.age),
            ("stock", self.stock),
            ("demand", self.demand),
            ("shelf_space", self.shelf_space),
        ]
    }
}

/// Global budgets and capacity for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Ceiling on total production spending
    pub production_budget: f64,
    /// Ceiling on total marketing spending
    pub marketing_budget: f64,
    /// Ceiling on total logistics spending
    pub logistics_budget: f64,
    /// Total shelf space, shared by existing stock and new units
    pub shelf_capacity: f64,
    /// Base discount applied to old, overstocked products
    #[serde(default)]
    pub discount_base: f64,
}

impl Limits {
    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("production_budget", self.production_budget),
            ("marketing_budget", self.marketing_budget),
            ("logistics_budget", self.logistics_budget),
            ("shelf_capacity", self.shelf_capacity),
            ("discount_base", self.discount_base),
        ]
    }
}

/// Validated catalog plus limits and derived constants
#[derive(Debug, Clone)]
pub struct Problem {
    products: Vec<ProductParams>,
    limits: Limits,
    age_max: f64,
    stock_sum: f64,
    penalty_factors: Vec<f64>,
}

impl Problem {
    /// Validate the catalog and limits and precompute derived constants.
    ///
    /// Negative budgets are accepted: they make the instance infeasible,
    /// which the run reports rather than rejects.
    pub fn new(products: Vec<ProductParams>, limits: Limits) -> Result<Self, ConfigError> {
        if products.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for (index, product) in products.iter().enumerate() {
            for (field, value) in product.numeric_fields() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidProduct {
                        index,
                        name: product.name.clone(),
                        field,
                        value,
                    });
                }
            }
        }

        for (field, value) in limits.fields() {
            if !value.is_finite() {
                return Err(ConfigError::InvalidLimit { field, value });
            }
        }

        let age_max = products.iter().map(|p| p.age).fold(0.0, f64::max);
        let stock_sum: f64 = products.iter().map(|p| p.stock).sum();

        let penalty_factors = products
            .iter()
            .map(|p| {
                if age_max == 0.0 || stock_sum == 0.0 {
                    0.0
                } else {
                    limits.discount_base * (p.age / age_max) * (p.stock / stock_sum)
                }
            })
            .collect();

        Ok(Problem {
            products,
            limits,
            age_max,
            stock_sum,
            penalty_factors,
        })
    }

    /// Number of products
    #[inline]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Always false for a constructed problem
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[inline]
    pub fn products(&self) -> &[ProductParams] {
        &self.products
    }

    #[inline]
    pub fn product(&self, i: usize) -> &ProductParams {
        &self.products[i]
    }

    #[inline]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Largest age in the catalog
    #[inline]
    pub fn age_max(&self) -> f64 {
        self.age_max
    }

    /// Total existing stock over all products
    #[inline]
    pub fn stock_sum(&self) -> f64 {
        self.stock_sum
    }

    /// Discount factor for old, overstocked products.
    ///
    /// `discount_base · (age / age_max) · (stock / stock_sum)`, or 0 when
    /// either denominator is 0. Not clamped.
    #[inline]
    pub fn penalty_factor(&self, i: usize) -> f64 {
        self.penalty_factors[i]
    }

    /// Largest order quantity that respects the demand ceiling of product `i`.
    #[inline]
    pub fn max_feasible_qty(&self, i: usize) -> u32 {
        let p = &self.products[i];
        (p.demand - p.stock).max(0.0).floor() as u32
    }

    /// Get statistics about the problem
    pub fn statistics(&self) -> ProblemStatistics {
        let n = self.len();
        let total_demand: f64 = self.products.iter().map(|p| p.demand).sum();
        let total_headroom: u64 = (0..n).map(|i| self.max_feasible_qty(i) as u64).sum();
        let non_positive_margin = self
            .products
            .iter()
            .filter(|p| p.unit_profit() <= 0.0)
            .count();
        let penalized_products = self.penalty_factors.iter().filter(|&&f| f > 0.0).count();
        let max_penalty_factor = self.penalty_factors.iter().cloned().fold(0.0, f64::max);
        let mean_unit_profit =
            self.products.iter().map(|p| p.unit_profit()).sum::<f64>() / n as f64;
        let stock_shelf_usage: f64 = self.products.iter().map(|p| p.shelf_space * p.stock).sum();

        ProblemStatistics {
            num_products: n,
            total_stock: self.stock_sum,
            total_demand,
            total_headroom,
            age_max: self.age_max,
            non_positive_margin,
            penalized_products,
            max_penalty_factor,
            mean_unit_profit,
            stock_shelf_usage,
            limits: self.limits,
        }
    }
}

/// Summary of a problem instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemStatistics {
    pub num_products: usize,
    pub total_stock: f64,
    pub total_demand: f64,
    /// Sum of the per-product demand headroom, in units
    pub total_headroom: u64,
    pub age_max: f64,
    /// Products whose price does not cover their unit cost
    pub non_positive_margin: usize,
    /// Products with a non-zero penalty factor
    pub penalized_products: usize,
    pub max_penalty_factor: f64,
    pub mean_unit_profit: f64,
    /// Shelf space already taken by existing stock
    pub stock_shelf_usage: f64,
    pub limits: Limits,
}

impl std::fmt::Display for ProblemStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Products: {}", self.num_products)?;
        writeln!(f, "  Total stock: {:.0}", self.total_stock)?;
        writeln!(f, "  Total expected demand: {:.0}", self.total_demand)?;
        writeln!(f, "  Orderable headroom: {} units", self.total_headroom)?;
        writeln!(f, "  Oldest stock age: {:.1}", self.age_max)?;
        writeln!(f, "  Non-positive margin: {} product(s)", self.non_positive_margin)?;
        writeln!(
            f,
            "  Penalized: {} product(s), max factor {:.4}",
            self.penalized_products, self.max_penalty_factor
        )?;
        writeln!(f, "  Mean unit profit: {:.2}", self.mean_unit_profit)?;
        writeln!(
            f,
            "  Shelf: {:.1} used by stock / {:.1} capacity",
            self.stock_shelf_usage, self.limits.shelf_capacity
        )?;
        writeln!(
            f,
            "  Budgets: production {:.2}, marketing {:.2}, logistics {:.2}",
            self.limits.production_budget, self.limits.marketing_budget, self.limits.logistics_budget
        )
    }
}
