//! Feasibility and objective evaluation.
//!
//! Every constraint check and profit figure used by the search strategies,
//! the repair engine and the result report goes through the methods here.

use crate::problem::{Problem, ProductParams};
use serde::{Deserialize, Serialize};

/// Relative tolerance applied to every budget and capacity comparison
pub const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// `total <= limit`, up to rounding noise in the summation.
#[inline]
pub(crate) fn within(total: f64, limit: f64) -> bool {
    total <= limit + FEASIBILITY_TOLERANCE * limit.abs().max(1.0)
}

/// Resources consumed by a quantity vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Production spending of the new units
    pub production: f64,
    /// Marketing spending of the new units
    pub marketing: f64,
    /// Logistics spending of the new units
    pub logistics: f64,
    /// Shelf space taken by new units and existing stock
    pub shelf: f64,
}

impl ResourceUsage {
    /// True when all three budgets and the shelf capacity hold.
    pub fn fits(&self, problem: &Problem) -> bool {
        let limits = problem.limits();
        within(self.production, limits.production_budget)
            && within(self.marketing, limits.marketing_budget)
            && within(self.logistics, limits.logistics_budget)
            && within(self.shelf, limits.shelf_capacity)
    }

    /// Sum of the amounts by which the budgets and the shelf are exceeded.
    pub fn overshoot(&self, problem: &Problem) -> f64 {
        let limits = problem.limits();
        (self.production - limits.production_budget).max(0.0)
            + (self.marketing - limits.marketing_budget).max(0.0)
            + (self.logistics - limits.logistics_budget).max(0.0)
            + (self.shelf - limits.shelf_capacity).max(0.0)
    }
}

/// Units of `p` that may still be ordered. Stock above demand allows none
/// but does not make the product itself infeasible.
#[inline]
fn demand_ceiling(p: &ProductParams) -> f64 {
    (p.demand - p.stock).max(0.0)
}

impl Problem {
    /// Resource usage of `q`. Existing stock counts towards the shelf.
    pub fn usage(&self, q: &[u32]) -> ResourceUsage {
        let mut usage = ResourceUsage::default();
        for (p, &qty) in self.products().iter().zip(q) {
            let qty = qty as f64;
            usage.production += p.production_cost * qty;
            usage.marketing += p.marketing_cost * qty;
            usage.logistics += p.logistics_cost * qty;
            usage.shelf += p.shelf_space * (qty + p.stock);
        }
        usage
    }

    /// Check demand ceilings, the three budgets and the shelf capacity.
    pub fn is_feasible(&self, q: &[u32]) -> bool {
        if q.len() != self.len() {
            return false;
        }

        let demand_ok = self
            .products()
            .iter()
            .zip(q)
            .all(|(p, &qty)| within(qty as f64, demand_ceiling(p)));

        demand_ok && self.usage(q).fits(self)
    }

    /// Total constraint overshoot of `q`, 0 when feasible.
    pub fn violation(&self, q: &[u32]) -> f64 {
        let demand_excess: f64 = self
            .products()
            .iter()
            .zip(q)
            .map(|(p, &qty)| (qty as f64 - demand_ceiling(p)).max(0.0))
            .sum();

        demand_excess + self.usage(q).overshoot(self)
    }

    /// Profit with the age/stock discount applied. This is the search objective.
    pub fn penalized_profit(&self, q: &[u32]) -> f64 {
        self.products()
            .iter()
            .zip(q)
            .enumerate()
            .map(|(i, (p, &qty))| p.unit_profit() * qty as f64 * (1.0 - self.penalty_factor(i)))
            .sum()
    }

    /// Profit without the discount. This is the reported total.
    pub fn raw_profit(&self, q: &[u32]) -> f64 {
        self.products()
            .iter()
            .zip(q)
            .map(|(p, &qty)| p.unit_profit() * qty as f64)
            .sum()
    }
}
