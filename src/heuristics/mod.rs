//! Search strategies for the restocking problem.
//!
//! Both strategies implement [`SearchStrategy`] and share the repair operator.
//! A run draws all randomness from the generator passed in, so a seeded
//! generator makes it reproducible.

pub mod repair;
pub mod genetic;
pub mod aco;

pub use repair::*;
pub use genetic::*;
pub use aco::*;

use crate::error::ConfigError;
use crate::problem::Problem;
use crate::solution::OptimizationResult;
use rand::RngCore;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives the best score after each generation or iteration
pub trait SearchObserver {
    fn on_progress(&self, algorithm: &str, iteration: usize, total: usize, best_score: f64);
}

impl<F> SearchObserver for F
where
    F: Fn(&str, usize, usize, f64),
{
    fn on_progress(&self, algorithm: &str, iteration: usize, total: usize, best_score: f64) {
        self(algorithm, iteration, total, best_score)
    }
}

/// Optional hooks for a run: progress reporting and cancellation
#[derive(Clone, Copy, Default)]
pub struct SearchContext<'a> {
    observer: Option<&'a dyn SearchObserver>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> SearchContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: &'a dyn SearchObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The run stops before the next generation or iteration once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub(crate) fn report(&self, algorithm: &str, iteration: usize, total: usize, best_score: f64) {
        if let Some(observer) = self.observer {
            observer.on_progress(algorithm, iteration, total, best_score);
        }
    }
}

/// A stochastic search producing an order-quantity vector
pub trait SearchStrategy {
    /// Short algorithm label used in results and reports
    fn name(&self) -> &str;

    /// Run the search with progress and cancellation hooks.
    fn run_with(
        &self,
        problem: &Problem,
        rng: &mut dyn RngCore,
        ctx: &SearchContext<'_>,
    ) -> Result<OptimizationResult, ConfigError>;

    /// Run the search to completion.
    fn run(&self, problem: &Problem, rng: &mut dyn RngCore) -> Result<OptimizationResult, ConfigError> {
        self.run_with(problem, rng, &SearchContext::default())
    }
}
