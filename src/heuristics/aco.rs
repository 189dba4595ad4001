//! Ant Colony Optimization for the restocking problem.
//!
//! Every product has a trail over its candidate quantities `0..=headroom`.
//! An ant picks one quantity per product with probability proportional to
//! `pheromone^alpha · heuristic^beta`. After each iteration the trails
//! evaporate, the iteration's best ant deposits on the quantities it chose,
//! and every trail is clamped into a fixed band. The run stops early once
//! the best score has not improved for `max_no_improve` iterations.

use crate::error::ConfigError;
use crate::heuristics::repair::repair_in_place;
use crate::heuristics::{SearchContext, SearchStrategy};
use crate::problem::Problem;
use crate::solution::OptimizationResult;
use ordered_float::OrderedFloat;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::Instant;

/// Heuristic weight of quantity zero, which would otherwise be unreachable
pub const MIN_HEURISTIC: f64 = 1e-6;

/// Largest demand headroom a trail is built for
pub const MAX_TRAIL_HEADROOM: u32 = 1_000_000;

/// What to do with an ant whose quantities break a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibleAnts {
    /// Run the repair operator; the ant is dropped only if that fails
    Repair,
    /// Drop the ant
    Discard,
}

/// ACO configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ACOConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Number of iterations
    pub max_iterations: usize,
    /// Iterations without improvement before stopping (0 disables)
    pub max_no_improve: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Evaporation rate (rho)
    pub evaporation_rate: f64,
    /// Pheromone deposit factor
    pub q: f64,
    /// Lower bound of the pheromone band
    pub min_pheromone: f64,
    /// Upper bound of the pheromone band
    pub max_pheromone: f64,
    pub infeasible_ants: InfeasibleAnts,
    /// Repair and score ants on the rayon thread pool
    pub parallel: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ACOConfig {
    fn default() -> Self {
        ACOConfig {
            num_ants: 100,
            max_iterations: 10,
            max_no_improve: 5,
            alpha: 5.0,
            beta: 10.0,
            evaporation_rate: 0.3,
            q: 0.5,
            min_pheromone: 0.01,
            max_pheromone: 10.0,
            infeasible_ants: InfeasibleAnts::Repair,
            parallel: false,
            seed: 42,
        }
    }
}

impl ACOConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_ants == 0 {
            return Err(ConfigError::parameter("num_ants", "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::parameter("max_iterations", "must be at least 1"));
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("q", self.q)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::parameter(
                    name,
                    format!("must be finite and non-negative, got {}", value),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.evaporation_rate) {
            return Err(ConfigError::parameter(
                "evaporation_rate",
                format!("must lie in [0, 1], got {}", self.evaporation_rate),
            ));
        }
        if !(self.min_pheromone.is_finite() && self.min_pheromone > 0.0)
            || !self.max_pheromone.is_finite()
            || self.max_pheromone < self.min_pheromone
        {
            return Err(ConfigError::parameter(
                "pheromone band",
                format!(
                    "need 0 < min <= max, both finite, got [{}, {}]",
                    self.min_pheromone, self.max_pheromone
                ),
            ));
        }
        Ok(())
    }
}

/// Candidate quantities of one product with their heuristic and pheromone.
/// Index `v` stands for quantity `v`.
#[derive(Debug, Clone)]
struct Trail {
    heuristic: Vec<f64>,
    pheromone: Vec<f64>,
}

impl Trail {
    /// The single quantity 0
    fn collapsed() -> Self {
        Trail {
            heuristic: vec![1.0],
            pheromone: vec![1.0],
        }
    }
}

/// Draws a quantity from one trail
enum Sampler {
    Weighted(WeightedIndex<f64>),
    Uniform(usize),
}

impl Sampler {
    fn new(trail: &Trail, alpha: f64, beta: f64) -> Self {
        let weights: Vec<f64> = trail
            .pheromone
            .iter()
            .zip(&trail.heuristic)
            .map(|(tau, eta)| tau.powf(alpha) * eta.powf(beta))
            .collect();

        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Sampler::Uniform(weights.len());
        }
        match WeightedIndex::new(&weights) {
            Ok(dist) => Sampler::Weighted(dist),
            Err(_) => Sampler::Uniform(weights.len()),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match self {
            Sampler::Weighted(dist) => dist.sample(rng) as u32,
            Sampler::Uniform(len) => rng.gen_range(0..*len) as u32,
        }
    }
}

/// An accepted ant
#[derive(Debug, Clone)]
struct Ant {
    quantities: Vec<u32>,
    /// Constraint overshoot of the constructed vector, before any repair
    violation: f64,
    score: f64,
}

/// Measure, optionally repair, and score one constructed vector.
fn assess(problem: &Problem, handling: InfeasibleAnts, mut quantities: Vec<u32>) -> Option<Ant> {
    let violation = problem.violation(&quantities);
    if handling == InfeasibleAnts::Repair && violation > 0.0 {
        repair_in_place(problem, &mut quantities);
    }
    if !problem.is_feasible(&quantities) {
        return None;
    }

    let score = problem.penalized_profit(&quantities);
    Some(Ant {
        quantities,
        violation,
        score,
    })
}

/// Ant Colony Optimization strategy
#[derive(Debug, Clone, Default)]
pub struct AntColonyOptimization {
    config: ACOConfig,
}

impl AntColonyOptimization {
    pub fn new(config: ACOConfig) -> Self {
        AntColonyOptimization { config }
    }

    pub fn config(&self) -> &ACOConfig {
        &self.config
    }
}

impl SearchStrategy for AntColonyOptimization {
    fn name(&self) -> &str {
        "ACO"
    }

    fn run_with(
        &self,
        problem: &Problem,
        rng: &mut dyn RngCore,
        ctx: &SearchContext<'_>,
    ) -> Result<OptimizationResult, ConfigError> {
        self.config.validate()?;

        // Every trail holds one pheromone and one heuristic entry per quantity.
        for i in 0..problem.len() {
            let headroom = problem.max_feasible_qty(i);
            if headroom > MAX_TRAIL_HEADROOM {
                return Err(ConfigError::HeadroomTooLarge {
                    index: i,
                    name: problem.product(i).name.clone(),
                    headroom,
                    limit: MAX_TRAIL_HEADROOM,
                });
            }
        }

        let mut run = ACORun::new(&self.config, problem, rng);
        Ok(run.run(ctx))
    }
}

/// State of a single ACO run
struct ACORun<'a> {
    config: &'a ACOConfig,
    problem: &'a Problem,
    rng: &'a mut dyn RngCore,
    trails: Vec<Trail>,
    best: Option<Ant>,
    history: Vec<f64>,
    no_improve_count: usize,
}

impl<'a> ACORun<'a> {
    fn new(config: &'a ACOConfig, problem: &'a Problem, rng: &'a mut dyn RngCore) -> Self {
        let trails = (0..problem.len())
            .map(|i| {
                let headroom = problem.max_feasible_qty(i);
                let potential = problem.product(i).unit_profit() * (1.0 - problem.penalty_factor(i));
                if potential <= 0.0 || headroom == 0 {
                    return Trail::collapsed();
                }

                // potential · v normalized by its maximum potential · headroom
                let heuristic = (0..=headroom)
                    .map(|v| {
                        if v == 0 {
                            MIN_HEURISTIC
                        } else {
                            v as f64 / headroom as f64
                        }
                    })
                    .collect();
                let pheromone = (0..=headroom).map(|_| rng.gen_range(0.9..=1.1)).collect();
                Trail { heuristic, pheromone }
            })
            .collect();

        ACORun {
            config,
            problem,
            rng,
            trails,
            best: None,
            history: Vec::with_capacity(config.max_iterations),
            no_improve_count: 0,
        }
    }

    /// Construct one quantity vector
    fn construct_solution(&mut self, samplers: &[Sampler]) -> Vec<u32> {
        samplers.iter().map(|s| s.sample(&mut *self.rng)).collect()
    }

    /// Evaporate, deposit on `iteration_best`, then clamp into the band.
    fn update_pheromone(&mut self, iteration_best: Option<&Ant>) {
        let keep = 1.0 - self.config.evaporation_rate;
        for trail in self.trails.iter_mut() {
            for tau in trail.pheromone.iter_mut() {
                *tau *= keep;
            }
        }

        if let Some(ant) = iteration_best {
            let deposit = self.config.q * ant.score / (1.0 + ant.violation);
            for (trail, &v) in self.trails.iter_mut().zip(&ant.quantities) {
                trail.pheromone[v as usize] += deposit;
            }
        }

        let (lo, hi) = (self.config.min_pheromone, self.config.max_pheromone);
        for trail in self.trails.iter_mut() {
            for tau in trail.pheromone.iter_mut() {
                *tau = tau.clamp(lo, hi);
            }
        }
    }

    fn run(&mut self, ctx: &SearchContext<'_>) -> OptimizationResult {
        let start = Instant::now();
        let mut iterations = 0;
        let mut stagnated = false;
        let mut cancelled = false;

        while iterations < self.config.max_iterations {
            if ctx.is_cancelled() {
                cancelled = true;
                break;
            }

            let samplers: Vec<Sampler> = self
                .trails
                .iter()
                .map(|t| Sampler::new(t, self.config.alpha, self.config.beta))
                .collect();
            let constructed: Vec<Vec<u32>> = (0..self.config.num_ants)
                .map(|_| self.construct_solution(&samplers))
                .collect();

            let problem = self.problem;
            let handling = self.config.infeasible_ants;
            let ants: Vec<Option<Ant>> = if self.config.parallel {
                constructed
                    .into_par_iter()
                    .map(|q| assess(problem, handling, q))
                    .collect()
            } else {
                constructed
                    .into_iter()
                    .map(|q| assess(problem, handling, q))
                    .collect()
            };

            let accepted = ants.iter().filter(|a| a.is_some()).count();
            let iteration_best = ants
                .iter()
                .enumerate()
                .filter_map(|(i, a)| a.as_ref().map(|a| (i, a)))
                .max_by_key(|&(i, a)| (OrderedFloat(a.score), Reverse(i)))
                .map(|(_, a)| a);

            let improved = match (iteration_best, &self.best) {
                (Some(it), Some(best)) => it.score > best.score,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if improved {
                self.best = iteration_best.cloned();
                self.no_improve_count = 0;
            } else {
                self.no_improve_count += 1;
            }

            self.update_pheromone(iteration_best);
            iterations += 1;

            let best_score = self.best.as_ref().map(|b| b.score);
            if let Some(score) = best_score {
                self.history.push(score);
            }
            log::debug!(
                "[ACO] Iteration {}/{}  accepted {}/{}  iteration best {}  run best {}",
                iterations,
                self.config.max_iterations,
                accepted,
                self.config.num_ants,
                iteration_best.map_or("-".to_string(), |a| format!("{:.3}", a.score)),
                best_score.map_or("-".to_string(), |s| format!("{:.3}", s)),
            );
            ctx.report("ACO", iterations, self.config.max_iterations, best_score.unwrap_or(0.0));

            if self.config.max_no_improve > 0 && self.no_improve_count >= self.config.max_no_improve {
                log::info!(
                    "[ACO] Early stop at iteration {}: no improvement in {} iterations",
                    iterations,
                    self.no_improve_count
                );
                stagnated = true;
                break;
            }
        }

        let mut result = match self.best.take() {
            Some(best) => OptimizationResult::from_quantities(self.problem, best.quantities, "ACO"),
            None => {
                log::warn!("[ACO] No ant produced a feasible order plan");
                OptimizationResult::no_solution("ACO")
            }
        };
        result.iterations = iterations;
        result.stagnated = stagnated;
        result.cancelled = cancelled;
        result.history = std::mem::take(&mut self.history);
        result.computation_time = start.elapsed().as_secs_f64();

        log::info!(
            "[ACO] {} iterations, best penalized profit {:.3}, {} in {:.2}s",
            result.iterations,
            result.penalized_profit,
            result.outcome,
            result.computation_time
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::{ample_limits, product};
    use crate::problem::Limits;
    use crate::solution::Outcome;
    use rand_chacha::ChaCha8Rng;

    fn create_test_problem() -> Problem {
        let a = product("a", 10.0, 2.0, 30.0);
        let b = product("b", 7.0, 1.0, 20.0);
        // price below cost: never worth ordering
        let c = product("c", 3.0, 4.0, 50.0);
        let limits = Limits { production_budget: 50.0, ..ample_limits() };
        Problem::new(vec![a, b, c], limits).unwrap()
    }

    #[test]
    fn test_trails_follow_headroom_and_margin() {
        let problem = create_test_problem();
        let config = ACOConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let run = ACORun::new(&config, &problem, &mut rng);

        assert_eq!(run.trails[0].heuristic.len(), 31);
        assert_eq!(run.trails[0].heuristic[0], MIN_HEURISTIC);
        assert_eq!(run.trails[0].heuristic[30], 1.0);
        assert!(run.trails[0].pheromone.iter().all(|&t| (0.9..=1.1).contains(&t)));
        assert_eq!(run.trails[2].heuristic, vec![1.0]);
        assert_eq!(run.trails[2].pheromone, vec![1.0]);
    }

    #[test]
    fn test_pheromone_stays_in_band() {
        let problem = create_test_problem();
        let config = ACOConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut run = ACORun::new(&config, &problem, &mut rng);

        let ant = Ant {
            quantities: vec![20, 10, 0],
            violation: 0.0,
            score: 230.0,
        };
        run.update_pheromone(Some(&ant));
        assert_eq!(run.trails[0].pheromone[20], config.max_pheromone);

        for _ in 0..50 {
            run.update_pheromone(None);
        }
        for trail in &run.trails {
            assert!(trail.pheromone.iter().all(|&t| t == config.min_pheromone));
        }
    }

    #[test]
    fn test_assess_repairs_or_discards() {
        let problem = create_test_problem();
        // production 2*30 + 20 = 80 > 50
        let over = vec![30, 20, 0];

        let repaired = assess(&problem, InfeasibleAnts::Repair, over.clone()).unwrap();
        assert!(problem.is_feasible(&repaired.quantities));
        assert!((repaired.violation - 30.0).abs() < 1e-9);

        assert!(assess(&problem, InfeasibleAnts::Discard, over).is_none());
    }

    #[test]
    fn test_ant_colony() {
        let problem = create_test_problem();
        let aco = AntColonyOptimization::new(ACOConfig {
            num_ants: 30,
            max_iterations: 20,
            ..Default::default()
        });
        let result = aco.run(&problem, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();

        assert!(result.is_feasible());
        assert_eq!(result.quantities[2], 0);
        assert!(result.iterations <= 20);
        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_no_feasible_ant_means_no_solution() {
        let a = product("a", 10.0, 2.0, 30.0);
        let limits = Limits { logistics_budget: -1.0, ..ample_limits() };
        let problem = Problem::new(vec![a], limits).unwrap();

        for handling in [InfeasibleAnts::Repair, InfeasibleAnts::Discard] {
            let aco = AntColonyOptimization::new(ACOConfig {
                num_ants: 5,
                infeasible_ants: handling,
                ..Default::default()
            });
            let result = aco.run(&problem, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
            assert_eq!(result.outcome, Outcome::NoSolution);
            assert_eq!(result.raw_profit, 0.0);
            assert!(result.quantities.is_empty());
            assert!(result.products.is_empty());
        }
    }

    #[test]
    fn test_overflowing_weights_fall_back_to_uniform() {
        let problem = create_test_problem();
        let aco = AntColonyOptimization::new(ACOConfig {
            alpha: 1e4,
            num_ants: 10,
            max_iterations: 3,
            ..Default::default()
        });
        let result = aco.run(&problem, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert!(result.is_feasible());
    }

    #[test]
    fn test_huge_headroom_is_rejected_before_allocating() {
        let problem = Problem::new(
            vec![product("a", 10.0, 2.0, 30.0), product("bulk", 10.0, 2.0, 1e9)],
            ample_limits(),
        )
        .unwrap();

        let err = AntColonyOptimization::default()
            .run(&problem, &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        match err {
            ConfigError::HeadroomTooLarge { index, headroom, .. } => {
                assert_eq!(index, 1);
                assert_eq!(headroom, 1_000_000_000);
            }
            other => panic!("expected HeadroomTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(ACOConfig::default().validate().is_ok());

        let bad = [
            ACOConfig { num_ants: 0, ..Default::default() },
            ACOConfig { max_iterations: 0, ..Default::default() },
            ACOConfig { alpha: -1.0, ..Default::default() },
            ACOConfig { beta: f64::INFINITY, ..Default::default() },
            ACOConfig { evaporation_rate: 1.2, ..Default::default() },
            ACOConfig { min_pheromone: 0.0, ..Default::default() },
            ACOConfig { max_pheromone: 0.001, ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err());
        }
    }
}
