//! Genetic Algorithm for the restocking problem.
//!
//! Each product's order quantity is encoded as a fixed-width binary field,
//! most significant bit first, and the chromosome is the concatenation of
//! those fields. Every generation:
//! - repairs and scores each candidate with the penalized profit
//! - keeps the best candidate seen so far (replaced only on strict improvement)
//! - breeds the next population by tournament selection, one-point crossover
//!   and per-bit mutation, with the best candidate copied in first

use crate::error::ConfigError;
use crate::heuristics::repair::repair_in_place;
use crate::heuristics::{SearchContext, SearchStrategy};
use crate::problem::Problem;
use crate::solution::OptimizationResult;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::seq::index;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::time::Instant;

/// Widest supported quantity field
pub const MAX_BITS_PER_PRODUCT: u32 = 31;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Probability that a parent pair is recombined
    pub crossover_prob: f64,
    /// Probability that a single bit is flipped
    pub mutation_prob: f64,
    /// Candidates drawn (without replacement) per tournament
    pub tournament_size: usize,
    /// Width of each product's quantity field
    pub bits_per_product: u32,
    /// Score each generation on the rayon thread pool
    pub parallel: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 50,
            max_generations: 100,
            crossover_prob: 0.7,
            mutation_prob: 0.01,
            tournament_size: 3,
            bits_per_product: 10,
            parallel: false,
            seed: 42,
        }
    }
}

impl GAConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::parameter("population_size", "must be at least 2"));
        }
        if self.max_generations == 0 {
            return Err(ConfigError::parameter("max_generations", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err(ConfigError::parameter(
                "crossover_prob",
                format!("must lie in [0, 1], got {}", self.crossover_prob),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err(ConfigError::parameter(
                "mutation_prob",
                format!("must lie in [0, 1], got {}", self.mutation_prob),
            ));
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::parameter("tournament_size", "must be at least 1"));
        }
        if !(1..=MAX_BITS_PER_PRODUCT).contains(&self.bits_per_product) {
            return Err(ConfigError::parameter(
                "bits_per_product",
                format!("must lie in 1..={}, got {}", MAX_BITS_PER_PRODUCT, self.bits_per_product),
            ));
        }
        Ok(())
    }

    /// Smallest field width able to encode every product's demand headroom.
    pub fn bits_for(problem: &Problem) -> u32 {
        let max_qty = (0..problem.len())
            .map(|i| problem.max_feasible_qty(i))
            .max()
            .unwrap_or(0);
        (u32::BITS - max_qty.leading_zeros()).clamp(1, MAX_BITS_PER_PRODUCT)
    }

    /// Set `bits_per_product` from the problem's demand headroom.
    pub fn with_bits_for(mut self, problem: &Problem) -> Self {
        self.bits_per_product = Self::bits_for(problem);
        self
    }
}

/// Bit-string encoding of a quantity vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    bits: Vec<bool>,
}

impl Chromosome {
    /// Uniformly random bits
    pub fn random<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        Chromosome {
            bits: (0..len).map(|_| rng.gen::<bool>()).collect(),
        }
    }

    /// Encode `quantities` with `width` bits each. Values must fit the width.
    pub fn encode(quantities: &[u32], width: u32) -> Self {
        let mut bits = Vec::with_capacity(quantities.len() * width as usize);
        for &q in quantities {
            debug_assert!(width >= 32 || q < (1 << width));
            for k in (0..width).rev() {
                bits.push((q >> k) & 1 == 1);
            }
        }
        Chromosome { bits }
    }

    pub fn decode(&self, width: u32) -> Vec<u32> {
        self.bits
            .chunks(width as usize)
            .map(|field| field.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// One-point crossover at `cut`, returning both children.
    pub fn crossover(&self, other: &Chromosome, cut: usize) -> (Chromosome, Chromosome) {
        let mut first = self.bits[..cut].to_vec();
        first.extend_from_slice(&other.bits[cut..]);
        let mut second = other.bits[..cut].to_vec();
        second.extend_from_slice(&self.bits[cut..]);
        (Chromosome { bits: first }, Chromosome { bits: second })
    }

    /// Flip each bit independently with probability `rate`.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R, rate: f64) {
        for bit in self.bits.iter_mut() {
            if rng.gen::<f64>() < rate {
                *bit = !*bit;
            }
        }
    }
}

/// Individual in the genetic algorithm population
#[derive(Debug, Clone)]
pub struct Individual {
    /// Repaired encoding
    pub chromosome: Chromosome,
    /// Decoded, repaired quantities
    pub quantities: Vec<u32>,
    /// Penalized profit of `quantities`
    pub fitness: f64,
}

impl Individual {
    /// Decode, repair and re-encode `chromosome`, then score it.
    pub fn new(chromosome: Chromosome, problem: &Problem, width: u32) -> Self {
        let mut quantities = chromosome.decode(width);
        repair_in_place(problem, &mut quantities);
        let fitness = problem.penalized_profit(&quantities);

        Individual {
            chromosome: Chromosome::encode(&quantities, width),
            quantities,
            fitness,
        }
    }
}

/// Genetic Algorithm strategy
#[derive(Debug, Clone, Default)]
pub struct GeneticAlgorithm {
    config: GAConfig,
}

impl GeneticAlgorithm {
    pub fn new(config: GAConfig) -> Self {
        GeneticAlgorithm { config }
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }
}

impl SearchStrategy for GeneticAlgorithm {
    fn name(&self) -> &str {
        "GA"
    }

    fn run_with(
        &self,
        problem: &Problem,
        rng: &mut dyn RngCore,
        ctx: &SearchContext<'_>,
    ) -> Result<OptimizationResult, ConfigError> {
        self.config.validate()?;

        let width = self.config.bits_per_product;
        if width < GAConfig::bits_for(problem) {
            log::warn!(
                "[GA] {} bits per product cannot encode the largest demand headroom ({} bits needed)",
                width,
                GAConfig::bits_for(problem)
            );
        }

        let mut run = GARun {
            config: &self.config,
            problem,
            rng,
            population: Vec::new(),
            best: None,
            history: Vec::with_capacity(self.config.max_generations),
            generation: 0,
        };
        Ok(run.run(ctx))
    }
}

/// State of a single GA run
struct GARun<'a> {
    config: &'a GAConfig,
    problem: &'a Problem,
    rng: &'a mut dyn RngCore,
    population: Vec<Chromosome>,
    best: Option<Individual>,
    history: Vec<f64>,
    generation: usize,
}

impl GARun<'_> {
    fn total_bits(&self) -> usize {
        self.config.bits_per_product as usize * self.problem.len()
    }

    fn initialize_population(&mut self) {
        let total_bits = self.total_bits();
        self.population = (0..self.config.population_size)
            .map(|_| Chromosome::random(&mut *self.rng, total_bits))
            .collect();
    }

    /// Repair and score the current population.
    fn evaluate(&mut self) -> Vec<Individual> {
        let problem = self.problem;
        let width = self.config.bits_per_product;
        let population = std::mem::take(&mut self.population);

        if self.config.parallel {
            population
                .into_par_iter()
                .map(|c| Individual::new(c, problem, width))
                .collect()
        } else {
            population
                .into_iter()
                .map(|c| Individual::new(c, problem, width))
                .collect()
        }
    }

    /// Tournament over distinct candidates; the earliest drawn wins ties.
    fn tournament_select<'p>(&mut self, scored: &'p [Individual]) -> &'p Individual {
        let k = self.config.tournament_size.min(scored.len());
        let picks = index::sample(&mut *self.rng, scored.len(), k);

        let mut winner = &scored[picks.index(0)];
        for i in picks.iter().skip(1) {
            if scored[i].fitness > winner.fitness {
                winner = &scored[i];
            }
        }
        winner
    }

    /// Build the next population from the scored one.
    fn evolve(&mut self, scored: &[Individual], elite: &Chromosome) {
        let size = self.config.population_size;
        let total_bits = self.total_bits();
        let width = self.config.bits_per_product;

        let mut next = Vec::with_capacity(size);
        next.push(elite.clone());

        while next.len() < size {
            let parent1 = self.tournament_select(scored);
            let parent2 = self.tournament_select(scored);

            let (mut child1, mut child2) =
                if total_bits >= 2 && self.rng.gen::<f64>() < self.config.crossover_prob {
                    let cut = self.rng.gen_range(1..total_bits);
                    parent1.chromosome.crossover(&parent2.chromosome, cut)
                } else {
                    (parent1.chromosome.clone(), parent2.chromosome.clone())
                };

            child1.mutate(&mut *self.rng, self.config.mutation_prob);
            child2.mutate(&mut *self.rng, self.config.mutation_prob);

            for child in [child1, child2] {
                if next.len() < size {
                    let mut quantities = child.decode(width);
                    repair_in_place(self.problem, &mut quantities);
                    next.push(Chromosome::encode(&quantities, width));
                }
            }
        }

        self.population = next;
    }

    fn run(&mut self, ctx: &SearchContext<'_>) -> OptimizationResult {
        let start = Instant::now();
        let mut cancelled = false;

        self.initialize_population();

        while self.generation < self.config.max_generations {
            if ctx.is_cancelled() {
                cancelled = true;
                break;
            }

            let scored = self.evaluate();

            let Some((idx, generation_best)) = scored
                .iter()
                .enumerate()
                .max_by_key(|&(i, ind)| (OrderedFloat(ind.fitness), Reverse(i)))
            else {
                break;
            };

            let best = match self.best.take() {
                Some(best) if best.fitness >= generation_best.fitness => best,
                _ => {
                    log::debug!(
                        "[GA] Gen {}  new best {:.3} (candidate {})",
                        self.generation + 1,
                        generation_best.fitness,
                        idx
                    );
                    generation_best.clone()
                }
            };
            let best_fitness = best.fitness;
            let elite = best.chromosome.clone();
            self.best = Some(best);

            self.history.push(best_fitness);
            self.generation += 1;
            ctx.report("GA", self.generation, self.config.max_generations, best_fitness);

            self.evolve(&scored, &elite);
        }

        let mut result = match self.best.take() {
            Some(best) => OptimizationResult::from_quantities(self.problem, best.quantities, "GA"),
            None => OptimizationResult::no_solution("GA"),
        };
        result.iterations = self.generation;
        result.cancelled = cancelled;
        result.history = std::mem::take(&mut self.history);
        result.computation_time = start.elapsed().as_secs_f64();

        log::info!(
            "[GA] {} generations, best penalized profit {:.3}, {} in {:.2}s",
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
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::AtomicBool;

    fn create_test_problem() -> Problem {
        let mut a = product("a", 12.0, 3.0, 40.0);
        a.age = 8.0;
        a.stock = 10.0;
        let mut b = product("b", 9.0, 2.0, 30.0);
        b.marketing_cost = 1.0;
        b.age = 2.0;
        b.stock = 4.0;
        let c = product("c", 5.0, 1.0, 60.0);
        let limits = Limits {
            production_budget: 120.0,
            marketing_budget: 20.0,
            shelf_capacity: 90.0,
            discount_base: 0.3,
            ..ample_limits()
        };
        Problem::new(vec![a, b, c], limits).unwrap()
    }

    #[test]
    fn test_encoding_is_msb_first() {
        let chromosome = Chromosome::encode(&[5, 1], 3);
        assert_eq!(chromosome.bits(), &[true, false, true, false, false, true]);
        assert_eq!(chromosome.decode(3), vec![5, 1]);
    }

    #[test]
    fn test_crossover_swaps_tails() {
        let a = Chromosome::encode(&[0b1111], 4);
        let b = Chromosome::encode(&[0b0000], 4);
        let (c1, c2) = a.crossover(&b, 1);
        assert_eq!(c1.decode(4), vec![0b1000]);
        assert_eq!(c2.decode(4), vec![0b0111]);
    }

    #[test]
    fn test_bits_for_covers_headroom() {
        let problem = Problem::new(vec![product("a", 10.0, 4.0, 100.0)], ample_limits()).unwrap();
        assert_eq!(GAConfig::bits_for(&problem), 7);

        let empty_headroom = Problem::new(vec![product("z", 10.0, 4.0, 0.0)], ample_limits()).unwrap();
        assert_eq!(GAConfig::bits_for(&empty_headroom), 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(GAConfig::default().validate().is_ok());

        let bad = [
            GAConfig { population_size: 1, ..Default::default() },
            GAConfig { max_generations: 0, ..Default::default() },
            GAConfig { crossover_prob: 1.5, ..Default::default() },
            GAConfig { mutation_prob: f64::NAN, ..Default::default() },
            GAConfig { tournament_size: 0, ..Default::default() },
            GAConfig { bits_per_product: 0, ..Default::default() },
            GAConfig { bits_per_product: 32, ..Default::default() },
        ];
        for config in bad {
            let err = GeneticAlgorithm::new(config)
                .run(&create_test_problem(), &mut ChaCha8Rng::seed_from_u64(0))
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_genetic_algorithm() {
        let problem = create_test_problem();
        let config = GAConfig {
            population_size: 20,
            max_generations: 30,
            ..Default::default()
        }
        .with_bits_for(&problem);

        let ga = GeneticAlgorithm::new(config);
        let result = ga.run(&problem, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();

        assert!(result.is_feasible());
        assert_eq!(result.quantities.len(), 3);
        assert_eq!(result.iterations, 30);
        assert_eq!(result.history.len(), 30);
        assert!(result.penalized_profit > 0.0);
    }

    #[test]
    fn test_elitism_keeps_history_monotone() {
        let problem = create_test_problem();
        let config = GAConfig {
            population_size: 10,
            max_generations: 60,
            mutation_prob: 0.2,
            ..Default::default()
        }
        .with_bits_for(&problem);

        let result = GeneticAlgorithm::new(config)
            .run(&problem, &mut ChaCha8Rng::seed_from_u64(3))
            .unwrap();

        assert!(result.history.windows(2).all(|w| w[1] >= w[0]));
        let last = *result.history.last().unwrap();
        assert!((result.penalized_profit - last).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_result() {
        let problem = create_test_problem();
        let config = GAConfig { max_generations: 15, ..Default::default() }.with_bits_for(&problem);
        let ga = GeneticAlgorithm::new(config.clone());

        let a = ga.run(&problem, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = ga.run(&problem, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(a.quantities, b.quantities);
        assert_eq!(a.history, b.history);

        let parallel = GeneticAlgorithm::new(GAConfig { parallel: true, ..config })
            .run(&problem, &mut ChaCha8Rng::seed_from_u64(11))
            .unwrap();
        assert_eq!(a.quantities, parallel.quantities);
    }

    #[test]
    fn test_infeasible_instance_runs_to_completion() {
        let limits = Limits { logistics_budget: -1.0, ..ample_limits() };
        let problem = Problem::new(
            vec![product("a", 10.0, 2.0, 30.0), product("b", 7.0, 1.0, 20.0)],
            limits,
        )
        .unwrap();
        let config = GAConfig { max_generations: 8, ..Default::default() }.with_bits_for(&problem);

        let result = GeneticAlgorithm::new(config)
            .run(&problem, &mut ChaCha8Rng::seed_from_u64(4))
            .unwrap();
        assert_eq!(result.outcome, crate::solution::Outcome::Infeasible);
        assert_eq!(result.quantities, vec![0, 0]);
        assert_eq!(result.iterations, 8);
        assert_eq!(result.history, vec![0.0; 8]);
        assert!(!result.is_feasible());
    }

    #[test]
    fn test_cancelled_before_start() {
        let problem = create_test_problem();
        let flag = AtomicBool::new(true);
        let ctx = SearchContext::new().with_cancel(&flag);

        let result = GeneticAlgorithm::default()
            .run_with(&problem, &mut ChaCha8Rng::seed_from_u64(1), &ctx)
            .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.outcome, crate::solution::Outcome::NoSolution);
    }

    #[test]
    fn test_observer_sees_every_generation() {
        let problem = create_test_problem();
        let seen = std::cell::RefCell::new(Vec::new());
        let observer = |_: &str, generation: usize, total: usize, _: f64| {
            seen.borrow_mut().push((generation, total));
        };
        let ctx = SearchContext::new().with_observer(&observer);
        let config = GAConfig { max_generations: 5, ..Default::default() };

        GeneticAlgorithm::new(config)
            .run_with(&problem, &mut ChaCha8Rng::seed_from_u64(2), &ctx)
            .unwrap();
        assert_eq!(*seen.borrow(), vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }
}
