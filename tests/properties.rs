//! Property tests for the repair operator and the objective.
//!
//! Costs are drawn as small integers so every usage sum is exact.

use proptest::prelude::*;
use restock_optimizer::heuristics::repair;
use restock_optimizer::{Limits, Problem, ProductParams};

prop_compose! {
    fn arb_product()(
        costs in prop::array::uniform4(0u32..5),
        margin in 0u32..10,
        age in 0u32..20,
        stock in 0u32..10,
        demand in 0u32..40,
        shelf_space in 0u32..3,
    ) -> ProductParams {
        let [production, marketing, logistics, shelf] = costs;
        ProductParams {
            name: String::from("p"),
            price: (production + marketing + logistics + shelf + margin) as f64,
            production_cost: production as f64,
            marketing_cost: marketing as f64,
            logistics_cost: logistics as f64,
            shelf_cost: shelf as f64,
            age: age as f64,
            stock: stock as f64,
            demand: demand as f64,
            shelf_space: shelf_space as f64,
        }
    }
}

prop_compose! {
    fn arb_limits()(
        budgets in prop::array::uniform3(0u32..200),
        shelf_capacity in 0u32..200,
        discount in 0.0f64..1.0,
    ) -> Limits {
        Limits {
            production_budget: budgets[0] as f64,
            marketing_budget: budgets[1] as f64,
            logistics_budget: budgets[2] as f64,
            shelf_capacity: shelf_capacity as f64,
            discount_base: discount,
        }
    }
}

prop_compose! {
    fn arb_case()(products in prop::collection::vec(arb_product(), 1..6), limits in arb_limits())
        (q in prop::collection::vec(0u32..60, products.len()), products in Just(products), limits in Just(limits))
        -> (Problem, Vec<u32>)
    {
        (Problem::new(products, limits).unwrap(), q)
    }
}

/// Unit-by-unit removal recomputing every sum from scratch.
fn reference_repair(problem: &Problem, q: &[u32]) -> Vec<u32> {
    let mut q: Vec<u32> = q
        .iter()
        .enumerate()
        .map(|(i, &qty)| qty.min(problem.max_feasible_qty(i)))
        .collect();

    while !problem.usage(&q).fits(problem) {
        let mut pick: Option<(usize, f64)> = None;
        for (i, p) in problem.products().iter().enumerate() {
            if q[i] == 0 {
                continue;
            }
            let w = p.production_cost + p.marketing_cost + p.logistics_cost + p.shelf_space;
            let score = q[i] as f64 * w;
            if pick.map_or(true, |(_, best)| score > best) {
                pick = Some((i, score));
            }
        }
        match pick {
            Some((i, _)) => q[i] -= 1,
            None => break,
        }
    }
    q
}

proptest! {
    #[test]
    fn repair_is_idempotent((problem, q) in arb_case()) {
        let once = repair(&problem, &q);
        prop_assert_eq!(repair(&problem, &once), once);
    }

    #[test]
    fn repair_never_increases_a_quantity((problem, q) in arb_case()) {
        let repaired = repair(&problem, &q);
        prop_assert_eq!(repaired.len(), q.len());
        for (r, o) in repaired.iter().zip(&q) {
            prop_assert!(r <= o);
        }
    }

    #[test]
    fn repair_is_feasible_when_ordering_nothing_is((problem, q) in arb_case()) {
        prop_assume!(problem.is_feasible(&vec![0; problem.len()]));
        let repaired = repair(&problem, &q);
        prop_assert!(problem.is_feasible(&repaired));
        prop_assert_eq!(problem.violation(&repaired), 0.0);
    }

    #[test]
    fn repair_matches_unit_step_reference((problem, q) in arb_case()) {
        prop_assert_eq!(repair(&problem, &q), reference_repair(&problem, &q));
    }

    #[test]
    fn discount_never_raises_profit((problem, q) in arb_case()) {
        let raw = problem.raw_profit(&q);
        let penalized = problem.penalized_profit(&q);
        prop_assert!(penalized <= raw + 1e-9);
        if problem.limits().discount_base == 0.0 {
            prop_assert_eq!(penalized, raw);
        }
    }
}
