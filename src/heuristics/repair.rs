//! Repair operator shared by both search strategies.
//!
//! Repair first clips every quantity to its demand headroom, then removes
//! single units from the product with the largest weighted footprint
//! `q[i] · (production + marketing + logistics + shelf_space)` until the
//! budgets and the shelf capacity hold. Ties go to the lowest index.
//!
//! The result never exceeds the input componentwise, and repairing a
//! repaired vector returns it unchanged.

use crate::problem::Problem;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Repair `q` in place.
///
/// If every quantity reaches zero and a constraint still fails (for example a
/// negative budget, or existing stock that already overflows the shelf), the
/// all-zero vector is left in `q` and the caller sees an infeasible result.
pub fn repair_in_place(problem: &Problem, q: &mut [u32]) {
    debug_assert_eq!(q.len(), problem.len());

    for (i, qty) in q.iter_mut().enumerate() {
        *qty = (*qty).min(problem.max_feasible_qty(i));
    }

    let mut usage = problem.usage(q);
    if usage.fits(problem) {
        return;
    }

    let weights: Vec<f64> = problem
        .products()
        .iter()
        .map(|p| p.production_cost + p.marketing_cost + p.logistics_cost + p.shelf_space)
        .collect();

    // One entry per product with units left; only the popped entry changes.
    let mut heap: BinaryHeap<(OrderedFloat<f64>, Reverse<usize>)> = q
        .iter()
        .enumerate()
        .filter(|&(_, &qty)| qty > 0)
        .map(|(i, &qty)| (OrderedFloat(qty as f64 * weights[i]), Reverse(i)))
        .collect();

    loop {
        if usage.fits(problem) {
            // The running totals drift; confirm with a fresh sum.
            let fresh = problem.usage(q);
            if fresh.fits(problem) {
                return;
            }
            usage = fresh;
        }

        let Some((_, Reverse(i))) = heap.pop() else {
            return;
        };

        q[i] -= 1;
        let p = problem.product(i);
        usage.production -= p.production_cost;
        usage.marketing -= p.marketing_cost;
        usage.logistics -= p.logistics_cost;
        usage.shelf -= p.shelf_space;

        if q[i] > 0 {
            heap.push((OrderedFloat(q[i] as f64 * weights[i]), Reverse(i)));
        }
    }
}

/// Return a repaired copy of `q`.
pub fn repair(problem: &Problem, q: &[u32]) -> Vec<u32> {
    let mut repaired = q.to_vec();
    repair_in_place(problem, &mut repaired);
    repaired
}
