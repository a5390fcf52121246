//! Pick one response among those whose conditions all hold.

use chess_core::MoveEvent;
use rand::Rng;
use tracing::debug;

use crate::condition::all_match;
use crate::personality::Response;

/// Responses whose whole condition list holds for `event`, in document order.
pub fn matching<'a>(candidates: &'a [Response], event: &MoveEvent) -> Vec<&'a Response> {
    candidates
        .iter()
        .filter(|r| all_match(&r.conditions, event))
        .collect()
}

/// Weighted draw. Returns exactly one response whenever `pool` is non-empty.
pub fn weighted_pick<'a, R: Rng + ?Sized>(pool: &[&'a Response], rng: &mut R) -> Option<&'a Response> {
    let last = *pool.last()?;
    let mut scale = 1.0;
    let mut total: f64 = pool.iter().map(|r| effective_weight(r)).sum();
    if !total.is_finite() {
        // Individually valid weights can still overflow the sum
        scale = pool.iter().map(|r| effective_weight(r)).fold(0.0, f64::max);
        total = pool.iter().map(|r| effective_weight(r) / scale).sum();
    }
    if total <= 0.0 || !total.is_finite() {
        return pool.get(rng.gen_range(0..pool.len())).copied();
    }

    let mut remaining = rng.gen_range(0.0..total);
    for &response in pool {
        remaining -= effective_weight(response) / scale;
        if remaining <= 0.0 {
            return Some(response);
        }
    }
    // Float residue after the last subtraction
    Some(last)
}

/// Filter then draw. `None` when nothing matches, which is a normal outcome.
pub fn select<'a, R: Rng + ?Sized>(
    candidates: &'a [Response],
    event: &MoveEvent,
    rng: &mut R,
) -> Option<&'a Response> {
    let pool = matching(candidates, event);
    if pool.is_empty() {
        debug!(san = %event.san, candidates = candidates.len(), "No response matched");
        return None;
    }
    weighted_pick(&pool, rng)
}

fn effective_weight(response: &Response) -> f64 {
    let w = response.weight();
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}
