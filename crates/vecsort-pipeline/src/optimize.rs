//! Tour optimization: order and orient segments to minimize transit.
//!
//! Uses a nearest-neighbor greedy heuristic on segment endpoints. From
//! the current pen position every remaining segment is scored by the
//! squared distance to both of its endpoints; the single closest
//! endpoint wins, and the segment is reversed when that endpoint was
//! its `b`. The pen then moves to the far end and the search repeats
//! until the store is empty.
//!
//! Ties go to the first candidate seen under strict `<` (store order,
//! `a` before `b`), so the result is deterministic. The search is O(n²)
//! per pass and does not split segments.

use crate::store::{SegmentId, SegmentStore};
use crate::types::{Pass, PipelineError, Point, Tour};

/// The segment endpoint nearest to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    /// Handle of the winning segment.
    pub id: SegmentId,
    /// `true` if the nearest endpoint was `b`.
    pub reversed: bool,
    /// Squared distance from the query point to that endpoint.
    pub distance_squared: f64,
}

/// Find the stored segment endpoint nearest to `from`.
///
/// Returns `None` only for an empty store.
#[must_use]
pub fn find_closest(store: &SegmentStore, from: Point) -> Option<Closest> {
    let mut best: Option<Closest> = None;
    let mut best_dist = f64::INFINITY;

    for (id, segment) in store {
        let dist_a = from.distance_squared(segment.a);
        if dist_a < best_dist {
            best_dist = dist_a;
            best = Some(Closest {
                id,
                reversed: false,
                distance_squared: dist_a,
            });
        }

        let dist_b = from.distance_squared(segment.b);
        if dist_b < best_dist {
            best_dist = dist_b;
            best = Some(Closest {
                id,
                reversed: true,
                distance_squared: dist_b,
            });
        }
    }

    best
}

/// Move every segment of `store` into a new tour starting at `start`.
///
/// The store is empty afterwards. The returned tour's
/// [`end`](Tour::end) is the pen position for whatever comes next.
///
/// # Errors
///
/// Returns [`PipelineError::OptimizerInvariant`] if the store still
/// holds segments but yields no candidate, which means its bookkeeping
/// is corrupt.
pub fn optimize_tour(
    pass: Pass,
    store: &mut SegmentStore,
    start: Point,
) -> Result<Tour, PipelineError> {
    let mut tour = Tour::new(pass, start);

    while !store.is_empty() {
        let remaining = store.len();
        let invariant = move || PipelineError::OptimizerInvariant { pass, remaining };

        let closest = find_closest(store, tour.end()).ok_or_else(invariant)?;
        let mut segment = store.remove(closest.id).ok_or_else(invariant)?;
        if closest.reversed {
            segment.reverse();
        }
        tour.push(segment);
    }

    Ok(tour)
}
