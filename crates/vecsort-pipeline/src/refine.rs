//! Transit refinement: a local search that repairs the longest transit.
//!
//! One step finds the longest pen-up move in a tour, relocates the
//! segment it leads into so that it directly follows the earlier
//! segment whose end lies closest to its start, then re-runs the greedy
//! optimizer over everything after the relocated segment. The candidate
//! is kept only if its total transit is strictly shorter, so a step can
//! never make a tour worse.
//!
//! Refinement is off by default. [`refine_iteratively`] applies steps
//! under a caller-supplied cap and stops at the first step that does
//! not help.

use serde::{Deserialize, Serialize};

use crate::optimize::optimize_tour;
use crate::store::SegmentStore;
use crate::types::{PipelineError, Point, Segment, Tour};

/// Outcome of [`refine_iteratively`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RefineSummary {
    /// Steps that were attempted, including the final unproductive one.
    pub iterations: u32,
    /// Total transit removed from the tour.
    pub improvement: f64,
}

/// Locate the longest transit as `(segment index, length)`.
///
/// Only moves between consecutive segments compete; the approach from
/// the tour's start into the first segment has nothing before it to
/// relocate after. Transits within tolerance of zero are ignored and
/// ties keep the earliest.
#[must_use]
pub fn longest_transit(tour: &Tour) -> Option<(usize, f64)> {
    let mut longest: Option<(usize, f64)> = None;
    for (index, from, to) in tour.transits().filter(|&(index, _, _)| index > 0) {
        let length = from.distance(to);
        if longest.is_none_or(|(_, best)| best < length) {
            longest = Some((index, length));
        }
    }
    longest
}

/// Among `segments[..before]`, the one whose `b` endpoint is closest to
/// `target`. Ties keep the later segment.
fn closest_predecessor(segments: &[Segment], before: usize, target: Point) -> Option<usize> {
    let mut closest = None;
    let mut min_dist = f64::INFINITY;
    for (index, segment) in segments.iter().take(before).enumerate() {
        let dist = segment.b.distance_squared(target);
        if dist <= min_dist {
            min_dist = dist;
            closest = Some(index);
        }
    }
    closest
}

/// Apply one refinement step to `tour`.
///
/// Returns the reduction in total transit (initial minus new). A
/// non-positive value means the tour was left unchanged and further
/// steps are pointless.
///
/// # Errors
///
/// Propagates [`PipelineError::OptimizerInvariant`] from re-running the
/// optimizer over the tail of the tour.
pub fn refine_tour(tour: &mut Tour) -> Result<f64, PipelineError> {
    let initial = tour.transit_length();

    let Some((long_index, long_length)) = longest_transit(tour) else {
        tracing::debug!(pass = %tour.pass(), "no transit to refine");
        return Ok(0.0);
    };

    let mut segments = tour.segments().to_vec();
    let moved = segments[long_index];
    let Some(anchor) = closest_predecessor(&segments, long_index, moved.a) else {
        return Ok(0.0);
    };

    tracing::debug!(
        pass = %tour.pass(),
        total = initial,
        longest = long_length,
        x = moved.a.x,
        y = moved.a.y,
        "relocating longest transit",
    );

    // Splice the long-transit segment in after the anchor, then re-sort
    // everything behind it starting from its end point.
    segments.remove(long_index);
    let insert_at = anchor + 1;
    segments.insert(insert_at, moved);

    let mut tail = SegmentStore::new();
    for segment in segments.drain(insert_at + 1..) {
        tail.push_back(segment);
    }
    let reordered = optimize_tour(tour.pass(), &mut tail, moved.b)?;
    segments.extend(reordered.into_segments());

    let candidate = Tour::from_segments(tour.pass(), tour.start(), segments);
    let refined = candidate.transit_length();
    let reduction = initial - refined;

    tracing::debug!(pass = %tour.pass(), refined, reduction, "refine step");

    if refined < initial {
        *tour = candidate;
    }
    Ok(reduction)
}

/// Run up to `max_iterations` refinement steps, stopping at the first
/// one that does not shorten the tour.
///
/// # Errors
///
/// Propagates errors from [`refine_tour`].
pub fn refine_iteratively(
    tour: &mut Tour,
    max_iterations: u32,
) -> Result<RefineSummary, PipelineError> {
    let mut summary = RefineSummary::default();
    while summary.iterations < max_iterations {
        summary.iterations += 1;
        let reduction = refine_tour(tour)?;
        if reduction <= 0.0 {
            break;
        }
        summary.improvement += reduction;
    }
    Ok(summary)
}
