//! Path emission: turn ordered tours into pen commands.
//!
//! Consecutive segments that touch (within tolerance) are merged into a
//! single pen-down run. Every other segment starts with a pen-up move to
//! its `a` endpoint. The first segment of each pass always starts with
//! a move, since a pass marker may reset the device.
//!
//! Power, speed, and other device settings are out of scope here.

use serde::{Deserialize, Serialize};

use crate::types::{Pass, Point, Polyline, Tour};

/// One abstract instruction for the device collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    /// Start of a pass; the device selects the matching settings.
    Pass(Pass),
    /// Lift the pen and move to the point.
    MoveTo(Point),
    /// Pen down and draw to the point.
    LineTo(Point),
}

/// Split a tour into maximal runs of touching segments.
///
/// Each run is a polyline starting at the `a` endpoint of its first
/// segment. An empty tour has no runs.
#[must_use]
pub fn pen_down_runs(tour: &Tour) -> Vec<Polyline> {
    let mut runs: Vec<Polyline> = Vec::new();
    let mut previous_end: Option<Point> = None;

    for segment in tour.segments() {
        let continues = previous_end.is_some_and(|end| end.approx_eq(segment.a));
        if continues && let Some(run) = runs.last_mut() {
            run.push(segment.b);
        } else {
            runs.push(Polyline::new(vec![segment.a, segment.b]));
        }
        previous_end = Some(segment.b);
    }

    runs
}

/// Append the commands for one tour to `out`.
///
/// Empty tours emit nothing, not even a pass marker.
pub fn emit_tour(tour: &Tour, out: &mut Vec<PathCommand>) {
    if tour.is_empty() {
        return;
    }

    out.push(PathCommand::Pass(tour.pass()));
    for run in pen_down_runs(tour) {
        let mut points = run.points().iter().copied();
        if let Some(first) = points.next() {
            out.push(PathCommand::MoveTo(first));
        }
        out.extend(points.map(PathCommand::LineTo));
    }
}

/// Emit several tours in the given order.
#[must_use]
pub fn emit_tours<'a>(tours: impl IntoIterator<Item = &'a Tour>) -> Vec<PathCommand> {
    let mut out = Vec::new();
    for tour in tours {
        emit_tour(tour, &mut out);
    }
    out
}

/// Number of pen lifts (`MoveTo` commands) in a stream.
#[must_use]
pub fn pen_lifts(commands: &[PathCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, PathCommand::MoveTo(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    fn tour(segments: Vec<Segment>) -> Tour {
        Tour::from_segments(Pass::Red, Point::ORIGIN, segments)
    }

    #[test]
    fn empty_tour_emits_nothing() {
        let mut out = Vec::new();
        emit_tour(&tour(Vec::new()), &mut out);
        assert!(out.is_empty());
        assert!(pen_down_runs(&tour(Vec::new())).is_empty());
    }

    #[test]
    fn closed_triangle_is_one_run() {
        let t = tour(vec![
            seg(0.0, 0.0, 10.0, 0.0),
            seg(10.0, 0.0, 10.0, 10.0),
            seg(10.0, 10.0, 0.0, 0.0),
        ]);
        let mut out = Vec::new();
        emit_tour(&t, &mut out);
        assert_eq!(
            out,
            vec![
                PathCommand::Pass(Pass::Red),
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 0.0)),
                PathCommand::LineTo(Point::new(10.0, 10.0)),
                PathCommand::LineTo(Point::new(0.0, 0.0)),
            ],
        );
        assert_eq!(pen_lifts(&out), 1);
    }

    #[test]
    fn gap_lifts_the_pen() {
        let t = tour(vec![seg(0.0, 0.0, 1.0, 0.0), seg(2.0, 0.0, 3.0, 0.0)]);
        let runs = pen_down_runs(&t);
        assert_eq!(runs.len(), 2);

        let out = emit_tours([&t]);
        assert_eq!(
            &out[1..],
            &[
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(1.0, 0.0)),
                PathCommand::MoveTo(Point::new(2.0, 0.0)),
                PathCommand::LineTo(Point::new(3.0, 0.0)),
            ],
        );
    }

    #[test]
    fn touching_within_tolerance_continues() {
        let t = tour(vec![seg(0.0, 0.0, 1.0, 0.0), seg(1.0 + 1e-10, 0.0, 2.0, 0.0)]);
        let out = emit_tours([&t]);
        assert_eq!(pen_lifts(&out), 1);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn passes_are_marked_in_given_order() {
        let red = tour(vec![seg(0.0, 0.0, 1.0, 0.0)]);
        let blue = Tour::from_segments(Pass::Blue, red.end(), vec![seg(5.0, 5.0, 6.0, 6.0)]);
        let empty_green = Tour::new(Pass::Green, red.end());

        let out = emit_tours([&red, &empty_green, &blue]);
        let markers: Vec<Pass> = out
            .iter()
            .filter_map(|c| match c {
                PathCommand::Pass(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(markers, vec![Pass::Red, Pass::Blue]);
    }
}
