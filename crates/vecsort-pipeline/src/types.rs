//! Shared types for the vecsort segment ordering pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute tolerance used for every coordinate comparison.
///
/// Segments come from rounded raster coordinates, so exact float
/// equality would treat touching segments as disjoint.
pub const TOLERANCE: f64 = 1e-8;

/// Compare two coordinates using [`TOLERANCE`].
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

/// A 2D point in device working units (millimetres in practice).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// The origin, where the pen starts unless configured otherwise.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Tolerance equality: both coordinates within [`TOLERANCE`].
    #[must_use]
    pub fn approx_eq(self, other: Self) -> bool {
        approx_eq(self.x, other.x) && approx_eq(self.y, other.y)
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An oriented line from `a` to `b`.
///
/// Endpoints never change after creation; only the orientation may be
/// flipped with [`reverse`](Self::reverse).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start point (where the pen goes down).
    pub a: Point,
    /// End point (where the pen ends up).
    pub b: Point,
}

impl Segment {
    /// Create a new segment from `a` to `b`.
    #[must_use]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Swap the endpoints in place.
    pub const fn reverse(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }

    /// Returns a copy with the endpoints swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.b, self.a)
    }

    /// Drawn (cut) length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// A segment whose endpoints coincide draws nothing.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.a.approx_eq(self.b)
    }

    /// Returns `true` if `other` covers the same line, in either
    /// orientation.
    #[must_use]
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        (self.a.approx_eq(other.a) && self.b.approx_eq(other.b))
            || (self.a.approx_eq(other.b) && self.b.approx_eq(other.a))
    }
}

/// A sequence of connected points drawn without lifting the pen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Append a point.
    pub fn push(&mut self, point: Point) {
        self.0.push(point);
    }
}

/// One independent group of segments sharing a solid color.
///
/// Passes are emitted in ascending order: red, green, then blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pass {
    /// Pass 0: solid red strokes.
    Red,
    /// Pass 1: solid green strokes.
    Green,
    /// Pass 2: solid blue strokes.
    Blue,
}

impl Pass {
    /// Number of passes.
    pub const COUNT: usize = 3;

    /// All passes in emission order.
    pub const ALL: [Self; Self::COUNT] = [Self::Red, Self::Green, Self::Blue];

    /// Zero-based pass index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    /// Select a pass from a color given in blue, green, red channel
    /// order, as the extraction front end writes it.
    ///
    /// Exactly one channel must be nonzero. Returns `None` for mixed
    /// colors and for black.
    #[must_use]
    pub fn from_bgr(blue: f64, green: f64, red: f64) -> Option<Self> {
        match (red != 0.0, green != 0.0, blue != 0.0) {
            (true, false, false) => Some(Self::Red),
            (false, true, false) => Some(Self::Green),
            (false, false, true) => Some(Self::Blue),
            _ => None,
        }
    }

    /// Output marker triple in red, green, blue order: 100 on this
    /// pass's channel and 0 elsewhere.
    #[must_use]
    pub const fn indicator(self) -> [u8; 3] {
        match self {
            Self::Red => [100, 0, 0],
            Self::Green => [0, 100, 0],
            Self::Blue => [0, 0, 100],
        }
    }

    /// Lowercase color name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An ordered sequence of segments for one pass.
///
/// The tour remembers where the pen was before its first segment
/// (`start`) and where it is after its last one (`end`), so transit
/// lengths can be measured without outside context.
///
/// Deserializing ignores any serialized `end` and recomputes it from the
/// last segment, as [`Tour::from_segments`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TourParts")]
pub struct Tour {
    pass: Pass,
    start: Point,
    end: Point,
    segments: Vec<Segment>,
}

/// Serialized form of a [`Tour`] without its derived `end`.
#[derive(Deserialize)]
struct TourParts {
    pass: Pass,
    start: Point,
    segments: Vec<Segment>,
}

impl From<TourParts> for Tour {
    fn from(parts: TourParts) -> Self {
        Self::from_segments(parts.pass, parts.start, parts.segments)
    }
}

impl Tour {
    /// Create an empty tour with the pen resting at `start`.
    #[must_use]
    pub const fn new(pass: Pass, start: Point) -> Self {
        Self {
            pass,
            start,
            end: start,
            segments: Vec::new(),
        }
    }

    /// Build a tour from already ordered segments.
    #[must_use]
    pub fn from_segments(pass: Pass, start: Point, segments: Vec<Segment>) -> Self {
        let end = segments.last().map_or(start, |s| s.b);
        Self {
            pass,
            start,
            end,
            segments,
        }
    }

    /// Append a segment and advance the pen to its `b` endpoint.
    pub fn push(&mut self, segment: Segment) {
        self.end = segment.b;
        self.segments.push(segment);
    }

    /// The pass this tour belongs to.
    #[must_use]
    pub const fn pass(&self) -> Pass {
        self.pass
    }

    /// Pen position before the first segment.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Pen position after the last segment.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// The ordered segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Consumes the tour and returns the ordered segments.
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    /// Number of segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the tour has no segments.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Pen-up moves as `(index, from, to)`, where `index` is the
    /// segment the move leads into. Moves within tolerance of zero are
    /// skipped.
    pub fn transits(&self) -> impl Iterator<Item = (usize, Point, Point)> + '_ {
        let previous_ends =
            std::iter::once(self.start).chain(self.segments.iter().map(|s| s.b));
        previous_ends
            .zip(&self.segments)
            .enumerate()
            .filter(|(_, (from, segment))| !from.approx_eq(segment.a))
            .map(|(index, (from, segment))| (index, from, segment.a))
    }

    /// Total pen-up travel.
    #[must_use]
    pub fn transit_length(&self) -> f64 {
        self.transits().map(|(_, from, to)| from.distance(to)).sum()
    }

    /// Total pen-down (drawn) length.
    #[must_use]
    pub fn cut_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }
}

/// Configuration for the ordering pipeline.
///
/// Defaults reproduce the reference behavior: the pen starts at the
/// origin and the transit refiner is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on transit refiner invocations per pass. Refinement
    /// stops early at the first invocation that does not improve the
    /// tour. Zero disables refinement.
    pub refine_iterations: u32,

    /// Pen position before the first pass.
    pub start: Point,
}

impl PipelineConfig {
    /// Default refine iteration cap (refinement disabled).
    pub const DEFAULT_REFINE_ITERATIONS: u32 = 0;

    /// Default starting pen position.
    pub const DEFAULT_START: Point = Point::ORIGIN;

    /// Check construction-time invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the start point is
    /// not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.start.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "start point ({}, {}) is not finite",
                self.start.x, self.start.y,
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            refine_iterations: Self::DEFAULT_REFINE_ITERATIONS,
            start: Self::DEFAULT_START,
        }
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// One tour per non-empty pass, in emission order.
    pub tours: Vec<Tour>,

    /// The pen command stream for the device collaborator.
    pub commands: Vec<crate::emit::PathCommand>,

    /// Pen position after the last pass.
    pub end: Point,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// A line started with a character that is not a known command.
    #[error("line {line}: unknown command {command:?}")]
    UnknownCommand {
        /// 1-based input line number.
        line: usize,
        /// The offending command character.
        command: char,
    },

    /// A known command had missing or unusable fields.
    #[error("line {line}: malformed {command} command: {reason}")]
    MalformedCommand {
        /// 1-based input line number.
        line: usize,
        /// The command character.
        command: char,
        /// What was wrong with the fields.
        reason: String,
    },

    /// A `P` line did not select exactly one solid primary color.
    #[error("line {line}: non-red/green/blue color (b={blue}, g={green}, r={red})")]
    Color {
        /// 1-based input line number.
        line: usize,
        /// Blue channel as read.
        blue: f64,
        /// Green channel as read.
        green: f64,
        /// Red channel as read.
        red: f64,
    },

    /// The optimizer's store still held segments but no closest
    /// candidate was found. Indicates corrupted bookkeeping.
    #[error("optimizer found no closest segment in {pass} pass with {remaining} segments left")]
    OptimizerInvariant {
        /// Pass being optimized.
        pass: Pass,
        /// Segments still in the store.
        remaining: usize,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Returns `true` for errors caused by unreadable input text.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownCommand { .. } | Self::MalformedCommand { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance_squared() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn point_approx_eq_absorbs_rounding() {
        let a = Point::new(1.0, 2.0);
        assert!(a.approx_eq(Point::new(1.0 + 1e-9, 2.0 - 1e-9)));
        assert!(!a.approx_eq(Point::new(1.0 + 1e-6, 2.0)));
    }

    // --- Segment tests ---

    #[test]
    fn segment_reverse_swaps_endpoints() {
        let mut s = Segment::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        s.reverse();
        assert_eq!(s.a, Point::new(3.0, 4.0));
        assert_eq!(s.b, Point::new(1.0, 2.0));
        assert_eq!(s.reversed().a, Point::new(1.0, 2.0));
    }

    #[test]
    fn segment_duplicate_detection() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        assert!(s.is_duplicate_of(&s));
        assert!(s.is_duplicate_of(&s.reversed()));
        assert!(!s.is_duplicate_of(&Segment::new(Point::new(0.0, 0.0), Point::new(5.0, 6.0))));
    }

    #[test]
    fn segment_degenerate() {
        let p = Point::new(2.0, 2.0);
        assert!(Segment::new(p, p).is_degenerate());
        assert!(!Segment::new(p, Point::new(2.0, 3.0)).is_degenerate());
    }

    // --- Pass tests ---

    #[test]
    fn pass_from_bgr_uses_blue_green_red_order() {
        assert_eq!(Pass::from_bgr(0.0, 0.0, 100.0), Some(Pass::Red));
        assert_eq!(Pass::from_bgr(0.0, 100.0, 0.0), Some(Pass::Green));
        assert_eq!(Pass::from_bgr(100.0, 0.0, 0.0), Some(Pass::Blue));
    }

    #[test]
    fn pass_from_bgr_rejects_mixed_and_black() {
        assert_eq!(Pass::from_bgr(0.0, 0.0, 0.0), None);
        assert_eq!(Pass::from_bgr(1.0, 0.0, 1.0), None);
        assert_eq!(Pass::from_bgr(1.0, 1.0, 1.0), None);
    }

    #[test]
    fn pass_indicator_is_rgb() {
        assert_eq!(Pass::Red.indicator(), [100, 0, 0]);
        assert_eq!(Pass::Green.indicator(), [0, 100, 0]);
        assert_eq!(Pass::Blue.indicator(), [0, 0, 100]);
    }

    #[test]
    fn pass_indices_follow_emission_order() {
        for (i, pass) in Pass::ALL.iter().enumerate() {
            assert_eq!(pass.index(), i);
        }
    }

    // --- Tour tests ---

    #[test]
    fn tour_tracks_end_and_transits() {
        let mut tour = Tour::new(Pass::Red, Point::ORIGIN);
        tour.push(Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
        tour.push(Segment::new(Point::new(10.0, 3.0), Point::new(10.0, 10.0)));
        assert_eq!(tour.end(), Point::new(10.0, 10.0));
        assert_eq!(tour.len(), 2);

        let transits: Vec<_> = tour.transits().collect();
        assert_eq!(transits.len(), 1);
        assert_eq!(transits[0].0, 1);
        assert!((tour.transit_length() - 3.0).abs() < 1e-12);
        assert!((tour.cut_length() - 17.0).abs() < 1e-12);
    }

    #[test]
    fn tour_first_transit_measured_from_start() {
        let tour = Tour::from_segments(
            Pass::Blue,
            Point::new(0.0, 4.0),
            vec![Segment::new(Point::new(3.0, 0.0), Point::new(6.0, 0.0))],
        );
        assert!((tour.transit_length() - 5.0).abs() < 1e-12);
        assert_eq!(tour.end(), Point::new(6.0, 0.0));
    }

    #[test]
    fn empty_tour_end_is_start() {
        let tour = Tour::from_segments(Pass::Green, Point::new(1.0, 1.0), Vec::new());
        assert!(tour.is_empty());
        assert_eq!(tour.end(), Point::new(1.0, 1.0));
        assert!(tour.transit_length().abs() < f64::EPSILON);
    }

    // --- PipelineConfig tests ---

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.refine_iterations, 0);
        assert_eq!(config.start, Point::ORIGIN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pipeline_config_rejects_non_finite_start() {
        let config = PipelineConfig {
            start: Point::new(f64::NAN, 0.0),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn pipeline_config_missing_fields_use_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"refine_iterations": 8}"#).unwrap();
        assert_eq!(config.refine_iterations, 8);
        assert_eq!(config.start, Point::ORIGIN);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_unknown_command_display() {
        let err = PipelineError::UnknownCommand {
            line: 3,
            command: 'Q',
        };
        assert_eq!(err.to_string(), "line 3: unknown command 'Q'");
        assert!(err.is_parse_error());
    }

    #[test]
    fn error_color_is_not_parse_error() {
        let err = PipelineError::Color {
            line: 1,
            blue: 1.0,
            green: 1.0,
            red: 0.0,
        };
        assert!(!err.is_parse_error());
        assert!(err.to_string().contains("non-red/green/blue"));
    }

    #[test]
    fn error_invariant_display_names_pass() {
        let err = PipelineError::OptimizerInvariant {
            pass: Pass::Green,
            remaining: 4,
        };
        assert_eq!(
            err.to_string(),
            "optimizer found no closest segment in green pass with 4 segments left",
        );
    }

    #[test]
    fn tour_serde_round_trip() {
        let tour = Tour::from_segments(
            Pass::Red,
            Point::ORIGIN,
            vec![Segment::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0))],
        );
        let json = serde_json::to_string(&tour).unwrap();
        let back: Tour = serde_json::from_str(&json).unwrap();
        assert_eq!(tour, back);
    }

    #[test]
    fn tour_deserialize_recomputes_end() {
        let json = r#"{
            "pass": "Blue",
            "start": {"x": 0.0, "y": 0.0},
            "end": {"x": 99.0, "y": 99.0},
            "segments": [{"a": {"x": 1.0, "y": 2.0}, "b": {"x": 3.0, "y": 4.0}}]
        }"#;
        let tour: Tour = serde_json::from_str(json).unwrap();
        assert_eq!(tour.end(), Point::new(3.0, 4.0));

        let empty: Tour = serde_json::from_str(
            r#"{"pass": "Red", "start": {"x": 5.0, "y": 6.0}, "end": {"x": 0.0, "y": 0.0}, "segments": []}"#,
        )
        .unwrap();
        assert_eq!(empty.end(), Point::new(5.0, 6.0));
    }
}
