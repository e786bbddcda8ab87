//! Pipeline diagnostics: cut and transit statistics plus stage timing.
//!
//! These numbers exist for manual verification and regression
//! comparison; nothing in the pipeline branches on them. Every call to
//! [`process_with_diagnostics`] collects them alongside the result.
//!
//! Stage timing comes from `web_time::Instant`. In JSON every duration
//! is a plain number of seconds so `--json` output stays easy to plot.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Pass, PipelineConfig, PipelineError, Point, ProcessResult, Segment, Tour};

/// `#[serde(with)]` adapter storing a [`Duration`] as `f64` seconds.
mod seconds {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

/// Cut and transit totals for one ordering of segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TourStats {
    /// Number of segments.
    pub segments: usize,
    /// Segments with nonzero drawn length.
    pub cuts: usize,
    /// Total drawn length.
    pub cut_length: f64,
    /// Pen-up moves longer than the coordinate tolerance.
    pub transits: usize,
    /// Total pen-up travel.
    pub transit_length: f64,
}

impl TourStats {
    /// Measure segments drawn in the given order with the pen starting
    /// at `start`.
    pub fn of_sequence<'a>(start: Point, segments: impl IntoIterator<Item = &'a Segment>) -> Self {
        let mut stats = Self::default();
        let mut pen = start;
        for segment in segments {
            stats.segments += 1;
            if !pen.approx_eq(segment.a) {
                stats.transits += 1;
                stats.transit_length += pen.distance(segment.a);
            }
            if !segment.is_degenerate() {
                stats.cuts += 1;
                stats.cut_length += segment.length();
            }
            pen = segment.b;
        }
        stats
    }

    /// Measure a tour from its own start point.
    #[must_use]
    pub fn of_tour(tour: &Tour) -> Self {
        Self::of_sequence(tour.start(), tour.segments())
    }
}

/// Diagnostics for the parse stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDiagnostics {
    /// Wall-clock duration (seconds).
    #[serde(with = "seconds")]
    pub duration: Duration,
    /// Input lines consumed.
    pub lines: usize,
    /// Candidate segments from `L` and `Z` commands.
    pub segments_read: usize,
    /// Segments kept after dedup.
    pub segments_stored: usize,
    /// Candidates dropped as duplicate or degenerate.
    pub duplicates_dropped: usize,
}

/// Diagnostics for the optional refinement of one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineDiagnostics {
    /// Refinement steps attempted.
    pub iterations: u32,
    /// Transit length removed.
    pub improvement: f64,
    /// Statistics after refinement.
    pub stats: TourStats,
}

/// Diagnostics for one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDiagnostics {
    /// Which pass.
    pub pass: Pass,
    /// Wall-clock duration of optimization and refinement (seconds).
    #[serde(with = "seconds")]
    pub duration: Duration,
    /// Statistics of the segments in insertion order.
    pub input: TourStats,
    /// Statistics after greedy optimization.
    pub optimized: TourStats,
    /// Refinement results (only when refinement was enabled).
    pub refined: Option<RefineDiagnostics>,
}

impl PassDiagnostics {
    /// Statistics of the pass as emitted.
    #[must_use]
    pub fn final_stats(&self) -> &TourStats {
        self.refined.as_ref().map_or(&self.optimized, |r| &r.stats)
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Parse stage.
    pub parse: ParseDiagnostics,
    /// One entry per non-empty pass, in emission order.
    pub passes: Vec<PassDiagnostics>,
    /// Commands in the emitted path stream.
    pub emitted_commands: usize,
    /// Pen lifts in the emitted path stream.
    pub pen_lifts: usize,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "seconds")]
    pub total_duration: Duration,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Parse: {} lines, {} segments read, {} stored, {} dropped ({:.3}ms)",
            self.parse.lines,
            self.parse.segments_read,
            self.parse.segments_stored,
            self.parse.duplicates_dropped,
            duration_ms(self.parse.duration),
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<8} {:<10} {:>8} {:>12} {:>8} {:>12}",
            "Pass", "Stage", "Cuts", "Cut len", "Moves", "Move len"
        ));
        lines.push("-".repeat(64));

        for pass in &self.passes {
            let mut stages = vec![("input", &pass.input), ("optimized", &pass.optimized)];
            if let Some(ref refined) = pass.refined {
                stages.push(("refined", &refined.stats));
            }
            for (stage, stats) in stages {
                lines.push(format_stats_row(pass.pass, stage, stats));
            }
            if let Some(ref refined) = pass.refined {
                lines.push(format!(
                    "{:<8} refine: {} iterations, {:.3} removed",
                    "", refined.iterations, refined.improvement,
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Commands: {}  |  Pen lifts: {}",
            self.emitted_commands, self.pen_lifts,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_stats_row(pass: Pass, stage: &str, stats: &TourStats) -> String {
    format!(
        "{:<8} {:<10} {:>8} {:>12.0} {:>8} {:>12.0}",
        pass.name(),
        stage,
        stats.cuts,
        stats.cut_length,
        stats.transits,
        stats.transit_length,
    )
}

/// Run the full pipeline, collecting diagnostics along the way.
///
/// # Errors
///
/// Same as [`crate::process`].
pub fn process_with_diagnostics(
    input: &str,
    config: &PipelineConfig,
) -> Result<(ProcessResult, PipelineDiagnostics), PipelineError> {
    let emitted = crate::Pipeline::new(input, config.clone())
        .parse()?
        .order()?
        .emit();
    Ok(emitted.into_parts())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let diag = ParseDiagnostics {
            duration: Duration::from_millis(1500),
            lines: 3,
            segments_read: 2,
            segments_stored: 2,
            duplicates_dropped: 0,
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["duration"].as_f64().unwrap() - 1.5).abs() < 1e-12);

        let back: ParseDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
    }

    #[test]
    fn negative_duration_rejected() {
        let json = r#"{"duration": -1.0, "lines": 0, "segments_read": 0,
            "segments_stored": 0, "duplicates_dropped": 0}"#;
        assert!(serde_json::from_str::<ParseDiagnostics>(json).is_err());
    }

    #[test]
    fn stats_of_empty_sequence() {
        let stats = TourStats::of_sequence(Point::ORIGIN, std::iter::empty::<&Segment>());
        assert_eq!(stats, TourStats::default());
    }

    #[test]
    fn stats_count_cuts_and_transits() {
        let segments = [
            seg(0.0, 0.0, 3.0, 4.0),
            seg(3.0, 4.0, 3.0, 0.0),
            seg(6.0, 0.0, 6.0, 2.0),
        ];
        let stats = TourStats::of_sequence(Point::ORIGIN, &segments);
        assert_eq!(stats.segments, 3);
        assert_eq!(stats.cuts, 3);
        assert!((stats.cut_length - 11.0).abs() < 1e-12);
        assert_eq!(stats.transits, 1);
        assert!((stats.transit_length - 3.0).abs() < 1e-12);
    }

    #[test]
    fn stats_of_tour_match_tour_lengths() {
        let tour = Tour::from_segments(
            Pass::Green,
            Point::new(-1.0, 0.0),
            vec![seg(0.0, 0.0, 1.0, 0.0), seg(4.0, 4.0, 5.0, 5.0)],
        );
        let stats = TourStats::of_tour(&tour);
        assert!((stats.transit_length - tour.transit_length()).abs() < 1e-12);
        assert!((stats.cut_length - tour.cut_length()).abs() < 1e-12);
        assert_eq!(stats.transits, tour.transits().count());
    }

    #[test]
    fn final_stats_prefers_refined() {
        let optimized = TourStats {
            transit_length: 10.0,
            ..TourStats::default()
        };
        let refined = TourStats {
            transit_length: 4.0,
            ..TourStats::default()
        };
        let mut diag = PassDiagnostics {
            pass: Pass::Red,
            duration: Duration::ZERO,
            input: TourStats::default(),
            optimized,
            refined: None,
        };
        assert!((diag.final_stats().transit_length - 10.0).abs() < f64::EPSILON);
        diag.refined = Some(RefineDiagnostics {
            iterations: 2,
            improvement: 6.0,
            stats: refined,
        });
        assert!((diag.final_stats().transit_length - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_produces_nonempty_string() {
        let stats = TourStats {
            segments: 3,
            cuts: 3,
            cut_length: 30.0,
            transits: 1,
            transit_length: 5.0,
        };
        let diag = PipelineDiagnostics {
            parse: ParseDiagnostics {
                duration: Duration::from_millis(1),
                lines: 6,
                segments_read: 4,
                segments_stored: 3,
                duplicates_dropped: 1,
            },
            passes: vec![PassDiagnostics {
                pass: Pass::Blue,
                duration: Duration::from_millis(2),
                input: stats,
                optimized: stats,
                refined: Some(RefineDiagnostics {
                    iterations: 1,
                    improvement: 0.0,
                    stats,
                }),
            }],
            emitted_commands: 6,
            pen_lifts: 2,
            total_duration: Duration::from_millis(4),
        };

        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("blue"));
        assert!(report.contains("refined"));
        assert!(report.contains("Pen lifts: 2"));
    }

    #[test]
    fn process_with_diagnostics_counts_match_result() {
        let input = "P 0 0 100\nM 0 0\nL 10 0\nL 10 10\nZ\nP 100 0 0\nM 20 0\nL 30 0\nX\n";
        let (result, diag) = process_with_diagnostics(input, &PipelineConfig::default())
            .unwrap_or_else(|e| unreachable!("pipeline failed: {e}"));

        assert_eq!(diag.parse.segments_stored, 4);
        assert_eq!(diag.passes.len(), 2);
        assert_eq!(diag.passes[0].pass, Pass::Red);
        assert_eq!(diag.passes[1].pass, Pass::Blue);
        assert_eq!(diag.emitted_commands, result.commands.len());
        assert!(diag.passes.iter().all(|p| p.refined.is_none()));
    }
}
