//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs the entire pipeline in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use vecsort_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(input: &str) -> Result<(), PipelineError> {
//! let config = PipelineConfig::default();
//! let parsed = Pipeline::new(input, config).parse()?;
//! println!("{} segments stored", parsed.passes().segment_count());
//!
//! let ordered = parsed.order()?;
//! for tour in ordered.tours() {
//!     println!("{}: {} transit", tour.pass(), tour.transit_length());
//! }
//!
//! let (result, diagnostics) = ordered.emit().into_parts();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying the diagnostics gathered
//! so far. Any stage can be finished in one go with `complete()`.

use web_time::Instant;

use crate::diagnostics::{
    ParseDiagnostics, PassDiagnostics, PipelineDiagnostics, RefineDiagnostics, TourStats,
};
use crate::emit::{PathCommand, emit_tours, pen_lifts};
use crate::optimize::optimize_tour;
use crate::parse::ParsedPasses;
use crate::refine::refine_iteratively;
use crate::types::{Pass, PipelineConfig, PipelineError, Point, ProcessResult, Tour};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline over the command stream `input`.
    ///
    /// Nothing is parsed until [`Pending::parse`] is called.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(input: &str, config: PipelineConfig) -> Pending<'_> {
        Pending {
            config,
            input,
            started: Instant::now(),
        }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`parse`](Self::parse) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .parse() to continue"]
pub struct Pending<'a> {
    config: PipelineConfig,
    input: &'a str,
    started: Instant,
}

impl Pending<'_> {
    /// The raw command stream.
    #[must_use]
    pub const fn source(&self) -> &str {
        self.input
    }

    /// The configuration the pipeline will run with.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the config, parse the input, and advance to [`Parsed`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a rejected config,
    /// or the first parse or color error in the input.
    pub fn parse(self) -> Result<Parsed, PipelineError> {
        self.config.validate()?;

        let stage_start = Instant::now();
        let passes = crate::parse::parse(self.input)?;
        let stats = passes.stats();
        let parse = ParseDiagnostics {
            duration: stage_start.elapsed(),
            lines: stats.lines,
            segments_read: stats.segments_read,
            segments_stored: stats.segments_stored,
            duplicates_dropped: stats.duplicates_dropped,
        };

        Ok(Parsed {
            config: self.config,
            passes,
            parse,
            started: self.started,
        })
    }

    /// Run all remaining stages.
    ///
    /// # Errors
    ///
    /// Any error from [`parse`](Self::parse) or [`Parsed::order`].
    pub fn complete(self) -> Result<(ProcessResult, PipelineDiagnostics), PipelineError> {
        self.parse()?.complete()
    }
}

// ───────────────────────── Stage 1: Parsed ───────────────────────────

/// Pipeline state after parsing: one deduplicated store per pass.
///
/// Call [`order`](Self::order) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .order() to continue"]
pub struct Parsed {
    config: PipelineConfig,
    passes: ParsedPasses,
    parse: ParseDiagnostics,
    started: Instant,
}

impl Parsed {
    /// The parsed per-pass stores.
    #[must_use]
    pub const fn passes(&self) -> &ParsedPasses {
        &self.passes
    }

    /// Parse stage diagnostics.
    #[must_use]
    pub const fn parse_diagnostics(&self) -> &ParseDiagnostics {
        &self.parse
    }

    /// Optimize (and optionally refine) every non-empty pass in
    /// ascending order, carrying the pen from one pass to the next.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OptimizerInvariant`] if a store's
    /// bookkeeping turns out to be inconsistent.
    pub fn order(self) -> Result<Ordered, PipelineError> {
        let refine_cap = self.config.refine_iterations;
        let mut pen = self.config.start;
        let mut tours = Vec::new();
        let mut pass_diagnostics = Vec::new();

        for (pass, mut store) in Pass::ALL.into_iter().zip(self.passes.into_stores()) {
            if store.is_empty() {
                tracing::debug!(%pass, "skipping empty pass");
                continue;
            }

            let stage_start = Instant::now();
            let input = TourStats::of_sequence(pen, store.segments());
            let mut tour = optimize_tour(pass, &mut store, pen)?;
            let optimized = TourStats::of_tour(&tour);

            let refined = if refine_cap > 0 {
                let summary = refine_iteratively(&mut tour, refine_cap)?;
                Some(RefineDiagnostics {
                    iterations: summary.iterations,
                    improvement: summary.improvement,
                    stats: TourStats::of_tour(&tour),
                })
            } else {
                None
            };

            let diag = PassDiagnostics {
                pass,
                duration: stage_start.elapsed(),
                input,
                optimized,
                refined,
            };
            tracing::debug!(
                %pass,
                segments = optimized.segments,
                cut_length = optimized.cut_length,
                input_transit = input.transit_length,
                optimized_transit = optimized.transit_length,
                final_transit = diag.final_stats().transit_length,
                "ordered pass",
            );

            pen = tour.end();
            tours.push(tour);
            pass_diagnostics.push(diag);
        }

        Ok(Ordered {
            tours,
            end: pen,
            parse: self.parse,
            passes: pass_diagnostics,
            started: self.started,
        })
    }

    /// Run all remaining stages.
    ///
    /// # Errors
    ///
    /// Any error from [`order`](Self::order).
    pub fn complete(self) -> Result<(ProcessResult, PipelineDiagnostics), PipelineError> {
        Ok(self.order()?.complete())
    }
}

// ───────────────────────── Stage 2: Ordered ──────────────────────────

/// Pipeline state after ordering: one finished tour per non-empty pass.
///
/// Call [`emit`](Self::emit) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing — call .emit() to continue"]
pub struct Ordered {
    tours: Vec<Tour>,
    end: Point,
    parse: ParseDiagnostics,
    passes: Vec<PassDiagnostics>,
    started: Instant,
}

impl Ordered {
    /// Tours in emission order.
    #[must_use]
    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    /// Pen position after the last pass.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Per-pass diagnostics gathered so far.
    #[must_use]
    pub fn pass_diagnostics(&self) -> &[PassDiagnostics] {
        &self.passes
    }

    /// Emit the pen command stream and advance to [`Emitted`].
    pub fn emit(self) -> Emitted {
        let commands = emit_tours(&self.tours);
        let diagnostics = PipelineDiagnostics {
            parse: self.parse,
            passes: self.passes,
            emitted_commands: commands.len(),
            pen_lifts: pen_lifts(&commands),
            total_duration: self.started.elapsed(),
        };
        tracing::debug!(
            commands = diagnostics.emitted_commands,
            pen_lifts = diagnostics.pen_lifts,
            "emitted path stream",
        );

        Emitted {
            result: ProcessResult {
                tours: self.tours,
                commands,
                end: self.end,
            },
            diagnostics,
        }
    }

    /// Run the remaining stage.
    #[must_use]
    pub fn complete(self) -> (ProcessResult, PipelineDiagnostics) {
        self.emit().into_parts()
    }
}

// ───────────────────────── Stage 3: Emitted ──────────────────────────

/// Pipeline state after emission: the final stage.
#[must_use = "call .into_result() to extract the ProcessResult"]
pub struct Emitted {
    result: ProcessResult,
    diagnostics: PipelineDiagnostics,
}

impl Emitted {
    /// The pen command stream.
    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.result.commands
    }

    /// Diagnostics for the whole run.
    #[must_use]
    pub const fn diagnostics(&self) -> &PipelineDiagnostics {
        &self.diagnostics
    }

    /// Consume the pipeline and return the [`ProcessResult`].
    #[must_use]
    pub fn into_result(self) -> ProcessResult {
        self.result
    }

    /// Consume the pipeline and return the result with its diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (ProcessResult, PipelineDiagnostics) {
        (self.result, self.diagnostics)
    }
}
