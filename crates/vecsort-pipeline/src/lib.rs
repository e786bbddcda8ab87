//! vecsort-pipeline: Pure vector tour optimizer (sans-IO).
//!
//! Turns an unordered stream of colored line segments into an ordered
//! pen path that minimizes pen-up travel:
//! parse -> per-pass dedup store -> greedy ordering ->
//! optional transit refinement -> pen command emission.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! strings and returns structured data. Serializers live in
//! `vecsort-export`; files and stdio are handled by the `vecsort` binary.

pub mod diagnostics;
pub mod emit;
pub mod optimize;
pub mod parse;
pub mod pipeline;
pub mod refine;
pub mod store;
pub mod types;

pub use diagnostics::{PipelineDiagnostics, TourStats, process_with_diagnostics};
pub use emit::PathCommand;
pub use parse::{ParsedPasses, parse};
pub use pipeline::Pipeline;
pub use store::{SegmentId, SegmentStore};
pub use types::{
    Pass, PipelineConfig, PipelineError, Point, Polyline, ProcessResult, Segment, TOLERANCE, Tour,
};

/// Run the full pipeline.
///
/// Parses the command stream, orders every non-empty pass starting from
/// `config.start` (each pass starts where the previous one ended), and
/// emits the pen command stream.
///
/// # Pipeline steps
///
/// 1. Parse and deduplicate segments into one store per pass
/// 2. Greedy nearest-neighbor ordering with reversal
/// 3. Optional transit refinement (`config.refine_iterations`)
/// 4. Pen command emission with contiguous segments merged
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails
/// validation, the first parse or color error in `input`, or
/// [`PipelineError::OptimizerInvariant`] if ordering breaks down.
/// Nothing is returned on error; there is no partial output.
pub fn process(input: &str, config: &PipelineConfig) -> Result<ProcessResult, PipelineError> {
    Ok(Pipeline::new(input, config.clone())
        .parse()?
        .order()?
        .emit()
        .into_result())
}
