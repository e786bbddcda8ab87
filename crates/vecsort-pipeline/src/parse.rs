//! Segment parser: decode the line-oriented vector command stream.
//!
//! The extraction front end writes one command per line:
//!
//! ```text
//! P <b> <g> <r>   select the active pass (note: blue, green, red order)
//! M <x> <y>       set the move origin and pen position
//! L <x> <y>       segment from the pen position to (x, y)
//! Z               segment from the pen position back to the move origin
//! X               end of stream
//! ```
//!
//! Multi-segment paths are split into individual segments and stored
//! per pass with duplicates dropped (see [`SegmentStore::insert`]).
//! Parsing is all-or-nothing: the first bad line aborts with an error
//! and no stores are returned.

use crate::store::SegmentStore;
use crate::types::{Pass, PipelineError, Point, Segment};

/// Counters gathered while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Input lines consumed, up to and including an `X` line.
    pub lines: usize,
    /// Candidate segments produced by `L` and `Z` commands.
    pub segments_read: usize,
    /// Candidates that made it into a store.
    pub segments_stored: usize,
    /// Candidates dropped as duplicate or degenerate.
    pub duplicates_dropped: usize,
}

/// Output of [`parse`]: one store per pass plus the final pen position.
#[derive(Debug, Clone)]
pub struct ParsedPasses {
    stores: [SegmentStore; Pass::COUNT],
    pen: Point,
    stats: ParseStats,
}

impl ParsedPasses {
    /// The store for one pass.
    #[must_use]
    pub const fn store(&self, pass: Pass) -> &SegmentStore {
        &self.stores[pass.index()]
    }

    /// Pen position after the last command.
    #[must_use]
    pub const fn pen(&self) -> Point {
        self.pen
    }

    /// Parse counters.
    #[must_use]
    pub const fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Total segments across all passes.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.stores.iter().map(SegmentStore::len).sum()
    }

    /// Consumes the result and returns the stores indexed by
    /// [`Pass::index`].
    #[must_use]
    pub fn into_stores(self) -> [SegmentStore; Pass::COUNT] {
        self.stores
    }
}

/// Parsing state carried from line to line.
struct ParserContext {
    pass: Pass,
    origin: Point,
    pen: Point,
    stores: [SegmentStore; Pass::COUNT],
    stats: ParseStats,
}

impl ParserContext {
    fn new() -> Self {
        Self {
            pass: Pass::Red,
            origin: Point::ORIGIN,
            pen: Point::ORIGIN,
            stores: Default::default(),
            stats: ParseStats::default(),
        }
    }

    /// Offer a segment from the pen position to `to` to the active
    /// pass's store, then move the pen there.
    fn draw_to(&mut self, line: usize, to: Point) {
        let segment = Segment::new(self.pen, to);
        self.stats.segments_read += 1;
        if self.stores[self.pass.index()].insert(segment).is_some() {
            self.stats.segments_stored += 1;
        } else {
            self.stats.duplicates_dropped += 1;
            tracing::trace!(line, pass = %self.pass, "dropped duplicate or degenerate segment");
        }
        self.pen = to;
    }

    fn finish(self) -> ParsedPasses {
        ParsedPasses {
            stores: self.stores,
            pen: self.pen,
            stats: self.stats,
        }
    }
}

/// Whether parsing should continue after a line.
enum Flow {
    Continue,
    Stop,
}

/// Parse a vector command stream into per-pass segment stores.
///
/// Blank lines are skipped. Commands before the first `P` line go to
/// the red pass. Input after an `X` line is ignored; a missing `X` is
/// fine.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownCommand`] for an unrecognized
/// command character, [`PipelineError::MalformedCommand`] for missing
/// or non-finite numeric fields, and [`PipelineError::Color`] when a
/// `P` line does not select exactly one of red, green, or blue.
pub fn parse(input: &str) -> Result<ParsedPasses, PipelineError> {
    let mut ctx = ParserContext::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        ctx.stats.lines = line;
        match parse_line(&mut ctx, line, raw)? {
            Flow::Continue => {}
            Flow::Stop => break,
        }
    }

    tracing::debug!(
        lines = ctx.stats.lines,
        read = ctx.stats.segments_read,
        stored = ctx.stats.segments_stored,
        dropped = ctx.stats.duplicates_dropped,
        "parsed vector stream",
    );

    Ok(ctx.finish())
}

fn parse_line(ctx: &mut ParserContext, line: usize, raw: &str) -> Result<Flow, PipelineError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(command) = chars.next() else {
        return Ok(Flow::Continue);
    };
    let args = chars.as_str();

    match command {
        'P' => {
            let [blue, green, red] = fields(line, command, args)?;
            ctx.pass = Pass::from_bgr(blue, green, red).ok_or(PipelineError::Color {
                line,
                blue,
                green,
                red,
            })?;
        }
        'M' => {
            let [x, y] = fields(line, command, args)?;
            ctx.origin = Point::new(x, y);
            ctx.pen = ctx.origin;
        }
        'L' => {
            let [x, y] = fields(line, command, args)?;
            ctx.draw_to(line, Point::new(x, y));
        }
        'Z' => {
            let origin = ctx.origin;
            ctx.draw_to(line, origin);
        }
        'X' => return Ok(Flow::Stop),
        other => {
            return Err(PipelineError::UnknownCommand {
                line,
                command: other,
            });
        }
    }

    Ok(Flow::Continue)
}

/// Read exactly `N` leading numeric fields. Extra fields are ignored.
fn fields<const N: usize>(
    line: usize,
    command: char,
    args: &str,
) -> Result<[f64; N], PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedCommand {
        line,
        command,
        reason,
    };

    let mut values = [0.0; N];
    let mut tokens = args.split_whitespace();
    for (found, value) in values.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(format!("expected {N} numeric fields, found {found}")))?;
        let parsed: f64 = token
            .parse()
            .map_err(|_| malformed(format!("invalid number {token:?}")))?;
        if !parsed.is_finite() {
            return Err(malformed(format!("non-finite number {token:?}")));
        }
        *value = parsed;
    }
    Ok(values)
}
