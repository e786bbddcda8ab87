//! Path stream export serializer.
//!
//! Writes the pen command stream in the line-oriented text format the
//! device driver reads:
//!
//! ```text
//! P <r> <g> <b>   start of a pass: 100 on its channel, 0 elsewhere
//! M <x> <y>       pen-up move
//! L <x> <y>       pen-down draw
//! ```
//!
//! Every pen-up move is preceded by a blank line so each pen-down run
//! reads as its own paragraph, and passes are separated by a blank line
//! as well. Coordinates use a fixed number of decimals.
//!
//! This is a pure function with no I/O; it returns a `String`.

use std::fmt::Write;

use vecsort_pipeline::{PathCommand, PipelineError};

/// Formatting options for [`to_path_stream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStreamOptions {
    /// Decimal places written for each coordinate.
    pub precision: usize,
}

impl PathStreamOptions {
    /// Default coordinate precision.
    pub const DEFAULT_PRECISION: usize = 3;

    /// Largest accepted coordinate precision.
    pub const MAX_PRECISION: usize = 9;

    /// Check the options before serializing.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `precision` exceeds
    /// [`Self::MAX_PRECISION`].
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.precision > Self::MAX_PRECISION {
            return Err(PipelineError::InvalidConfig(format!(
                "precision {} is larger than the maximum of {}",
                self.precision,
                Self::MAX_PRECISION,
            )));
        }
        Ok(())
    }
}

impl Default for PathStreamOptions {
    fn default() -> Self {
        Self {
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

/// Serialize a pen command stream into the text path format.
///
/// # Examples
///
/// ```
/// use vecsort_pipeline::{Pass, PathCommand, Point};
/// use vecsort_export::path_stream::{PathStreamOptions, to_path_stream};
///
/// let commands = [
///     PathCommand::Pass(Pass::Red),
///     PathCommand::MoveTo(Point::new(0.0, 0.0)),
///     PathCommand::LineTo(Point::new(10.0, 0.5)),
/// ];
/// let text = to_path_stream(&commands, &PathStreamOptions::default());
/// assert_eq!(text, "P 100 0 0\n\nM 0.000 0.000\nL 10.000 0.500\n");
/// ```
#[must_use]
pub fn to_path_stream(commands: &[PathCommand], options: &PathStreamOptions) -> String {
    let precision = options.precision;
    let mut out = String::new();

    for command in commands {
        match command {
            PathCommand::Pass(pass) => {
                if !out.is_empty() {
                    out.push('\n');
                }
                let [r, g, b] = pass.indicator();
                let _ = writeln!(out, "P {r} {g} {b}");
            }
            PathCommand::MoveTo(p) => {
                let _ = writeln!(out, "\nM {:.precision$} {:.precision$}", p.x, p.y);
            }
            PathCommand::LineTo(p) => {
                let _ = writeln!(out, "L {:.precision$} {:.precision$}", p.x, p.y);
            }
        }
    }

    out
}
