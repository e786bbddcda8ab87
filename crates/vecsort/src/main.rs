//! vecsort: reorder vector cut passes to minimize pen-up travel.
//!
//! Reads the `P`/`M`/`L`/`Z`/`X` command stream produced by the
//! extraction front end, orders each color pass with the greedy
//! nearest-neighbor optimizer (optionally refined), and writes the
//! `P`/`M`/`L` path stream for the device driver.
//!
//! # Usage
//!
//! ```text
//! vecsort [OPTIONS] [INPUT]
//! ```
//!
//! Input defaults to stdin and output to stdout. Statistics, logs, and
//! errors go to stderr so the path stream can be piped.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use vecsort_export::{PathStreamOptions, SvgMetadata, SvgOptions};
use vecsort_pipeline::{PipelineConfig, PipelineDiagnostics, Point, ProcessResult};

/// Reorder red/green/blue vector passes for minimal transit.
///
/// Parses the vector command stream, orders every pass to minimize
/// pen-up travel, and writes the resulting path stream.
#[derive(Parser)]
#[command(name = "vecsort", version)]
struct Cli {
    /// Input command stream (reads stdin when omitted or `-`).
    input: Option<PathBuf>,

    /// Write the path stream to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum transit refinement steps per pass (0 disables).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_REFINE_ITERATIONS)]
    refine: u32,

    /// Starting pen X position.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_START.x, allow_negative_numbers = true)]
    start_x: f64,

    /// Starting pen Y position.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_START.y, allow_negative_numbers = true)]
    start_y: f64,

    /// Decimal places for output coordinates.
    #[arg(long, default_value_t = PathStreamOptions::DEFAULT_PRECISION)]
    precision: usize,

    /// Write an SVG preview of the ordered tours to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Leave pen-up transits out of the SVG preview.
    #[arg(long)]
    no_transits: bool,

    /// Print the diagnostics report to stderr.
    #[arg(long)]
    stats: bool,

    /// Print diagnostics to stderr as JSON instead of the report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, `--refine`, `--start-x`, and `--start-y` are
    /// ignored. The JSON must be a valid `PipelineConfig` serialization;
    /// missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Increase log verbosity (`-v` debug, `-vv` trace). `RUST_LOG`
    /// directives still apply on top.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        refine_iterations: cli.refine,
        start: Point::new(cli.start_x, cli.start_y),
    })
}

/// Install the stderr log subscriber.
fn init_logging(verbose: u8) -> Result<(), String> {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| format!("Error installing log subscriber: {e}"))
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading {}: {e}", path.display())),
        _ => std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Error reading stdin: {e}")),
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), String> {
    if let Some(path) = path {
        return std::fs::write(path, text)
            .map_err(|e| format!("Error writing {}: {e}", path.display()));
    }
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| format!("Error writing stdout: {e}"))
}

fn format_diagnostics(diagnostics: &PipelineDiagnostics, json: bool) -> Result<String, String> {
    if json {
        serde_json::to_string_pretty(diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))
    } else {
        Ok(diagnostics.report())
    }
}

fn render_svg(cli: &Cli, result: &ProcessResult, config: &PipelineConfig) -> Result<String, String> {
    let title = cli
        .input
        .as_ref()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("stdin");
    let transit: f64 = result.tours.iter().map(vecsort_pipeline::Tour::transit_length).sum();
    let desc = format!(
        "{} passes, {} commands, transit {transit:.3}",
        result.tours.len(),
        result.commands.len(),
    );
    let config_json = serde_json::to_string(config)
        .map_err(|e| format!("Error serializing config: {e}"))?;
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: Some(&config_json),
    };
    let options = SvgOptions {
        show_transits: !cli.no_transits,
        ..SvgOptions::default()
    };

    Ok(vecsort_export::to_svg(&result.tours, &metadata, &options))
}

/// Run the pipeline and write its outputs.
///
/// Everything is rendered before anything is written, and the SVG
/// preview is written before the path stream, so a failed run never
/// leaves a path stream behind.
fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;
    let stream_options = PathStreamOptions {
        precision: cli.precision,
    };
    stream_options.validate().map_err(|e| e.to_string())?;

    let input = read_input(cli.input.as_deref())?;
    tracing::debug!(bytes = input.len(), ?config, "read input");

    let (result, diagnostics) = vecsort_pipeline::process_with_diagnostics(&input, &config)
        .map_err(|e| format!("Pipeline error: {e}"))?;

    let text = vecsort_export::to_path_stream(&result.commands, &stream_options);
    let svg = match cli.svg {
        Some(ref svg_path) => Some((svg_path, render_svg(cli, &result, &config)?)),
        None => None,
    };
    let report = if cli.stats || cli.json {
        Some(format_diagnostics(&diagnostics, cli.json)?)
    } else {
        None
    };

    if let Some((svg_path, svg)) = svg {
        std::fs::write(svg_path, &svg)
            .map_err(|e| format!("Error writing SVG to {}: {e}", svg_path.display()))?;
        tracing::info!(path = %svg_path.display(), bytes = svg.len(), "wrote SVG preview");
    }

    write_output(cli.output.as_deref(), &text)?;

    if let Some(report) = report {
        eprintln!("{report}");
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(msg) = init_logging(cli.verbose) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
