//! Integration test: run a multi-pass command stream through the full
//! pipeline and export it to both the path stream and SVG formats.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use vecsort_export::{PathStreamOptions, SvgMetadata, SvgOptions, to_path_stream, to_svg};
use vecsort_pipeline::{Pass, PathCommand, PipelineConfig, Point};

/// Two red squares far apart given in a scattered order with mixed
/// orientation, a blue line, and a duplicate red edge.
const INPUT: &str = "\
P 0 0 100
M 100 100
L 110 100
M 0 0
L 10 0
M 110 110
L 110 100
M 10 10
L 10 0
M 0 10
L 0 0
M 110 110
L 100 110
M 10 10
L 0 10
L 100 100
M 100 100
L 100 110
M 10 0
L 0 0
P 100 0 0
M 200 0
L 200 50
X
";

#[test]
fn pipeline_to_path_stream() {
    let config = PipelineConfig::default();
    let (result, diagnostics) =
        vecsort_pipeline::process_with_diagnostics(INPUT, &config).expect("pipeline should succeed");

    assert_eq!(diagnostics.parse.duplicates_dropped, 1);
    assert_eq!(diagnostics.parse.segments_stored, 10);
    assert_eq!(result.tours.len(), 2);

    let text = to_path_stream(&result.commands, &PathStreamOptions::default());
    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();

    assert_eq!(lines[0], "P 100 0 0");
    assert_eq!(lines[1], "M 0.000 0.000");
    assert!(lines.contains(&"P 0 0 100"));

    // Every stored segment is drawn exactly once.
    let draws = lines.iter().filter(|l| l.starts_with("L ")).count();
    assert_eq!(draws, 10);

    // The blue pass picks up where red finished, then draws its line.
    let blue_at = lines.iter().position(|l| *l == "P 0 0 100").unwrap();
    assert!(lines[blue_at + 1].starts_with("M 200.000 "));

    // Optimized order never travels more than insertion order here.
    for pass in &diagnostics.passes {
        assert!(pass.optimized.transit_length <= pass.input.transit_length);
    }
}

#[test]
fn refinement_never_increases_transit() {
    let config = PipelineConfig {
        refine_iterations: 8,
        ..PipelineConfig::default()
    };
    let (refined, diagnostics) =
        vecsort_pipeline::process_with_diagnostics(INPUT, &config).unwrap();
    let plain = vecsort_pipeline::process(INPUT, &PipelineConfig::default()).unwrap();

    // Both runs start the first pass from the origin.
    assert!(refined.tours[0].transit_length() <= plain.tours[0].transit_length() + 1e-9);
    for pass in &diagnostics.passes {
        let refined = pass.refined.as_ref().expect("refinement enabled");
        assert!(refined.stats.transit_length <= pass.optimized.transit_length + 1e-9);
        assert!(refined.iterations <= 8);
    }
}

#[test]
fn pipeline_to_svg() {
    let result = vecsort_pipeline::process(INPUT, &PipelineConfig::default()).unwrap();
    let meta = SvgMetadata {
        title: Some("round trip"),
        ..SvgMetadata::default()
    };
    let svg = to_svg(&result.tours, &meta, &SvgOptions::default());

    assert!(svg.contains("<svg"));
    assert!(svg.contains(r#"id="pass-red""#));
    assert!(svg.contains(r#"id="pass-blue""#));
    assert!(svg.contains(r#"id="transits""#));
    assert!(svg.contains("</svg>"));

    let runs = result
        .commands
        .iter()
        .filter(|c| matches!(c, PathCommand::MoveTo(_)))
        .count();
    assert_eq!(svg.matches("<path").count(), runs);
}

#[test]
fn bad_input_produces_no_output() {
    let err = vecsort_pipeline::process("P 0 0 100\nM 0 0\nL 1 1\nQ 1 2\n", &PipelineConfig::default())
        .unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(err.to_string(), "line 4: unknown command 'Q'");
}

#[test]
fn starts_from_configured_point() {
    let config = PipelineConfig {
        start: Point::new(200.0, 60.0),
        ..PipelineConfig::default()
    };
    let result = vecsort_pipeline::process(INPUT, &config).unwrap();
    assert_eq!(result.tours[0].pass(), Pass::Red);
    assert_eq!(result.tours[0].start(), Point::new(200.0, 60.0));
}
