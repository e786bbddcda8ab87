//! SVG preview serializer.
//!
//! Renders ordered tours as an SVG document using the [`svg`] crate for
//! document construction, XML escaping, and path data formatting.
//!
//! Each pass becomes a `<g>` stroked in the pass color, holding one
//! `<path>` per pen-down run (`M` then `L` commands). Pen-up transits can
//! be drawn as a separate dashed group, which makes wasted travel easy
//! to spot when comparing optimizer settings.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>`, and `<metadata>`
//! elements so exported previews are self-describing.
//!
//! Rendering never touches the filesystem; callers write the returned `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Line, Path, Title};
use svg::node::{Node, Text, Value};

use vecsort_pipeline::emit::pen_down_runs;
use vecsort_pipeline::{Point, Polyline, Tour};

/// Stroke color for pen-up transits.
const TRANSIT_COLOR: &str = "#999999";

/// Descriptive elements placed ahead of the drawing. Each one is
/// skipped when `None`; text is escaped by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// `<title>` text, usually the input file name.
    pub title: Option<&'a str>,

    /// `<desc>` text, usually a one-line transit summary.
    pub description: Option<&'a str>,

    /// Serialized pipeline configuration, emitted as the text of a
    /// `<metadata>` element so a preview records the settings that
    /// produced it.
    pub config_json: Option<&'a str>,
}

/// Rendering options for [`to_svg`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgOptions {
    /// Draw pen-up transits as dashed lines.
    pub show_transits: bool,
    /// Stroke width in user units.
    pub stroke_width: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            show_transits: true,
            stroke_width: 0.5,
        }
    }
}

/// Path `d` data for one pen-down run: a move to its first point, then
/// a line to each following point. A run needs at least two points to
/// draw anything; shorter ones give an empty string.
///
/// # Examples
///
/// ```
/// use vecsort_pipeline::{Point, Polyline};
/// use vecsort_export::build_path_data;
///
/// let run = Polyline::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(10.0, 5.0),
/// ]);
/// assert_eq!(build_path_data(&run), "M0,0 L10,0 L10,5");
/// ```
#[must_use]
pub fn build_path_data(run: &Polyline) -> String {
    let Some((first, rest)) = run.points().split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let data = rest
        .iter()
        .fold(Data::new().move_to((first.x, first.y)), |data, p| data.line_to((p.x, p.y)));
    String::from(Value::from(data))
}

/// Axis-aligned bounds of everything drawn, as `(min, max)`.
///
/// Includes each tour's start point when transits are shown, since the
/// first transit leaves from there.
fn bounds(tours: &[Tour], include_starts: bool) -> Option<(Point, Point)> {
    let mut points = tours
        .iter()
        .filter(|tour| !tour.is_empty())
        .flat_map(|tour| {
            let start = include_starts.then_some(tour.start());
            start
                .into_iter()
                .chain(tour.segments().iter().flat_map(|s| [s.a, s.b]))
        });

    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| {
        (
            Point::new(min.x.min(p.x), min.y.min(p.y)),
            Point::new(max.x.max(p.x), max.y.max(p.y)),
        )
    }))
}

/// `(x, y, width, height)` of the view box: the drawing bounds padded
/// by 5% of the larger extent, or a unit box when nothing is drawn.
fn view_box(tours: &[Tour], options: &SvgOptions) -> (f64, f64, f64, f64) {
    let Some((min, max)) = bounds(tours, options.show_transits) else {
        return (0.0, 0.0, 1.0, 1.0);
    };
    let extent = (max.x - min.x).max(max.y - min.y);
    let margin = if extent > 0.0 { extent * 0.05 } else { 1.0 };
    (
        min.x - margin,
        min.y - margin,
        2.0f64.mul_add(margin, max.x - min.x),
        2.0f64.mul_add(margin, max.y - min.y),
    )
}

/// One `<g>` per pass holding a `<path>` per pen-down run.
fn pass_group(tour: &Tour, stroke_width: f64) -> Group {
    let mut group = Group::new()
        .set("id", format!("pass-{}", tour.pass().name()))
        .set("fill", "none")
        .set("stroke", tour.pass().name())
        .set("stroke-width", stroke_width)
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round");

    for run in pen_down_runs(tour) {
        let d = build_path_data(&run);
        if d.is_empty() {
            continue;
        }
        group = group.add(Path::new().set("d", d));
    }
    group
}

/// Dashed lines for every pen-up transit, or `None` if there are none.
fn transit_group(tours: &[Tour], stroke_width: f64) -> Option<Group> {
    let mut group = Group::new()
        .set("id", "transits")
        .set("stroke", TRANSIT_COLOR)
        .set("stroke-width", stroke_width / 2.0)
        .set("stroke-dasharray", format!("{} {}", stroke_width * 2.0, stroke_width * 2.0));
    let mut any = false;

    for tour in tours {
        for (_, from, to) in tour.transits() {
            group = group.add(
                Line::new()
                    .set("x1", from.x)
                    .set("y1", from.y)
                    .set("x2", to.x)
                    .set("y2", to.y),
            );
            any = true;
        }
    }

    any.then_some(group)
}

/// Serialize ordered tours into an SVG document string.
///
/// Tours are drawn in the order given; empty tours produce no group.
/// The `viewBox` fits the drawing with a small margin.
#[must_use]
pub fn to_svg(tours: &[Tour], metadata: &SvgMetadata<'_>, options: &SvgOptions) -> String {
    let mut doc = Document::new().set("viewBox", view_box(tours, options));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(Text::new(config_json));
        doc = doc.add(metadata_el);
    }

    if options.show_transits
        && let Some(group) = transit_group(tours, options.stroke_width)
    {
        doc = doc.add(group);
    }

    for tour in tours.iter().filter(|tour| !tour.is_empty()) {
        doc = doc.add(pass_group(tour, options.stroke_width));
    }

    // `Document` renders without an XML declaration.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
