//! vecsort-export: Pure format serializers (sans-IO)
//!
//! Converts pipeline output into files: the text path stream consumed by
//! the device driver, and an SVG preview of the ordered tours.

pub mod path_stream;
pub mod svg;

pub use path_stream::{PathStreamOptions, to_path_stream};
pub use svg::{SvgMetadata, SvgOptions, build_path_data, to_svg};
