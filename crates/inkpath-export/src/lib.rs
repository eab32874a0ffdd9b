//! inkpath-export: Pure format serializers (sans-IO)
//!
//! Converts outlines into output formats: G-code toolpaths for the
//! plotter and SVG previews for the operator.

pub mod gcode;
pub mod svg;

pub use gcode::{ExportError, GcodeParams, to_gcode};
pub use svg::{SvgMetadata, to_preview_svg};
