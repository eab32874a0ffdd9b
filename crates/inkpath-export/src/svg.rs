//! SVG preview serializer.
//!
//! Renders outlines as closed `<path>` elements in image pixel space,
//! with optional object labels drawn above each labelled outline. Used
//! for the tuning preview and the annotated preview after matching; the
//! plotter itself only ever receives G-code.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use inkpath_pipeline::{Dimensions, OutlineLabel, Polyline};

/// Vertical offset of a label above its outline's bounding rectangle.
const LABEL_OFFSET_PX: f64 = 10.0;

/// Metadata to embed in the SVG document.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title -- emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description -- emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string for a closed outline.
///
/// Uses `M` for the first point, `L` for subsequent points and `Z` to
/// close the ring. Returns an empty string for outlines with fewer than
/// 2 points.
///
/// # Examples
///
/// ```
/// use inkpath_pipeline::{Point, Polyline};
/// use inkpath_export::svg::build_path_data;
///
/// let outline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.0, 40.0),
/// ]);
/// assert_eq!(build_path_data(&outline), "M10,20 L30,40 z");
/// ```
#[must_use]
pub fn build_path_data(outline: &Polyline) -> String {
    let points = outline.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Text drawn for a label: the class name and its confidence.
#[must_use]
pub fn label_text(label: &OutlineLabel) -> String {
    format!("{} ({:.2})", label.label, label.confidence)
}

/// Serialize outlines (and optional labels) into a preview SVG string.
///
/// `labels`, when given, is matched to `outlines` by index; extra or
/// missing entries are ignored.
#[must_use]
pub fn to_preview_svg(
    outlines: &[Polyline],
    labels: Option<&[Option<OutlineLabel>]>,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for outline in outlines {
        let d = build_path_data(outline);
        if d.is_empty() {
            continue;
        }
        let path = Path::new()
            .set("d", d)
            .set("fill", "none")
            .set("stroke", "green")
            .set("stroke-width", 2);
        doc = doc.add(path);
    }

    if let Some(labels) = labels {
        for (outline, label) in outlines.iter().zip(labels) {
            let Some(label) = label else {
                continue;
            };
            let rect = outline.bounding_rect();
            let mut text = Element::new("text");
            text.assign("x", rect.x);
            text.assign("y", rect.y - LABEL_OFFSET_PX);
            text.assign("fill", "red");
            text.assign("font-family", "sans-serif");
            text.assign("font-size", 12);
            text.append(Text::new(label_text(label)));
            doc = doc.add(text);
        }
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
