//! Contour extraction: turn a binary mask into filtered closed outlines.
//!
//! This module defines the [`ContourTracer`] trait for pluggable border
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! one at runtime, plus [`extract`], which traces, filters and optionally
//! simplifies in one pure call.
//!
//! # Filtering
//!
//! Candidates are dropped, in order, when
//!
//! 1. their enclosed area is below `min_area` (binarization specks), or
//! 2. `ignore_border` is set and their bounding rectangle comes within
//!    `border_margin` pixels of a mask edge. A light background traces as
//!    one large frame around the whole image, which must never become a
//!    toolpath.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::binarize::BinaryMask;
use crate::diagnostics::ExtractionReport;
use crate::simplify;
use crate::types::{Dimensions, PipelineConfig, PipelineWarning, Point, Polyline};

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following via `imageproc::contours::find_contours`,
    /// with straight runs compressed to their end points.
    ///
    /// Finds outer borders and hole borders alike, in raster discovery
    /// order.
    #[default]
    BorderFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary raster (non-zero pixels = foreground).
/// Output: one closed outline per traced border, in a deterministic order.
pub trait ContourTracer {
    /// Trace borders in the given binary raster.
    fn trace(&self, mask: &GrayImage) -> Vec<Polyline>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, mask: &GrayImage) -> Vec<Polyline> {
        match *self {
            Self::BorderFollowing => trace_border_following(mask),
        }
    }
}

/// Parameters for [`extract`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractParams {
    /// Minimum enclosed area in square pixels.
    pub min_area: f64,
    /// Drop outlines touching the mask border.
    pub ignore_border: bool,
    /// Border proximity, in pixels, that counts as touching.
    pub border_margin: u32,
    /// RDP tolerance; `0.0` skips simplification.
    pub tolerance: f64,
    /// Tracing algorithm.
    pub tracer: ContourTracerKind,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ExtractParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_area: config.min_area,
            ignore_border: config.ignore_border,
            border_margin: config.border_margin,
            tolerance: config.tolerance,
            tracer: ContourTracerKind::default(),
        }
    }
}

impl ExtractParams {
    /// Copy of these parameters with a different tolerance.
    #[must_use]
    pub const fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }
}

/// Extract filtered outlines from a mask.
///
/// Pure function of its inputs; calling it twice with the same mask and
/// parameters yields identical outlines in identical order.
#[must_use = "returns the extracted outlines"]
pub fn extract(mask: &BinaryMask, params: &ExtractParams) -> Vec<Polyline> {
    extract_with_report(mask, params).0
}

/// Like [`extract`], additionally returning per-stage counts.
#[must_use = "returns the extracted outlines and their report"]
pub fn extract_with_report(
    mask: &BinaryMask,
    params: &ExtractParams,
) -> (Vec<Polyline>, ExtractionReport) {
    let dimensions = mask.dimensions();
    let candidates = params.tracer.trace(mask.as_image());

    let mut report = ExtractionReport {
        tolerance: params.tolerance,
        candidate_count: candidates.len(),
        ..ExtractionReport::default()
    };

    let mut kept = Vec::with_capacity(candidates.len());
    for outline in candidates {
        if outline.area() < params.min_area {
            report.rejected_by_area += 1;
            continue;
        }
        if params.ignore_border && touches_border(&outline, dimensions, params.border_margin) {
            report.rejected_by_border += 1;
            continue;
        }
        kept.push(outline);
    }

    report.points_before = kept.iter().map(Polyline::len).sum();
    let outlines = if params.tolerance > 0.0 {
        simplify::simplify_outlines(&kept, params.tolerance)
    } else {
        kept
    };
    report.points_after = outlines.iter().map(Polyline::len).sum();
    report.kept_count = outlines.len();

    tracing::debug!(
        candidates = report.candidate_count,
        rejected_by_area = report.rejected_by_area,
        rejected_by_border = report.rejected_by_border,
        kept = report.kept_count,
        points_before = report.points_before,
        points_after = report.points_after,
        tolerance = params.tolerance,
        "extracted outlines"
    );
    if outlines.is_empty() {
        tracing::warn!("{}", PipelineWarning::NoOutlines);
        report.warnings.push(PipelineWarning::NoOutlines);
    }

    (outlines, report)
}

/// Whether the outline's bounding rectangle lies within `margin` pixels
/// of any mask edge.
fn touches_border(outline: &Polyline, dimensions: Dimensions, margin: u32) -> bool {
    let rect = outline.bounding_rect();
    let m = f64::from(margin);
    let width = f64::from(dimensions.width);
    let height = f64::from(dimensions.height);
    rect.x <= m
        || rect.y <= m
        || rect.x + rect.width >= width - m
        || rect.y + rect.height >= height - m
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
///
/// The tracer only starts an outer border at `x > 0`, so the mask is
/// framed by one pixel of background first. Regions reaching the mask
/// edge (a light page, for one) are then traced like any other, and
/// points are shifted back into mask coordinates.
fn trace_border_following(mask: &GrayImage) -> Vec<Polyline> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&padded);

    contours
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let outline = compress_chain(&c.points);
            Polyline::new(
                outline
                    .into_points()
                    .into_iter()
                    .map(|p| Point::new(p.x - 1.0, p.y - 1.0))
                    .collect(),
            )
        })
        .collect()
}

/// Drop points in the interior of straight runs.
///
/// A point is interior when the step into it and the step out of it point
/// the same way. The ring wraps, so the last point is compared against
/// the first. The first traced point is always kept.
fn compress_chain(points: &[imageproc::point::Point<u32>]) -> Polyline {
    let n = points.len();
    let at = |i: usize| (i64::from(points[i].x), i64::from(points[i].y));

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        if i > 0 && n >= 3 {
            let (px, py) = at(i - 1);
            let (cx, cy) = at(i);
            let (nx, ny) = at((i + 1) % n);
            let (ax, ay) = (cx - px, cy - py);
            let (bx, by) = (nx - cx, ny - cy);
            let cross = ax * by - ay * bx;
            let dot = ax * bx + ay * by;
            if cross == 0 && dot > 0 {
                continue;
            }
        }
        out.push(Point::new(f64::from(points[i].x), f64::from(points[i].y)));
    }
    Polyline::new(out)
}
