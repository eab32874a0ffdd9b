//! Shared types for the inkpath contour pipeline.

use serde::{Deserialize, Serialize};

use crate::matching::MatcherKind;

/// Re-export `GrayImage` so downstream crates can reference raster
/// masks without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points.
///
/// Outlines produced by contour extraction are closed rings: the last
/// point connects back to the first even when the two differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Enclosed area of the polyline treated as a closed ring.
    ///
    /// Shoelace formula over all edges including the implicit closing
    /// edge. Always non-negative; fewer than 3 points enclose nothing.
    #[must_use]
    pub fn area(&self) -> f64 {
        let points = &self.0;
        if points.len() < 3 {
            return 0.0;
        }
        let mut twice_area = 0.0;
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            twice_area += a.x.mul_add(b.y, -(b.x * a.y));
        }
        (twice_area / 2.0).abs()
    }

    /// Pixel-grid bounding rectangle of the point set.
    ///
    /// Extents are inclusive of the last pixel, so a single point has a
    /// 1x1 rectangle. An empty polyline yields [`Rect::ZERO`].
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.0.first() else {
            return Rect::ZERO;
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.0[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1.0,
            height: max_y - min_y + 1.0,
        }
    }
}

/// Axis-aligned rectangle given by its top-left corner and extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Area, treating negative extents as empty.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Area of the overlap with `other`; zero when they do not overlap.
    #[must_use]
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);
        (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0)
    }

    /// Intersection-over-union with `other`, in `[0, 1]`.
    ///
    /// Returns 0 when the union is empty so degenerate rectangles never
    /// divide by zero.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union > 0.0 { inter / union } else { 0.0 }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Configuration for the contour pipeline.
///
/// Covers binarization, extraction filters, the initial simplification
/// tolerance and object-label matching. Toolpath serialization has its
/// own parameters in the export crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Luma threshold for binarization. Pixels strictly brighter become
    /// foreground.
    pub threshold: u8,

    /// Outlines enclosing less area than this (square pixels) are dropped.
    pub min_area: f64,

    /// Drop outlines whose bounding rectangle reaches the image border.
    pub ignore_border: bool,

    /// Distance from the image edge, in pixels, within which an outline
    /// counts as touching the border.
    pub border_margin: u32,

    /// Ramer-Douglas-Peucker tolerance in pixels. Zero keeps every traced
    /// corner.
    pub tolerance: f64,

    /// Minimum IoU for a detection to label an outline (exclusive).
    pub iou_threshold: f64,

    /// Detections below this confidence are ignored.
    pub min_confidence: f64,

    /// Which outline/detection assignment strategy to use.
    pub matcher: MatcherKind,
}

impl PipelineConfig {
    /// Default binarization threshold.
    pub const DEFAULT_THRESHOLD: u8 = 200;
    /// Default minimum outline area.
    pub const DEFAULT_MIN_AREA: f64 = 100.0;
    /// Default border margin.
    pub const DEFAULT_BORDER_MARGIN: u32 = 1;
    /// Default simplification tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 2.0;
    /// Default IoU significance threshold.
    pub const DEFAULT_IOU_THRESHOLD: f64 = 0.2;
    /// Default minimum detection confidence.
    pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

    /// Check field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `min_area` or
    /// `tolerance` is negative or not finite, or when `iou_threshold` or
    /// `min_confidence` lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_area must be a non-negative number, got {}",
                self.min_area
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            min_area: Self::DEFAULT_MIN_AREA,
            ignore_border: true,
            border_margin: Self::DEFAULT_BORDER_MARGIN,
            tolerance: Self::DEFAULT_TOLERANCE,
            iou_threshold: Self::DEFAULT_IOU_THRESHOLD,
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
            matcher: MatcherKind::default(),
        }
    }
}

/// Result of running the pipeline on an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Extracted (and simplified) outlines in discovery order.
    pub outlines: Vec<Polyline>,

    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Non-fatal conditions worth reporting to the operator.
///
/// These never abort the pipeline: an empty result is a valid
/// terminal state and the serializer accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineWarning {
    /// Extraction kept no outlines.
    NoOutlines,
    /// Matching attached no labels.
    NoLabels,
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOutlines => f.write_str("no contours found in the image"),
            Self::NoLabels => f.write_str("no outline matched a detected object"),
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The raster handed to extraction is not a usable binary mask.
    #[error("invalid input mask: {0}")]
    InvalidInput(String),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The object detector failed.
    #[error("object detection failed: {0}")]
    Detection(String),
}
