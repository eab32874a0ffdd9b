//! Object detection boundary.
//!
//! The detector itself is an external black box: anything that can turn
//! an image into labelled, scored boxes implements [`ObjectDetector`].
//! Overlap matching only ever sees the resulting [`Detection`]s, so its
//! tests never depend on a particular model.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Rect};

/// Axis-aligned box given by two corners, with `x1 <= x2` and `y1 <= y2`.
///
/// Serialized as a `[x1, y1, x2, y2]` array, the layout most detectors
/// emit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f64,
    /// Top edge.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Bottom edge.
    pub y2: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners in any order.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// The same region as a [`Rect`].
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect {
            x: self.x1,
            y: self.y1,
            width: self.x2 - self.x1,
            height: self.y2 - self.y1,
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Human-readable class name.
    pub label: String,
    /// Detector score in `[0, 1]`.
    pub confidence: f64,
    /// Numeric class identifier, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    /// Object extent in image pixels.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

/// Capability: find objects in an image.
pub trait ObjectDetector {
    /// Detect objects in `image`.
    ///
    /// # Errors
    ///
    /// Implementations return [`PipelineError::Detection`] when the
    /// underlying detector fails.
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, PipelineError>;
}

/// Detector backed by a precomputed list, typically loaded from the
/// output of an external model run.
///
/// Only detections scoring at least `min_confidence` are returned.
#[derive(Debug, Clone, Default)]
pub struct StaticDetections {
    detections: Vec<Detection>,
    min_confidence: f64,
}

impl StaticDetections {
    /// Wrap a detection list.
    #[must_use]
    pub const fn new(detections: Vec<Detection>, min_confidence: f64) -> Self {
        Self {
            detections,
            min_confidence,
        }
    }
}

impl ObjectDetector for StaticDetections {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>, PipelineError> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= self.min_confidence)
            .cloned()
            .collect())
    }
}
