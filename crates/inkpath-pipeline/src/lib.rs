//! inkpath-pipeline: Pure contour extraction pipeline (sans-IO).
//!
//! Converts raster images into closed outlines for a pen plotter through:
//! decode -> binarize -> border following -> area/border filtering ->
//! closed-ring simplification, with optional object-label matching for
//! previews.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Filesystem and terminal
//! interaction live in the `inkpath` binary.

pub mod binarize;
pub mod contour;
pub mod detection;
pub mod diagnostics;
pub mod matching;
pub mod simplify;
pub mod tuner;
pub mod types;

use image::DynamicImage;

pub use binarize::BinaryMask;
pub use contour::{ContourTracer, ContourTracerKind, ExtractParams};
pub use detection::{BoundingBox, Detection, ObjectDetector, StaticDetections};
pub use diagnostics::ExtractionReport;
pub use matching::{MatcherKind, OutlineLabel, OverlapMatcher};
pub use tuner::{Tuner, TunerAction, TunerEvent};
pub use types::{
    Dimensions, PipelineConfig, PipelineError, PipelineWarning, Point, Polyline, ProcessResult,
    Rect,
};

/// Run the extraction pipeline on encoded image bytes.
///
/// # Pipeline steps
///
/// 1. Decode image
/// 2. Grayscale + fixed threshold into a [`BinaryMask`]
/// 3. Border following
/// 4. Area filter, then border filter
/// 5. Closed-ring RDP simplification (skipped at tolerance 0)
///
/// An image without qualifying shapes yields an empty outline list, not
/// an error.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::InvalidInput`] if the image has zero area.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let image = binarize::decode(image_bytes)?;
    process_image(&image, config)
}

/// Run the pipeline on an already-decoded image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::InvalidInput`] if the image has zero area.
pub fn process_image(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let mask = binarize::binarize(image, config.threshold)?;
    let outlines = contour::extract(&mask, &ExtractParams::from(config));
    Ok(ProcessResult {
        outlines,
        dimensions: mask.dimensions(),
    })
}

/// Detect objects in `image` and attach their labels to `outlines`.
///
/// Returns one entry per outline, in order. Labels are for display only;
/// serialization never reads them.
///
/// # Errors
///
/// Propagates [`PipelineError::Detection`] from the detector.
pub fn label_outlines(
    image: &DynamicImage,
    outlines: &[Polyline],
    detector: &dyn ObjectDetector,
    config: &PipelineConfig,
) -> Result<Vec<Option<OutlineLabel>>, PipelineError> {
    let detections = detector.detect(image)?;
    Ok(config
        .matcher
        .assign_with_threshold(outlines, &detections, config.iou_threshold))
}
