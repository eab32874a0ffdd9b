//! Attach object-detection labels to outlines by bounding-box overlap.
//!
//! Each outline is compared with each detection by intersection-over-union
//! of their bounding rectangles. A detection labels an outline only when
//! the IoU is strictly above a significance threshold.
//!
//! # Strategy pattern
//!
//! [`MatcherKind::Greedy`] is the default: every outline independently
//! takes its best detection, so one detection may label several outlines.
//! It is a single pass with no coordination between outlines, which keeps
//! the preview instant. [`MatcherKind::OneToOne`] enforces that each
//! detection labels at most one outline, for callers that need exclusive
//! assignments. Neither strategy touches extraction or serialization.

use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::types::{PipelineConfig, PipelineWarning, Polyline, Rect};

/// A label attached to one outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineLabel {
    /// Class name of the matched detection.
    pub label: String,
    /// Confidence of the matched detection.
    pub confidence: f64,
}

impl OutlineLabel {
    fn from_detection(detection: &Detection) -> Self {
        Self {
            label: detection.label.clone(),
            confidence: detection.confidence,
        }
    }
}

/// Selects which assignment strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatcherKind {
    /// Per-outline best match; detections may be shared.
    #[default]
    Greedy,
    /// Highest-IoU pairs first; each outline and detection used once.
    OneToOne,
}

/// Trait for outline/detection assignment strategies.
///
/// Output has exactly one entry per outline, in input order; `None` means
/// no detection overlaps that outline significantly.
pub trait OverlapMatcher {
    /// Assign labels using the given IoU threshold (exclusive).
    fn assign_with_threshold(
        &self,
        outlines: &[Polyline],
        detections: &[Detection],
        iou_threshold: f64,
    ) -> Vec<Option<OutlineLabel>>;

    /// Assign labels using [`PipelineConfig::DEFAULT_IOU_THRESHOLD`].
    fn assign(&self, outlines: &[Polyline], detections: &[Detection]) -> Vec<Option<OutlineLabel>> {
        self.assign_with_threshold(outlines, detections, PipelineConfig::DEFAULT_IOU_THRESHOLD)
    }
}

impl OverlapMatcher for MatcherKind {
    fn assign_with_threshold(
        &self,
        outlines: &[Polyline],
        detections: &[Detection],
        iou_threshold: f64,
    ) -> Vec<Option<OutlineLabel>> {
        let labels = match *self {
            Self::Greedy => assign_greedy(outlines, detections, iou_threshold),
            Self::OneToOne => assign_one_to_one(outlines, detections, iou_threshold),
        };

        let matched = labels.iter().filter(|l| l.is_some()).count();
        tracing::debug!(
            strategy = ?self,
            outlines = outlines.len(),
            detections = detections.len(),
            matched,
            "matched outlines to detections"
        );
        if matched == 0 && !outlines.is_empty() {
            tracing::warn!("{}", PipelineWarning::NoLabels);
        }
        labels
    }
}

/// IoU between an outline's bounding rectangle and a detection box.
#[must_use]
pub fn outline_iou(outline: &Polyline, detection: &Detection) -> f64 {
    outline.bounding_rect().iou(&detection.bbox.to_rect())
}

fn assign_greedy(
    outlines: &[Polyline],
    detections: &[Detection],
    iou_threshold: f64,
) -> Vec<Option<OutlineLabel>> {
    outlines
        .iter()
        .map(|outline| {
            let rect = outline.bounding_rect();
            let mut best: Option<(f64, &Detection)> = None;
            for detection in detections {
                let iou = rect.iou(&detection.bbox.to_rect());
                if best.is_none_or(|(best_iou, _)| iou > best_iou) {
                    best = Some((iou, detection));
                }
            }
            best.filter(|&(iou, _)| iou > iou_threshold)
                .map(|(_, d)| OutlineLabel::from_detection(d))
        })
        .collect()
}

fn assign_one_to_one(
    outlines: &[Polyline],
    detections: &[Detection],
    iou_threshold: f64,
) -> Vec<Option<OutlineLabel>> {
    let rects: Vec<Rect> = detections.iter().map(|d| d.bbox.to_rect()).collect();

    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (oi, outline) in outlines.iter().enumerate() {
        let rect = outline.bounding_rect();
        for (di, det_rect) in rects.iter().enumerate() {
            let iou = rect.iou(det_rect);
            if iou > iou_threshold {
                pairs.push((iou, oi, di));
            }
        }
    }
    // Stable sort keeps (outline, detection) index order among equal IoUs.
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut labels = vec![None; outlines.len()];
    let mut detection_used = vec![false; detections.len()];
    for (_, oi, di) in pairs {
        if labels[oi].is_some() || detection_used[di] {
            continue;
        }
        labels[oi] = Some(OutlineLabel::from_detection(&detections[di]));
        detection_used[di] = true;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use crate::types::Point;

    /// Axis-aligned square outline whose pixel-inclusive rect is
    /// `(x0, y0)`..`(x0 + side, y0 + side)`.
    fn square(x0: f64, y0: f64, side: f64) -> Polyline {
        let s = side - 1.0;
        Polyline::new(vec![
            Point::new(x0, y0),
            Point::new(x0, y0 + s),
            Point::new(x0 + s, y0 + s),
            Point::new(x0 + s, y0),
        ])
    }

    fn det(label: &str, confidence: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            class_id: None,
            bbox: BoundingBox::new(x1, y1, x2, y2),
        }
    }

    #[test]
    fn empty_outlines_give_empty_labels() {
        let detections = vec![det("cat", 0.9, 0.0, 0.0, 10.0, 10.0)];
        assert!(MatcherKind::Greedy.assign(&[], &detections).is_empty());
        assert!(MatcherKind::OneToOne.assign(&[], &detections).is_empty());
    }

    #[test]
    fn no_detections_give_none_per_outline() {
        let outlines = vec![square(0.0, 0.0, 10.0), square(20.0, 20.0, 5.0)];
        assert_eq!(MatcherKind::Greedy.assign(&outlines, &[]), vec![None, None]);
    }

    #[test]
    fn exact_overlap_labels_outline() {
        let outlines = vec![square(10.0, 10.0, 20.0)];
        let detections = vec![det("dog", 0.8, 10.0, 10.0, 30.0, 30.0)];
        let labels = MatcherKind::Greedy.assign(&outlines, &detections);
        assert_eq!(
            labels,
            vec![Some(OutlineLabel {
                label: "dog".to_string(),
                confidence: 0.8
            })]
        );
    }

    #[test]
    fn best_iou_wins() {
        let outlines = vec![square(0.0, 0.0, 10.0)];
        let detections = vec![
            det("partial", 0.99, 5.0, 0.0, 15.0, 10.0),
            det("exact", 0.6, 0.0, 0.0, 10.0, 10.0),
        ];
        let labels = MatcherKind::Greedy.assign(&outlines, &detections);
        assert_eq!(labels[0].as_ref().map(|l| l.label.as_str()), Some("exact"));
    }

    #[test]
    fn ties_keep_first_detection() {
        let outlines = vec![square(0.0, 0.0, 10.0)];
        let detections = vec![
            det("first", 0.5, 0.0, 0.0, 10.0, 10.0),
            det("second", 0.9, 0.0, 0.0, 10.0, 10.0),
        ];
        let labels = MatcherKind::Greedy.assign(&outlines, &detections);
        assert_eq!(labels[0].as_ref().map(|l| l.label.as_str()), Some("first"));
    }

    #[test]
    fn iou_at_or_below_threshold_is_rejected() {
        let outlines = vec![square(0.0, 0.0, 10.0)];
        // Overlap 2x10 = 20, union 100 + 100 - 20 = 180 -> IoU ~0.11.
        let weak = vec![det("weak", 0.9, 8.0, 0.0, 18.0, 10.0)];
        assert_eq!(MatcherKind::Greedy.assign(&outlines, &weak), vec![None]);

        // IoU exactly 1/3: rejected at threshold 1/3, accepted just below.
        let third = vec![det("third", 0.9, 5.0, 0.0, 15.0, 10.0)];
        let iou = outline_iou(&outlines[0], &third[0]);
        assert_eq!(
            MatcherKind::Greedy.assign_with_threshold(&outlines, &third, iou),
            vec![None]
        );
        let labels = MatcherKind::Greedy.assign_with_threshold(&outlines, &third, iou - 1e-9);
        assert!(labels[0].is_some());
    }

    #[test]
    fn degenerate_outline_never_matches() {
        let outlines = vec![Polyline::new(vec![])];
        let detections = vec![det("any", 1.0, 0.0, 0.0, 0.0, 0.0)];
        assert_eq!(MatcherKind::Greedy.assign(&outlines, &detections), vec![None]);
    }

    #[test]
    fn greedy_shares_detections_between_outlines() {
        // Two overlapping outlines both favour the single detection.
        let outlines = vec![square(0.0, 0.0, 10.0), square(1.0, 1.0, 10.0)];
        let detections = vec![det("shared", 0.7, 0.0, 0.0, 10.0, 10.0)];
        let labels = MatcherKind::Greedy.assign(&outlines, &detections);
        assert!(labels.iter().all(Option::is_some));
    }

    #[test]
    fn one_to_one_uses_each_detection_once() {
        let outlines = vec![square(1.0, 1.0, 10.0), square(0.0, 0.0, 10.0)];
        let detections = vec![det("shared", 0.7, 0.0, 0.0, 10.0, 10.0)];
        let labels = MatcherKind::OneToOne.assign(&outlines, &detections);
        // The exact overlap (second outline) takes the detection.
        assert_eq!(labels[0], None);
        assert_eq!(labels[1].as_ref().map(|l| l.label.as_str()), Some("shared"));
    }

    #[test]
    fn one_to_one_falls_back_to_next_best_detection() {
        let outlines = vec![square(0.0, 0.0, 10.0), square(1.0, 0.0, 10.0)];
        let detections = vec![
            det("a", 0.9, 0.0, 0.0, 10.0, 10.0),
            det("b", 0.9, 2.0, 0.0, 12.0, 10.0),
        ];
        let labels = MatcherKind::OneToOne.assign(&outlines, &detections);
        assert_eq!(labels[0].as_ref().map(|l| l.label.as_str()), Some("a"));
        assert_eq!(labels[1].as_ref().map(|l| l.label.as_str()), Some("b"));
    }

    #[test]
    fn matching_is_deterministic() {
        let outlines = vec![square(0.0, 0.0, 10.0), square(30.0, 30.0, 8.0)];
        let detections = vec![
            det("a", 0.9, 0.0, 0.0, 9.0, 9.0),
            det("b", 0.4, 29.0, 29.0, 38.0, 38.0),
            det("c", 0.6, 2.0, 2.0, 12.0, 12.0),
        ];
        for kind in [MatcherKind::Greedy, MatcherKind::OneToOne] {
            assert_eq!(
                kind.assign(&outlines, &detections),
                kind.assign(&outlines, &detections)
            );
        }
    }
}
