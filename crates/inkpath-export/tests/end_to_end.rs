//! Integration test: binary mask through extraction, matching and G-code export.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{GrayImage, Luma};
use inkpath_export::{GcodeParams, SvgMetadata, to_gcode, to_preview_svg};
use inkpath_pipeline::contour::{self, ExtractParams};
use inkpath_pipeline::{
    BinaryMask, BoundingBox, Detection, Dimensions, MatcherKind, OverlapMatcher,
};

fn square_mask() -> BinaryMask {
    let img = GrayImage::from_fn(10, 10, |x, y| {
        if (3..=6).contains(&x) && (3..=6).contains(&y) {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    BinaryMask::new(img).unwrap()
}

#[test]
fn filled_square_becomes_five_move_block() {
    let params = ExtractParams {
        min_area: 5.0,
        ignore_border: true,
        tolerance: 0.0,
        ..ExtractParams::default()
    };
    let outlines = contour::extract(&square_mask(), &params);
    assert_eq!(outlines.len(), 1);
    assert_eq!(outlines[0].len(), 4);

    let gcode = to_gcode(
        &outlines,
        &GcodeParams {
            feed_rate: 1000.0,
            pen_down: 30.0,
            pen_up: 50.0,
            wait_ms: 100,
        },
    );

    let lines: Vec<&str> = gcode.lines().collect();
    let start = lines
        .iter()
        .position(|l| l.starts_with("; Polyline 1"))
        .expect("path block present");
    let end = start
        + lines[start..]
            .iter()
            .position(|l| l.is_empty())
            .expect("path block terminated");
    let block = &lines[start..end];

    let moves = block.iter().filter(|l| l.starts_with("G1 ")).count();
    assert_eq!(moves, 5, "4 corners + 1 closing move:\n{}", block.join("\n"));
    assert_eq!(block.iter().filter(|l| l.starts_with("M300 S30")).count(), 1);
    assert_eq!(block.iter().filter(|l| l.starts_with("M300 S50")).count(), 1);

    // Mirrored Y: every drawn point lies in y in [-6, -3].
    for line in block.iter().filter(|l| l.starts_with("G1 ")) {
        let y: f64 = line
            .split_whitespace()
            .find_map(|tok| tok.strip_prefix('Y'))
            .unwrap()
            .parse()
            .unwrap();
        assert!((-6.0..=-3.0).contains(&y), "unexpected Y in {line}");
    }

    // First and closing moves coincide.
    let g1: Vec<&&str> = block.iter().filter(|l| l.starts_with("G1 ")).collect();
    assert_eq!(g1.first(), g1.last());
}

#[test]
fn labels_reach_the_preview_but_not_the_program() {
    let outlines = contour::extract(
        &square_mask(),
        &ExtractParams {
            min_area: 5.0,
            tolerance: 0.0,
            ..ExtractParams::default()
        },
    );
    let unlabelled_gcode = to_gcode(&outlines, &GcodeParams::default());

    let detections = vec![Detection {
        label: "square".to_string(),
        confidence: 0.9,
        class_id: None,
        bbox: BoundingBox::new(3.0, 3.0, 7.0, 7.0),
    }];
    let labels = MatcherKind::Greedy.assign(&outlines, &detections);
    assert_eq!(labels[0].as_ref().map(|l| l.label.as_str()), Some("square"));

    let dimensions = Dimensions {
        width: 10,
        height: 10,
    };
    let plain = to_preview_svg(&outlines, None, dimensions, &SvgMetadata::default());
    let annotated = to_preview_svg(&outlines, Some(&labels), dimensions, &SvgMetadata::default());
    assert!(!plain.contains("square (0.90)"));
    assert!(annotated.contains("square (0.90)"));

    // Matching borrows the outlines; the program built afterwards is the
    // same one built before any labels existed.
    assert_eq!(to_gcode(&outlines, &GcodeParams::default()), unlabelled_gcode);
}

#[test]
fn nothing_found_still_serializes() {
    let blank = BinaryMask::new(GrayImage::new(10, 10)).unwrap();
    let outlines = contour::extract(&blank, &ExtractParams::default());
    assert!(outlines.is_empty());
    let gcode = to_gcode(&outlines, &GcodeParams::default());
    assert!(gcode.starts_with("G21"));
    assert!(gcode.contains("M01"));
    assert!(!gcode.contains("; Polyline"));
    assert!(gcode.contains("M18 ; Drives off"));
}
