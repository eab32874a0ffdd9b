//! G-code export serializer.
//!
//! Converts closed outlines into a G-code program for a servo-lifted pen
//! plotter (the `M300 S<value>` dialect).
//!
//! ## Program layout
//!
//! 1. **Preamble**: millimetre units, absolute positioning, origin reset.
//! 2. **Registration**: pen down then up, drives off, `M01` pause for the
//!    operator to confirm pen placement, drives on.
//! 3. **One block per outline** with at least two points: travel to the
//!    first point, pen down, one `G1` per remaining point, a closing move
//!    back to the first point when the outline is not already closed, pen
//!    up.
//! 4. **Epilogue**: pen up, servo off, return home, drives off.
//!
//! Every pen change is followed by a `G4` dwell so the servo settles.
//!
//! ## Coordinate Convention
//!
//! Image Y grows downward while the machine's Y grows upward, so every
//! emitted Y is the negated source Y. X is passed through unchanged.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use inkpath_pipeline::{Point, Polyline};
use serde::{Deserialize, Serialize};

/// Servo value that powers the pen servo down at the end of a job.
const SERVO_OFF: u32 = 255;

/// Feed rate for the final Z move.
const FINISH_Z_FEED_RATE: f64 = 150.0;

/// Machine parameters for [`to_gcode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeParams {
    /// Feed rate for every `G1` move, in mm/min.
    pub feed_rate: f64,
    /// Servo position with the pen on the paper.
    pub pen_down: f64,
    /// Servo position with the pen lifted.
    pub pen_up: f64,
    /// Dwell after every pen change, in milliseconds.
    pub wait_ms: u32,
}

impl GcodeParams {
    /// Default feed rate.
    pub const DEFAULT_FEED_RATE: f64 = 3500.0;
    /// Default pen-down servo value.
    pub const DEFAULT_PEN_DOWN: f64 = 30.0;
    /// Default pen-up servo value.
    pub const DEFAULT_PEN_UP: f64 = 50.0;
    /// Default dwell.
    pub const DEFAULT_WAIT_MS: u32 = 150;

    /// Check that the parameters describe a runnable program.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidParams`] if the feed rate is not a
    /// positive finite number or either servo value is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.feed_rate.is_finite() || self.feed_rate <= 0.0 {
            return Err(ExportError::InvalidParams(format!(
                "feed_rate must be positive, got {}",
                self.feed_rate
            )));
        }
        for (name, value) in [("pen_down", self.pen_down), ("pen_up", self.pen_up)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ExportError::InvalidParams(format!(
                    "{name} must be a non-negative servo value, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for GcodeParams {
    fn default() -> Self {
        Self {
            feed_rate: Self::DEFAULT_FEED_RATE,
            pen_down: Self::DEFAULT_PEN_DOWN,
            pen_up: Self::DEFAULT_PEN_UP,
            wait_ms: Self::DEFAULT_WAIT_MS,
        }
    }
}

/// Errors from export parameter validation.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Machine parameters are out of range.
    #[error("invalid export parameters: {0}")]
    InvalidParams(String),
}

/// Serialize outlines into a G-code program.
///
/// Outlines with fewer than two points are skipped but still count
/// toward the `; Polyline N` numbering. An empty slice produces just the
/// preamble, registration block and epilogue.
///
/// # Examples
///
/// ```
/// use inkpath_pipeline::{Point, Polyline};
/// use inkpath_export::gcode::{GcodeParams, to_gcode};
///
/// let square = Polyline::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(0.0, 10.0),
///     Point::new(10.0, 10.0),
///     Point::new(10.0, 0.0),
/// ]);
/// let gcode = to_gcode(&[square], &GcodeParams::default());
/// assert!(gcode.contains("G1 X0.00 Y-10.00 F3500.00"));
/// assert!(gcode.ends_with("M18 ; Drives off\n"));
/// ```
#[must_use]
pub fn to_gcode(outlines: &[Polyline], params: &GcodeParams) -> String {
    let mut out = String::new();
    let wait = params.wait_ms;
    let feed = params.feed_rate;

    // --- Preamble ---
    let _ = writeln!(out, "G21 ; Set units to millimeters");
    let _ = writeln!(out, "G90 ; Use absolute positioning mode");
    let _ = writeln!(out, "G92 X0.00 Y0.00 Z0.00 ; Set current position as origin");
    let _ = writeln!(out);

    // --- Registration ---
    let _ = writeln!(
        out,
        "M300 S{:.0} ; Pen down (prepare to print)",
        params.pen_down
    );
    let _ = writeln!(out, "G4 P{wait} ; Wait {wait}ms");
    let _ = writeln!(out, "M300 S{:.0} ; Pen up (initial state)", params.pen_up);
    let _ = writeln!(out, "G4 P{wait} ; Wait {wait}ms");
    let _ = writeln!(out, "M18 ; Disengage drives");
    let _ = writeln!(out, "M01 ; Registration test (pause for user confirmation)");
    let _ = writeln!(out, "M17 ; Engage drives if registration successful");
    let _ = writeln!(out);

    // --- Outlines ---
    for (idx, outline) in outlines.iter().enumerate() {
        let points = outline.points();
        let [first, rest @ ..] = points else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let _ = writeln!(
            out,
            "; Polyline {} consisting of {} points",
            idx + 1,
            points.len()
        );
        write_move(&mut out, *first, feed);
        let _ = writeln!(out, "M300 S{:.2} ; Pen down", params.pen_down);
        let _ = writeln!(out, "G4 P{wait} ; Wait {wait}ms");
        for &p in rest {
            write_move(&mut out, p, feed);
        }
        if points.last() != Some(first) {
            write_move(&mut out, *first, feed);
        }
        let _ = writeln!(out, "M300 S{:.2} ; Pen up", params.pen_up);
        let _ = writeln!(out, "G4 P{wait} ; Wait {wait}ms");
        let _ = writeln!(out);
    }

    // --- Epilogue ---
    let _ = writeln!(out, "; End of print job");
    let _ = writeln!(out, "M300 S{:.2} ; Pen up", params.pen_up);
    let _ = writeln!(out, "G4 P{wait} ; Wait {wait}ms");
    let _ = writeln!(out, "M300 S{SERVO_OFF} ; Turn off servo");
    let _ = writeln!(out, "G1 X0 Y0 F{feed:.2}");
    let _ = writeln!(
        out,
        "G1 Z0.00 F{FINISH_Z_FEED_RATE:.2} ; Raise to finished level"
    );
    let _ = writeln!(out, "G1 X0.00 Y0.00 F{feed:.2} ; Return to home");
    let _ = writeln!(out, "M18 ; Drives off");

    out
}

/// Emit one linear move with the Y axis mirrored.
fn write_move(out: &mut String, p: Point, feed: f64) {
    // Subtracting from +0.0 keeps points on the X axis at `Y0.00`
    // rather than `Y-0.00`.
    let y = 0.0 - p.y;
    let _ = writeln!(out, "G1 X{:.2} Y{y:.2} F{feed:.2}", p.x);
}
