//! Interactive simplification tuning.
//!
//! [`Tuner`] owns nothing but the current tolerance. Every adjustment
//! re-runs [`extract`](crate::contour::extract) over the borrowed,
//! read-only mask and hands back a fresh outline set that replaces the
//! previous one. Front ends map their own input events (arrow keys,
//! typed commands) onto [`TunerAction`]s and render the outlines from
//! each [`TunerEvent`].

use crate::binarize::BinaryMask;
use crate::contour::{self, ExtractParams};
use crate::diagnostics::ExtractionReport;
use crate::types::Polyline;

/// Operator input understood by the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerAction {
    /// Coarser outlines: raise the tolerance by one step.
    Increase,
    /// Finer outlines: lower the tolerance by one step.
    Decrease,
    /// Accept the current outlines.
    Confirm,
    /// Abandon tuning.
    Cancel,
}

/// Outcome of applying a [`TunerAction`].
#[derive(Debug, Clone, PartialEq)]
pub enum TunerEvent {
    /// Tolerance changed and outlines were recomputed.
    Updated {
        /// The new tolerance.
        tolerance: f64,
        /// Outlines at that tolerance.
        outlines: Vec<Polyline>,
        /// Counts from the recomputation.
        report: ExtractionReport,
    },
    /// The operator accepted the current outlines.
    Confirmed {
        /// The accepted tolerance.
        tolerance: f64,
        /// The accepted outlines.
        outlines: Vec<Polyline>,
    },
    /// The operator cancelled; no outlines are selected.
    Cancelled,
}

/// Tolerance-adjustment loop over a fixed mask.
#[derive(Debug)]
pub struct Tuner<'a> {
    mask: &'a BinaryMask,
    params: ExtractParams,
    outlines: Vec<Polyline>,
    report: ExtractionReport,
}

impl<'a> Tuner<'a> {
    /// Starting tolerance when none is configured.
    pub const INITIAL_TOLERANCE: f64 = 2.0;
    /// Tolerance change per step.
    pub const STEP: f64 = 0.02;
    /// Lowest reachable tolerance.
    pub const MIN_TOLERANCE: f64 = 0.02;

    /// Start tuning at `params.tolerance` (clamped to
    /// [`MIN_TOLERANCE`](Self::MIN_TOLERANCE)), computing the first
    /// outline set immediately.
    #[must_use]
    pub fn new(mask: &'a BinaryMask, params: ExtractParams) -> Self {
        let params = params.with_tolerance(params.tolerance.max(Self::MIN_TOLERANCE));
        let (outlines, report) = contour::extract_with_report(mask, &params);
        Self {
            mask,
            params,
            outlines,
            report,
        }
    }

    /// Current tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.params.tolerance
    }

    /// Outlines at the current tolerance.
    #[must_use]
    pub fn outlines(&self) -> &[Polyline] {
        &self.outlines
    }

    /// Counts from the most recent recomputation.
    #[must_use]
    pub const fn report(&self) -> &ExtractionReport {
        &self.report
    }

    /// Apply one operator action.
    ///
    /// `Confirm` and `Cancel` consume the tuning result; callers should
    /// stop feeding actions after either.
    pub fn apply(&mut self, action: TunerAction) -> TunerEvent {
        let tolerance = match action {
            TunerAction::Increase => self.params.tolerance + Self::STEP,
            TunerAction::Decrease => (self.params.tolerance - Self::STEP).max(Self::MIN_TOLERANCE),
            TunerAction::Confirm => {
                return TunerEvent::Confirmed {
                    tolerance: self.params.tolerance,
                    outlines: std::mem::take(&mut self.outlines),
                };
            }
            TunerAction::Cancel => {
                self.outlines.clear();
                return TunerEvent::Cancelled;
            }
        };

        self.params = self.params.with_tolerance(tolerance);
        let (outlines, report) = contour::extract_with_report(self.mask, &self.params);
        tracing::debug!(tolerance, outlines = outlines.len(), "tuner recomputed");
        self.outlines.clone_from(&outlines);
        self.report = report.clone();
        TunerEvent::Updated {
            tolerance,
            outlines,
            report,
        }
    }
}
