//! Extraction diagnostics: counts for each filtering stage.
//!
//! Every call to [`extract_with_report`](crate::contour::extract_with_report)
//! fills an [`ExtractionReport`] alongside the outlines. The CLI prints
//! it after each tuning step, either as a table or as JSON.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::types::PipelineWarning;

/// Counts collected from a single extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// RDP tolerance used (0 when simplification was skipped).
    pub tolerance: f64,
    /// Borders found by the tracer before filtering.
    pub candidate_count: usize,
    /// Candidates dropped for enclosing less than `min_area`.
    pub rejected_by_area: usize,
    /// Candidates dropped for touching the mask border.
    pub rejected_by_border: usize,
    /// Outlines returned.
    pub kept_count: usize,
    /// Total points across kept outlines before simplification.
    pub points_before: usize,
    /// Total points across kept outlines after simplification.
    pub points_after: usize,
    /// Non-fatal conditions raised during the run.
    pub warnings: Vec<PipelineWarning>,
}

impl ExtractionReport {
    /// Fraction of points removed by simplification, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduction_ratio(&self) -> f64 {
        if self.points_before == 0 {
            0.0
        } else {
            1.0 - self.points_after as f64 / self.points_before as f64
        }
    }

    /// Render a human-readable summary.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<22} {:>10}", "Candidates", self.candidate_count);
        let _ = writeln!(out, "{:<22} {:>10}", "Rejected (area)", self.rejected_by_area);
        let _ = writeln!(
            out,
            "{:<22} {:>10}",
            "Rejected (border)", self.rejected_by_border
        );
        let _ = writeln!(out, "{:<22} {:>10}", "Kept", self.kept_count);
        let _ = writeln!(out, "{:<22} {:>10.2}", "Tolerance (px)", self.tolerance);
        let _ = writeln!(
            out,
            "{:<22} {:>10} -> {} ({:.1}% removed)",
            "Points",
            self.points_before,
            self.points_after,
            self.reduction_ratio() * 100.0,
        );
        for warning in &self.warnings {
            let _ = writeln!(out, "warning: {warning}");
        }
        out
    }
}
