//! Output formatter trait

use zeladoria_application::{MarkerView, StallSweepReport, WorkflowError};
use zeladoria_domain::{ProblemId, ProblemType};

/// Trait for rendering command results
pub trait OutputFormatter {
    /// A single marker, as returned by a lifecycle command or `show`
    fn format_marker(&self, marker: &MarkerView) -> String;

    /// The full map feed
    fn format_markers(&self, markers: &[MarkerView]) -> String;

    /// The problem type catalog
    fn format_types(&self, types: &[ProblemType]) -> String;

    fn format_deleted(&self, id: ProblemId, existed: bool) -> String;

    fn format_sweep(&self, report: &StallSweepReport) -> String;

    /// A failed command
    fn format_error(&self, error: &WorkflowError) -> String;
}
