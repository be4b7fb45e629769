//! JSON output for scripting and map clients

use crate::output::formatter::OutputFormatter;
use serde::Serialize;
use serde_json::json;
use zeladoria_application::{MarkerView, StallSweepReport, WorkflowError};
use zeladoria_domain::{ProblemId, ProblemType};

/// Formats results as pretty-printed JSON
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_marker(&self, marker: &MarkerView) -> String {
        Self::pretty(marker)
    }

    fn format_markers(&self, markers: &[MarkerView]) -> String {
        Self::pretty(markers)
    }

    fn format_types(&self, types: &[ProblemType]) -> String {
        Self::pretty(types)
    }

    fn format_deleted(&self, id: ProblemId, existed: bool) -> String {
        Self::pretty(&json!({ "id": id, "deleted": true, "existed": existed }))
    }

    fn format_sweep(&self, report: &StallSweepReport) -> String {
        Self::pretty(report)
    }

    fn format_error(&self, error: &WorkflowError) -> String {
        Self::pretty(&json!({
            "error": error.to_string(),
            "category": error.category(),
            "retryable": error.is_retryable(),
            "resync": error.requires_resync(),
        }))
    }
}
