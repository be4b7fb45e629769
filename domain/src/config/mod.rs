//! Settings shared by every layer: the output format enum and the issue
//! type config validation reports.

mod output_format;
pub mod validation;

pub use output_format::OutputFormat;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
