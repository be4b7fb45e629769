//! Presentation-level configuration
//!
//! Resolves how results are printed from CLI flags and the `[output]`
//! section of the config file.

use crate::cli::commands::OutputFormat as CliOutputFormat;
use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use crate::output::json::JsonFormatter;
use serde::{Deserialize, Serialize};
use zeladoria_domain::OutputFormat;

/// Output configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

impl OutputConfig {
    /// CLI flags win over file values.
    pub fn resolve(
        cli_format: Option<CliOutputFormat>,
        no_color: bool,
        file_format: Option<OutputFormat>,
        file_color: bool,
    ) -> Self {
        Self {
            format: cli_format
                .map(OutputFormat::from)
                .or(file_format)
                .unwrap_or_default(),
            color: file_color && !no_color,
        }
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        match self.format {
            OutputFormat::Text => Box::new(ConsoleFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}
