//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use zeladoria_domain::{ProblemId, ProblemStatus, Role};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

impl From<OutputFormat> for zeladoria_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => zeladoria_domain::OutputFormat::Text,
            OutputFormat::Json => zeladoria_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for zeladoria
#[derive(Parser, Debug)]
#[command(name = "zeladoria")]
#[command(
    author,
    version,
    about = "Municipal problem reports with crowd confirmation and validation"
)]
#[command(long_about = r#"
Zeladoria tracks municipal problems (potholes, broken street lights, ...)
from report to confirmed fix.

Lifecycle:
1. open       Citizens report and confirm problems
2. in_review  The authority triages and may attach an official note
3. resolved   The authority marks it fixed; 3 citizen validations make it final

The caller identity is supplied with --actor and --as, as asserted by the
identity provider in front of this tool.

Configuration files are loaded from (in priority order):
1. ZELADORIA_* env     e.g. ZELADORIA_STORE__PATH=/tmp/z.db
2. --config <path>     Explicit config file
3. ./zeladoria.toml    Project-level config
4. ~/.config/zeladoria/config.toml   Global config

Example:
  zeladoria --actor maria report --type buraco --description "Cratera" --lat -23.55 --lng -46.63
  zeladoria --actor joao confirm 1
  zeladoria --actor prefeitura --as authority review 1
  zeladoria list -o json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Identity of the caller
    #[arg(long, global = true, value_name = "ID", default_value = "anonymous")]
    pub actor: String,

    /// Role of the caller (citizen, authority, admin)
    #[arg(long = "as", global = true, value_name = "ROLE", default_value = "citizen")]
    pub role: Role,

    /// Output format (defaults to [output].format, then text)
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Report a new problem (citizen)
    Report {
        /// Problem type key from the catalog
        #[arg(long = "type", value_name = "KEY")]
        type_key: String,
        #[arg(long, short)]
        description: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Confirm an open problem (citizen)
    Confirm { id: ProblemId },
    /// Validate a resolution (citizen)
    Validate { id: ProblemId },
    /// Triage an open problem or contest a resolution (authority)
    Review { id: ProblemId },
    /// Attach an official note to a problem in review (authority)
    Note { id: ProblemId, text: String },
    /// Mark a problem in review as resolved (authority)
    Resolve { id: ProblemId },
    /// Delete a problem regardless of status (admin)
    Delete { id: ProblemId },
    /// Show one problem as a marker
    Show { id: ProblemId },
    /// List all problems as markers
    List {
        /// Only problems with this status
        #[arg(long)]
        status: Option<ProblemStatus>,
    },
    /// List problem types grouped by category
    Types,
    /// Send stalled resolutions back to review
    SweepStalled,
}
