//! CLI entrypoint for zeladoria
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use zeladoria_application::{
    CatalogCache, ContestStalledUseCase, ErrorCategory, ProblemStore, RenderingFeedUseCase,
    SystemClock, WorkflowCoordinator, WorkflowError,
};
use zeladoria_domain::{ActorId, Caller, NewProblem, Problem, Transition};
use zeladoria_infrastructure::{
    ConfigLoader, ConfiguredTypeCatalog, FileConfig, JsonlAuditLogger, MemoryProblemStore,
    SqliteProblemStore, StoreBackend,
};
use zeladoria_presentation::{Cli, Command, OutputConfig, OutputFormatter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting zeladoria");

    check_config(&config)?;

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let output = OutputConfig::resolve(
        cli.output,
        cli.no_color,
        config.output.format,
        config.output.color,
    );
    if !output.color {
        colored::control::set_override(false);
    }
    let formatter = output.formatter();

    let app = App::build(&config)?;
    let caller = Caller::new(ActorId::new(&cli.actor)?, cli.role);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning the pending action");
            interrupt.cancel();
        }
    });

    match app.run(command, &caller, formatter.as_ref(), &cancel).await {
        Ok(text) => {
            print!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Err(RunError::Workflow(e)) => {
            eprint!("{}", formatter.format_error(&e));
            Ok(exit_code(e.category()))
        }
        Err(RunError::Other(e)) => Err(e),
    }
}

/// Initialize logging based on verbosity level
///
/// `RUST_LOG` wins when set. With `[logging].file` set, logs go to a
/// daily-rolling file with that prefix instead of stderr.
fn init_logging(verbose: u8, file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("logging.file has no file name: {}", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

/// Report config issues; refuse to start on errors.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("Config: {}", issue.message);
    }
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    if errors.is_empty() {
        return Ok(());
    }
    for issue in &errors {
        error!("Config: {}", issue.message);
    }
    bail!(
        "Invalid configuration ({} error(s)): {}",
        errors.len(),
        errors
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    )
}

fn exit_code(category: ErrorCategory) -> ExitCode {
    // sysexits.h where one fits
    let code = match category {
        ErrorCategory::Conflict => 1,
        ErrorCategory::Invalid => 65,
        ErrorCategory::NotFound => 66,
        ErrorCategory::Internal => 70,
        ErrorCategory::Transient => 75,
        ErrorCategory::Denied => 77,
        ErrorCategory::Cancelled => 130,
    };
    ExitCode::from(code)
}

enum RunError {
    Workflow(WorkflowError),
    Other(anyhow::Error),
}

impl From<WorkflowError> for RunError {
    fn from(e: WorkflowError) -> Self {
        RunError::Workflow(e)
    }
}

impl From<anyhow::Error> for RunError {
    fn from(e: anyhow::Error) -> Self {
        RunError::Other(e)
    }
}

struct App {
    coordinator: Arc<WorkflowCoordinator>,
    feed: RenderingFeedUseCase,
    catalog: Arc<CatalogCache>,
    sweep: Option<ContestStalledUseCase>,
}

impl App {
    // === Dependency Injection ===
    fn build(config: &FileConfig) -> Result<Self> {
        let params = config.workflow.to_params();

        let store: Arc<dyn ProblemStore> = match config.store.parse_backend().0 {
            Some(StoreBackend::Sqlite) => {
                let path = config
                    .store
                    .path
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.path is required for the sqlite backend"))?;
                let store = SqliteProblemStore::open(path)
                    .with_context(|| format!("Failed to open problem store at {}", path))?;
                info!("Using SQLite store at {}", path);
                Arc::new(store)
            }
            Some(StoreBackend::Memory) => {
                warn!("Using the in-memory store; nothing will be kept after exit");
                Arc::new(MemoryProblemStore::new())
            }
            None => bail!("Unknown store backend '{}'", config.store.backend),
        };

        let (entries, _) = config.catalog.to_entries();
        let catalog = Arc::new(CatalogCache::new(
            Arc::new(ConfiguredTypeCatalog::new(config.catalog.version, entries)),
            config.catalog.refresh_interval(),
        ));

        let clock = Arc::new(SystemClock);
        let mut coordinator =
            WorkflowCoordinator::new(store.clone(), clock.clone()).with_params(params.clone());
        if let Some(path) = &config.logging.audit_log
            && let Some(audit) = JsonlAuditLogger::new(path)
        {
            info!("Audit log: {}", audit.path().display());
            coordinator = coordinator.with_audit_logger(Arc::new(audit));
        }
        let coordinator = Arc::new(coordinator);

        let sweep = params
            .validation_stall
            .map(|stall| ContestStalledUseCase::new(coordinator.clone(), clock, stall));
        let feed = RenderingFeedUseCase::new(store, catalog.clone()).with_params(params);

        Ok(Self {
            coordinator,
            feed,
            catalog,
            sweep,
        })
    }

    async fn run(
        &self,
        command: Command,
        caller: &Caller,
        formatter: &dyn OutputFormatter,
        cancel: &CancellationToken,
    ) -> Result<String, RunError> {
        let wf = &self.coordinator;
        let problem: Problem = match command {
            Command::Report {
                type_key,
                description,
                lat,
                lng,
            } => {
                let report = NewProblem::new(type_key, description, lat, lng)
                    .map_err(WorkflowError::from)?;
                wf.create_with_cancel(caller, report, Some(cancel)).await?
            }
            Command::Confirm { id } => {
                wf.submit_with_cancel(caller, id, Transition::Confirm, Some(cancel))
                    .await?
            }
            Command::Validate { id } => {
                wf.submit_with_cancel(caller, id, Transition::Validate, Some(cancel))
                    .await?
            }
            Command::Review { id } => {
                wf.submit_with_cancel(caller, id, Transition::MarkInReview, Some(cancel))
                    .await?
            }
            Command::Note { id, text } => {
                wf.submit_with_cancel(caller, id, Transition::attach_note(text), Some(cancel))
                    .await?
            }
            Command::Resolve { id } => {
                wf.submit_with_cancel(caller, id, Transition::MarkResolved, Some(cancel))
                    .await?
            }
            Command::Delete { id } => {
                let existed = wf.delete(caller, id).await?;
                return Ok(formatter.format_deleted(id, existed));
            }
            Command::Show { id } => {
                let marker = self.feed.marker(id, caller.role).await?;
                return Ok(formatter.format_marker(&marker));
            }
            Command::List { status } => {
                let mut markers = self.feed.markers(caller.role).await?;
                if let Some(status) = status {
                    markers.retain(|m| m.problem.status == status);
                }
                return Ok(formatter.format_markers(&markers));
            }
            Command::Types => {
                let types = self
                    .catalog
                    .entries()
                    .await
                    .context("Type catalog unavailable")?;
                return Ok(formatter.format_types(&types));
            }
            Command::SweepStalled => {
                let sweep = self.sweep.as_ref().ok_or_else(|| {
                    anyhow!("Stall sweep is disabled (workflow.validation_stall_hours = 0)")
                })?;
                let report = sweep.execute().await?;
                return Ok(formatter.format_sweep(&report));
            }
        };

        let marker = self.feed.view(&problem, caller.role).await;
        Ok(formatter.format_marker(&marker))
    }
}
