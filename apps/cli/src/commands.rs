//! CLI command definitions, routing, and output.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use salesetl_core::{
    DefaultCollaborators, PipelineOrchestrator, ProgressReporter, RunSummary,
};
use salesetl_load::DatabaseLoader;
use salesetl_shared::{
    DEFAULT_CONFIG_PATH, EtlError, ExecutionLogEntry, Phase, PipelineConfig, SourceKind,
    init_config, load_config_from,
};
use tracing::info;

use crate::logging::LoggingContext;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SalesETL: extract, clean, validate, and load sales data.
#[derive(Parser)]
#[command(
    name = "salesetl",
    version,
    about = "Extract sales data from CSV files and HTTP APIs, clean and validate it, and load it into a local database.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for the per-run log file (overrides `[logging] dir`).
    #[arg(long, global = true, env = "SALESETL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Result output format for `run`.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run extract → transform → load.
    Run {
        /// Pipeline config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Source to extract (repeatable): csv, api.
        #[arg(long = "source", default_values = ["csv"])]
        sources: Vec<String>,

        /// Transformation rule (repeatable): clean, validate.
        #[arg(long = "rule", default_values = ["clean", "validate"])]
        rules: Vec<String>,

        /// Load mode handed to the loader: incremental or full.
        #[arg(short, long, default_value = "incremental")]
        mode: String,

        /// Result format.
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show recent load batches from the database.
    History {
        /// Pipeline config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Number of batches to show.
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default config file.
    Init {
        /// Where to write it.
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
    /// Print the resolved config.
    Show {
        /// Pipeline config file.
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Set up logging and run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            config,
            sources,
            rules,
            mode,
            output,
        } => {
            let config = load_config_from(&config)?;
            let log_dir = cli.log_dir.unwrap_or_else(|| config.logging.dir.clone());
            let logging = LoggingContext::init(cli.log_format, cli.verbose, Some(&log_dir))?;
            cmd_run(config, &sources, &rules, &mode, output, &logging).await
        }
        Command::History { config, limit } => {
            let _logging = LoggingContext::init(cli.log_format, cli.verbose, cli.log_dir.as_deref())?;
            cmd_history(&config, limit).await
        }
        Command::Config { action } => {
            let _logging = LoggingContext::init(cli.log_format, cli.verbose, cli.log_dir.as_deref())?;
            match action {
                ConfigAction::Init { path } => cmd_config_init(&path),
                ConfigAction::Show { config } => cmd_config_show(&config),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config: PipelineConfig,
    sources: &[String],
    rules: &[String],
    mode: &str,
    output: OutputFormat,
    logging: &LoggingContext,
) -> Result<()> {
    info!(?sources, ?rules, mode, "running pipeline");

    let progress: Box<dyn ProgressReporter> = match output {
        OutputFormat::Text => Box::new(CliProgress::new()),
        OutputFormat::Json => Box::new(salesetl_core::SilentProgress),
    };
    let mut pipeline =
        PipelineOrchestrator::new(config, Box::new(DefaultCollaborators)).with_progress(progress);

    let result = pipeline.run(sources, rules, mode).await;

    match output {
        OutputFormat::Text => print_run_text(result.as_ref().ok(), pipeline.execution_log(), logging),
        OutputFormat::Json => print_run_json(&result, pipeline.execution_log())?,
    }

    result?;
    Ok(())
}

async fn cmd_history(config_path: &Path, limit: usize) -> Result<()> {
    let config = load_config_from(config_path)?;
    let loader = DatabaseLoader::open(&config.database).await?;

    let batches = loader.list_batches(limit).await?;
    if batches.is_empty() {
        println!("No load batches recorded in {}", config.database.path.display());
        return Ok(());
    }

    println!();
    println!(
        "  {:<36}  {:<4}  {:<11}  {:<20}  {:>7}",
        "BATCH", "SRC", "MODE", "STARTED", "WRITTEN"
    );
    for batch in &batches {
        let written = batch
            .records_written
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<36}  {:<4}  {:<11}  {:<20}  {:>7}",
            batch.id,
            batch.source,
            batch.mode,
            batch.started_at.format("%Y-%m-%d %H:%M:%S"),
            written
        );
    }

    println!();
    for source in SourceKind::ALL {
        println!(
            "  {source}: {} records stored",
            loader.count_records(Some(source)).await?
        );
    }
    println!();

    Ok(())
}

fn cmd_config_init(path: &Path) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: &Path) -> Result<()> {
    let config = load_config_from(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_run_text(
    summary: Option<&RunSummary>,
    log: &[ExecutionLogEntry],
    logging: &LoggingContext,
) {
    println!();
    match summary {
        Some(summary) => {
            println!("  Pipeline completed successfully!");
            println!("  Extracted:   {}", summary.extracted);
            println!("  Transformed: {}", summary.transformed);
            println!("  Loaded:      {}", summary.loaded);
            println!("  Time:        {:.1}s", summary.elapsed.as_secs_f64());
        }
        None => println!("  Pipeline failed."),
    }

    println!();
    println!("  Execution log:");
    for entry in log {
        println!("  {}", format_entry(entry));
    }

    if let Some(path) = logging.log_file() {
        println!();
        println!("  Log file: {}", path.display());
    }
    println!();
}

fn print_run_json(
    result: &std::result::Result<RunSummary, EtlError>,
    log: &[ExecutionLogEntry],
) -> Result<()> {
    let report = serde_json::json!({
        "status": if result.is_ok() { "success" } else { "error" },
        "summary": result.as_ref().ok(),
        "error": result.as_ref().err().map(|e| e.to_string()),
        "execution_log": log,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// One execution log entry as a table row.
fn format_entry(entry: &ExecutionLogEntry) -> String {
    let detail = match (entry.records(), entry.error()) {
        (Some(records), _) => format!("{records} records"),
        (None, Some(error)) => error.to_string(),
        (None, None) => String::new(),
    };
    format!(
        "{}  {:<9}  {:<7}  {detail}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.phase,
        entry.status(),
    )
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase_started(&self, phase: Phase) {
        self.spinner.set_message(format!("{}...", capitalize(phase.as_str())));
    }

    fn source_started(&self, phase: Phase, source: SourceKind) {
        self.spinner
            .set_message(format!("{} [{source}]", capitalize(phase.as_str())));
    }

    fn phase_finished(&self, entry: &ExecutionLogEntry) {
        match entry.records() {
            Some(records) => self
                .spinner
                .println(format!("✓ {}: {records} records", entry.phase)),
            None => self.spinner.println(format!("✗ {}: failed", entry.phase)),
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }

    fn aborted(&self, _error: &EtlError) {
        self.spinner.finish_and_clear();
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
