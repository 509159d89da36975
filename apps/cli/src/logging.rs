//! Tracing setup: stderr output plus an optional per-run log file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use color_eyre::eyre::{Result, eyre};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::commands::LogFormat;

/// Installed tracing subscriber. Keep it alive until the process exits so
/// buffered file output is flushed.
pub(crate) struct LoggingContext {
    log_file: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

impl LoggingContext {
    /// Install the global subscriber.
    ///
    /// With `log_dir`, every event at the active level is also written to a
    /// new `pipeline_YYYYMMDD_HHMMSS.log` in that directory.
    pub(crate) fn init(format: LogFormat, verbose: u8, log_dir: Option<&Path>) -> Result<Self> {
        let level = match verbose {
            0 => "salesetl=info",
            1 => "salesetl=debug",
            _ => "salesetl=trace",
        };
        let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let stderr_layer = match format {
            LogFormat::Text => fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        }
        .with_filter(filter());

        let (file_layer, guard, log_file) = match log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .map_err(|e| eyre!("cannot create log directory {}: {e}", dir.display()))?;

                let name = log_file_name(Local::now());
                let appender = tracing_appender::rolling::never(dir, &name);
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(filter());
                (Some(layer), Some(guard), Some(dir.join(name)))
            }
            None => (None, None, None),
        };

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init()?;

        if let Some(path) = &log_file {
            tracing::debug!(path = %path.display(), "writing log file");
        }

        Ok(Self {
            log_file,
            _guard: guard,
        })
    }

    pub(crate) fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// `pipeline_YYYYMMDD_HHMMSS.log` for the given start time.
fn log_file_name(started: DateTime<Local>) -> String {
    format!("pipeline_{}.log", started.format("%Y%m%d_%H%M%S"))
}
