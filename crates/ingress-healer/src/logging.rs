//! Tracing setup: stdout plus an append-only log file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "nginx_health_monitor.log";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,ingress_healer=debug,notify=debug"
    } else {
        "info"
    }
}

/// Open `log_file` for appending behind a non-blocking writer.
fn open_log_file(log_file: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Log path {} has no file name", log_file.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init(log_file: &Path, format: LogFormat, verbose: bool) -> Result<WorkerGuard> {
    let (file_writer, guard) = open_log_file(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(fmt::layer())
            .with(fmt::layer().with_ansi(false).with_writer(file_writer))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json())
            .with(fmt::layer().json().with_writer(file_writer))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Log a startup failure before handing it back as an [`anyhow::Error`].
///
/// Errors returned from `main` only reach stderr; this puts them in the log
/// file as well.
pub fn fatal<T, E>(result: Result<T, E>, context: &'static str) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result.map_err(|e| {
        error!(error = %e, "{context}");
        anyhow::Error::new(e).context(context)
    })
}
