//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr so stdout stays free for the job output. When
//! `[logging] dir` is set, JSON lines are also written to a daily-rotated file.

use crate::config::LoggingSection;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Overrides every other source of the log filter.
pub const LOG_ENV: &str = "PDFTRANS_LOG";

const LOG_FILE_PREFIX: &str = "pdftrans.log";

/// Keeps the file writer alive; drop it only at process exit.
#[must_use = "dropping the guard stops the file writer"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Pick the filter: `PDFTRANS_LOG`, then `debug` for `--verbose`, then the
/// configured level.
pub fn build_filter(settings: &LoggingSection, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    let level = if verbose {
        "debug"
    } else {
        settings.level.as_str()
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(settings: &LoggingSection, verbose: bool) -> Result<LogGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match settings.dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(settings, verbose))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LogGuard { _file: guard })
}
