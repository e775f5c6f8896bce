//! Console and daily log file for an ingestion run

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::IngestConfig;

/// File name prefix of the daily log files
pub const LOG_PREFIX: &str = "logbook-ingest";

/// Flushes the log file on drop; hold it until `main` returns.
#[must_use]
pub struct LoggerGuard {
    _file_writer: WorkerGuard,
}

/// Install the global subscriber: ANSI console plus a plain daily file in
/// `config.log_dir`. `RUST_LOG` directives override `config.log_level`.
pub fn init_logging(config: &IngestConfig) -> anyhow::Result<LoggerGuard> {
    let level = parse_level(&config.log_level);
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy()
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(&config.log_dir)
        .with_context(|| format!("Cannot create log files in '{}'", config.log_dir))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).with_filter(filter()))
        .with(fmt::layer().with_writer(std::io::stdout).with_filter(filter()))
        .try_init()?;

    match prune_old_logs(Path::new(&config.log_dir), config.log_retention()) {
        Ok(removed) => {
            for path in removed {
                tracing::info!("Old log file deleted: {}", path.display());
            }
        }
        Err(e) => tracing::warn!("Failed to prune old log files: {}", e),
    }

    Ok(LoggerGuard { _file_writer: guard })
}

fn parse_level(raw: &str) -> LevelFilter {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", raw);
        LevelFilter::INFO
    })
}

/// Delete this tool's `.log` files last modified more than `max_age` ago.
/// Returns the deleted paths.
fn prune_old_logs(log_dir: &Path, max_age: Duration) -> std::io::Result<Vec<PathBuf>> {
    let now = SystemTime::now();
    let mut removed = Vec::new();

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".log"));
        if !ours {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}
