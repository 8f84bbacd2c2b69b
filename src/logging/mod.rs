//! Application logging functionality
//!
//! Installs the tracing subscriber: an env-filtered stderr layer, plus an
//! optional non-blocking file layer under the config logs directory.

use crate::core::config_file::ConfigFile;
use chrono::NaiveDate;
use std::fs;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::logs_dir()
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("bezy-marks-{}.log", date.format("%Y-%m-%d"))
}

/// Get the path to today's log file
pub fn current_log_file() -> PathBuf {
    logs_dir().join(log_file_name(chrono::Utc::now().date_naive()))
}

/// Initialize the logs directory
pub fn initialize_logs_directory() -> anyhow::Result<()> {
    fs::create_dir_all(logs_dir())?;
    Ok(())
}

/// `RUST_LOG` when set, otherwise info (debug when verbose) for this crate
pub fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "bezy_marks=debug"
    } else {
        "bezy_marks=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber.
///
/// When file logging is on, the returned guard must be held until exit so
/// buffered lines are flushed.
pub fn init(verbose: bool, log_to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if !log_to_file {
        tracing_subscriber::registry()
            .with(env_filter(verbose))
            .with(stderr_layer)
            .try_init()?;
        return Ok(None);
    }

    initialize_logs_directory()?;
    let log_file_path = current_log_file();
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;
    let (writer, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    info!(
        "=== bezy-marks started at {} ===",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    info!("Logging to {:?}", log_file_path);
    Ok(Some(guard))
}
