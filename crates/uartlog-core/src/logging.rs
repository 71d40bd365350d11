//! Diagnostic log file
//!
//! Stdout belongs to the device log, so diagnostics only ever go to a file.
//! The filter comes from `[log] filter` in `uartlog.toml`; `UARTLOG_LOG`
//! overrides it for a single run.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::error::{Error, Result};

/// Environment variable that replaces the configured filter
pub const LOG_ENV_VAR: &str = "UARTLOG_LOG";

const LOG_FILE_NAME: &str = "uartlog.log";

/// Install the file subscriber described by `config`.
///
/// The returned guard flushes the background writer when dropped; keep it
/// alive until the process exits.
///
/// ```bash
/// UARTLOG_LOG=debug uartlog -p /dev/ttyACM0
/// ```
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let log_dir = log_directory(config);
    std::fs::create_dir_all(&log_dir)?;

    let directives = filter_directives(config);
    let env_filter = EnvFilter::try_new(&directives)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", directives, e)))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Logging already initialized: {}", e)))?;

    tracing::info!(
        "uartlog {} on {} @ {} baud, filter '{}', logs in {}",
        env!("CARGO_PKG_VERSION"),
        config.port,
        config.baud_rate,
        directives,
        log_dir.display()
    );

    Ok(guard)
}

/// `[log] dir`, or `<data_local_dir>/uartlog/logs`
pub fn log_directory(config: &Config) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(default_log_directory)
}

pub fn default_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("uartlog").join("logs")
}

fn filter_directives(config: &Config) -> String {
    match std::env::var(LOG_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => config.log_filter.clone(),
    }
}
