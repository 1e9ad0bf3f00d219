//! Application logging for the `salesflow` binary.
//!
//! Console output plus two daily-rotated files in the platform data
//! directory:
//!
//! - `salesflow.<date>.log`: everything that passes the filter
//! - `error.<date>.log`: warnings and errors only
//!
//! The per-row error log of the batch pipeline is separate and lives in
//! [`crate::pipeline::error_log`].
//!
//! ```no_run
//! salesflow::logging::init()?;
//! tracing::info!("ready");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Rotated log files kept per appender
const MAX_LOG_FILES: usize = 10;

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/salesflow/logs`
/// - macOS: `~/Library/Application Support/salesflow/logs`
/// - Linux: `~/.local/share/salesflow/logs`
///
/// # Errors
///
/// Fails when the platform has no data directory or it cannot be created.
pub fn log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join("salesflow").join("logs");

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    Ok(log_dir)
}

/// Initializes console and file logging. Call once, at startup.
///
/// `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or file appenders fail
pub fn init() -> Result<()> {
    let log_dir = log_dir()?;

    let all_logs_appender = appender(&log_dir, "salesflow")?;
    let error_logs_appender = appender(&log_dir, "error")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer().with_target(false).compact();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Logging was already initialized")?;

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}

fn appender(log_dir: &std::path::Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log file appender"))
}

/// Path of today's main log file (the appender rotates on UTC dates)
///
/// # Errors
///
/// Same as [`log_dir`].
pub fn current_log_path() -> Result<PathBuf> {
    let today = chrono::Utc::now().format("%Y-%m-%d");
    Ok(log_dir()?.join(format!("salesflow.{today}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_paths() {
        let Ok(dir) = log_dir() else {
            // No data directory in this environment
            return;
        };
        assert!(dir.ends_with("salesflow/logs") || dir.ends_with("salesflow\\logs"));

        let current = current_log_path().expect("log dir resolved once already");
        let name = current.file_name().expect("has a name").to_string_lossy();
        assert!(name.starts_with("salesflow.") && name.ends_with(".log"));
    }
}
