//! Logging setup.
//!
//! Library code only emits `tracing` events. Binaries install a subscriber
//! with one of:
//!
//! - [`init_logging`] - log file (cleared per session) plus stderr
//! - [`init_console_logging`] - stderr only
//!
//! Both honour `RUST_LOG`, falling back to the given default directive.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Truncates (or creates) the session log file.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<(), io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")
}

/// Initialize logging to a file and stderr.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files, created if missing
/// * `log_file` - Log file name; any previous content is cleared
/// * `default_level` - Filter used when `RUST_LOG` is not set
///
/// # Errors
///
/// Returns an error if the log file cannot be prepared or a global
/// subscriber is already installed.
pub fn init_logging(
    log_dir: &Path,
    log_file: &str,
    default_level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Initialize logging to stderr only.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_console_logging(default_level: &str) -> Result<(), io::Error> {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(io::Error::other)
}
