//! Tracing setup for the keywatch binary.
//!
//! The daemon tails someone else's log file while writing its own: runtime
//! diagnostics go to stderr plus a daily-rotated JSON file under the keywatch
//! logs directory. One-shot subcommands skip the file layer. Nothing is ever
//! written to stdout, which `scan` reserves for matched notifications.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// File name prefix for the daemon's own logs; the appender adds the date.
const LOG_FILE_PREFIX: &str = "keywatch.log";

/// Keeps the background log writer alive.
///
/// Hold this for the life of the daemon; dropping it flushes buffered
/// entries and closes the current log file.
pub struct FlushGuard {
    _worker: WorkerGuard,
}

/// `RUST_LOG` filter, defaulting to `info` when unset or unparseable.
fn base_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Full logging for `keywatch start`: daily-rotated JSON files under
/// `logs_dir` plus readable stderr output, both behind the `RUST_LOG` filter.
///
/// # Errors
///
/// Fails when `logs_dir` cannot be created.
pub fn init_daemon(logs_dir: &Path) -> anyhow::Result<FlushGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(base_filter())
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(FlushGuard { _worker: worker })
}

/// Stderr-only logging for `check` and `scan`.
pub fn init_cli() {
    tracing_subscriber::fmt()
        .with_env_filter(base_filter())
        .with_writer(std::io::stderr)
        .init();
}
