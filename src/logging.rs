//! Process-wide logging.
//!
//! Library code logs through the `log` facade. The binary installs a
//! `tracing-subscriber` registry that captures those records and writes
//! them to the console and, through a non-blocking `tracing-appender`
//! writer, to the durable log file. Timestamps are local time.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Local-time timestamps, matching the event timestamps in the history.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("waterwatch={level},reqwest=warn,warn")
}

/// Keeps the file writer alive. Dropping it flushes pending lines.
pub struct LogContext {
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl LogContext {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_logging(log_file: &Path, debug: bool) -> anyhow::Result<LogContext> {
    let dir = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = log_file
        .file_name()
        .with_context(|| format!("log file path {} has no file name", log_file.display()))?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(true).with_timer(LocalTimer))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .context("installing the global log subscriber")?;

    Ok(LogContext {
        log_file: dir.join(name),
        _guard: guard,
    })
}
