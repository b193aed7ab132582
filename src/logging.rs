//! File logging. The terminal belongs to the UI, so nothing is written to
//! stdout or stderr while a session runs.

use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

pub const LOG_FILE: &str = "reprise.log";

/// Filter from `RUST_LOG`, else the configured level.
fn filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to `<log_dir>/reprise.log`.
/// Logging stays off when there is no log directory. Keep the returned
/// guard alive for the whole program, or buffered lines are lost.
pub fn init(settings: &Settings) -> io::Result<Option<WorkerGuard>> {
    let Some(dir) = settings.log_dir() else {
        return Ok(None);
    };
    fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_env_filter(filter(settings))
        .try_init();
    if installed.is_err() {
        // Someone else owns the global subscriber.
        return Ok(None);
    }
    Ok(Some(guard))
}
