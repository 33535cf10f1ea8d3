//! File logging for the terminal app.
//!
//! The screen belongs to ratatui, so tracing output goes to a single log
//! file in the cache directory instead of stdout.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::config;

const LOG_FILE: &str = "medal_terminal.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("no cache directory available for logs")]
    NoCacheDir,
    #[error("failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber. Returns the log file path.
///
/// A second call is a no-op. Callers are expected to carry on without logs
/// when this fails.
pub fn init(filter: &str) -> Result<PathBuf, LoggingError> {
    let dir = config::cache_dir().ok_or(LoggingError::NoCacheDir)?;
    let path = dir.join(LOG_FILE);
    if LOG_GUARD.get().is_some() {
        return Ok(path);
    }
    fs::create_dir_all(&dir).map_err(|source| LoggingError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

    let subscriber = Registry::default().with(env_filter).with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!("logging initialized; log file at {}", path.display());
    Ok(path)
}
