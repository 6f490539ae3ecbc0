//! Sets up the process-wide `tracing` subscriber.
//!
//! Events go to stderr unless a log file is given, in which case they are
//! written to it through a non-blocking appender. The returned guard must be
//! kept alive until the program ends, dropping it flushes pending lines.
use std::error::Error;
use std::fs::{create_dir_all, File};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::CResult;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Truncates the previous run's log, like the output file.
fn create_log_file(path: &Path) -> CResult<File> {
    if let Some(log_dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !log_dir.exists() {
            create_dir_all(log_dir)?;
        }
    }
    Ok(File::create(path)?)
}

pub fn init_logging(log_file: Option<&Path>) -> CResult<Option<WorkerGuard>> {
    match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(create_log_file(path)?);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| e as Box<dyn Error>)?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| e as Box<dyn Error>)?;
            Ok(None)
        }
    }
}
