//! File logging. The terminal belongs to the UI, so nothing goes to stdout.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "clinic-companion.log";
const DEFAULT_LEVEL: &str = "info";

/// Default log directory: $XDG_DATA_HOME/clinic-companion/logs
pub fn default_directory() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("clinic-companion").join("logs"))
}

/// Install the global subscriber writing to a daily rolling file in `directory`.
///
/// `RUST_LOG` wins over `level`. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init(directory: &Path, level: Option<&str>) -> Result<WorkerGuard> {
  std::fs::create_dir_all(directory)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", directory.display(), e))?;

  let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LEVEL)));

  let fmt_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
