use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Log file written inside the data directory. The terminal belongs to the
/// TUI, so nothing is logged to stdout or stderr.
pub const LOG_FILE_NAME: &str = "lyrics-locker.log";

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(data_dir: &Path, default_level: &str) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;
    let log_path = data_dir.join(LOG_FILE_NAME);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .with_context(|| format!("invalid log level {default_level:?}"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))?;

    Ok(log_path)
}
