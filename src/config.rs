//! User configuration and data-directory resolution.
//!
//! Everything lives under `~/.lyrics-locker/` (or `$LYRICS_LOCKER_HOME`): the
//! optional `config.toml`, the song store, the log file and exported lyrics.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".lyrics-locker";
/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable that relocates the whole data directory.
pub const HOME_ENV: &str = "LYRICS_LOCKER_HOME";

/// Which persistence adapter backs the song collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shared SQLite file with live updates.
    #[default]
    Sqlite,
    /// Single JSON snapshot rewritten on every change.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    /// Terminal width from which the list and the lyrics share the screen.
    pub wide_min_columns: u16,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Seed a few sample songs into a store that is created from scratch.
    pub seed_samples: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            wide_min_columns: 100,
            log_level: "info".to_string(),
            seed_samples: true,
        }
    }
}

impl Config {
    /// Load `config.toml` from `data_dir`; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw).context("failed to parse TOML")?;
        if config.wide_min_columns == 0 {
            return Err(anyhow!("wide_min_columns must be greater than zero"));
        }
        Ok(config)
    }
}

/// Resolve the data directory: `$LYRICS_LOCKER_HOME` if set, otherwise
/// `~/.lyrics-locker`.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(custom) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(custom));
    }
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Sqlite);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml("backend = \"snapshot\"\nwide_min_columns = 80\n").unwrap();
        assert_eq!(config.backend, Backend::Snapshot);
        assert_eq!(config.wide_min_columns, 80);
        assert_eq!(config.log_level, "info");
        assert!(config.seed_samples);
    }

    #[test]
    fn rejects_unknown_backend_and_zero_width() {
        assert!(Config::from_toml("backend = \"firestore\"").is_err());
        assert!(Config::from_toml("wide_min_columns = 0").is_err());
    }

    #[test]
    fn loads_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "seed_samples = false").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.seed_samples);
    }
}
