//! Optional TOML configuration stored next to the data files. Every field has
//! a default, so a missing file simply means "use the defaults".

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".digital-library";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "library.sqlite";
const LOG_FILE_NAME: &str = "library.log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not locate home directory")]
    HomeDirNotFound,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the database and log file live. Defaults to `~/.digital-library`.
    pub data_dir: Option<PathBuf>,
    /// `tracing` filter directive, e.g. `info` or `digital_library=debug`.
    pub log_level: String,
    /// SQLite file name inside `data_dir`.
    pub db_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "info".to_string(),
            db_file: DEFAULT_DB_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load `~/.digital-library/config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> ConfigResult<Self> {
        let path = default_data_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the data directory, creating it if needed.
    pub fn ensure_data_dir(&self) -> ConfigResult<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn db_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.db_file)
    }

    pub fn log_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(LOG_FILE_NAME)
    }
}

fn default_data_dir() -> ConfigResult<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
