//! Runtime configuration
//!
//! Loaded from `~/.config/assetstore/config.json` (or platform equivalent) when
//! present, then overridden by `ASSETSTORE_DATA_DIR` and `ASSETSTORE_LOG`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "ASSETSTORE_DATA_DIR";
pub const ENV_LOG: &str = "ASSETSTORE_LOG";

const APP_DIR: &str = "assetstore";
const TABLE_FILE: &str = "assets.table";
const CONTENT_DIR: &str = "content";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the table file and content directory by default
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Overrides `data_dir/assets.table`
    #[serde(default)]
    pub table_file: Option<PathBuf>,
    /// Overrides `data_dir/content`
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            table_file: None,
            content_dir: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
    }

    /// Load from `path`, or the default location when `None`
    ///
    /// A missing file yields defaults. An explicit path that does not exist is
    /// an error. Environment overrides are applied either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Parse a config file without applying environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var_os(ENV_DATA_DIR).map(PathBuf::from),
            std::env::var(ENV_LOG).ok(),
        )
    }

    fn with_overrides(mut self, data_dir: Option<PathBuf>, log_filter: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.data_dir = dir;
        }
        if let Some(filter) = log_filter.filter(|f| !f.is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    pub fn table_path(&self) -> PathBuf {
        self.table_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(TABLE_FILE))
    }

    pub fn content_path(&self) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(CONTENT_DIR))
    }

    /// Create the data directory and the parent of the table file
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| Error::Config(format!("Failed to create data dir: {}", e)))?;
        if let Some(parent) = self.table_path().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create table dir: {}", e)))?;
        }
        Ok(())
    }
}
