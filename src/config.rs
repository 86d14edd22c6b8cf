//! Configuration file loading.
//!
//! Precedence is CLI flag > config file > built-in default. The file lives at
//! `~/.config/stackask/config.toml` (platform config dir) and every key is
//! optional.

use crate::notify::DEFAULT_NOTIFICATION_DELAY;
use crate::search::SearchParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "stackask";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "stackask.log";

pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Stack Exchange site, e.g. "stackoverflow", "superuser"
    pub site: Option<String>,
    /// Semicolon separated tags every question must have
    pub tags: Option<String>,
    /// "relevance", "votes", "activity" or "creation"
    pub sort: Option<String>,
    /// "desc" or "asc"
    pub order: Option<String>,
    /// API filter controlling which fields come back. Unset means one
    /// with markdown bodies is created on first search.
    pub filter: Option<String>,
    pub page_size: Option<u32>,
    /// API key for a higher request quota
    pub api_key: Option<String>,
    /// Seconds a toast stays on screen
    pub notification_secs: Option<u64>,
    /// Capture mouse scroll/clicks on startup
    pub mouse: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFile {
    /// Load a config file. A missing file yields the empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub params: SearchParams,
    pub filter: Option<String>,
    pub page_size: u32,
    pub api_key: Option<String>,
    pub notification_delay: Duration,
    pub mouse: bool,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

impl Config {
    /// Apply built-in defaults to whatever the file left unset
    pub fn from_file(file: ConfigFile) -> Self {
        Self {
            params: SearchParams {
                site: file.site.unwrap_or_default(),
                tags: file.tags.unwrap_or_default(),
                sort: file.sort.unwrap_or_default(),
                order: file.order.unwrap_or_default(),
            },
            filter: file.filter,
            page_size: file.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            api_key: file.api_key,
            notification_delay: file
                .notification_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_NOTIFICATION_DELAY),
            mouse: file.mouse.unwrap_or(true),
            log_file: file.log_file.unwrap_or_else(default_log_path),
        }
    }

    /// Load from `path`, or the default location when none is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => ConfigFile::load(&path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::from_file(file))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(LOG_FILE)
}
