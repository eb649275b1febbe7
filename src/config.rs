//! Application configuration.
//!
//! Stored as JSON in `~/.portfolio-view/config.json`. Every field has a
//! default, so a partial or missing file is fine.

use crate::consts::cli_consts::{http, refresh};
use crate::sync::{RendererConfig, Section};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Overrides the environment's server URL.
    pub server_url: Option<String>,
    /// Value of the `Cookie` header, e.g. `session=...`.
    pub session_cookie: Option<String>,
    pub refresh_interval_secs: u64,
    pub settle_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Sections shown and refreshed, in tab order.
    pub sections: Vec<Section>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            session_cookie: None,
            refresh_interval_secs: refresh::PERIODIC_INTERVAL_SECS,
            settle_delay_ms: refresh::SETTLE_DELAY_MS,
            request_timeout_secs: http::REQUEST_TIMEOUT_SECS,
            sections: Section::ALL.to_vec(),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file at the given path.
    ///
    /// # Errors
    /// Returns a `ConfigError` if reading from file fails or JSON is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let buf = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&buf).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`Config::load_from_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a JSON file at the given path.
    ///
    /// Directories will be created if they don't exist. This method overwrites existing files.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }

    /// Removes the config file. A missing file is not an error.
    pub fn clear(path: &Path) -> Result<(), ConfigError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
        }
    }

    /// Configured sections without duplicates; all sections when none are set.
    pub fn active_sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        for section in &self.sections {
            if !sections.contains(section) {
                sections.push(*section);
            }
        }
        if sections.is_empty() {
            return Section::ALL.to_vec();
        }
        sections
    }
}

/// `~/.portfolio-view/config.json`
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let home = home::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(".portfolio-view").join("config.json"))
}
