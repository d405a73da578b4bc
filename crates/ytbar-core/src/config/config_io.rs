//! Configuration loading and path resolution.
//!
//! Focuses on I/O and filesystem-related helpers for config management.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::Config;

const APP_DIR: &str = "ytbar";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFailed(String),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("missing $HOME, unable to resolve config directory")]
    MissingHome,
}

impl Config {
    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::ReadFailed(err.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text and apply runtime defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config =
            toml::from_str(contents).map_err(|err| ConfigError::ParseFailed(err.to_string()))?;
        config.apply_runtime_defaults();
        Ok(config)
    }

    /// Load configuration from the default XDG config location, if present.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            let mut config = Self::default();
            config.apply_runtime_defaults();
            return Ok(config);
        }
        Self::load_from_path(&path)
    }

    /// Return the default config directory based on XDG or $HOME.
    pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Return the log file path, honoring an explicit `general.log_file`.
    pub fn log_file_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = self.general.log_file.as_ref() {
            return Ok(path.clone());
        }
        Ok(xdg_dir("XDG_STATE_HOME", &[".local", "state"])?.join("ytbar.log"))
    }
}

fn xdg_dir(var: &str, home_fallback: &[&str]) -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = env::var(var) {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join(APP_DIR));
        }
    }
    let home = env::var("HOME").map_err(|_| ConfigError::MissingHome)?;
    let mut path = PathBuf::from(home);
    for part in home_fallback {
        path.push(part);
    }
    Ok(path.join(APP_DIR))
}
