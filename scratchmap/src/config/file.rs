//! Configuration file handling for ~/.scratchmap/config.ini.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::coord::CoordError;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read or parse the INI file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A required setting is absent
    #[error("Missing configuration: {section}.{key}")]
    MissingValue { section: String, key: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The `[map]` settings do not produce a usable grid
    #[error("Invalid map settings: {0}")]
    InvalidMap(#[from] CoordError),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.scratchmap/config.ini).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Unlike optional settings, the file itself is required: paths and the
    /// render backend have no usable defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }
}

/// Get the path to the config directory (~/.scratchmap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scratchmap")
}

/// Get the path to the config file (~/.scratchmap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
