//! Configuration loaded from `~/.scratchmap/config.ini`.
//!
//! Settings are read once at startup and never change afterwards. Missing
//! required settings and out-of-range values are rejected at load time, so
//! the rest of the crate can rely on them being valid.

mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigError};
pub use settings::{
    BackendSettings, ConfigFile, DataSettings, FetchSettings, LoggingSettings, MapSettings,
    OutputSettings, ServiceSettings, StyleSettings, DEFAULT_LOG_FILE, DEFAULT_OUTPUT_FILE,
    DEFAULT_TIMEOUT_SECS,
};
