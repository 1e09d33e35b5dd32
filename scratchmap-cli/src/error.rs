//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process;

use scratchmap::config::ConfigError;
use scratchmap::coord::CoordError;
use scratchmap::country::RegistryError;
use scratchmap::fetch::HttpError;
use scratchmap::handler::{HandlerError, MessagesError};
use scratchmap::style::StyleError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Configuration file missing or invalid
    Config(ConfigError),
    /// Country list could not be loaded
    Registry(RegistryError),
    /// Message templates could not be loaded
    Messages(MessagesError),
    /// Bounding box does not produce a usable tile grid
    Grid(CoordError),
    /// Style file or backup problem
    Style(StyleError),
    /// HTTP client could not be created
    Http(HttpError),
    /// Reply delivery failed
    Handler(HandlerError),
    /// Reading messages from stdin failed
    Input(io::Error),
    /// The request completed without producing an image
    NotGenerated,
    /// The image could not be copied to its destination
    Deliver { path: PathBuf, error: io::Error },
    /// A failed generation stopped the service
    Shutdown,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigError::NotFound(path)) => {
                eprintln!();
                eprintln!("Create {} with at least these settings:", path.display());
                eprintln!("  [map]     lon_min, lat_min, lon_max, lat_max, zoom");
                eprintln!("  [style]   path, backup_path, fill_color, fill_opacity");
                eprintln!("  [backend] base_url, container_name");
                eprintln!("  [data]    countries_path, messages_path");
            }
            CliError::Style(StyleError::BackupMissing { .. }) => {
                eprintln!();
                eprintln!("The live style still carries overlays and there is no backup.");
                eprintln!("Remove the fill-* layers and *-geojson sources by hand, then retry.");
            }
            CliError::Shutdown => {
                eprintln!();
                eprintln!("Check the style file before restarting; 'scratchmap restore-style'");
                eprintln!("puts the backup back in place.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Registry(e) => write!(f, "Failed to load countries: {}", e),
            CliError::Messages(e) => write!(f, "Failed to load message templates: {}", e),
            CliError::Grid(e) => write!(f, "Invalid map bounds: {}", e),
            CliError::Style(e) => write!(f, "Style error: {}", e),
            CliError::Http(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Handler(e) => write!(f, "{}", e),
            CliError::Input(e) => write!(f, "Failed to read input: {}", e),
            CliError::NotGenerated => write!(f, "No scratch map was generated"),
            CliError::Deliver { path, error } => {
                write!(f, "Failed to write '{}': {}", path.display(), error)
            }
            CliError::Shutdown => write!(f, "Service stopped after a failed generation"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Registry(e) => Some(e),
            CliError::Messages(e) => Some(e),
            CliError::Grid(e) => Some(e),
            CliError::Style(e) => Some(e),
            CliError::Http(e) => Some(e),
            CliError::Handler(e) => Some(e),
            CliError::Input(e) => Some(e),
            CliError::Deliver { error, .. } => Some(error),
            CliError::NotGenerated | CliError::Shutdown => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

impl From<MessagesError> for CliError {
    fn from(e: MessagesError) -> Self {
        CliError::Messages(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Grid(e)
    }
}

impl From<StyleError> for CliError {
    fn from(e: StyleError) -> Self {
        CliError::Style(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::Http(e)
    }
}

impl From<HandlerError> for CliError {
    fn from(e: HandlerError) -> Self {
        CliError::Handler(e)
    }
}
