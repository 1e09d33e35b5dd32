//! Reply templates loaded from the messages file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagesError {
    #[error("Failed to read messages {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid messages file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Texts sent back to users. Keys in the file are PascalCase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageTemplates {
    pub welcome_message: String,
    pub info_message: String,
    pub unknown_command_message: String,
    pub invalid_input_message: String,
    pub no_valid_inputs_message: String,
    pub selected_countries_list_header: String,
    pub unrecognized_inputs_list_header: String,
    pub scratchmap_generation_message: String,
    pub scratchmap_created_message: String,
    /// Sent when a generation fails. Without it users hear nothing.
    #[serde(default)]
    pub scratchmap_failed_message: Option<String>,
}

impl MessageTemplates {
    pub fn from_json(json: &str) -> Result<Self, MessagesError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, MessagesError> {
        let json = std::fs::read_to_string(path).map_err(|source| MessagesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
