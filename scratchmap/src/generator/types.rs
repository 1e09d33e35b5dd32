//! Generation results and errors

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::BackendError;
use crate::composite::CompositeError;
use crate::gate::GatePermit;
use crate::style::StyleError;

/// Pipeline step a generation failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AddOverlays,
    Reload,
    Composite,
    RemoveOverlays,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AddOverlays => "add overlays",
            Stage::Reload => "reload backend",
            Stage::Composite => "composite tiles",
            Stage::RemoveOverlays => "remove overlays",
        };
        f.write_str(name)
    }
}

/// Why a generation failed.
///
/// Every variant except [`RollbackFailed`](Self::RollbackFailed) leaves the
/// style file in its pristine state, so the failure is scoped to the request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No countries selected")]
    EmptySelection,

    /// The overlays could not be written. Nothing was mutated.
    #[error("Failed to add overlays: {0}")]
    AddOverlays(#[source] StyleError),

    /// The backend did not take the reload signal. The style was restored.
    #[error("Failed to reload render backend: {0}")]
    Reload(#[source] BackendError),

    /// A tile could not be fetched or decoded. The style was restored.
    #[error("Failed to composite scratch map: {0}")]
    Composite(#[source] CompositeError),

    /// Restoring the style after a failure failed too. The style file is in
    /// an unknown state and the process must not serve further requests.
    #[error("Style rollback failed after {stage} error ({cause}): {rollback}")]
    RollbackFailed {
        stage: Stage,
        cause: String,
        #[source]
        rollback: StyleError,
    },
}

impl GenerationError {
    /// True when the process must stop serving.
    pub fn requires_shutdown(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }

    /// Stage the generation failed in, if it got past input checks.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::EmptySelection => None,
            Self::AddOverlays(_) => Some(Stage::AddOverlays),
            Self::Reload(_) => Some(Stage::Reload),
            Self::Composite(_) => Some(Stage::Composite),
            Self::RollbackFailed { stage, .. } => Some(*stage),
        }
    }
}

/// A composited scratch map on local storage.
///
/// Every generation writes to the same output path, so the image holds the
/// request gate until it is discarded or dropped. Deliver it, then call
/// [`discard`](Self::discard).
#[derive(Debug)]
pub struct GeneratedImage {
    path: PathBuf,
    _permit: GatePermit,
}

impl GeneratedImage {
    pub(crate) fn new(path: PathBuf, permit: GatePermit) -> Self {
        Self {
            path,
            _permit: permit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the image file and releases the request gate.
    pub async fn discard(self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
