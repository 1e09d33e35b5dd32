//! Scratch map generation
//!
//! Runs one generation end to end under the request gate:
//!
//! 1. add the selected countries' overlays to the style file
//! 2. signal the render backend to reload the style
//! 3. fetch every grid tile and composite the output image
//! 4. remove the overlays again
//!
//! If step 2 or 3 fails, the style file is restored from its backup before
//! the error is returned. If step 4 fails, the backup is restored and the
//! image is still delivered.

mod types;

pub use types::{GeneratedImage, GenerationError, Stage};

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::backend::RenderBackend;
use crate::composite::{CompositeError, Compositor};
use crate::coord::TileGrid;
use crate::country::{CountryRegistry, CountrySelection};
use crate::fetch::TileSource;
use crate::gate::RequestGate;
use crate::style::StyleStore;

/// Produces scratch maps for country selections.
pub struct ScratchMapGenerator<B: RenderBackend, S: TileSource> {
    registry: Arc<CountryRegistry>,
    store: StyleStore,
    backend: B,
    tiles: S,
    compositor: Compositor,
    grid: Arc<TileGrid>,
    gate: RequestGate,
}

impl<B: RenderBackend, S: TileSource> ScratchMapGenerator<B, S> {
    /// Creates a generator. `grid` is computed once at startup and reused for
    /// every generation.
    pub fn new(
        registry: Arc<CountryRegistry>,
        store: StyleStore,
        backend: B,
        tiles: S,
        compositor: Compositor,
        grid: Arc<TileGrid>,
    ) -> Self {
        Self {
            registry,
            store,
            backend,
            tiles,
            compositor,
            grid,
            gate: RequestGate::new(),
        }
    }

    pub fn registry(&self) -> &CountryRegistry {
        &self.registry
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    pub fn store(&self) -> &StyleStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generates a scratch map highlighting `selection`.
    ///
    /// Waits for any running generation first. The returned image keeps the
    /// gate held until it is discarded.
    pub async fn generate(
        &self,
        selection: &CountrySelection,
    ) -> Result<GeneratedImage, GenerationError> {
        if selection.is_empty() {
            return Err(GenerationError::EmptySelection);
        }
        // An oversized canvas must fail before the style is touched
        self.grid
            .canvas_size(self.compositor.tile_size())
            .map_err(|e| GenerationError::Composite(CompositeError::Canvas(e)))?;

        let permit = self.gate.acquire().await;
        let start = Instant::now();
        let names: Vec<&str> = selection
            .iter()
            .map(|id| self.registry.get(id).name.as_str())
            .collect();
        info!(
            countries = ?names,
            tiles = self.grid.len(),
            zoom = self.grid.zoom(),
            "Generating scratch map"
        );

        // A failed add never leaves a partial file behind
        self.store
            .add_overlays(&self.registry, selection)
            .await
            .map_err(GenerationError::AddOverlays)?;

        if let Err(e) = self.backend.reload().await {
            return Err(self.roll_back(Stage::Reload, e, GenerationError::Reload).await);
        }

        let path = match self.compositor.composite(&self.grid, &self.tiles).await {
            Ok(path) => path,
            Err(e) => {
                return Err(self.roll_back(Stage::Composite, e, GenerationError::Composite).await)
            }
        };

        if let Err(e) = self.store.remove_overlays(&self.registry, selection).await {
            warn!(error = %e, "Failed to remove overlays, restoring style from backup");
            if let Err(rollback) = self.store.restore_from_backup().await {
                error!(error = %rollback, "Style rollback failed");
                return Err(GenerationError::RollbackFailed {
                    stage: Stage::RemoveOverlays,
                    cause: e.to_string(),
                    rollback,
                });
            }
        }

        info!(
            path = %path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scratch map generated"
        );
        Ok(GeneratedImage::new(path, permit))
    }

    /// Restores the style after a failed stage and builds the error to return.
    async fn roll_back<E: Display>(
        &self,
        stage: Stage,
        cause: E,
        wrap: impl FnOnce(E) -> GenerationError,
    ) -> GenerationError {
        warn!(stage = %stage, error = %cause, "Generation failed, restoring style from backup");
        match self.store.restore_from_backup().await {
            Ok(()) => wrap(cause),
            Err(rollback) => {
                error!(stage = %stage, error = %rollback, "Style rollback failed");
                GenerationError::RollbackFailed {
                    stage,
                    cause: cause.to_string(),
                    rollback,
                }
            }
        }
    }
}
