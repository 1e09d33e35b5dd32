//! File-backed style store with backup recovery.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use super::document::{OverlayPaint, StyleDocument};
use crate::country::{CountryRegistry, CountrySelection};

/// Errors raised by the style store. All of them are fatal for the request.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error("Failed to read style {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write style {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed style document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize style document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Layer '{layer}' references missing source '{source_name}'")]
    DanglingSource { layer: String, source_name: String },

    #[error("Style backup not found at {path}")]
    BackupMissing { path: PathBuf },
}

/// Reads and writes the live style file.
///
/// Every write goes to a hidden sibling file first and is then renamed over
/// the live file, so the render backend never reads a partial document.
/// Callers must hold the request gate while using the store.
#[derive(Debug, Clone)]
pub struct StyleStore {
    path: PathBuf,
    backup_path: PathBuf,
    paint: OverlayPaint,
}

impl StyleStore {
    pub fn new(
        path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
        paint: OverlayPaint,
    ) -> Self {
        Self {
            path: path.into(),
            backup_path: backup_path.into(),
            paint,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Loads and parses the live style file.
    pub async fn load(&self) -> Result<StyleDocument, StyleError> {
        let bytes = fs::read(&self.path).await.map_err(|source| StyleError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StyleError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Validates and atomically replaces the live style file.
    pub async fn save(&self, document: &StyleDocument) -> Result<(), StyleError> {
        document
            .validate()
            .map_err(|dangling| StyleError::DanglingSource {
                layer: dangling.layer,
                source_name: dangling.source,
            })?;
        let bytes = serde_json::to_vec_pretty(document)?;
        self.replace_live(&bytes).await
    }

    /// Injects a fill overlay for each selected country and persists the result.
    pub async fn add_overlays(
        &self,
        registry: &CountryRegistry,
        selection: &CountrySelection,
    ) -> Result<(), StyleError> {
        let mut document = self.load().await?;
        for id in selection.iter() {
            document.add_overlay(registry.get(id), &self.paint);
        }
        self.save(&document).await?;
        debug!(countries = selection.len(), path = %self.path.display(), "Added style overlays");
        Ok(())
    }

    /// Removes the overlays of the selected countries. Missing entries are ignored.
    pub async fn remove_overlays(
        &self,
        registry: &CountryRegistry,
        selection: &CountrySelection,
    ) -> Result<(), StyleError> {
        let mut document = self.load().await?;
        for id in selection.iter() {
            document.remove_overlay(registry.get(id));
        }
        self.save(&document).await?;
        debug!(countries = selection.len(), path = %self.path.display(), "Removed style overlays");
        Ok(())
    }

    /// Replaces the live style with a verbatim copy of the backup.
    pub async fn restore_from_backup(&self) -> Result<(), StyleError> {
        let bytes = match fs::read(&self.backup_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StyleError::BackupMissing {
                    path: self.backup_path.clone(),
                })
            }
            Err(source) => {
                return Err(StyleError::Read {
                    path: self.backup_path.clone(),
                    source,
                })
            }
        };
        self.replace_live(&bytes).await?;
        warn!(
            path = %self.path.display(),
            backup = %self.backup_path.display(),
            "Restored style from backup"
        );
        Ok(())
    }

    /// Makes the store ready to serve.
    ///
    /// Creates the backup from the live style if it does not exist yet. If the
    /// live style still carries overlays of any registered country, the live
    /// file is restored from the backup. Returns `true` when a restore happened.
    pub async fn prepare(&self, registry: &CountryRegistry) -> Result<bool, StyleError> {
        let document = self.load().await?;

        if !fs::try_exists(&self.backup_path).await.unwrap_or(false) {
            // Never seed the backup from a style that is already mutated
            if let Some((_, stale)) = registry.iter().find(|(_, c)| document.has_overlay(c)) {
                warn!(country = %stale.name, "Live style carries overlays and has no backup");
                return Err(StyleError::BackupMissing {
                    path: self.backup_path.clone(),
                });
            }
            let bytes = fs::read(&self.path).await.map_err(|source| StyleError::Read {
                path: self.path.clone(),
                source,
            })?;
            write_atomic(&self.backup_path, &bytes).await?;
            info!(backup = %self.backup_path.display(), "Created style backup");
            return Ok(false);
        }

        if registry.iter().any(|(_, c)| document.has_overlay(c)) {
            warn!(path = %self.path.display(), "Live style carries leftover overlays");
            self.restore_from_backup().await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn replace_live(&self, bytes: &[u8]) -> Result<(), StyleError> {
        write_atomic(&self.path, bytes).await
    }
}

/// Writes `bytes` to a hidden sibling of `path`, then renames it into place.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StyleError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let write_err = |source| StyleError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&temp_path, bytes).await.map_err(write_err)?;
    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(write_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::sample_registry;
    use crate::style::BASE_STYLE;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: StyleStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.json");
        let backup = dir.path().join("style.json.bak");
        std::fs::write(&path, BASE_STYLE).unwrap();
        std::fs::write(&backup, BASE_STYLE).unwrap();
        let store = StyleStore::new(path, backup, OverlayPaint::new("#d4af37", 0.6));
        Fixture { _dir: dir, store }
    }

    fn select(registry: &CountryRegistry, names: &[&str]) -> CountrySelection {
        names.iter().filter_map(|n| registry.resolve(n)).collect()
    }

    #[tokio::test]
    async fn test_add_overlays_persists_document() {
        let f = fixture();
        let registry = sample_registry();

        f.store
            .add_overlays(&registry, &select(&registry, &["France", "Italy"]))
            .await
            .unwrap();

        let doc = f.store.load().await.unwrap();
        assert!(doc.sources.contains_key("France-geojson"));
        assert!(doc.sources.contains_key("Italy-geojson"));
        assert_eq!(doc.layers.len(), 4);
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let f = fixture();
        let registry = sample_registry();
        let before = f.store.load().await.unwrap();
        let selection = select(&registry, &["Spain", "France"]);

        f.store.add_overlays(&registry, &selection).await.unwrap();
        f.store.remove_overlays(&registry, &selection).await.unwrap();

        assert_eq!(f.store.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_round_trip_keeps_null_fields() {
        let f = fixture();
        let registry = sample_registry();
        let with_nulls = BASE_STYLE.replace(
            r#""metadata": { "openmaptiles:version": "3.x" }"#,
            r#""metadata": null"#,
        );
        std::fs::write(f.store.path(), &with_nulls).unwrap();
        let selection = select(&registry, &["France"]);

        f.store.add_overlays(&registry, &selection).await.unwrap();
        f.store.remove_overlays(&registry, &selection).await.unwrap();

        let saved: serde_json::Value =
            serde_json::from_slice(&std::fs::read(f.store.path()).unwrap()).unwrap();
        let original: serde_json::Value = serde_json::from_str(&with_nulls).unwrap();
        assert_eq!(saved, original);
        assert!(saved["metadata"].is_null());
    }

    #[tokio::test]
    async fn test_duplicate_names_produce_one_overlay() {
        let f = fixture();
        let registry = sample_registry();
        let selection = select(&registry, &["Spain", "espana", "Kingdom of Spain"]);
        assert_eq!(selection.len(), 1);

        f.store.add_overlays(&registry, &selection).await.unwrap();

        let doc = f.store.load().await.unwrap();
        assert_eq!(doc.sources.len(), 2);
        assert_eq!(doc.layers.iter().filter(|l| l.id == "fill-Spain").count(), 1);
    }

    #[tokio::test]
    async fn test_remove_never_added_is_ok() {
        let f = fixture();
        let registry = sample_registry();

        f.store
            .remove_overlays(&registry, &select(&registry, &["Italy"]))
            .await
            .unwrap();

        assert_eq!(f.store.load().await.unwrap().layers.len(), 2);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let f = fixture();
        let registry = sample_registry();

        f.store
            .add_overlays(&registry, &select(&registry, &["France"]))
            .await
            .unwrap();

        let dir = f.store.path().parent().unwrap();
        let names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
    }

    #[tokio::test]
    async fn test_restore_is_byte_for_byte() {
        let f = fixture();
        let registry = sample_registry();

        f.store
            .add_overlays(&registry, &select(&registry, &["France"]))
            .await
            .unwrap();
        f.store.restore_from_backup().await.unwrap();

        let live = std::fs::read(f.store.path()).unwrap();
        let backup = std::fs::read(f.store.backup_path()).unwrap();
        assert_eq!(live, backup);
    }

    #[tokio::test]
    async fn test_restore_without_backup_fails() {
        let f = fixture();
        std::fs::remove_file(f.store.backup_path()).unwrap();

        let result = f.store.restore_from_backup().await;
        assert!(matches!(result, Err(StyleError::BackupMissing { .. })));
    }

    #[tokio::test]
    async fn test_malformed_style_is_parse_error() {
        let f = fixture();
        std::fs::write(f.store.path(), "{ not json").unwrap();

        let result = f.store.load().await;
        assert!(matches!(result, Err(StyleError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_prepare_creates_missing_backup() {
        let f = fixture();
        let registry = sample_registry();
        std::fs::remove_file(f.store.backup_path()).unwrap();

        let restored = f.store.prepare(&registry).await.unwrap();

        assert!(!restored);
        assert_eq!(
            std::fs::read(f.store.backup_path()).unwrap(),
            BASE_STYLE.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_prepare_restores_leftover_overlays() {
        let f = fixture();
        let registry = sample_registry();
        f.store
            .add_overlays(&registry, &select(&registry, &["Italy"]))
            .await
            .unwrap();

        let restored = f.store.prepare(&registry).await.unwrap();

        assert!(restored);
        assert_eq!(std::fs::read(f.store.path()).unwrap(), BASE_STYLE.as_bytes());
    }

    #[tokio::test]
    async fn test_prepare_refuses_mutated_style_without_backup() {
        let f = fixture();
        let registry = sample_registry();
        f.store
            .add_overlays(&registry, &select(&registry, &["Italy"]))
            .await
            .unwrap();
        std::fs::remove_file(f.store.backup_path()).unwrap();

        let result = f.store.prepare(&registry).await;
        assert!(matches!(result, Err(StyleError::BackupMissing { .. })));
    }
}
