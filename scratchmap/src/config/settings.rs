//! Settings structs, one per INI section.

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{DEFAULT_DOCKER_ENDPOINT, DEFAULT_RELOAD_SIGNAL};
use crate::composite::{DEFAULT_MAX_CONCURRENT, DEFAULT_TILE_SIZE};
use crate::coord::{compute_grid, CoordError, TileGrid};
use crate::fetch::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
use crate::handler::FailurePolicy;
use crate::style::OverlayPaint;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default output image file name, placed in the system temp directory.
pub const DEFAULT_OUTPUT_FILE: &str = "scratchmap.png";

/// Default log file name, placed in the logs directory.
pub const DEFAULT_LOG_FILE: &str = "scratchmap.log";

/// Complete configuration loaded from `config.ini`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub map: MapSettings,
    pub style: StyleSettings,
    pub backend: BackendSettings,
    pub fetch: FetchSettings,
    pub data: DataSettings,
    pub output: OutputSettings,
    pub service: ServiceSettings,
    pub logging: LoggingSettings,
}

/// `[map]`: bounding box and tile geometry. Never changes at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
    pub zoom: u8,
    pub tile_size: u32,
}

impl MapSettings {
    /// Tile grid covering the configured bounding box.
    ///
    /// Also fails when the composite for `tile_size` would be too large.
    pub fn grid(&self) -> Result<TileGrid, CoordError> {
        let grid = compute_grid(
            self.lon_min,
            self.lat_min,
            self.lon_max,
            self.lat_max,
            self.zoom,
        )?;
        grid.canvas_size(self.tile_size)?;
        Ok(grid)
    }
}

/// `[style]`: the shared style file, its backup and the overlay fill.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSettings {
    pub path: PathBuf,
    pub backup_path: PathBuf,
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl StyleSettings {
    pub fn overlay_paint(&self) -> OverlayPaint {
        OverlayPaint::new(self.fill_color.clone(), self.fill_opacity)
    }
}

/// `[backend]`: where tiles come from and how the renderer is reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    /// Tile URL prefix; `{zoom}/{x}/{y}@3x.png` is appended verbatim.
    pub base_url: String,
    pub container_name: String,
    pub docker_endpoint: String,
    pub reload_signal: String,
}

/// `[fetch]`: tile request retry and concurrency.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl FetchSettings {
    /// A single attempt means no retries at all.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.max_attempts {
            0 | 1 => RetryPolicy::None,
            n => RetryPolicy::fixed(n, Duration::from_millis(self.retry_delay_ms)),
        }
    }
}

/// `[data]`: static lookup files.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub countries_path: PathBuf,
    pub messages_path: PathBuf,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join(DEFAULT_OUTPUT_FILE),
        }
    }
}

/// `[service]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceSettings {
    pub on_failure: FailurePolicy,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::file::config_directory()
                .join("logs")
                .join(DEFAULT_LOG_FILE),
        }
    }
}

pub(super) fn default_backend_endpoint() -> String {
    DEFAULT_DOCKER_ENDPOINT.to_string()
}

pub(super) fn default_reload_signal() -> String {
    DEFAULT_RELOAD_SIGNAL.to_string()
}

pub(super) fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}
