//! Tile compositing.
//!
//! Fetches every tile of a [`TileGrid`] and draws it onto one canvas at its
//! grid offset, then encodes the canvas as PNG to the configured output path.
//! Tiles are positioned absolutely, so fetch completion order does not
//! matter. Any fetch or decode failure fails the whole composite; there is no
//! placeholder for missing tiles.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt, TryStreamExt};
use image::{imageops, ImageFormat, RgbaImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::coord::{CoordError, TileCoord, TileGrid};
use crate::fetch::{FetchError, TileSource};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default number of tile requests in flight.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to decode tile {tile}: {source}")]
    Decode {
        tile: TileCoord,
        source: image::ImageError,
    },

    #[error(transparent)]
    Canvas(#[from] CoordError),

    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Compositing task failed: {0}")]
    Join(String),
}

/// Assembles fetched tiles into the output image.
#[derive(Debug, Clone)]
pub struct Compositor {
    tile_size: u32,
    output_path: PathBuf,
    max_concurrent: usize,
}

impl Compositor {
    pub fn new(tile_size: u32, output_path: impl Into<PathBuf>) -> Self {
        Self {
            tile_size,
            output_path: output_path.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Sets how many tile requests may run at once (at least one).
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Fetches every tile in `grid` from `source` and writes the composite.
    ///
    /// The output path is overwritten on every call. A stale output from a
    /// previous call is removed first so a failure never leaves an image
    /// behind.
    pub async fn composite<S: TileSource>(
        &self,
        grid: &TileGrid,
        source: &S,
    ) -> Result<PathBuf, CompositeError> {
        self.remove_stale_output().await?;
        grid.canvas_size(self.tile_size)?;

        let zoom = grid.zoom();
        let tiles: Vec<(TileCoord, Vec<u8>)> = stream::iter(grid.tiles().iter().copied())
            .map(|tile| async move {
                source
                    .fetch_tile(zoom, tile)
                    .await
                    .map(|bytes| (tile, bytes))
            })
            .buffer_unordered(self.max_concurrent)
            .try_collect()
            .await?;
        debug!(tiles = tiles.len(), zoom, "Fetched all tiles");

        let grid = grid.clone();
        let tile_size = self.tile_size;
        let output_path = self.output_path.clone();
        tokio::task::spawn_blocking(move || -> Result<PathBuf, CompositeError> {
            let canvas = assemble(&grid, tile_size, &tiles)?;
            write_png(&canvas, &output_path)?;
            info!(
                width = canvas.width(),
                height = canvas.height(),
                path = %output_path.display(),
                "Wrote scratch map"
            );
            Ok(output_path)
        })
        .await
        .map_err(|e| CompositeError::Join(e.to_string()))?
    }

    async fn remove_stale_output(&self) -> Result<(), CompositeError> {
        match tokio::fs::remove_file(&self.output_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CompositeError::Io {
                path: self.output_path.clone(),
                source,
            }),
        }
    }
}

/// Draws decoded tiles onto a blank canvas sized to the grid.
///
/// Each tile lands at `((x - min_x) * tile_size, (y - min_y) * tile_size)`.
/// Tiles larger than `tile_size` are clipped to their cell.
pub fn assemble(
    grid: &TileGrid,
    tile_size: u32,
    tiles: &[(TileCoord, Vec<u8>)],
) -> Result<RgbaImage, CompositeError> {
    let (width, height) = grid.canvas_size(tile_size)?;
    let mut canvas = RgbaImage::new(width, height);

    for (tile, bytes) in tiles {
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| CompositeError::Decode {
                tile: *tile,
                source,
            })?
            .to_rgba8();

        let (col, row) = grid.offset_of(tile);
        let cell = if decoded.width() > tile_size || decoded.height() > tile_size {
            imageops::crop_imm(
                &decoded,
                0,
                0,
                decoded.width().min(tile_size),
                decoded.height().min(tile_size),
            )
            .to_image()
        } else {
            decoded
        };
        imageops::replace(
            &mut canvas,
            &cell,
            i64::from(col * tile_size),
            i64::from(row * tile_size),
        );
    }

    Ok(canvas)
}

/// Encodes `canvas` as PNG next to `path`, then renames it into place.
fn write_png(canvas: &RgbaImage, path: &Path) -> Result<(), CompositeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CompositeError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("png.tmp");
    canvas
        .save_with_format(&temp_path, ImageFormat::Png)
        .map_err(|source| CompositeError::Encode {
            path: temp_path.clone(),
            source,
        })?;
    std::fs::rename(&temp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(&temp_path);
        CompositeError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::coord::compute_grid;
    use crate::fetch::HttpError;
    use image::Rgba;
    use std::io::Cursor;

    /// Encodes a solid-color PNG tile.
    pub(crate) fn solid_png(size: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(size, size, Rgba(color));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    /// Color derived from a tile's position so placement can be checked.
    pub(crate) fn tile_color(tile: TileCoord) -> [u8; 4] {
        [(tile.x % 256) as u8, (tile.y % 256) as u8, 200, 255]
    }

    /// Serves a solid tile colored by its coordinates.
    pub(crate) struct ColoredTiles {
        pub size: u32,
    }

    impl TileSource for ColoredTiles {
        async fn fetch_tile(&self, _zoom: u8, tile: TileCoord) -> Result<Vec<u8>, FetchError> {
            Ok(solid_png(self.size, tile_color(tile)))
        }
    }

    struct FailingTiles;

    impl TileSource for FailingTiles {
        async fn fetch_tile(&self, zoom: u8, tile: TileCoord) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Exhausted {
                zoom,
                tile,
                attempts: 10,
                last: HttpError::Request("connection refused".to_string()),
            })
        }
    }

    struct GarbageTiles;

    impl TileSource for GarbageTiles {
        async fn fetch_tile(&self, _zoom: u8, _tile: TileCoord) -> Result<Vec<u8>, FetchError> {
            Ok(b"not an image".to_vec())
        }
    }

    /// 2x2 grid at zoom 1 covering the whole world.
    fn world_grid() -> TileGrid {
        compute_grid(-180.0, 85.0, 180.0, -85.0, 1).unwrap()
    }

    #[tokio::test]
    async fn test_two_by_two_grid_is_512_square() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("scratchmap.png");
        let compositor = Compositor::new(256, &output);
        let grid = world_grid();
        assert_eq!((grid.count_x(), grid.count_y()), (2, 2));

        let path = compositor
            .composite(&grid, &ColoredTiles { size: 256 })
            .await
            .unwrap();

        assert_eq!(path, output);
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (512, 512));
        assert_eq!(*img.get_pixel(0, 0), Rgba(tile_color(TileCoord::new(0, 0))));
        assert_eq!(*img.get_pixel(256, 256), Rgba(tile_color(TileCoord::new(1, 1))));
        assert_eq!(*img.get_pixel(300, 10), Rgba(tile_color(TileCoord::new(1, 0))));
        assert_eq!(*img.get_pixel(10, 300), Rgba(tile_color(TileCoord::new(0, 1))));
    }

    #[test]
    fn test_oversized_tiles_are_clipped() {
        let grid = world_grid();
        let tiles: Vec<_> = grid
            .tiles()
            .iter()
            .map(|t| (*t, solid_png(768, tile_color(*t))))
            .collect();

        let canvas = assemble(&grid, 256, &tiles).unwrap();

        assert_eq!(canvas.dimensions(), (512, 512));
        assert_eq!(*canvas.get_pixel(255, 255), Rgba(tile_color(TileCoord::new(0, 0))));
        assert_eq!(*canvas.get_pixel(256, 0), Rgba(tile_color(TileCoord::new(1, 0))));
    }

    #[test]
    fn test_assembly_ignores_tile_order() {
        let grid = world_grid();
        let mut tiles: Vec<_> = grid
            .tiles()
            .iter()
            .map(|t| (*t, solid_png(256, tile_color(*t))))
            .collect();

        let forward = assemble(&grid, 256, &tiles).unwrap();
        tiles.reverse();
        let backward = assemble(&grid, 256, &tiles).unwrap();

        assert_eq!(forward, backward);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("scratchmap.png");
        std::fs::write(&output, b"previous run").unwrap();
        let compositor = Compositor::new(256, &output);

        let result = compositor.composite(&world_grid(), &FailingTiles).await;

        assert!(matches!(result, Err(CompositeError::Fetch(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_decode_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("scratchmap.png");
        let compositor = Compositor::new(256, &output);

        let result = compositor.composite(&world_grid(), &GarbageTiles).await;

        assert!(matches!(result, Err(CompositeError::Decode { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_canvas_overflow_is_rejected() {
        let grid = world_grid();
        let result = assemble(&grid, u32::MAX, &[]);
        assert!(matches!(
            result,
            Err(CompositeError::Canvas(CoordError::CanvasTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_oversized_canvas_fails_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        // 64 x 64 tiles: within the tile cap, 16384 px square at 256 px
        let grid = compute_grid(-180.0, 85.0, 180.0, -85.0, 6).unwrap();
        let compositor = Compositor::new(256, dir.path().join("scratchmap.png"));

        let result = compositor.composite(&grid, &FailingTiles).await;

        assert!(matches!(
            result,
            Err(CompositeError::Canvas(CoordError::CanvasTooLarge { .. }))
        ));
    }
}
