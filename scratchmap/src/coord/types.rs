//! Tile coordinate types.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level accepted by the grid calculator.
pub const MAX_ZOOM: u8 = 22;

/// Most tiles a single grid may cover.
pub const MAX_GRID_TILES: u64 = 4096;

/// Largest composite canvas, in pixels (8192 x 8192).
pub const MAX_CANVAS_PIXELS: u64 = 8192 * 8192;

/// Errors raised while building a tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be within ±85.05112878)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be within ±180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (maximum is 22)")]
    InvalidZoom(u8),

    /// The bounds map to an inverted range on one axis.
    ///
    /// Latitude bounds are converted independently, so `lat_min` becomes the
    /// smallest row only when it is the northern bound.
    #[error("Bounding box yields an empty {axis} range: min {min} > max {max}")]
    EmptyGrid { axis: Axis, min: u32, max: u32 },

    #[error("Bounding box covers {count_x}x{count_y} tiles (maximum is {max})")]
    GridTooLarge { count_x: u32, count_y: u32, max: u64 },

    #[error("Canvas of {width}x{height} px exceeds {max} pixels")]
    CanvasTooLarge { width: u64, height: u64, max: u64 },
}

/// Grid axis, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// A tile index pair at the grid's zoom level.
///
/// `x` increases eastward, `y` increases southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}

/// Every tile covering a bounding box at a fixed zoom level.
///
/// Computed once at startup and shared read-only by every generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    zoom: u8,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    tiles: Vec<TileCoord>,
}

impl TileGrid {
    /// Builds the grid for an inclusive tile range.
    ///
    /// Tiles are enumerated column by column (x outer, y inner). Ranges
    /// covering more than [`MAX_GRID_TILES`] are rejected before anything is
    /// allocated.
    pub(crate) fn from_range(
        zoom: u8,
        min_x: u32,
        min_y: u32,
        max_x: u32,
        max_y: u32,
    ) -> Result<Self, CoordError> {
        let count_x = max_x - min_x + 1;
        let count_y = max_y - min_y + 1;
        let total = u64::from(count_x) * u64::from(count_y);
        if total > MAX_GRID_TILES {
            return Err(CoordError::GridTooLarge {
                count_x,
                count_y,
                max: MAX_GRID_TILES,
            });
        }

        let mut tiles = Vec::with_capacity(total as usize);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                tiles.push(TileCoord { x, y });
            }
        }

        Ok(Self {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
            tiles,
        })
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn min_x(&self) -> u32 {
        self.min_x
    }

    pub fn min_y(&self) -> u32 {
        self.min_y
    }

    pub fn max_x(&self) -> u32 {
        self.max_x
    }

    pub fn max_y(&self) -> u32 {
        self.max_y
    }

    /// Number of tile columns.
    pub fn count_x(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Number of tile rows.
    pub fn count_y(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        (self.min_x..=self.max_x).contains(&tile.x) && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Pixel dimensions of the composite for `tile_size` pixel tiles.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::CanvasTooLarge`] when the canvas would exceed
    /// [`MAX_CANVAS_PIXELS`] or an edge does not fit in `u32`.
    pub fn canvas_size(&self, tile_size: u32) -> Result<(u32, u32), CoordError> {
        let width = u64::from(self.count_x()) * u64::from(tile_size);
        let height = u64::from(self.count_y()) * u64::from(tile_size);
        let too_large = CoordError::CanvasTooLarge {
            width,
            height,
            max: MAX_CANVAS_PIXELS,
        };

        match width.checked_mul(height) {
            Some(area) if area <= MAX_CANVAS_PIXELS => {
                match (u32::try_from(width), u32::try_from(height)) {
                    (Ok(width), Ok(height)) => Ok((width, height)),
                    _ => Err(too_large),
                }
            }
            _ => Err(too_large),
        }
    }

    /// Position of a tile relative to the grid's top-left corner, in cells.
    pub fn offset_of(&self, tile: &TileCoord) -> (u32, u32) {
        (tile.x - self.min_x, tile.y - self.min_y)
    }
}
