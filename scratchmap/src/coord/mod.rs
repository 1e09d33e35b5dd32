//! Coordinate conversion module
//!
//! Converts a geographic bounding box into the Web Mercator (slippy map) tile
//! grid that covers it. The formulas are the standard ones from the
//! OpenStreetMap wiki:
//!
//! ```text
//! x = floor((lon + 180) / 360 * 2^z)
//! y = floor((1 - ln(tan(lat) + 1 / cos(lat)) / π) / 2 * 2^z)
//! ```

mod types;

pub use types::{
    Axis, CoordError, TileCoord, TileGrid, MAX_CANVAS_PIXELS, MAX_GRID_TILES, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON,
};

use std::f64::consts::PI;

/// Converts a longitude to a tile column at the given zoom level.
///
/// The result is clamped to the valid column range, so `lon = 180` maps to
/// the easternmost column.
#[inline]
pub fn lon_to_tile_x(lon: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let x = ((lon + 180.0) / 360.0 * n).floor();
    clamp_index(x, n)
}

/// Converts a latitude to a tile row at the given zoom level.
///
/// Rows grow southward: a larger latitude yields a smaller row.
#[inline]
pub fn lat_to_tile_y(lat: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();
    clamp_index(y, n)
}

#[inline]
fn clamp_index(value: f64, n: f64) -> u32 {
    value.clamp(0.0, n - 1.0) as u32
}

/// Computes the tile grid covering a bounding box.
///
/// Each bound is converted independently: `lon_min`/`lon_max` give the
/// column range and `lat_min`/`lat_max` give the row range. Because rows grow
/// southward, `lat_min` must be the bound that maps to the top row; bounds
/// are never swapped, and an inverted range is reported as
/// [`CoordError::EmptyGrid`].
///
/// # Errors
///
/// Returns an error for out-of-range coordinates or zoom, when either axis
/// yields an empty range, or when the grid covers more than
/// [`MAX_GRID_TILES`] tiles.
pub fn compute_grid(
    lon_min: f64,
    lat_min: f64,
    lon_max: f64,
    lat_max: f64,
    zoom: u8,
) -> Result<TileGrid, CoordError> {
    for lat in [lat_min, lat_max] {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
    }
    for lon in [lon_min, lon_max] {
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let min_x = lon_to_tile_x(lon_min, zoom);
    let max_x = lon_to_tile_x(lon_max, zoom);
    let min_y = lat_to_tile_y(lat_min, zoom);
    let max_y = lat_to_tile_y(lat_max, zoom);

    if min_x > max_x {
        return Err(CoordError::EmptyGrid {
            axis: Axis::X,
            min: min_x,
            max: max_x,
        });
    }
    if min_y > max_y {
        return Err(CoordError::EmptyGrid {
            axis: Axis::Y,
            min: min_y,
            max: max_y,
        });
    }

    TileGrid::from_range(zoom, min_x, min_y, max_x, max_y)
}
