//! Grid command - show the tiles covered by the configured bounding box.

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

pub fn run(options: RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("grid");
    let map = &runner.config().map;
    let grid = map.grid()?;
    let (width, height) = grid.canvas_size(map.tile_size)?;

    println!(
        "Bounds:  lon {} .. {}, lat {} .. {}",
        map.lon_min, map.lon_max, map.lat_min, map.lat_max
    );
    println!("Zoom:    {}", grid.zoom());
    println!("X tiles: {} .. {} ({})", grid.min_x(), grid.max_x(), grid.count_x());
    println!("Y tiles: {} .. {} ({})", grid.min_y(), grid.max_y(), grid.count_y());
    println!("Total:   {} tiles", grid.len());
    println!("Image:   {} x {} px", width, height);
    Ok(())
}
