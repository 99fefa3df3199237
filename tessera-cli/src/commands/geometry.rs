//! Geometry command: print the projected geometry of a tile.

use clap::Args;
use serde_json::{json, Value};
use tessera::geometry::{compute_geometry, BoundingBox, TileGeometry, TilingParams};

use super::common::tile;
use crate::error::CliError;

/// Arguments for the geometry command.
#[derive(Debug, Args)]
pub struct GeometryArgs {
    /// Zoom level
    #[arg(short, long)]
    pub z: u8,

    /// Tile column
    #[arg(short, long)]
    pub x: u32,

    /// Tile row (0 at the top)
    #[arg(short, long)]
    pub y: u32,

    /// Total pixel buffer, overrides the configured value
    #[arg(long)]
    pub buffer_size: Option<u32>,

    /// Aggregation cell size in pixels
    #[arg(long, default_value = "1")]
    pub resolution: f64,
}

/// Run the geometry command.
pub fn run(args: GeometryArgs, tiling: TilingParams) -> Result<(), CliError> {
    let coord = tile(args.z, args.x, args.y)?;
    let tiling = match args.buffer_size {
        Some(buffer_size) => tiling.with_buffer_size(buffer_size),
        None => tiling,
    };

    let geometry = compute_geometry(&coord, &tiling, args.resolution);
    let report = geometry_report(&geometry);
    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

fn bbox(b: &BoundingBox) -> Value {
    json!({"xmin": b.xmin, "ymin": b.ymin, "xmax": b.xmax, "ymax": b.ymax})
}

fn geometry_report(geometry: &TileGeometry) -> Value {
    json!({
        "extent": bbox(&geometry.extent),
        "buffered": bbox(&geometry.buffered),
        "resolution": geometry.resolution,
        "buffer": geometry.buffer,
        "b_size": geometry.b_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera::coord::TileCoord;

    #[test]
    fn test_root_tile_report() {
        let coord = TileCoord::new(0, 0, 0).unwrap();
        let geometry = compute_geometry(&coord, &TilingParams::default(), 1.0);

        let report = geometry_report(&geometry);
        assert_eq!(report["extent"]["xmin"], -20037508.5);
        assert_eq!(report["extent"]["ymin"], 20037508.5);
        assert_eq!(report["buffer"], 0.0);
    }
}
