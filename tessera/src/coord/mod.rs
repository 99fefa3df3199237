//! Tile addressing module
//!
//! Provides the `(zoom, x, y)` tile coordinate used throughout the renderer
//! stack. Coordinates follow the standard power-of-two tiling scheme: at zoom
//! `z` there are `2^z` columns and `2^z` rows, with row 0 at the top.

mod types;

pub use types::{CoordError, TileCoord, MAX_ZOOM, MIN_ZOOM};

/// Returns the number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}
