//! Projected tile geometry.
//!
//! Converts a tile coordinate into its bounding box in projected units
//! (web mercator metres by default), together with a buffered box that
//! extends the tile by a pixel margin so geometries crossing the tile edge
//! are not clipped.
//!
//! # Axis convention
//!
//! The tile grid is y-reversed: row 0 is the top of the map. `ymin` is
//! therefore the *top* edge of the tile and `ymax` the bottom one, so
//! `ymin > ymax` holds for every tile. Consumers must not assume
//! `ymin < ymax`.
//!
//! # Example
//!
//! ```
//! use tessera::coord::TileCoord;
//! use tessera::geometry::{compute_geometry, TilingParams};
//!
//! let tile = TileCoord::new(0, 0, 0).unwrap();
//! let geometry = compute_geometry(&tile, &TilingParams::default(), 1.0);
//! assert_eq!(geometry.extent.width(), 40075017.0);
//! ```

use crate::coord::TileCoord;

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Earth circumference in web mercator (EPSG:3857) units.
pub const DEFAULT_MAX_GEOSIZE: f64 = 40075017.0;

/// Parameters describing the tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingParams {
    /// Tile edge in pixels.
    pub tile_size: u32,
    /// Full extent of the projection along one axis, in geometry units.
    pub max_geosize: f64,
    /// Total pixel buffer (half is applied on each side).
    pub buffer_size: u32,
}

impl Default for TilingParams {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            max_geosize: DEFAULT_MAX_GEOSIZE,
            buffer_size: 0,
        }
    }
}

impl TilingParams {
    /// Set the tile size in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the projected extent.
    pub fn with_max_geosize(mut self, max_geosize: f64) -> Self {
        self.max_geosize = max_geosize;
        self
    }

    /// Set the pixel buffer.
    pub fn with_buffer_size(mut self, buffer_size: u32) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// An axis-aligned box in projected units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Horizontal size of the box.
    pub fn width(&self) -> f64 {
        (self.xmax - self.xmin).abs()
    }

    /// Vertical size of the box, independent of the y-axis orientation.
    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin).abs()
    }
}

/// Geometry of a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGeometry {
    /// Unbuffered tile extent.
    pub extent: BoundingBox,
    /// Extent grown by the pixel buffer on every side.
    pub buffered: BoundingBox,
    /// Geometry units per pixel at this zoom.
    pub resolution: f64,
    /// Buffer size per side, in geometry units.
    pub buffer: f64,
    /// Buffer size per side in aggregation cells, used for edge inclusion.
    pub b_size: f64,
}

impl TileGeometry {
    /// Named values for template substitution.
    ///
    /// Keys match the placeholders used by aggregation tile templates
    /// (`{xmin}`, `{b_xmin}`, `{b_size}`, ...).
    pub fn template_values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("xmin", self.extent.xmin.to_string()),
            ("ymin", self.extent.ymin.to_string()),
            ("xmax", self.extent.xmax.to_string()),
            ("ymax", self.extent.ymax.to_string()),
            ("b_xmin", self.buffered.xmin.to_string()),
            ("b_ymin", self.buffered.ymin.to_string()),
            ("b_xmax", self.buffered.xmax.to_string()),
            ("b_ymax", self.buffered.ymax.to_string()),
            ("b_size", self.b_size.to_string()),
        ]
    }
}

/// Geometry units per pixel at the given zoom.
#[inline]
pub fn resolution(zoom: u8, tiling: &TilingParams) -> f64 {
    let full_resolution = tiling.max_geosize / f64::from(tiling.tile_size);
    full_resolution / 2.0_f64.powi(i32::from(zoom))
}

/// Computes the projected geometry of a tile.
///
/// # Arguments
///
/// * `coord` - The tile to compute
/// * `tiling` - Tile size, projected extent and pixel buffer
/// * `resolution_factor` - Aggregation cell size in pixels; divides the
///   half-buffer to produce `b_size`
pub fn compute_geometry(
    coord: &TileCoord,
    tiling: &TilingParams,
    resolution_factor: f64,
) -> TileGeometry {
    let tile_size = f64::from(tiling.tile_size);
    let origin_shift = resolution(0, tiling) * tile_size / 2.0;

    let pixres = resolution(coord.z, tiling);
    let tile_geo_size = tile_size * pixres;

    let x = f64::from(coord.x);
    let y = f64::from(coord.y);

    let half_buffer = f64::from(tiling.buffer_size) / 2.0;
    let buffer = pixres * half_buffer;

    let extent = BoundingBox {
        xmin: -origin_shift + x * tile_geo_size,
        xmax: -origin_shift + (x + 1.0) * tile_geo_size,
        // y-reversed: ymin is the top of the tile
        ymin: origin_shift - y * tile_geo_size,
        ymax: origin_shift - (y + 1.0) * tile_geo_size,
    };

    let buffered = BoundingBox {
        xmin: extent.xmin - buffer,
        ymin: extent.ymin + buffer,
        xmax: extent.xmax + buffer,
        ymax: extent.ymax - buffer,
    };

    TileGeometry {
        extent,
        buffered,
        resolution: pixres,
        buffer,
        b_size: half_buffer / resolution_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(z: u8, x: u32, y: u32) -> TileCoord {
        TileCoord::new(z, x, y).unwrap()
    }

    #[test]
    fn test_root_tile_covers_full_extent() {
        let geometry = compute_geometry(&tile(0, 0, 0), &TilingParams::default(), 1.0);

        assert_eq!(geometry.extent.width(), DEFAULT_MAX_GEOSIZE);
        assert_eq!(geometry.extent.height(), DEFAULT_MAX_GEOSIZE);
        assert_eq!(geometry.extent.xmin, -DEFAULT_MAX_GEOSIZE / 2.0);
        assert_eq!(geometry.extent.xmax, DEFAULT_MAX_GEOSIZE / 2.0);
    }

    #[test]
    fn test_root_tile_y_is_reversed() {
        let geometry = compute_geometry(&tile(0, 0, 0), &TilingParams::default(), 1.0);

        assert_eq!(geometry.extent.ymin, DEFAULT_MAX_GEOSIZE / 2.0);
        assert_eq!(geometry.extent.ymax, -DEFAULT_MAX_GEOSIZE / 2.0);
        assert!(geometry.extent.ymin > geometry.extent.ymax);
    }

    #[test]
    fn test_each_zoom_halves_the_tile() {
        let tiling = TilingParams::default();
        let mut previous = compute_geometry(&tile(0, 0, 0), &tiling, 1.0);

        for z in 1..=12u8 {
            let current = compute_geometry(&tile(z, 0, 0), &tiling, 1.0);
            assert_eq!(current.extent.width(), previous.extent.width() / 2.0);
            assert_eq!(current.extent.height(), previous.extent.height() / 2.0);
            assert_eq!(current.resolution, previous.resolution / 2.0);
            previous = current;
        }
    }

    #[test]
    fn test_resolution_at_zoom_zero() {
        let tiling = TilingParams::default();
        assert_eq!(resolution(0, &tiling), DEFAULT_MAX_GEOSIZE / 256.0);
    }

    #[test]
    fn test_adjacent_tiles_share_edges() {
        let tiling = TilingParams::default();
        let left = compute_geometry(&tile(3, 2, 5), &tiling, 1.0);
        let right = compute_geometry(&tile(3, 3, 5), &tiling, 1.0);
        let below = compute_geometry(&tile(3, 2, 6), &tiling, 1.0);

        assert_eq!(left.extent.xmax, right.extent.xmin);
        assert_eq!(left.extent.ymax, below.extent.ymin);
    }

    #[test]
    fn test_no_buffer_keeps_boxes_equal() {
        let geometry = compute_geometry(&tile(4, 3, 9), &TilingParams::default(), 1.0);
        assert_eq!(geometry.extent, geometry.buffered);
        assert_eq!(geometry.buffer, 0.0);
        assert_eq!(geometry.b_size, 0.0);
    }

    #[test]
    fn test_buffer_grows_the_box() {
        let tiling = TilingParams::default().with_buffer_size(32);
        let geometry = compute_geometry(&tile(2, 1, 1), &tiling, 2.0);

        let expected = geometry.resolution * 16.0;
        assert_eq!(geometry.buffer, expected);
        assert_eq!(geometry.buffered.xmin, geometry.extent.xmin - expected);
        assert_eq!(geometry.buffered.xmax, geometry.extent.xmax + expected);
        assert_eq!(geometry.buffered.ymin, geometry.extent.ymin + expected);
        assert_eq!(geometry.buffered.ymax, geometry.extent.ymax - expected);
        assert_eq!(geometry.b_size, 8.0);
    }

    #[test]
    fn test_custom_tile_size() {
        let tiling = TilingParams::default().with_tile_size(512);
        let geometry = compute_geometry(&tile(0, 0, 0), &tiling, 1.0);

        assert_eq!(geometry.extent.width(), DEFAULT_MAX_GEOSIZE);
        assert_eq!(geometry.resolution, DEFAULT_MAX_GEOSIZE / 512.0);
    }

    #[test]
    fn test_deterministic() {
        let tiling = TilingParams::default().with_buffer_size(64);
        let a = compute_geometry(&tile(14, 8190, 5447), &tiling, 4.0);
        let b = compute_geometry(&tile(14, 8190, 5447), &tiling, 4.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_template_values_names() {
        let geometry = compute_geometry(&tile(1, 0, 0), &TilingParams::default(), 1.0);
        let names: Vec<&str> = geometry.template_values().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec!["xmin", "ymin", "xmax", "ymax", "b_xmin", "b_ymin", "b_xmax", "b_ymax", "b_size"]
        );
    }
}
