//! Tile coordinate type definitions

use std::fmt;

/// Lowest zoom level (a single tile covers the whole extent).
pub const MIN_ZOOM: u8 = 0;

/// Highest supported zoom level.
///
/// Keeps `2^zoom` inside the `u32` range used for x/y.
pub const MAX_ZOOM: u8 = 30;

/// Tile coordinates in a power-of-two tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub z: u8,
    /// Column, 0 at the west edge
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
}

impl TileCoord {
    /// Creates a validated tile coordinate.
    ///
    /// # Errors
    ///
    /// Returns `CoordError::InvalidZoom` when `z > MAX_ZOOM` and
    /// `CoordError::OutOfRange` when `x` or `y` fall outside `[0, 2^z)`.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }

        let limit = super::tiles_per_axis(z);
        if u64::from(x) >= limit || u64::from(y) >= limit {
            return Err(CoordError::OutOfRange { zoom: z, x, y });
        }

        Ok(Self { z, x, y })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Errors that can occur when building tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Zoom level is outside the supported range
    InvalidZoom(u8),
    /// Column or row does not exist at this zoom level
    OutOfRange { zoom: u8, x: u32, y: u32 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::OutOfRange { zoom, x, y } => {
                write!(
                    f,
                    "Tile {}/{}/{} is out of range (x and y must be below {})",
                    zoom,
                    x,
                    y,
                    super::tiles_per_axis(*zoom)
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
