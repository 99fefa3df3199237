//! Crate-level error type.

use std::fmt;

use crate::config::ConfigFileError;
use crate::coord::CoordError;
use crate::filter::FilterError;
use crate::mapconfig::MapConfigError;
use crate::renderer::RenderError;

/// Any error produced by this crate.
#[derive(Debug)]
pub enum TesseraError {
    /// Map configuration could not be loaded
    MapConfig(MapConfigError),
    /// Filter parameters were rejected
    Filter(FilterError),
    /// Rendering failed
    Render(RenderError),
    /// Tile coordinates are invalid
    Coord(CoordError),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
}

impl fmt::Display for TesseraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TesseraError::MapConfig(e) => write!(f, "{}", e),
            TesseraError::Filter(e) => write!(f, "{}", e),
            TesseraError::Render(e) => write!(f, "{}", e),
            TesseraError::Coord(e) => write!(f, "{}", e),
            TesseraError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TesseraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TesseraError::MapConfig(e) => Some(e),
            TesseraError::Filter(e) => Some(e),
            TesseraError::Render(e) => Some(e),
            TesseraError::Coord(e) => Some(e),
            TesseraError::Config(e) => Some(e),
        }
    }
}

impl From<MapConfigError> for TesseraError {
    fn from(e: MapConfigError) -> Self {
        TesseraError::MapConfig(e)
    }
}

impl From<FilterError> for TesseraError {
    fn from(e: FilterError) -> Self {
        TesseraError::Filter(e)
    }
}

impl From<RenderError> for TesseraError {
    fn from(e: RenderError) -> Self {
        TesseraError::Render(e)
    }
}

impl From<CoordError> for TesseraError {
    fn from(e: CoordError) -> Self {
        TesseraError::Coord(e)
    }
}

impl From<ConfigFileError> for TesseraError {
    fn from(e: ConfigFileError) -> Self {
        TesseraError::Config(e)
    }
}
