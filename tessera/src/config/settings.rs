//! Settings structs, one per `[section]` of the config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::aggregation::{DEFAULT_GEOM_COLUMN, DEFAULT_SRID};
use crate::geometry::{TilingParams, DEFAULT_MAX_GEOSIZE, DEFAULT_TILE_SIZE};
use crate::renderer::{BlendRequest, RenderLimits};

use super::file::config_directory;

/// Default output format of blended tiles.
pub const DEFAULT_FORMAT: &str = "png";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tessera.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub tiles: TilesSettings,
    pub renderer: RendererSettings,
    pub aggregation: AggregationSettings,
    pub logging: LoggingSettings,
}

/// Tile grid configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesSettings {
    /// Tile edge length in pixels
    pub tile_size: u32,
    /// Projected width of the world at zoom 0
    pub max_geosize: f64,
    /// Pixel buffer around each tile
    pub buffer_size: u32,
}

/// Renderer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// Output format of blended tiles
    pub format: String,
    /// Per-layer render timeout in milliseconds
    pub render_timeout: Option<u64>,
}

/// Aggregation layer defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSettings {
    pub geom_column: String,
    pub srid: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory holding the log file
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tiles: TilesSettings {
                tile_size: DEFAULT_TILE_SIZE,
                max_geosize: DEFAULT_MAX_GEOSIZE,
                buffer_size: 0,
            },
            renderer: RendererSettings {
                format: DEFAULT_FORMAT.to_string(),
                render_timeout: None,
            },
            aggregation: AggregationSettings {
                geom_column: DEFAULT_GEOM_COLUMN.to_string(),
                srid: DEFAULT_SRID,
            },
            logging: LoggingSettings {
                directory: config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}

impl ConfigFile {
    /// Tiling parameters for geometry and aggregation queries.
    pub fn tiling(&self) -> TilingParams {
        TilingParams::default()
            .with_tile_size(self.tiles.tile_size)
            .with_max_geosize(self.tiles.max_geosize)
            .with_buffer_size(self.tiles.buffer_size)
    }

    /// Limits forwarded to renderer providers.
    pub fn render_limits(&self) -> RenderLimits {
        RenderLimits {
            render_timeout: self.renderer.render_timeout.map(Duration::from_millis),
        }
    }

    /// Blend request for a layer selector, in the configured output format
    /// and with the configured render limits.
    pub fn blend_request(&self, layer: impl Into<String>) -> BlendRequest {
        BlendRequest::new(layer)
            .with_format(self.renderer.format.clone())
            .with_limits(self.render_limits())
    }
}
