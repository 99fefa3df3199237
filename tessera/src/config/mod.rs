//! User configuration loaded from `~/.tessera/config.ini`.
//!
//! ```ini
//! [tiles]
//! tile_size = 256
//! max_geosize = 40075017
//! buffer_size = 0
//!
//! [renderer]
//! format = png
//! render_timeout = 5000
//!
//! [aggregation]
//! geom_column = the_geom_webmercator
//! srid = 3857
//!
//! [logging]
//! directory = ~/.tessera/logs
//! file = tessera.log
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    AggregationSettings, ConfigFile, LoggingSettings, RendererSettings, TilesSettings,
    DEFAULT_FORMAT, DEFAULT_LOG_FILE,
};
