//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tessera::config::ConfigFile;
use tessera::coord::TileCoord;
use tessera::mapconfig::MapConfig;

use crate::error::CliError;

/// Reads and parses a JSON file.
pub fn read_json(path: &Path) -> Result<Value, CliError> {
    let content = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.to_path_buf(),
        error,
    })?;
    serde_json::from_str(&content).map_err(|error| CliError::Json {
        path: path.to_path_buf(),
        error,
    })
}

/// Loads a map configuration document.
pub fn load_map_config(path: &Path) -> Result<MapConfig, CliError> {
    let document = read_json(path)?;
    Ok(MapConfig::from_value(document)?)
}

/// Loads the settings file, or the default location when none is given.
pub fn load_settings(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Validates tile coordinates given on the command line.
pub fn tile(z: u8, x: u32, y: u32) -> Result<TileCoord, CliError> {
    Ok(TileCoord::new(z, x, y)?)
}
