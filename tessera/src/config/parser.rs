//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = parse_positive(section, "tiles", "tile_size")? {
            config.tiles.tile_size = v;
        }
        if let Some(v) = section.get("max_geosize") {
            config.tiles.max_geosize = v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|size| size.is_finite() && *size > 0.0)
                .ok_or_else(|| invalid("tiles", "max_geosize", v, "must be a positive number"))?;
        }
        if let Some(v) = section.get("buffer_size") {
            config.tiles.buffer_size = parse_value(
                v,
                "tiles",
                "buffer_size",
                "must be a non-negative integer (pixels)",
            )?;
        }
    }

    // [renderer] section
    if let Some(section) = ini.section(Some("renderer")) {
        if let Some(v) = section.get("format") {
            let v = v.trim().to_lowercase();
            if v != "png" {
                return Err(invalid("renderer", "format", &v, "must be 'png'"));
            }
            config.renderer.format = v;
        }
        if let Some(v) = section.get("render_timeout") {
            config.renderer.render_timeout = if v.trim().is_empty() {
                None
            } else {
                parse_positive(section, "renderer", "render_timeout")?
            };
        }
    }

    // [aggregation] section
    if let Some(section) = ini.section(Some("aggregation")) {
        if let Some(v) = section.get("geom_column") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("aggregation", "geom_column", v, "must not be empty"));
            }
            config.aggregation.geom_column = v.to_string();
        }
        if let Some(v) = parse_positive(section, "aggregation", "srid")? {
            config.aggregation.srid = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

/// Parses an optional strictly positive integer key.
fn parse_positive<T>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(v) = section.get(key) else {
        return Ok(None);
    };

    match v.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(Some(parsed)),
        _ => Err(invalid(name, key, v, "must be a positive integer")),
    }
}

/// Expand ~ to home directory in paths.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlay_values() {
        let config = parse(
            "[tiles]\n\
             tile_size = 512\n\
             max_geosize = 1000.5\n\
             buffer_size = 32\n\
             [renderer]\n\
             format = PNG\n\
             render_timeout = 3000\n\
             [aggregation]\n\
             geom_column = geom\n\
             srid = 4326\n\
             [logging]\n\
             directory = /var/log/tessera\n\
             file = tiles.log\n",
        )
        .unwrap();

        assert_eq!(config.tiles.tile_size, 512);
        assert_eq!(config.tiles.max_geosize, 1000.5);
        assert_eq!(config.tiles.buffer_size, 32);
        assert_eq!(config.renderer.format, "png");
        assert_eq!(config.renderer.render_timeout, Some(3000));
        assert_eq!(config.aggregation.geom_column, "geom");
        assert_eq!(config.aggregation.srid, 4326);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/tessera"));
        assert_eq!(config.logging.file, "tiles.log");
    }

    #[test]
    fn test_invalid_tile_size() {
        let err = parse("[tiles]\ntile_size = 0\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "tiles");
                assert_eq!(key, "tile_size");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_geosize() {
        assert!(parse("[tiles]\nmax_geosize = huge\n").is_err());
        assert!(parse("[tiles]\nmax_geosize = -1\n").is_err());
    }

    #[test]
    fn test_invalid_format() {
        let err = parse("[renderer]\nformat = mvt\n").unwrap_err();
        assert!(err.to_string().contains("renderer.format"));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(parse("[renderer]\nrender_timeout = soon\n").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse("[renderer]\nrender_timeout = 0\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "renderer");
                assert_eq!(key, "render_timeout");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(parse("[renderer]\nrender_timeout = -5\n").is_err());
    }

    #[test]
    fn test_empty_timeout_means_none() {
        let config = parse("[renderer]\nrender_timeout =\n").unwrap();
        assert_eq!(config.renderer.render_timeout, None);
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/logs");
        assert!(expanded.ends_with("logs"));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
