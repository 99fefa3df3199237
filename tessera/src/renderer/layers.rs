//! Resolution of the `layer` request parameter.

use crate::mapconfig::{LayerType, MapConfig};

use super::RenderError;

/// Resolves a layer selector into layer indices.
///
/// Accepted selectors:
///
/// - `"all"` (or empty) - every layer
/// - `"mapnik"` - every mapnik layer
/// - `"1,3,4"` - explicit, strictly ascending indices
///
/// # Errors
///
/// Returns `RenderError::UnknownLayer` for unparsable selectors, indices
/// that are not strictly ascending, or indices past the last layer.
pub fn select_layers(config: &MapConfig, selector: &str) -> Result<Vec<usize>, RenderError> {
    let selector = selector.trim();
    let count = config.layer_count();

    match selector {
        "" | "all" => return Ok((0..count).collect()),
        "mapnik" => {
            return Ok((0..count)
                .filter(|&i| config.layer_type(i) == Some(LayerType::Mapnik))
                .collect())
        }
        _ => {}
    }

    let mut indices: Vec<usize> = Vec::new();
    for part in selector.split(',') {
        let index: usize = part
            .trim()
            .parse()
            .map_err(|_| RenderError::UnknownLayer(selector.to_string()))?;

        if index >= count {
            return Err(RenderError::UnknownLayer(selector.to_string()));
        }
        if indices.last().is_some_and(|&last| index <= last) {
            return Err(RenderError::UnknownLayer(selector.to_string()));
        }
        indices.push(index);
    }

    Ok(indices)
}
