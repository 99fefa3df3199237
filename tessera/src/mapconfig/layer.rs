//! Layer definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use super::widget::Widget;

/// Rendering variant of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Vector/raster layer drawn by the shared CartoCSS engine.
    #[serde(alias = "cartodb")]
    Mapnik,
    /// Remote raster tiles fetched over HTTP.
    Http,
    /// Time-bucketed aggregation layer.
    Torque,
    /// Solid colour or image background.
    Plain,
}

impl LayerType {
    /// Canonical name as used in map configurations.
    pub fn name(&self) -> &'static str {
        match self {
            LayerType::Mapnik => "mapnik",
            LayerType::Http => "http",
            LayerType::Torque => "torque",
            LayerType::Plain => "plain",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options understood by this crate. Everything else in a layer's
/// `options` object is carried opaquely in the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LayerOptions {
    /// Base query of the layer.
    #[serde(default)]
    pub sql: Option<String>,

    /// Widgets keyed by widget id.
    #[serde(default)]
    pub widgets: BTreeMap<String, Widget>,

    /// Geometry column used by aggregation tiles.
    #[serde(default)]
    pub geom_column: Option<String>,

    /// SRID of the geometry column.
    #[serde(default)]
    pub srid: Option<u32>,
}

/// A single layer of a map configuration, as originally declared.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Layer {
    #[serde(rename = "type")]
    pub layer_type: LayerType,

    #[serde(default)]
    pub options: LayerOptions,
}

impl Layer {
    /// The original (unfiltered) base query.
    pub fn sql(&self) -> Option<&str> {
        self.options.sql.as_deref()
    }

    /// Widget by id.
    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.options.widgets.get(id)
    }
}
