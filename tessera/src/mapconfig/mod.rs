//! Map configuration model.
//!
//! A map configuration is the JSON document describing a map: an ordered
//! list of layers, each with a type, a base query and optional widgets.
//!
//! ```json
//! {
//!   "version": "1.5.0",
//!   "layers": [{
//!     "type": "mapnik",
//!     "options": {
//!       "sql": "select * from populated_places",
//!       "cartocss": "#layer { marker-fill: red; }",
//!       "cartocss_version": "2.0.1",
//!       "widgets": {
//!         "adm0name": { "type": "aggregation", "options": { "aggregation": "count", "column": "adm0name" } }
//!       }
//!     }
//!   }]
//! }
//! ```
//!
//! # Identity
//!
//! Every configuration has an identity: the SHA-256 of its canonical JSON
//! serialization (object keys sorted). The identity follows the *current*
//! content, so applying filters (which rewrite layer queries) changes it and
//! clearing them restores the original value.
//!
//! # Filters
//!
//! [`MapConfig::set_filters_params`] validates and compiles per-widget filter
//! arguments, then rewrites the query of every filtered layer. The original
//! queries are kept aside so [`MapConfig::clear_filters`] can restore them
//! and [`WidgetRef::sql`] can always start from the pristine query.
//!
//! Mutation takes `&mut self`; a configuration shared across tasks must be
//! wrapped by the caller so that only one writer exists at a time.

mod layer;
mod widget;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::filter::{Filter, FilterError, FilterParams, LayerFilters};

pub use layer::{Layer, LayerOptions, LayerType};
pub use widget::{
    Widget, WidgetOptions, WidgetRef, WidgetType, AGGREGATION_ALIAS, FORMULA_ALIAS,
    HISTOGRAM_ALIAS, LIST_ALIAS,
};

/// Errors raised while loading a map configuration.
#[derive(Debug, Error)]
pub enum MapConfigError {
    /// The document is not valid JSON or a layer does not match the schema.
    #[error("Invalid map configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document has no `layers` array.
    #[error("Invalid map configuration: missing 'layers' array")]
    MissingLayers,

    /// A widget is missing options required by its type.
    #[error("Invalid widget '{widget}' in layer {layer}: {reason}")]
    InvalidWidget {
        layer: usize,
        widget: String,
        reason: String,
    },
}

/// A map configuration with its content identity and active filters.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Current document, including any filter rewrites.
    document: Value,
    /// Layers as originally declared.
    layers: Vec<Layer>,
    /// Active filters, keyed by layer index.
    filters: BTreeMap<usize, LayerFilters>,
    id: String,
}

impl MapConfig {
    /// Loads a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `MapConfigError` if the document has no `layers` array, a
    /// layer or widget type is unknown, or a widget lacks required options.
    pub fn from_value(document: Value) -> Result<Self, MapConfigError> {
        let layers = match document.get("layers") {
            Some(layers @ Value::Array(_)) => Vec::<Layer>::deserialize(layers)?,
            _ => return Err(MapConfigError::MissingLayers),
        };

        for (index, layer) in layers.iter().enumerate() {
            for (id, widget) in &layer.options.widgets {
                widget
                    .validate()
                    .map_err(|reason| MapConfigError::InvalidWidget {
                        layer: index,
                        widget: id.clone(),
                        reason,
                    })?;
            }
        }

        let id = fingerprint(&document);
        Ok(Self {
            document,
            layers,
            filters: BTreeMap::new(),
            id,
        })
    }

    /// Parses and loads a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, MapConfigError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Content identity of the configuration in its current state.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The current document, including filter rewrites.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Layers as originally declared.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer by index.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Type of the layer at `index`.
    pub fn layer_type(&self, index: usize) -> Option<LayerType> {
        self.layers.get(index).map(|layer| layer.layer_type)
    }

    /// Current query of a layer, reflecting active filters.
    pub fn layer_sql(&self, index: usize) -> Option<&str> {
        self.document
            .pointer(&sql_pointer(index))
            .and_then(Value::as_str)
    }

    /// Looks up a widget, bound to its layer's original query.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnknownLayer` or `FilterError::UnknownWidget`
    /// when the layer or widget does not exist.
    pub fn widget(&self, layer: usize, widget_id: &str) -> Result<WidgetRef<'_>, FilterError> {
        let owner = self
            .layers
            .get(layer)
            .ok_or(FilterError::UnknownLayer(layer))?;

        let (id, widget) = owner
            .options
            .widgets
            .get_key_value(widget_id)
            .ok_or_else(|| FilterError::UnknownWidget {
                layer,
                widget: widget_id.to_string(),
            })?;

        Ok(WidgetRef::new(id, widget, owner.sql().unwrap_or_default()))
    }

    /// Applies per-widget filter parameters.
    ///
    /// Replaces any previously active filters. Every argument is validated
    /// and compiled first; if any of them fails, the configuration is left
    /// exactly as it was. Calling this twice with the same parameters gives
    /// the same queries and identity.
    ///
    /// # Errors
    ///
    /// - `FilterError::UnknownLayer` / `FilterError::UnknownWidget` for
    ///   references to missing layers or widgets
    /// - `FilterError::InvalidFilterArgs` for malformed arguments, widgets
    ///   that cannot be filtered, or layers without a query
    pub fn set_filters_params(&mut self, params: &FilterParams) -> Result<(), FilterError> {
        let compiled = self.compile_filters(params)?;

        let mut rewrites = Vec::with_capacity(compiled.len());
        for (&index, filters) in &compiled {
            let base = self.layers[index].sql().ok_or_else(|| {
                FilterError::InvalidFilterArgs(format!("Layer {} has no sql to filter", index))
            })?;
            rewrites.push((index, filters.apply(base)));
        }

        self.restore_layer_sql();
        for (index, sql) in rewrites {
            self.write_layer_sql(index, sql);
        }
        self.filters = compiled;
        self.refresh_id();

        debug!(
            id = %self.id,
            layers = self.filters.len(),
            "Applied filters to map configuration"
        );
        Ok(())
    }

    /// Active filters of a layer, if any.
    pub fn layer_filters(&self, index: usize) -> Option<&LayerFilters> {
        self.filters.get(&index)
    }

    /// Drops all filters and restores the original queries and identity.
    pub fn clear_filters(&mut self) {
        if self.filters.is_empty() {
            return;
        }

        self.restore_layer_sql();
        self.filters.clear();
        self.refresh_id();

        debug!(id = %self.id, "Cleared map configuration filters");
    }

    fn compile_filters(
        &self,
        params: &FilterParams,
    ) -> Result<BTreeMap<usize, LayerFilters>, FilterError> {
        let mut compiled: BTreeMap<usize, LayerFilters> = BTreeMap::new();

        for (index, widget_id, args) in params.iter() {
            let layer = self
                .layers
                .get(index)
                .ok_or(FilterError::UnknownLayer(index))?;

            let widget = layer
                .widget(widget_id)
                .ok_or_else(|| FilterError::UnknownWidget {
                    layer: index,
                    widget: widget_id.to_string(),
                })?;

            let kind = widget.widget_type.filter_kind().ok_or_else(|| {
                FilterError::InvalidFilterArgs(format!(
                    "Widget '{}' does not support filtering",
                    widget_id
                ))
            })?;

            let filter = Filter::compile(kind, widget.column(), args)?;
            compiled.entry(index).or_default().insert(widget_id, filter);
        }

        Ok(compiled)
    }

    fn restore_layer_sql(&mut self) {
        for index in self.filters.keys().copied().collect::<Vec<_>>() {
            if let Some(sql) = self.layers[index].options.sql.clone() {
                self.write_layer_sql(index, sql);
            }
        }
    }

    fn write_layer_sql(&mut self, index: usize, sql: String) {
        if let Some(slot) = self.document.pointer_mut(&sql_pointer(index)) {
            *slot = Value::String(sql);
        }
    }

    fn refresh_id(&mut self) {
        self.id = fingerprint(&self.document);
    }
}

fn sql_pointer(index: usize) -> String {
    format!("/layers/{}/options/sql", index)
}

/// Hex SHA-256 of the canonical (key-sorted) JSON serialization.
fn fingerprint(document: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CATEGORY_EMPTY_ARRAYS, CATEGORY_MISSING_ARRAYS};
    use serde_json::json;

    const LAYER_SQL: &str = "select * from populated_places_simple_reduced";

    fn category_config() -> MapConfig {
        MapConfig::from_value(json!({
            "version": "1.5.0",
            "layers": [{
                "type": "mapnik",
                "options": {
                    "sql": LAYER_SQL,
                    "cartocss": "#layer0 { marker-fill: red; marker-width: 10; }",
                    "cartocss_version": "2.0.1",
                    "widgets": {
                        "adm0name": {
                            "type": "aggregation",
                            "options": { "aggregation": "count", "column": "adm0name" }
                        }
                    }
                }
            }]
        }))
        .unwrap()
    }

    fn accept(values: serde_json::Value) -> FilterParams {
        FilterParams::new().with_widget(0, "adm0name", json!({ "accept": values }))
    }

    #[test]
    fn test_identity_is_deterministic() {
        assert_eq!(category_config().id(), category_config().id());
        assert_eq!(category_config().id().len(), 64);
    }

    #[test]
    fn test_identity_ignores_key_order() {
        let a = MapConfig::from_json(r#"{"version":"1.5.0","layers":[]}"#).unwrap();
        let b = MapConfig::from_json(r#"{"layers":[],"version":"1.5.0"}"#).unwrap();
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_identity_depends_on_content() {
        let a = MapConfig::from_json(r#"{"version":"1.5.0","layers":[]}"#).unwrap();
        let b = MapConfig::from_json(r#"{"version":"1.6.0","layers":[]}"#).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_missing_layers() {
        assert!(matches!(
            MapConfig::from_json(r#"{"version":"1.5.0"}"#),
            Err(MapConfigError::MissingLayers)
        ));
    }

    #[test]
    fn test_invalid_widget_is_reported() {
        let err = MapConfig::from_value(json!({
            "layers": [{"type": "mapnik", "options": {"sql": "x", "widgets": {"h": {"type": "histogram"}}}}]
        }))
        .unwrap_err();
        assert!(matches!(err, MapConfigError::InvalidWidget { layer: 0, .. }));
    }

    #[test]
    fn test_accept_filter_rewrites_layer_sql() {
        let mut config = category_config();
        let original_id = config.id().to_string();
        assert_eq!(config.layer_sql(0), Some(LAYER_SQL));

        config.set_filters_params(&accept(json!(["Spain"]))).unwrap();

        assert_eq!(
            config.layer_sql(0),
            Some(
                "SELECT * FROM (select * from populated_places_simple_reduced) \
                 _cdb_category_filter WHERE adm0name IN ('Spain')"
            )
        );
        assert_ne!(config.id(), original_id);

        config.clear_filters();
        assert_eq!(config.id(), original_id);
        assert_eq!(config.layer_sql(0), Some(LAYER_SQL));
    }

    #[test]
    fn test_set_filters_is_idempotent() {
        let mut config = category_config();
        let params = accept(json!(["Spain"]));

        config.set_filters_params(&params).unwrap();
        let first_sql = config.layer_sql(0).map(str::to_string);
        let first_id = config.id().to_string();

        config.set_filters_params(&params).unwrap();
        assert_eq!(config.layer_sql(0).map(str::to_string), first_sql);
        assert_eq!(config.id(), first_id);
    }

    #[test]
    fn test_new_params_replace_previous_filters() {
        let mut config = category_config();
        config.set_filters_params(&accept(json!(["Spain"]))).unwrap();
        config.set_filters_params(&accept(json!(["France"]))).unwrap();

        assert_eq!(
            config.layer_sql(0),
            Some(
                "SELECT * FROM (select * from populated_places_simple_reduced) \
                 _cdb_category_filter WHERE adm0name IN ('France')"
            )
        );
    }

    #[test]
    fn test_failed_call_leaves_config_untouched() {
        let mut config = category_config();
        config.set_filters_params(&accept(json!(["Spain"]))).unwrap();
        let filtered_id = config.id().to_string();
        let filtered_sql = config.layer_sql(0).map(str::to_string);

        let err = config.set_filters_params(&accept(json!([]))).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_EMPTY_ARRAYS);
        assert_eq!(config.id(), filtered_id);
        assert_eq!(config.layer_sql(0).map(str::to_string), filtered_sql);
        assert!(config.layer_filters(0).is_some());
    }

    #[test]
    fn test_missing_arrays_error() {
        let mut config = category_config();
        let params = FilterParams::new().with_widget(0, "adm0name", json!({}));
        let err = config.set_filters_params(&params).unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterArgs(CATEGORY_MISSING_ARRAYS.to_string()));
    }

    #[test]
    fn test_unknown_widget() {
        let mut config = category_config();
        let params = FilterParams::new().with_widget(0, "nope", json!({"accept": ["a"]}));
        assert_eq!(
            config.set_filters_params(&params).unwrap_err(),
            FilterError::UnknownWidget {
                layer: 0,
                widget: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_layer() {
        let mut config = category_config();
        let params = FilterParams::new().with_widget(3, "adm0name", json!({"accept": ["a"]}));
        assert_eq!(
            config.set_filters_params(&params).unwrap_err(),
            FilterError::UnknownLayer(3)
        );
    }

    #[test]
    fn test_widget_lookup_errors() {
        let config = category_config();
        assert!(config.widget(0, "adm0name").is_ok());
        assert!(matches!(
            config.widget(0, "missing"),
            Err(FilterError::UnknownWidget { .. })
        ));
        assert_eq!(
            config.widget(1, "adm0name").unwrap_err(),
            FilterError::UnknownLayer(1)
        );
    }

    #[test]
    fn test_clear_without_filters_is_noop() {
        let mut config = category_config();
        let id = config.id().to_string();
        config.clear_filters();
        assert_eq!(config.id(), id);
    }

    #[test]
    fn test_layer_accessors() {
        let config = category_config();
        assert_eq!(config.layer_count(), 1);
        assert_eq!(config.layer_type(0), Some(LayerType::Mapnik));
        assert_eq!(config.layer_type(1), None);
        assert_eq!(config.layer(0).and_then(Layer::sql), Some(LAYER_SQL));
    }
}
