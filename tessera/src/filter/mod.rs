//! Widget-driven query filters.
//!
//! Widgets attached to a layer double as filter definitions: an
//! `aggregation` widget accepts category filters (`accept` / `reject` value
//! sets) and a `histogram` widget accepts range filters (`min` / `max`).
//! Filter parameters arrive per request, keyed by layer index and widget id:
//!
//! ```json
//! { "layers": [ { "adm0name": { "accept": ["Spain"] } } ] }
//! ```
//!
//! Each filter compiles to a `WHERE` clause and is applied by wrapping the
//! query it restricts:
//!
//! ```text
//! SELECT * FROM (<sql>) _cdb_category_filter WHERE adm0name IN ('Spain')
//! ```
//!
//! Applying filters to a configuration is done through
//! [`MapConfig::set_filters_params`](crate::mapconfig::MapConfig::set_filters_params).

mod category;
mod error;
mod range;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Number, Value};

pub use category::{CategoryFilter, CategoryValue};
pub use error::{
    FilterError, CATEGORY_EMPTY_ARRAYS, CATEGORY_MISSING_ARRAYS, RANGE_MISSING_BOUNDS,
};
pub use range::{RangeBounds, RangeFilter};

/// Subquery alias used when wrapping a query in category filters.
pub const CATEGORY_FILTER_ALIAS: &str = "_cdb_category_filter";

/// Subquery alias used when wrapping a query in range filters.
pub const RANGE_FILTER_ALIAS: &str = "_cdb_range_filter";

/// Kind of filter a widget accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Category,
    Range,
}

impl FilterKind {
    /// Subquery alias for this kind.
    pub fn alias(&self) -> &'static str {
        match self {
            FilterKind::Category => CATEGORY_FILTER_ALIAS,
            FilterKind::Range => RANGE_FILTER_ALIAS,
        }
    }
}

/// A compiled widget filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Category(CategoryFilter),
    Range(RangeFilter),
}

impl Filter {
    /// Compiles filter arguments for a given kind and column.
    pub fn compile(kind: FilterKind, column: &str, args: &Value) -> Result<Self, FilterError> {
        match kind {
            FilterKind::Category => CategoryFilter::from_args(column, args).map(Filter::Category),
            FilterKind::Range => RangeFilter::from_args(column, args).map(Filter::Range),
        }
    }

    /// The filter kind.
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Category(_) => FilterKind::Category,
            Filter::Range(_) => FilterKind::Range,
        }
    }

    /// The filtered column.
    pub fn column(&self) -> &str {
        match self {
            Filter::Category(f) => f.column(),
            Filter::Range(f) => f.column(),
        }
    }

    /// Boolean SQL condition, without the `WHERE` keyword.
    pub fn condition(&self) -> String {
        match self {
            Filter::Category(f) => f.condition(),
            Filter::Range(f) => f.condition(),
        }
    }

    /// Wraps `sql` so that only rows matching this filter remain.
    pub fn wrap(&self, sql: &str) -> String {
        wrap_query(sql, self.kind().alias(), &[self.condition()])
    }
}

/// SQL literal for a JSON number.
///
/// Floats with no fractional part are written as integers (`100`, not
/// `100.0`).
pub(crate) fn number_to_sql(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

fn wrap_query(sql: &str, alias: &str, conditions: &[String]) -> String {
    format!(
        "SELECT * FROM ({}) {} WHERE {}",
        sql,
        alias,
        conditions.join(" AND ")
    )
}

/// Active filters for one layer, keyed by widget id.
///
/// Produced by [`MapConfig::set_filters_params`](crate::mapconfig::MapConfig::set_filters_params)
/// and handed to [`WidgetRef::sql`](crate::mapconfig::WidgetRef::sql).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerFilters {
    filters: BTreeMap<String, Filter>,
}

impl LayerFilters {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the filter of a widget.
    pub fn insert(&mut self, widget_id: impl Into<String>, filter: Filter) {
        self.filters.insert(widget_id.into(), filter);
    }

    /// Filter attached to a widget, if any.
    pub fn get(&self, widget_id: &str) -> Option<&Filter> {
        self.filters.get(widget_id)
    }

    /// Number of filtered widgets.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no widget is filtered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates `(widget_id, filter)` pairs in widget id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.filters.iter().map(|(id, f)| (id.as_str(), f))
    }

    /// Applies every filter to a layer query.
    ///
    /// Category conditions are combined into one `_cdb_category_filter`
    /// wrapper, then range conditions into an outer `_cdb_range_filter`
    /// wrapper. Kinds without filters add no wrapper.
    pub fn apply(&self, sql: &str) -> String {
        let mut query = sql.to_string();
        for kind in [FilterKind::Category, FilterKind::Range] {
            let conditions: Vec<String> = self
                .filters
                .values()
                .filter(|f| f.kind() == kind)
                .map(Filter::condition)
                .collect();

            if !conditions.is_empty() {
                query = wrap_query(&query, kind.alias(), &conditions);
            }
        }
        query
    }
}

/// Per-request filter parameters.
///
/// `layers[i]` maps widget ids of layer `i` to their raw filter arguments.
/// Arguments stay untyped JSON so malformed input is reported as a filter
/// error naming the problem rather than as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub layers: Vec<BTreeMap<String, Value>>,
}

impl FilterParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses parameters from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds arguments for a widget, growing the layer list as needed.
    pub fn with_widget(mut self, layer: usize, widget_id: impl Into<String>, args: Value) -> Self {
        if self.layers.len() <= layer {
            self.layers.resize_with(layer + 1, BTreeMap::new);
        }
        self.layers[layer].insert(widget_id.into(), args);
        self
    }

    /// Iterates `(layer_index, widget_id, args)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &Value)> {
        self.layers.iter().enumerate().flat_map(|(layer, widgets)| {
            widgets
                .iter()
                .map(move |(id, args)| (layer, id.as_str(), args))
        })
    }

    /// Returns `true` if no widget arguments are present.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(BTreeMap::is_empty)
    }
}
