//! Widgets and the queries they produce.

use serde::Deserialize;

use crate::filter::{FilterKind, LayerFilters};

/// Outer alias of aggregation widget queries.
pub const AGGREGATION_ALIAS: &str = "_cdb_aggregation";

/// Outer alias of histogram widget queries.
pub const HISTOGRAM_ALIAS: &str = "_cdb_histogram";

/// Outer alias of formula widget queries.
pub const FORMULA_ALIAS: &str = "_cdb_formula";

/// Outer alias of list widget queries.
pub const LIST_ALIAS: &str = "_cdb_list";

const AGGREGATION_FUNCTIONS: [&str; 5] = ["count", "sum", "avg", "min", "max"];

/// Widget variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    /// Category counts; filtered with accept/reject sets.
    Aggregation,
    /// Numeric distribution; filtered with min/max bounds.
    Histogram,
    /// Single aggregate value.
    Formula,
    /// Raw rows for a set of columns.
    List,
}

impl WidgetType {
    /// Filter kind accepted by this widget, if it can be filtered.
    pub fn filter_kind(&self) -> Option<FilterKind> {
        match self {
            WidgetType::Aggregation => Some(FilterKind::Category),
            WidgetType::Histogram => Some(FilterKind::Range),
            WidgetType::Formula | WidgetType::List => None,
        }
    }
}

/// Widget options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    /// Column the widget (and its filter) works on.
    #[serde(default)]
    pub column: Option<String>,

    /// Aggregation function for aggregation widgets (`count` by default).
    #[serde(default)]
    pub aggregation: Option<String>,

    /// Column aggregated by non-count aggregation functions.
    #[serde(default)]
    pub aggregation_column: Option<String>,

    /// Operation for formula widgets (`count` by default).
    #[serde(default)]
    pub operation: Option<String>,

    /// Columns returned by list widgets.
    #[serde(default)]
    pub columns: Vec<String>,
}

/// A widget declared on a layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Widget {
    #[serde(rename = "type")]
    pub widget_type: WidgetType,

    #[serde(default)]
    pub options: WidgetOptions,
}

impl Widget {
    /// The widget column, or an empty string when none is declared.
    pub fn column(&self) -> &str {
        self.options.column.as_deref().unwrap_or_default()
    }

    /// Checks the options required by the widget type.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let needs_column = match self.widget_type {
            WidgetType::Aggregation | WidgetType::Histogram => true,
            WidgetType::Formula => self.operation() != "count",
            WidgetType::List => false,
        };
        if needs_column && self.options.column.is_none() {
            return Err("missing 'column' option".to_string());
        }

        match self.widget_type {
            WidgetType::Aggregation if !AGGREGATION_FUNCTIONS.contains(&self.aggregation()) => {
                Err(format!("unsupported aggregation '{}'", self.aggregation()))
            }
            WidgetType::Formula if !AGGREGATION_FUNCTIONS.contains(&self.operation()) => {
                Err(format!("unsupported operation '{}'", self.operation()))
            }
            WidgetType::List if self.options.columns.is_empty() => {
                Err("missing 'columns' option".to_string())
            }
            _ => Ok(()),
        }
    }

    fn aggregation(&self) -> &str {
        self.options.aggregation.as_deref().unwrap_or("count")
    }

    fn operation(&self) -> &str {
        self.options.operation.as_deref().unwrap_or("count")
    }

    /// Builds the widget query over `base_sql`.
    pub fn query(&self, base_sql: &str) -> String {
        let column = self.column();
        match self.widget_type {
            WidgetType::Aggregation => {
                let aggregation = self.aggregation();
                if aggregation == "count" {
                    format!(
                        "SELECT count(*) AS count, {column} FROM ({base_sql}) {AGGREGATION_ALIAS} \
                         GROUP BY {column} ORDER BY count DESC"
                    )
                } else {
                    let target = self.options.aggregation_column.as_deref().unwrap_or(column);
                    format!(
                        "SELECT {aggregation}({target}) AS value, {column} FROM ({base_sql}) \
                         {AGGREGATION_ALIAS} GROUP BY {column} ORDER BY value DESC"
                    )
                }
            }
            WidgetType::Histogram => format!(
                "SELECT min({column}) AS min, max({column}) AS max, avg({column}) AS avg, \
                 count(*) AS freq FROM ({base_sql}) {HISTOGRAM_ALIAS}"
            ),
            WidgetType::Formula => {
                let expression = match self.operation() {
                    "count" => "count(*)".to_string(),
                    operation => format!("{operation}({column})"),
                };
                format!("SELECT {expression} AS result FROM ({base_sql}) {FORMULA_ALIAS}")
            }
            WidgetType::List => format!(
                "SELECT {} FROM ({base_sql}) {LIST_ALIAS}",
                self.options.columns.join(", ")
            ),
        }
    }
}

/// A widget bound to the original query of its layer.
///
/// Obtained from [`MapConfig::widget`](super::MapConfig::widget). The base
/// query is always the pristine layer query, whatever filters are active on
/// the configuration.
#[derive(Debug, Clone, Copy)]
pub struct WidgetRef<'a> {
    id: &'a str,
    widget: &'a Widget,
    base_sql: &'a str,
}

impl<'a> WidgetRef<'a> {
    pub(crate) fn new(id: &'a str, widget: &'a Widget, base_sql: &'a str) -> Self {
        Self {
            id,
            widget,
            base_sql,
        }
    }

    /// Widget id.
    pub fn id(&self) -> &'a str {
        self.id
    }

    /// Widget definition.
    pub fn widget(&self) -> &'a Widget {
        self.widget
    }

    /// Builds the widget query.
    ///
    /// Without filters, or when `filters` holds nothing for this widget, the
    /// query runs over the original layer query. Otherwise the layer query is
    /// first wrapped in this widget's own filter.
    pub fn sql(&self, filters: Option<&LayerFilters>) -> String {
        match filters.and_then(|f| f.get(self.id)) {
            Some(filter) => self.widget.query(&filter.wrap(self.base_sql)),
            None => self.widget.query(self.base_sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget(value: serde_json::Value) -> Widget {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_count_aggregation_query() {
        let w = widget(json!({"type": "aggregation", "options": {"aggregation": "count", "column": "adm0name"}}));
        assert_eq!(
            w.query("select * from t"),
            "SELECT count(*) AS count, adm0name FROM (select * from t) _cdb_aggregation \
             GROUP BY adm0name ORDER BY count DESC"
        );
    }

    #[test]
    fn test_sum_aggregation_query() {
        let w = widget(json!({
            "type": "aggregation",
            "options": {"aggregation": "sum", "column": "adm0name", "aggregationColumn": "pop_max"}
        }));
        assert_eq!(
            w.query("select * from t"),
            "SELECT sum(pop_max) AS value, adm0name FROM (select * from t) _cdb_aggregation \
             GROUP BY adm0name ORDER BY value DESC"
        );
    }

    #[test]
    fn test_histogram_query() {
        let w = widget(json!({"type": "histogram", "options": {"column": "pop_max"}}));
        assert_eq!(
            w.query("select * from t"),
            "SELECT min(pop_max) AS min, max(pop_max) AS max, avg(pop_max) AS avg, \
             count(*) AS freq FROM (select * from t) _cdb_histogram"
        );
    }

    #[test]
    fn test_formula_queries() {
        let count = widget(json!({"type": "formula", "options": {}}));
        assert_eq!(
            count.query("select 1"),
            "SELECT count(*) AS result FROM (select 1) _cdb_formula"
        );

        let avg = widget(json!({"type": "formula", "options": {"operation": "avg", "column": "x"}}));
        assert_eq!(
            avg.query("select 1"),
            "SELECT avg(x) AS result FROM (select 1) _cdb_formula"
        );
    }

    #[test]
    fn test_list_query() {
        let w = widget(json!({"type": "list", "options": {"columns": ["name", "pop"]}}));
        assert_eq!(w.query("select 1"), "SELECT name, pop FROM (select 1) _cdb_list");
    }

    #[test]
    fn test_filter_kinds() {
        assert_eq!(WidgetType::Aggregation.filter_kind(), Some(FilterKind::Category));
        assert_eq!(WidgetType::Histogram.filter_kind(), Some(FilterKind::Range));
        assert_eq!(WidgetType::Formula.filter_kind(), None);
        assert_eq!(WidgetType::List.filter_kind(), None);
    }

    #[test]
    fn test_validate() {
        assert!(widget(json!({"type": "histogram", "options": {"column": "x"}})).validate().is_ok());
        assert!(widget(json!({"type": "histogram"})).validate().is_err());
        assert!(widget(json!({"type": "aggregation", "options": {"column": "x", "aggregation": "median"}}))
            .validate()
            .is_err());
        assert!(widget(json!({"type": "list", "options": {}})).validate().is_err());
        assert!(widget(json!({"type": "formula"})).validate().is_ok());
        assert!(widget(json!({"type": "formula", "options": {"operation": "sum"}}))
            .validate()
            .is_err());
    }
}
