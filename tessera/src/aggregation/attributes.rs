//! Aggregation layer attributes and derived metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_resolution() -> f64 {
    1.0
}

fn default_countby() -> String {
    "count(cartodb_id)".to_string()
}

/// Time-bucketing attributes of an aggregation layer.
///
/// Deserialized from the layer's attribute object; camelCase keys
/// (`stepSelect`, `stepOffset`) are accepted as written by clients. Keys
/// not listed here are kept in `extra` and are still available to tile
/// templates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregationAttributes {
    /// Column the steps are computed from.
    pub column: String,
    /// Whether `column` is a timestamp (converted to epoch seconds).
    #[serde(default)]
    pub is_time: bool,
    pub start: f64,
    pub end: f64,
    /// Width of a step in column units.
    pub step: f64,
    pub steps: f64,
    #[serde(default)]
    pub data_steps: f64,
    /// Aggregation cell size in pixels.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Aggregate expression per cell.
    #[serde(default = "default_countby")]
    pub countby: String,
    /// Selected step; restricts tiles to a step window when set.
    #[serde(default, rename = "stepSelect")]
    pub step_select: Option<f64>,
    /// Number of steps ending at `step_select` to include.
    #[serde(default, rename = "stepOffset")]
    pub step_offset: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AggregationAttributes {
    /// Attributes for a column with the given range and step count.
    pub fn new(column: impl Into<String>, start: f64, end: f64, steps: f64) -> Self {
        let step = if steps > 0.0 {
            (end - start) / steps
        } else {
            0.0
        };
        Self {
            column: column.into(),
            is_time: false,
            start,
            end,
            step,
            steps,
            data_steps: steps,
            resolution: default_resolution(),
            countby: default_countby(),
            step_select: None,
            step_offset: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_time(mut self, is_time: bool) -> Self {
        self.is_time = is_time;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_step_select(mut self, step_select: f64, step_offset: Option<f64>) -> Self {
        self.step_select = Some(step_select);
        self.step_offset = step_offset;
        self
    }

    /// Column expression used in step arithmetic.
    pub fn column_conv(&self) -> String {
        if self.is_time {
            format!("date_part('epoch', {})", self.column)
        } else {
            self.column.clone()
        }
    }

    /// Placeholder values contributed by the attributes.
    ///
    /// Unset optional attributes are omitted so their placeholders stay
    /// unexpanded.
    pub(crate) fn template_values(&self) -> Vec<(String, String)> {
        let mut values: Vec<(String, String)> = self
            .extra
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect();

        values.extend([
            ("column".to_string(), self.column.clone()),
            ("is_time".to_string(), self.is_time.to_string()),
            ("start".to_string(), self.start.to_string()),
            ("end".to_string(), self.end.to_string()),
            ("step".to_string(), self.step.to_string()),
            ("steps".to_string(), self.steps.to_string()),
            ("data_steps".to_string(), self.data_steps.to_string()),
            ("resolution".to_string(), self.resolution.to_string()),
            ("countby".to_string(), self.countby.clone()),
        ]);

        if let Some(step_select) = self.step_select {
            values.push(("stepSelect".to_string(), step_select.to_string()));
        }
        if let Some(step_offset) = self.step_offset {
            values.push(("stepOffset".to_string(), step_offset.to_string()));
        }
        values
    }

    /// Display metadata derived from the attributes.
    pub fn metadata(&self) -> AggregationMetadata {
        AggregationMetadata {
            start: self.start * 1000.0,
            end: self.end * 1000.0,
            steps: self.steps,
            data_steps: self.data_steps.trunc() as i64,
            column_type: if self.is_time {
                ColumnType::Date
            } else {
                ColumnType::Number
            },
        }
    }
}

/// Kind of values in the stepped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Number,
}

/// Metadata reported to clients of an aggregation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationMetadata {
    /// Range start in milliseconds.
    pub start: f64,
    /// Range end in milliseconds.
    pub end: f64,
    pub steps: f64,
    pub data_steps: i64,
    pub column_type: ColumnType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_client_attributes() {
        let attrs: AggregationAttributes = serde_json::from_value(json!({
            "column": "date",
            "is_time": true,
            "start": 1000,
            "end": 2000,
            "step": 10,
            "steps": 100,
            "data_steps": 80.7,
            "resolution": 2,
            "countby": "count(cartodb_id)",
            "stepSelect": 3,
            "stepOffset": 2,
            "animationDuration": 30
        }))
        .unwrap();

        assert_eq!(attrs.column, "date");
        assert!(attrs.is_time);
        assert_eq!(attrs.step_select, Some(3.0));
        assert_eq!(attrs.step_offset, Some(2.0));
        assert_eq!(attrs.extra.get("animationDuration"), Some(&json!(30)));
    }

    #[test]
    fn test_defaults() {
        let attrs: AggregationAttributes = serde_json::from_value(json!({
            "column": "n", "start": 0, "end": 10, "step": 1, "steps": 10
        }))
        .unwrap();

        assert!(!attrs.is_time);
        assert_eq!(attrs.resolution, 1.0);
        assert_eq!(attrs.countby, "count(cartodb_id)");
        assert_eq!(attrs.step_select, None);
    }

    #[test]
    fn test_column_conv() {
        let attrs = AggregationAttributes::new("created_at", 0.0, 10.0, 10.0);
        assert_eq!(attrs.column_conv(), "created_at");
        assert_eq!(
            attrs.with_time(true).column_conv(),
            "date_part('epoch', created_at)"
        );
    }

    #[test]
    fn test_metadata() {
        let mut attrs = AggregationAttributes::new("date", 1.5, 20.0, 512.0).with_time(true);
        attrs.data_steps = 97.9;

        let meta = attrs.metadata();
        assert_eq!(meta.start, 1500.0);
        assert_eq!(meta.end, 20000.0);
        assert_eq!(meta.steps, 512.0);
        assert_eq!(meta.data_steps, 97);
        assert_eq!(meta.column_type, ColumnType::Date);
    }

    #[test]
    fn test_metadata_serializes_column_type() {
        let meta = AggregationAttributes::new("n", 0.0, 1.0, 1.0).metadata();
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["column_type"], "number");
    }

    #[test]
    fn test_template_values_omit_unset_step_select() {
        let values = AggregationAttributes::new("n", 0.0, 1.0, 1.0).template_values();
        assert!(values.iter().all(|(name, _)| name != "stepSelect"));
        assert!(values.iter().any(|(name, v)| name == "start" && v == "0"));
    }
}
