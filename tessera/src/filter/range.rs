//! Range filters (numeric min/max bounds).

use serde_json::{Number, Value};

use super::error::{FilterError, RANGE_MISSING_BOUNDS};
use super::number_to_sql;

/// Bounds of a range filter; at least one is always present.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeBounds {
    Min(Number),
    Max(Number),
    Both(Number, Number),
}

/// Restricts rows to a numeric interval on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    column: String,
    bounds: RangeBounds,
}

impl RangeFilter {
    /// Builds a range filter from widget arguments.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidFilterArgs` unless at least one of `min`
    /// and `max` is a number. A bound that is present but not numeric is
    /// rejected with the same message.
    pub fn from_args(column: &str, args: &Value) -> Result<Self, FilterError> {
        let bounds = match (bound(args, "min")?, bound(args, "max")?) {
            (Some(min), Some(max)) => RangeBounds::Both(min, max),
            (Some(min), None) => RangeBounds::Min(min),
            (None, Some(max)) => RangeBounds::Max(max),
            (None, None) => return Err(FilterError::invalid(RANGE_MISSING_BOUNDS)),
        };

        Ok(Self {
            column: column.to_string(),
            bounds,
        })
    }

    /// The filtered column.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn bounds(&self) -> &RangeBounds {
        &self.bounds
    }

    /// Boolean SQL condition, without the `WHERE` keyword.
    pub fn condition(&self) -> String {
        match &self.bounds {
            RangeBounds::Both(min, max) => format!(
                "{} BETWEEN {} AND {}",
                self.column,
                number_to_sql(min),
                number_to_sql(max)
            ),
            RangeBounds::Min(min) => format!("{} > {}", self.column, number_to_sql(min)),
            RangeBounds::Max(max) => format!("{} < {}", self.column, number_to_sql(max)),
        }
    }
}

// serde_json numbers are always finite, so any Number is a usable bound
fn bound(args: &Value, name: &str) -> Result<Option<Number>, FilterError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(FilterError::invalid(RANGE_MISSING_BOUNDS)),
    }
}
