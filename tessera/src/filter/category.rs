//! Category filters (accept/reject value sets).

use serde_json::{Number, Value};

use super::error::{FilterError, CATEGORY_EMPTY_ARRAYS, CATEGORY_MISSING_ARRAYS};
use super::number_to_sql;

/// A single value in an accept or reject set.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryValue {
    Text(String),
    Number(Number),
}

impl CategoryValue {
    fn from_json(value: &Value) -> Result<Self, FilterError> {
        match value {
            Value::String(s) => Ok(CategoryValue::Text(s.clone())),
            Value::Number(n) => Ok(CategoryValue::Number(n.clone())),
            other => Err(FilterError::InvalidFilterArgs(format!(
                "Category filter values must be strings or numbers, got {}",
                other
            ))),
        }
    }

    /// SQL literal for this value. Text is single-quoted with quotes doubled.
    pub fn to_sql(&self) -> String {
        match self {
            CategoryValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            CategoryValue::Number(n) => number_to_sql(n),
        }
    }
}

/// Restricts rows to (or away from) a set of column values.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFilter {
    column: String,
    accept: Option<Vec<CategoryValue>>,
    reject: Option<Vec<CategoryValue>>,
}

impl CategoryFilter {
    /// Builds a category filter from widget arguments.
    ///
    /// `args` is expected to hold an `accept` and/or a `reject` array.
    /// Anything that is not an array counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidFilterArgs` when neither array is present,
    /// when a present array is empty, or when a value is not a string or number.
    pub fn from_args(column: &str, args: &Value) -> Result<Self, FilterError> {
        let accept = args.get("accept").and_then(Value::as_array);
        let reject = args.get("reject").and_then(Value::as_array);

        if accept.is_none() && reject.is_none() {
            return Err(FilterError::invalid(CATEGORY_MISSING_ARRAYS));
        }

        let is_empty = |values: Option<&Vec<Value>>| values.is_some_and(|v| v.is_empty());
        if is_empty(accept) || is_empty(reject) {
            return Err(FilterError::invalid(CATEGORY_EMPTY_ARRAYS));
        }

        Ok(Self {
            column: column.to_string(),
            accept: accept.map(|v| parse_values(v)).transpose()?,
            reject: reject.map(|v| parse_values(v)).transpose()?,
        })
    }

    /// The filtered column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Boolean SQL condition, without the `WHERE` keyword.
    pub fn condition(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(accept) = &self.accept {
            parts.push(format!("{} IN ({})", self.column, value_list(accept)));
        }
        if let Some(reject) = &self.reject {
            parts.push(format!("{} NOT IN ({})", self.column, value_list(reject)));
        }
        parts.join(" AND ")
    }
}

fn parse_values(values: &[Value]) -> Result<Vec<CategoryValue>, FilterError> {
    values.iter().map(CategoryValue::from_json).collect()
}

fn value_list(values: &[CategoryValue]) -> String {
    values
        .iter()
        .map(CategoryValue::to_sql)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accept_only() {
        let filter = CategoryFilter::from_args("adm0name", &json!({"accept": ["Spain"]})).unwrap();
        assert_eq!(filter.condition(), "adm0name IN ('Spain')");
    }

    #[test]
    fn test_reject_only() {
        let filter = CategoryFilter::from_args("adm0name", &json!({"reject": ["Spain"]})).unwrap();
        assert_eq!(filter.condition(), "adm0name NOT IN ('Spain')");
    }

    #[test]
    fn test_accept_and_reject() {
        let filter = CategoryFilter::from_args(
            "adm0name",
            &json!({"reject": ["Spain"], "accept": ["USA"]}),
        )
        .unwrap();
        assert_eq!(
            filter.condition(),
            "adm0name IN ('USA') AND adm0name NOT IN ('Spain')"
        );
    }

    #[test]
    fn test_multiple_values_and_numbers() {
        let filter =
            CategoryFilter::from_args("code", &json!({"accept": ["a", 3, 4.5]})).unwrap();
        assert_eq!(filter.condition(), "code IN ('a',3,4.5)");
    }

    #[test]
    fn test_integral_float_values() {
        let filter = CategoryFilter::from_args("code", &json!({"reject": [2.0, -1e1]})).unwrap();
        assert_eq!(filter.condition(), "code NOT IN (2,-10)");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filter =
            CategoryFilter::from_args("name", &json!({"accept": ["Côte d'Ivoire"]})).unwrap();
        assert_eq!(filter.condition(), "name IN ('Côte d''Ivoire')");
    }

    #[test]
    fn test_missing_arrays() {
        let err = CategoryFilter::from_args("c", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_MISSING_ARRAYS);
    }

    #[test]
    fn test_non_array_counts_as_missing() {
        let err = CategoryFilter::from_args("c", &json!({"accept": "Spain"})).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_MISSING_ARRAYS);
    }

    #[test]
    fn test_empty_accept() {
        let err = CategoryFilter::from_args("c", &json!({"accept": []})).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_EMPTY_ARRAYS);
    }

    #[test]
    fn test_empty_reject_with_valid_accept() {
        let err =
            CategoryFilter::from_args("c", &json!({"accept": ["a"], "reject": []})).unwrap_err();
        assert_eq!(err.to_string(), CATEGORY_EMPTY_ARRAYS);
    }

    #[test]
    fn test_rejects_object_values() {
        let err = CategoryFilter::from_args("c", &json!({"accept": [{"a": 1}]})).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterArgs(_)));
    }
}
