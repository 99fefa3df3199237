//! Error types for filter compilation.

use thiserror::Error;

/// Message for a category filter without `accept` or `reject`.
pub const CATEGORY_MISSING_ARRAYS: &str =
    "Category filter expects at least one array in accept or reject params";

/// Message for a category filter with an empty `accept` or `reject`.
pub const CATEGORY_EMPTY_ARRAYS: &str =
    "Category filter expects to have at least one value in accept or reject arrays";

/// Message for a range filter without a numeric `min` or `max`.
pub const RANGE_MISSING_BOUNDS: &str =
    "Range filter expect to have at least one value in min or max numeric params";

/// Errors raised while applying filter parameters to a map configuration.
///
/// All of these are caller input errors. They are raised before the
/// configuration is touched, so a failed call leaves it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Filter arguments are missing or malformed.
    ///
    /// The message is meant to be shown to the caller verbatim.
    #[error("{0}")]
    InvalidFilterArgs(String),

    /// No widget with this id exists on the layer.
    #[error("Widget '{widget}' not found in layer {layer}")]
    UnknownWidget { layer: usize, widget: String },

    /// The layer index does not exist in the configuration.
    #[error("Layer {0} not found")]
    UnknownLayer(usize),
}

impl FilterError {
    pub(crate) fn invalid(message: &str) -> Self {
        FilterError::InvalidFilterArgs(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_args_message_is_verbatim() {
        let err = FilterError::invalid(CATEGORY_MISSING_ARRAYS);
        assert_eq!(err.to_string(), CATEGORY_MISSING_ARRAYS);
    }

    #[test]
    fn test_unknown_widget_display() {
        let err = FilterError::UnknownWidget {
            layer: 2,
            widget: "country".to_string(),
        };
        assert_eq!(err.to_string(), "Widget 'country' not found in layer 2");
    }

    #[test]
    fn test_unknown_layer_display() {
        assert_eq!(FilterError::UnknownLayer(7).to_string(), "Layer 7 not found");
    }
}
