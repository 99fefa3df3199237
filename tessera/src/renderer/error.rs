//! Error types for rendering.

use thiserror::Error;

use crate::compositor::CompositeError;

/// Broad class of an upstream render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    /// The upstream did not answer in time.
    Timeout,
    /// Any other upstream failure.
    Other,
}

/// Errors that can occur while acquiring renderers or rendering tiles.
///
/// None of these are retried. A failure in any layer of a composite
/// request fails the whole request unless the layer's
/// [`TileErrorPolicy`](super::TileErrorPolicy) substitutes a blank tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Layer selection or dispatch left nothing to render.
    #[error("No renderers")]
    NoRenderableLayers,

    /// The `layer` parameter references layers that do not exist or is malformed.
    #[error("Invalid layer filtering: {0}")]
    UnknownLayer(String),

    /// The requested output format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The query execution backend failed. The message carries the
    /// component prefix.
    #[error("{0}")]
    UpstreamQuery(String),

    /// A per-layer renderer or the renderer provider failed.
    #[error("{message}")]
    UpstreamRender {
        kind: RenderErrorKind,
        message: String,
    },

    /// Layer outputs could not be merged.
    #[error("Compositing failed: {0}")]
    Composite(#[from] CompositeError),
}

impl RenderError {
    /// Upstream render failure of the general kind.
    pub fn upstream(message: impl Into<String>) -> Self {
        RenderError::UpstreamRender {
            kind: RenderErrorKind::Other,
            message: message.into(),
        }
    }

    /// Upstream render timeout.
    pub fn timeout(message: impl Into<String>) -> Self {
        RenderError::UpstreamRender {
            kind: RenderErrorKind::Timeout,
            message: message.into(),
        }
    }

    /// Returns `true` for timeout-class failures.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            RenderError::UpstreamRender {
                kind: RenderErrorKind::Timeout,
                ..
            }
        )
    }
}
