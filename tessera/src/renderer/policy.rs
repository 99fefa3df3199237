//! Per-layer-type tile failure policies.
//!
//! Some layer types can lose a tile without failing the whole composite.
//! Their renderers are wrapped in a [`PolicyRenderer`] that swaps selected
//! failures for a transparent placeholder tile.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use regex::Regex;
use tracing::warn;

use super::{BoxFuture, RenderError, RenderResult, Renderer};
use crate::coord::TileCoord;
use crate::mapconfig::LayerType;

/// How a layer's render failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TileErrorPolicy {
    /// Substitute a blank tile for "coordinates out of range" failures;
    /// propagate everything else.
    #[default]
    Default,
    /// Propagate timeouts; substitute a blank tile for every other failure.
    TimeoutTolerant,
}

/// Outcome of applying a policy to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Propagate,
    Substitute,
}

/// Layer types with a non-default policy.
const POLICY_TABLE: &[(LayerType, TileErrorPolicy)] =
    &[(LayerType::Http, TileErrorPolicy::TimeoutTolerant)];

fn out_of_range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)coordinates out of range").unwrap())
}

impl TileErrorPolicy {
    /// Policy registered for a layer type.
    pub fn for_layer(layer_type: LayerType) -> Self {
        POLICY_TABLE
            .iter()
            .find(|(t, _)| *t == layer_type)
            .map(|(_, policy)| *policy)
            .unwrap_or_default()
    }

    /// Decides what to do with a failure.
    pub fn decide(&self, err: &RenderError) -> PolicyDecision {
        let substitute = match self {
            TileErrorPolicy::Default => out_of_range_pattern().is_match(&err.to_string()),
            TileErrorPolicy::TimeoutTolerant => !err.is_timeout(),
        };

        if substitute {
            PolicyDecision::Substitute
        } else {
            PolicyDecision::Propagate
        }
    }

    /// Applies the policy to a render outcome.
    ///
    /// Successes pass through. Substituted failures become `blank` with a
    /// `Content-Type: image/png` header.
    pub fn apply(
        &self,
        result: Result<RenderResult, RenderError>,
        blank: &Bytes,
    ) -> Result<RenderResult, RenderError> {
        match result {
            Ok(tile) => Ok(tile),
            Err(err) => match self.decide(&err) {
                PolicyDecision::Substitute => {
                    warn!(policy = ?self, error = %err, "Substituting blank tile");
                    Ok(RenderResult::image(blank.clone()))
                }
                PolicyDecision::Propagate => Err(err),
            },
        }
    }
}

/// Renderer wrapper applying a [`TileErrorPolicy`] to every tile.
pub struct PolicyRenderer {
    inner: Arc<dyn Renderer>,
    policy: TileErrorPolicy,
    blank: Bytes,
}

impl PolicyRenderer {
    /// Wraps `inner`; `blank` is served for substituted failures.
    pub fn new(inner: Arc<dyn Renderer>, policy: TileErrorPolicy, blank: Bytes) -> Self {
        Self {
            inner,
            policy,
            blank,
        }
    }

    /// The wrapped policy.
    pub fn policy(&self) -> TileErrorPolicy {
        self.policy
    }
}

impl Renderer for PolicyRenderer {
    fn get_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>> {
        Box::pin(async move {
            let result = self.inner.get_tile(coord).await;
            self.policy.apply(result, &self.blank)
        })
    }
}
