//! Render time limits.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{BoxFuture, RenderError, RenderResult, Renderer};
use crate::coord::TileCoord;

/// Fails a render that does not finish within a deadline.
///
/// The failure is a timeout-class [`RenderError`], so tile error policies
/// treat it like a timeout reported by the renderer itself.
pub struct TimeoutRenderer {
    inner: Arc<dyn Renderer>,
    timeout: Duration,
}

impl TimeoutRenderer {
    pub fn new(inner: Arc<dyn Renderer>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Renderer for TimeoutRenderer {
    fn get_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.inner.get_tile(coord)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(
                        tile = %coord,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Render timed out"
                    );
                    Err(RenderError::timeout(format!(
                        "Render timed out after {}ms",
                        self.timeout.as_millis()
                    )))
                }
            }
        })
    }
}
