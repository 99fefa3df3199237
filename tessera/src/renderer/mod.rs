//! Renderer contracts and multi-layer rendering.
//!
//! A [`Renderer`] turns a tile coordinate into a [`RenderResult`]. Concrete
//! per-layer renderers come from an external [`RendererProvider`]. This
//! module adds what sits on top of them:
//!
//! - [`select_layers`] - resolves the `layer` request parameter
//! - [`TileErrorPolicy`] / [`PolicyRenderer`] - per-layer-type failure
//!   substitution
//! - [`TimeoutRenderer`] - enforces the render timeout of a request
//! - [`BlendDispatcher`] - acquires the renderers needed for a request
//! - [`CompositeRenderer`] - renders all layers concurrently and merges them
//!
//! ```text
//! ┌──────────────────┐   plan + acquire    ┌────────────────────┐
//! │ BlendDispatcher  │ ──────────────────▶ │ RendererProvider   │ (external)
//! └────────┬─────────┘                     └────────────────────┘
//!          │ PolicyRenderer per layer
//!          ▼
//! ┌──────────────────┐    join_all     ┌──────────┐
//! │ CompositeRenderer│ ──────────────▶ │ Renderer │ × N
//! └────────┬─────────┘                 └──────────┘
//!          │ merge in layer order
//!          ▼
//!   ImageCompositor
//! ```

mod composite;
mod dispatch;
mod error;
mod layers;
mod limits;
mod policy;
mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::coord::TileCoord;
use crate::mapconfig::MapConfig;

pub use composite::CompositeRenderer;
pub use dispatch::{BlendDispatcher, BlendRequest, LayerDispatch, BLEND_NAME};
pub use error::{RenderError, RenderErrorKind};
pub use layers::select_layers;
pub use limits::TimeoutRenderer;
pub use policy::{PolicyDecision, PolicyRenderer, TileErrorPolicy};
pub use types::{
    Headers, RenderLimits, RenderParams, RenderResult, RenderStats, RendererOptions, TileBody,
    CONTENT_TYPE, CONTENT_TYPE_JSON, CONTENT_TYPE_PNG,
};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Renders tiles.
///
/// Implementations must be `Send + Sync` so a single renderer can serve
/// concurrent tile requests.
pub trait Renderer: Send + Sync {
    /// Render the tile at `coord`.
    fn get_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>>;
}

/// Supplies concrete per-layer renderers.
///
/// This is the seam to the rendering engines (CartoCSS, HTTP tiles,
/// aggregation tiles...). `params` carries the request parameters with the
/// `layer` entry set to the layer (or comma-joined layers) to render.
pub trait RendererProvider: Send + Sync {
    /// Acquire a renderer for the given layer selection.
    fn get_renderer<'a>(
        &'a self,
        config: &'a MapConfig,
        params: &'a RenderParams,
        options: RendererOptions,
    ) -> BoxFuture<'a, Result<Arc<dyn Renderer>, RenderError>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles shared by the renderer tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    /// Renderer returning a fixed result after an optional delay.
    pub struct MockRenderer {
        pub result: Result<RenderResult, RenderError>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl MockRenderer {
        pub fn ok(result: RenderResult) -> Self {
            Self {
                result: Ok(result),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn image(bytes: Bytes) -> Self {
            Self::ok(RenderResult::image(bytes))
        }

        pub fn failing(err: RenderError) -> Self {
            Self {
                result: Err(err),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl Renderer for MockRenderer {
        fn get_tile(&self, _coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                self.result.clone()
            })
        }
    }

    /// Provider recording every request and handing out image renderers.
    #[derive(Default)]
    pub struct RecordingProvider {
        pub requests: Mutex<Vec<(RenderParams, RendererOptions)>>,
        pub fail_for_layer: Option<String>,
    }

    impl RendererProvider for RecordingProvider {
        fn get_renderer<'a>(
            &'a self,
            _config: &'a MapConfig,
            params: &'a RenderParams,
            options: RendererOptions,
        ) -> BoxFuture<'a, Result<Arc<dyn Renderer>, RenderError>> {
            Box::pin(async move {
                self.requests
                    .lock()
                    .unwrap()
                    .push((params.clone(), options.clone()));

                if self.fail_for_layer.as_deref() == params.layer() {
                    return Err(RenderError::upstream("provider failure"));
                }

                let renderer: Arc<dyn Renderer> =
                    Arc::new(MockRenderer::image(Bytes::from_static(b"tile")));
                Ok(renderer)
            })
        }
    }
}
