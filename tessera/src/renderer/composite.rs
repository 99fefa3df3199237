//! Composite renderer merging several layer renderers into one tile.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::future::join_all;

use super::{
    BoxFuture, Headers, RenderError, RenderResult, RenderStats, Renderer, TileBody, CONTENT_TYPE,
    CONTENT_TYPE_PNG,
};
use crate::compositor::{CompositeError, ImageCompositor};
use crate::coord::TileCoord;

/// Renders every layer concurrently and merges the images in layer order.
///
/// Any layer failure fails the tile; there is no partial compositing.
pub struct CompositeRenderer {
    renderers: Vec<Arc<dyn Renderer>>,
    compositor: Arc<dyn ImageCompositor>,
}

impl CompositeRenderer {
    /// Creates a composite over renderers given in layer order.
    pub fn new(renderers: Vec<Arc<dyn Renderer>>, compositor: Arc<dyn ImageCompositor>) -> Self {
        Self {
            renderers,
            compositor,
        }
    }

    /// Number of layer renderers.
    pub fn layer_count(&self) -> usize {
        self.renderers.len()
    }

    fn merge(&self, layers: Vec<RenderResult>) -> Result<RenderResult, RenderError> {
        let started = Instant::now();
        let mut headers = Headers::new();
        let mut stats = RenderStats::new();
        let mut images: Vec<Bytes> = Vec::with_capacity(layers.len());

        for layer in layers {
            headers.extend(layer.headers);
            stats.merge(&layer.stats);
            match layer.body {
                TileBody::Image(bytes) => images.push(bytes),
                TileBody::Empty => {}
                TileBody::Rows(_) => return Err(CompositeError::NotAnImage.into()),
            }
        }

        let body = if images.is_empty() {
            self.compositor.blank_tile()
        } else {
            self.compositor.merge(&images)?
        };

        headers.insert(CONTENT_TYPE.to_string(), CONTENT_TYPE_PNG.to_string());
        stats.insert("layers", images.len() as f64);
        stats.record_duration("composite", started.elapsed());

        Ok(RenderResult {
            body: TileBody::Image(body),
            headers,
            stats,
        })
    }
}

impl Renderer for CompositeRenderer {
    fn get_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<RenderResult, RenderError>> {
        Box::pin(async move {
            let results = join_all(self.renderers.iter().map(|r| r.get_tile(coord))).await;

            // first failure in layer order wins
            let layers = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            self.merge(layers)
        })
    }
}
