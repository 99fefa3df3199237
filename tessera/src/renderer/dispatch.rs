//! Blend dispatch: acquiring one renderer per layer of a request.
//!
//! Dispatch happens in two steps. [`BlendDispatcher::plan`] is a pure
//! function deciding, per selected layer, what to ask the provider for.
//! [`BlendDispatcher::get_renderer`] then acquires all renderers
//! concurrently and assembles a [`CompositeRenderer`].
//!
//! Mapnik layers share a single rendering engine, so only the first mapnik
//! layer of a selection is dispatched. It carries every selected mapnik
//! index (`layer = "0,2"`), and the remaining mapnik layers are skipped.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tracing::debug;

use super::composite::CompositeRenderer;
use super::layers::select_layers;
use super::limits::TimeoutRenderer;
use super::policy::{PolicyRenderer, TileErrorPolicy};
use super::{RenderError, RenderLimits, RenderParams, Renderer, RendererOptions, RendererProvider};
use crate::compositor::ImageCompositor;
use crate::mapconfig::{LayerType, MapConfig};

/// Name under which the blend dispatcher is registered.
pub const BLEND_NAME: &str = "blend";

/// Output format supported by blended tiles.
const SUPPORTED_FORMAT: &str = "png";

/// A blended tile request.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendRequest {
    /// Layer selector (`"all"`, `"mapnik"` or `"0,2"`).
    pub layer: String,
    /// Parameters shared by every layer.
    pub params: RenderParams,
    pub limits: RenderLimits,
    /// Requested output format.
    pub format: String,
}

impl BlendRequest {
    /// PNG request for a layer selector with no extra parameters.
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            params: RenderParams::new(),
            limits: RenderLimits::default(),
            format: SUPPORTED_FORMAT.to_string(),
        }
    }

    pub fn with_params(mut self, params: RenderParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_limits(mut self, limits: RenderLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// What to do for one selected layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerDispatch {
    /// Ask the provider for a renderer.
    Render {
        index: usize,
        params: RenderParams,
        options: RendererOptions,
    },
    /// Already covered by an earlier dispatch.
    Skip { index: usize },
}

impl LayerDispatch {
    /// Layer index this entry belongs to.
    pub fn index(&self) -> usize {
        match self {
            LayerDispatch::Render { index, .. } | LayerDispatch::Skip { index } => *index,
        }
    }
}

/// Acquires per-layer renderers and combines them into a composite.
pub struct BlendDispatcher {
    provider: Arc<dyn RendererProvider>,
    compositor: Arc<dyn ImageCompositor>,
}

impl BlendDispatcher {
    /// Creates a dispatcher over a renderer provider and image compositor.
    pub fn new(provider: Arc<dyn RendererProvider>, compositor: Arc<dyn ImageCompositor>) -> Self {
        Self {
            provider,
            compositor,
        }
    }

    /// Registered name of this dispatcher.
    pub fn name(&self) -> &'static str {
        BLEND_NAME
    }

    /// Returns `true` if tiles can be produced in `format`.
    pub fn supports_format(&self, format: &str) -> bool {
        format == SUPPORTED_FORMAT
    }

    /// Plans the dispatch of a request, one entry per selected layer.
    ///
    /// # Errors
    ///
    /// - `RenderError::UnknownLayer` if the selector is invalid
    /// - `RenderError::NoRenderableLayers` if the selection is empty
    pub fn plan(
        &self,
        config: &MapConfig,
        request: &BlendRequest,
    ) -> Result<Vec<LayerDispatch>, RenderError> {
        let selected = select_layers(config, &request.layer)?;
        if selected.is_empty() {
            return Err(RenderError::NoRenderableLayers);
        }

        let mapnik_layers: Vec<String> = selected
            .iter()
            .filter(|&&i| config.layer_type(i) == Some(LayerType::Mapnik))
            .map(|i| i.to_string())
            .collect();

        let mut mapnik_dispatched = false;
        let mut plan = Vec::with_capacity(selected.len());

        for index in selected {
            let Some(layer_type) = config.layer_type(index) else {
                return Err(RenderError::UnknownLayer(index.to_string()));
            };

            let layer_param = if layer_type == LayerType::Mapnik {
                if mapnik_dispatched {
                    plan.push(LayerDispatch::Skip { index });
                    continue;
                }
                mapnik_dispatched = true;
                mapnik_layers.join(",")
            } else {
                index.to_string()
            };

            plan.push(LayerDispatch::Render {
                index,
                params: request.params.clone().with("layer", layer_param),
                options: RendererOptions {
                    limits: request.limits.clone(),
                    policy: TileErrorPolicy::for_layer(layer_type),
                },
            });
        }

        Ok(plan)
    }

    /// Acquires the renderers of a request and combines them.
    ///
    /// Each renderer is bounded by the request's render timeout, if any,
    /// and wrapped in its layer's error policy. Acquisitions run
    /// concurrently. The first failing acquisition (in
    /// layer order) fails the whole dispatch.
    ///
    /// # Errors
    ///
    /// - `RenderError::UnsupportedFormat` for formats other than `png`
    /// - any error from [`plan`](Self::plan) or from the provider
    /// - `RenderError::NoRenderableLayers` if nothing was dispatched
    pub async fn get_renderer(
        &self,
        config: &MapConfig,
        request: &BlendRequest,
    ) -> Result<CompositeRenderer, RenderError> {
        if !self.supports_format(&request.format) {
            return Err(RenderError::UnsupportedFormat(request.format.clone()));
        }

        let plan = self.plan(config, request)?;
        let blank = self.compositor.blank_tile();

        let acquisitions = plan
            .iter()
            .map(|entry| self.acquire(config, entry, &blank));

        let mut renderers = Vec::with_capacity(plan.len());
        for acquired in join_all(acquisitions).await {
            if let Some(renderer) = acquired? {
                renderers.push(renderer);
            }
        }

        if renderers.is_empty() {
            return Err(RenderError::NoRenderableLayers);
        }

        debug!(
            layer = %request.layer,
            dispatched = renderers.len(),
            skipped = plan.len() - renderers.len(),
            "Acquired layer renderers"
        );

        Ok(CompositeRenderer::new(renderers, Arc::clone(&self.compositor)))
    }

    async fn acquire(
        &self,
        config: &MapConfig,
        entry: &LayerDispatch,
        blank: &Bytes,
    ) -> Result<Option<Arc<dyn Renderer>>, RenderError> {
        let LayerDispatch::Render {
            params, options, ..
        } = entry
        else {
            return Ok(None);
        };

        let renderer = self
            .provider
            .get_renderer(config, params, options.clone())
            .await?;

        let renderer: Arc<dyn Renderer> = match options.limits.render_timeout {
            Some(timeout) => Arc::new(TimeoutRenderer::new(renderer, timeout)),
            None => renderer,
        };

        let wrapped: Arc<dyn Renderer> = Arc::new(PolicyRenderer::new(
            renderer,
            options.policy,
            blank.clone(),
        ));
        Ok(Some(wrapped))
    }
}
