//! The render orchestrator and per-layer pipeline.
//!
//! A render fans the layer pipeline (content resolve, mask, filters) out
//! over all layers as independent tasks, joins them back in original stack
//! order, and hands the resolved placements to the blend compositor. The
//! first error observed anywhere aborts the render and reaches the caller
//! exactly once; sibling pipelines still in flight are left to finish and
//! their results are dropped.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use strata_core::{RasterBuffer, StrataError, StrataResult};
use strata_ir::{Canvas, Layer, LayerContent};

use crate::backend::{ContentSource, RasterBackend};
use crate::blend::{BlendCapabilities, BlendRegistry};
use crate::compositor::{BlendCompositor, LayerPlacement};
use crate::filter::{
    self, FilterCall, FilterOptions, FilterRegistry, MaskOptions, FILTER_LUMINANCE, FILTER_MASK,
};
use crate::gradient;
use crate::software::SoftwareBackend;

/// Renderer configuration.
#[derive(Debug, Clone, Copy)]
pub struct RendererOptions {
    /// Maximum nesting depth for nested canvases and masks before the
    /// render fails with `RecursionLimitExceeded`.
    pub max_depth: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { max_depth: 16 }
    }
}

type RenderFuture = Pin<Box<dyn Future<Output = StrataResult<Option<RasterBuffer>>> + Send>>;

/// The render orchestrator.
///
/// Holds the rasterization backend and the filter/blend configuration as
/// explicit immutable state, so renders against differently configured
/// backends can run concurrently without interference. Cloning is cheap
/// (everything is behind `Arc`s) and clones share the source cache.
#[derive(Clone)]
pub struct Renderer {
    backend: Arc<dyn RasterBackend>,
    filters: Arc<FilterRegistry>,
    blends: Arc<BlendRegistry>,
    capabilities: Arc<BlendCapabilities>,
    options: RendererOptions,
    source_cache: Arc<DashMap<PathBuf, RasterBuffer>>,
}

impl Renderer {
    /// Create a renderer from a backend and explicit configuration.
    pub fn new(
        backend: Arc<dyn RasterBackend>,
        filters: FilterRegistry,
        blends: BlendRegistry,
        capabilities: BlendCapabilities,
        options: RendererOptions,
    ) -> Self {
        Self {
            backend,
            filters: Arc::new(filters),
            blends: Arc::new(blends),
            capabilities: Arc::new(capabilities),
            options,
            source_cache: Arc::new(DashMap::new()),
        }
    }

    /// A renderer over the built-in CPU backend with the reference filter
    /// and blend registries.
    pub fn with_software_defaults() -> Self {
        Self::new(
            Arc::new(SoftwareBackend::new()),
            FilterRegistry::default(),
            BlendRegistry::default(),
            SoftwareBackend::capabilities(),
            RendererOptions::default(),
        )
    }

    /// Flatten a canvas into a single raster. A canvas with zero layers
    /// yields `Ok(None)` ("no image").
    pub async fn render(&self, canvas: &Canvas) -> StrataResult<Option<RasterBuffer>> {
        self.render_at_depth(canvas.clone(), 0).await
    }

    /// Like [`Renderer::render`], but appends the fixed luminance filter to
    /// the composited result. Used by the mask stage and for producing
    /// grayscale previews.
    pub async fn render_grayscale(&self, canvas: &Canvas) -> StrataResult<Option<RasterBuffer>> {
        self.render_grayscale_at_depth(canvas.clone(), 0).await
    }

    /// Render on the current runtime and deliver the outcome to `callback`
    /// exactly once. Must be called from within a Tokio runtime.
    pub fn render_with<F>(&self, canvas: Canvas, callback: F)
    where
        F: FnOnce(StrataResult<Option<RasterBuffer>>) + Send + 'static,
    {
        let renderer = self.clone();
        tokio::spawn(async move {
            callback(renderer.render_at_depth(canvas, 0).await);
        });
    }

    fn render_at_depth(&self, canvas: Canvas, depth: u32) -> RenderFuture {
        let renderer = self.clone();
        Box::pin(async move { renderer.render_canvas(canvas, depth).await })
    }

    fn render_grayscale_at_depth(&self, canvas: Canvas, depth: u32) -> RenderFuture {
        let renderer = self.clone();
        Box::pin(async move {
            match renderer.render_canvas(canvas, depth).await? {
                Some(buf) => {
                    let chain = [FilterCall::new(FILTER_LUMINANCE, FilterOptions::default())];
                    Ok(Some(filter::apply_chain(&renderer.filters, buf, &chain)?))
                }
                None => Ok(None),
            }
        })
    }

    async fn render_canvas(
        &self,
        canvas: Canvas,
        depth: u32,
    ) -> StrataResult<Option<RasterBuffer>> {
        if depth > self.options.max_depth {
            return Err(StrataError::RecursionLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        if canvas.layers.is_empty() {
            debug!(depth, "canvas has no layers, rendering no image");
            return Ok(None);
        }

        let (width, height) = (canvas.width, canvas.height);
        debug!(layers = canvas.layers.len(), width, height, depth, "rendering canvas");

        // Fan out: one task per layer.
        let handles: Vec<_> = canvas
            .layers
            .iter()
            .map(|layer| {
                tokio::spawn(self.clone().run_layer_pipeline(layer.clone(), width, height, depth))
            })
            .collect();

        // Fan in, preserving original stack order regardless of completion
        // order. The first error wins; remaining tasks finish on the
        // runtime and their results are dropped.
        let mut placements = Vec::with_capacity(handles.len());
        for (layer, handle) in canvas.layers.iter().zip(handles) {
            let raster = handle
                .await
                .map_err(|e| StrataError::Render(format!("layer pipeline task failed: {e}")))??;
            placements.push(LayerPlacement::new(layer, raster, width, height));
        }

        BlendCompositor::new(self.backend.as_ref(), &self.blends, &self.capabilities)
            .composite(width, height, &placements)
    }

    /// One layer's pipeline: content resolve, then mask, then filters.
    async fn run_layer_pipeline(
        self,
        layer: Layer,
        canvas_w: u32,
        canvas_h: u32,
        depth: u32,
    ) -> StrataResult<RasterBuffer> {
        let buf = self.resolve_content(&layer, canvas_w, canvas_h, depth).await?;
        let buf = self.apply_mask(&layer, buf, depth).await?;
        let chain: Vec<FilterCall> = layer.filters.iter().map(FilterCall::from).collect();
        filter::apply_chain(&self.filters, buf, &chain)
    }

    /// Resolve a layer's content descriptor into a raster buffer.
    async fn resolve_content(
        &self,
        layer: &Layer,
        canvas_w: u32,
        canvas_h: u32,
        depth: u32,
    ) -> StrataResult<RasterBuffer> {
        // Fills and gradients take the layer's size override, if any.
        let fill_w = layer.width.unwrap_or(canvas_w);
        let fill_h = layer.height.unwrap_or(canvas_h);

        match &layer.content {
            LayerContent::FileReference { path } => {
                if path.as_os_str().is_empty() {
                    return Err(StrataError::InvalidLayerContent(
                        "file reference with an empty path".into(),
                    ));
                }
                if let Some(cached) = self.source_cache.get(path) {
                    debug!(path = %path.display(), "source cache hit");
                    return Ok(cached.clone());
                }
                let backend = Arc::clone(&self.backend);
                let owned = path.clone();
                let buf = tokio::task::spawn_blocking(move || {
                    backend.resolve_source(&ContentSource::File(&owned))
                })
                .await
                .map_err(|e| StrataError::Render(format!("source decode task failed: {e}")))??;
                info!(
                    path = %path.display(),
                    width = buf.width,
                    height = buf.height,
                    "decoded file source"
                );
                self.source_cache.insert(path.clone(), buf.clone());
                Ok(buf)
            }
            LayerContent::SolidFill { color } => {
                let mut buf = self.backend.allocate(fill_w, fill_h)?;
                buf.fill(color);
                Ok(buf)
            }
            LayerContent::Gradient { gradient: spec } => {
                let mut buf = self.backend.allocate(fill_w, fill_h)?;
                gradient::paint(&mut buf, spec);
                Ok(buf)
            }
            LayerContent::ExternalRaster { raster } => {
                let expected = (raster.width as usize) * (raster.height as usize) * 4;
                if raster.width == 0 || raster.height == 0 || raster.data.len() != expected {
                    return Err(StrataError::InvalidLayerContent(format!(
                        "raster payload of {} bytes does not match {}x{}",
                        raster.data.len(),
                        raster.width,
                        raster.height
                    )));
                }
                self.backend.resolve_source(&ContentSource::Raster(raster))
            }
            LayerContent::RawImage { image } => {
                if !image.is_well_formed() {
                    return Err(StrataError::InvalidLayerContent(format!(
                        "image payload of {} bytes does not match {}x{}",
                        image.data.len(),
                        image.width,
                        image.height
                    )));
                }
                self.backend.resolve_source(&ContentSource::Image(image))
            }
            LayerContent::NestedCanvas { canvas } => {
                match self.render_at_depth(canvas.clone(), depth + 1).await? {
                    Some(buf) => Ok(buf),
                    // An empty nested canvas resolves to a transparent
                    // buffer of its own size.
                    None => self.backend.allocate(canvas.width, canvas.height),
                }
            }
        }
    }

    /// Apply a layer's mask, if any. A missing mask or a mask canvas with
    /// zero layers is the identity.
    async fn apply_mask(
        &self,
        layer: &Layer,
        buf: RasterBuffer,
        depth: u32,
    ) -> StrataResult<RasterBuffer> {
        let Some(mask) = &layer.mask else {
            return Ok(buf);
        };
        if mask.layers.is_empty() {
            return Ok(buf);
        }

        // The mask renders at the masked buffer's size.
        let mut mask_canvas = mask.clone();
        mask_canvas.width = buf.width;
        mask_canvas.height = buf.height;

        let rendered = match self.render_grayscale_at_depth(mask_canvas, depth + 1).await? {
            Some(rendered) => rendered,
            None => return Ok(buf),
        };

        let call = FilterCall::new(
            FILTER_MASK,
            FilterOptions::Mask(MaskOptions {
                data: rendered.data,
                width: rendered.width,
                height: rendered.height,
                dx: 0,
                dy: 0,
            }),
        );
        filter::apply_chain(&self.filters, buf, &[call])
    }
}
