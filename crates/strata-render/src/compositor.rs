//! The blend compositor: merges an ordered list of placed, post-filter
//! layer rasters into one output buffer.
//!
//! The list above the bottommost layer is split into maximal contiguous
//! runs sharing the same native-vs-manual classification, and the runs are
//! processed strictly in original order — one run's output is the next
//! run's input. Partitioning only ever changes the implementation path of
//! a layer, never its position in the stack.

use tracing::debug;

use strata_core::{Affine2D, Point2D, RasterBuffer, StrataResult};
use strata_ir::layer::BLEND_SOURCE_OVER;
use strata_ir::{Layer, LayerTransform};

use crate::backend::{DrawParams, RasterBackend};
use crate::blend::{BlendCapabilities, BlendInput, BlendRegistry};
use crate::transform;

/// The resolved, per-render draw data for one layer. Ephemeral: built
/// fresh for every render call and discarded once merged.
#[derive(Debug, Clone)]
pub struct LayerPlacement {
    /// The layer's post-mask, post-filter raster.
    pub raster: RasterBuffer,
    /// Draw offset centering the raster's natural size on the canvas.
    pub offset: Point2D,
    pub opacity: f64,
    pub blend_mode: String,
    pub transform: LayerTransform,
}

impl LayerPlacement {
    /// Build a placement for a resolved layer raster on a canvas of the
    /// given size.
    pub fn new(layer: &Layer, raster: RasterBuffer, canvas_w: u32, canvas_h: u32) -> Self {
        let offset = transform::centering_offset(raster.width, raster.height, canvas_w, canvas_h);
        Self {
            raster,
            offset,
            opacity: layer.opacity.clamp(0.0, 1.0),
            blend_mode: layer.blend_mode.clone(),
            transform: layer.transform,
        }
    }

    /// The full source-space to canvas-space transform for this placement.
    fn full_transform(&self, canvas_w: u32, canvas_h: u32) -> Affine2D {
        Affine2D::translation(self.offset.x, self.offset.y)
            .then(&transform::placement_transform(&self.transform, canvas_w, canvas_h))
    }
}

/// A maximal contiguous run of placements sharing one classification.
#[derive(Debug)]
pub struct BlendRun<'a> {
    /// Whether every placement in the run composites natively.
    pub native: bool,
    pub placements: &'a [LayerPlacement],
}

/// Split placements into maximal contiguous runs by native-blend
/// capability of their blend mode.
pub fn partition_runs<'a>(
    placements: &'a [LayerPlacement],
    capabilities: &BlendCapabilities,
) -> Vec<BlendRun<'a>> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < placements.len() {
        let native = capabilities.is_native(&placements[start].blend_mode);
        let mut end = start + 1;
        while end < placements.len() && capabilities.is_native(&placements[end].blend_mode) == native
        {
            end += 1;
        }
        runs.push(BlendRun { native, placements: &placements[start..end] });
        start = end;
    }
    runs
}

/// Merges placements into a single canvas-sized buffer.
pub struct BlendCompositor<'a> {
    backend: &'a dyn RasterBackend,
    blends: &'a BlendRegistry,
    capabilities: &'a BlendCapabilities,
}

impl<'a> BlendCompositor<'a> {
    pub fn new(
        backend: &'a dyn RasterBackend,
        blends: &'a BlendRegistry,
        capabilities: &'a BlendCapabilities,
    ) -> Self {
        Self { backend, blends, capabilities }
    }

    /// Composite placements in order. Zero placements produce no image; a
    /// single placement is drawn directly with its transform and opacity,
    /// with no blend function involved.
    pub fn composite(
        &self,
        canvas_w: u32,
        canvas_h: u32,
        placements: &[LayerPlacement],
    ) -> StrataResult<Option<RasterBuffer>> {
        let Some((bottom, rest)) = placements.split_first() else {
            return Ok(None);
        };

        let mut out = self.backend.allocate(canvas_w, canvas_h)?;
        self.draw_native(&mut out, bottom, canvas_w, canvas_h, None)?;

        for run in partition_runs(rest, self.capabilities) {
            debug!(
                native = run.native,
                layers = run.placements.len(),
                "compositing blend run"
            );
            if run.native {
                for placement in run.placements {
                    let op = if placement.blend_mode == BLEND_SOURCE_OVER {
                        None
                    } else {
                        Some(placement.blend_mode.clone())
                    };
                    self.draw_native(&mut out, placement, canvas_w, canvas_h, op)?;
                }
            } else {
                for placement in run.placements {
                    self.blend_manual(&mut out, placement, canvas_w, canvas_h)?;
                }
            }
        }

        Ok(Some(out))
    }

    /// Draw a placement through the backend's compositing, optionally with
    /// a named native operation.
    fn draw_native(
        &self,
        out: &mut RasterBuffer,
        placement: &LayerPlacement,
        canvas_w: u32,
        canvas_h: u32,
        composite_op: Option<String>,
    ) -> StrataResult<()> {
        self.backend.draw(
            out,
            &placement.raster,
            &DrawParams {
                transform: placement.full_transform(canvas_w, canvas_h),
                opacity: placement.opacity,
                composite_op,
            },
        )
    }

    /// Blend a placement through its registered manual blend function:
    /// rasterize the transformed layer into scratch space, extract the
    /// bounding rectangle, and let the blend function merge it.
    fn blend_manual(
        &self,
        out: &mut RasterBuffer,
        placement: &LayerPlacement,
        canvas_w: u32,
        canvas_h: u32,
    ) -> StrataResult<()> {
        let rect = transform::bounding_rect(
            &placement.transform,
            placement.raster.width,
            placement.raster.height,
            canvas_w,
            canvas_h,
        );
        if rect.is_empty() {
            debug!(mode = %placement.blend_mode, "zero-area placement skipped");
            return Ok(());
        }

        let blend = self.blends.require(&placement.blend_mode)?;

        let mut scratch = self.backend.allocate(canvas_w, canvas_h)?;
        self.backend.draw(
            &mut scratch,
            &placement.raster,
            &DrawParams::over(placement.full_transform(canvas_w, canvas_h), 1.0),
        )?;
        let data = self.backend.read_region(&scratch, &rect)?;

        let base = out.clone();
        blend(
            &base.data,
            &mut out.data,
            canvas_w,
            canvas_h,
            &BlendInput {
                data: &data,
                width: rect.width,
                height: rect.height,
                opacity: placement.opacity,
                dx: rect.x,
                dy: rect.y,
            },
        )
    }
}
