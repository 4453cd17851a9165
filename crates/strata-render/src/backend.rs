//! The rasterization backend boundary.
//!
//! Everything pixel-level that the engine does not decide itself —
//! allocating buffers, decoding sources, drawing one buffer onto another
//! with an affine transform — goes through [`RasterBackend`]. The engine
//! ships a CPU implementation ([`crate::software::SoftwareBackend`]);
//! embedders can substitute their own (e.g. a GPU-backed one) without
//! touching the pipeline.

use std::path::Path;

use strata_core::{Affine2D, RasterBuffer, Rect, StrataResult};
use strata_ir::ImageData;

/// A drawable source handed to the backend for decoding.
#[derive(Debug)]
pub enum ContentSource<'a> {
    /// An image file to decode.
    File(&'a Path),
    /// An opaque pre-rendered raster.
    Raster(&'a RasterBuffer),
    /// Decoded RGBA pixels with declared dimensions.
    Image(&'a ImageData),
}

/// Parameters for drawing a source buffer onto a destination.
#[derive(Debug, Clone)]
pub struct DrawParams {
    /// Source-space to destination-space mapping.
    pub transform: Affine2D,
    /// Source opacity in [0, 1], applied on top of source alpha.
    pub opacity: f64,
    /// Named native composite operation, or `None` for plain alpha
    /// compositing ("source-over").
    pub composite_op: Option<String>,
}

impl DrawParams {
    /// Plain alpha compositing with the given transform and opacity.
    pub fn over(transform: Affine2D, opacity: f64) -> Self {
        Self {
            transform,
            opacity,
            composite_op: None,
        }
    }
}

/// The rasterization backend the compositing engine draws through.
///
/// Implementations must be thread-safe: layer pipelines run concurrently
/// and share the backend behind an `Arc`.
pub trait RasterBackend: Send + Sync {
    /// Allocate a transparent buffer of the given size.
    fn allocate(&self, width: u32, height: u32) -> StrataResult<RasterBuffer>;

    /// Decode or copy a source into a buffer of its natural dimensions.
    fn resolve_source(&self, source: &ContentSource<'_>) -> StrataResult<RasterBuffer>;

    /// Draw `src` onto `dst` with a transform, opacity, and optional named
    /// native composite operation. Callers must only pass composite ops the
    /// backend's capability table declares native.
    fn draw(&self, dst: &mut RasterBuffer, src: &RasterBuffer, params: &DrawParams)
        -> StrataResult<()>;

    /// Read the raw RGBA bytes of a region (tightly packed).
    fn read_region(&self, buf: &RasterBuffer, rect: &Rect) -> StrataResult<Vec<u8>>;

    /// Overwrite the raw RGBA bytes of a region.
    fn write_region(&self, buf: &mut RasterBuffer, rect: &Rect, pixels: &[u8])
        -> StrataResult<()>;
}
