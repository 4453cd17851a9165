//! CPU reference implementation of the rasterization backend.
//!
//! Drawing uses inverse-mapped nearest-neighbor sampling with row-parallel
//! pixel loops. A whole-pixel translation at full opacity takes the
//! integer fast path on [`RasterBuffer`] directly.

use rayon::prelude::*;

use strata_core::{Affine2D, Point2D, RasterBuffer, Rect, StrataError, StrataResult};

use crate::backend::{ContentSource, DrawParams, RasterBackend};
use crate::blend::BlendCapabilities;
use crate::image_loader;

/// Composite operations the software backend executes natively.
pub const NATIVE_OPS: &[&str] = &["source-over", "lighter"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompositeOp {
    SourceOver,
    Lighter,
}

/// The built-in CPU rasterization backend.
#[derive(Debug, Default)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    pub fn new() -> Self {
        Self
    }

    /// The native-blend capability table for this backend.
    pub fn capabilities() -> BlendCapabilities {
        BlendCapabilities::from_native(NATIVE_OPS.iter().copied())
    }

    fn draw_transformed(
        &self,
        dst: &mut RasterBuffer,
        src: &RasterBuffer,
        transform: &Affine2D,
        opacity: f64,
        op: CompositeOp,
    ) {
        if op == CompositeOp::SourceOver && opacity >= 1.0 && transform.is_integer_translation() {
            dst.composite_over(src, transform.tx as i32, transform.ty as i32);
            return;
        }

        // Degenerate transforms draw nothing.
        let Some(inv) = transform.invert() else {
            return;
        };

        // Conservative destination region from the transformed source corners.
        let w = src.width as f64;
        let h = src.height as f64;
        let corners = [
            transform.apply(Point2D::new(0.0, 0.0)),
            transform.apply(Point2D::new(w, 0.0)),
            transform.apply(Point2D::new(w, h)),
            transform.apply(Point2D::new(0.0, h)),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let x0 = (min_x.floor() as i64).max(0) as usize;
        let x1 = (max_x.ceil() as i64).min(dst.width as i64).max(0) as usize;
        let y0 = (min_y.floor() as i64).max(0) as usize;
        let y1 = (max_y.ceil() as i64).min(dst.height as i64).max(0) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = dst.stride();
        dst.data
            .par_chunks_mut(stride)
            .enumerate()
            .skip(y0)
            .take(y1 - y0)
            .for_each(|(y, row)| {
                for x in x0..x1 {
                    // Inverse-map the destination pixel center.
                    let p = inv.apply(Point2D::new(x as f64 + 0.5, y as f64 + 0.5));
                    let sx = p.x.floor();
                    let sy = p.y.floor();
                    if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
                        continue;
                    }
                    let src_off =
                        ((sy as usize) * (src.width as usize) + (sx as usize)) * 4;
                    let mut pixel = [
                        src.data[src_off],
                        src.data[src_off + 1],
                        src.data[src_off + 2],
                        src.data[src_off + 3],
                    ];
                    if opacity < 1.0 {
                        pixel[3] = (pixel[3] as f64 * opacity).round() as u8;
                    }
                    let d = &mut row[x * 4..x * 4 + 4];
                    match op {
                        CompositeOp::SourceOver => blend_over(d, pixel),
                        CompositeOp::Lighter => blend_lighter(d, pixel),
                    }
                }
            });
    }
}

/// Porter-Duff "over" on one pixel, integer math.
fn blend_over(d: &mut [u8], s: [u8; 4]) {
    let sa = s[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s);
        return;
    }
    let da = d[3] as u32;
    let inv_sa = 255 - sa;
    let out_a = sa + (da * inv_sa) / 255;
    if out_a == 0 {
        return;
    }
    for ch in 0..3 {
        let sc = s[ch] as u32;
        let dc = d[ch] as u32;
        d[ch] = ((sc * sa * 255 + dc * da * inv_sa) / (out_a * 255)) as u8;
    }
    d[3] = out_a as u8;
}

/// Additive ("lighter") compositing on one pixel: channels sum in
/// premultiplied space, alpha saturates.
fn blend_lighter(d: &mut [u8], s: [u8; 4]) {
    let sa = s[3] as u32;
    if sa == 0 {
        return;
    }
    let da = d[3] as u32;
    let out_a = (sa + da).min(255);
    if out_a == 0 {
        return;
    }
    for ch in 0..3 {
        let sc = s[ch] as u32 * sa / 255;
        let dc = d[ch] as u32 * da / 255;
        d[ch] = (((sc + dc) * 255 / out_a).min(255)) as u8;
    }
    d[3] = out_a as u8;
}

impl RasterBackend for SoftwareBackend {
    fn allocate(&self, width: u32, height: u32) -> StrataResult<RasterBuffer> {
        Ok(RasterBuffer::new(width, height))
    }

    fn resolve_source(&self, source: &ContentSource<'_>) -> StrataResult<RasterBuffer> {
        match source {
            ContentSource::File(path) => image_loader::load_image(path),
            ContentSource::Raster(raster) => Ok((*raster).clone()),
            ContentSource::Image(img) => Ok(RasterBuffer {
                data: img.data.clone(),
                width: img.width,
                height: img.height,
            }),
        }
    }

    fn draw(
        &self,
        dst: &mut RasterBuffer,
        src: &RasterBuffer,
        params: &DrawParams,
    ) -> StrataResult<()> {
        let op = match params.composite_op.as_deref() {
            None | Some("source-over") => CompositeOp::SourceOver,
            Some("lighter") => CompositeOp::Lighter,
            Some(other) => {
                return Err(StrataError::Render(format!(
                    "software backend has no native '{}' composite operation",
                    other
                )))
            }
        };
        self.draw_transformed(dst, src, &params.transform, params.opacity.clamp(0.0, 1.0), op);
        Ok(())
    }

    fn read_region(&self, buf: &RasterBuffer, rect: &Rect) -> StrataResult<Vec<u8>> {
        Ok(buf.read_region(rect))
    }

    fn write_region(
        &self,
        buf: &mut RasterBuffer,
        rect: &Rect,
        pixels: &[u8],
    ) -> StrataResult<()> {
        if pixels.len() < (rect.width as usize) * (rect.height as usize) * 4 {
            return Err(StrataError::Render(
                "write_region pixel slice shorter than region".into(),
            ));
        }
        buf.write_region(rect, pixels);
        Ok(())
    }
}
