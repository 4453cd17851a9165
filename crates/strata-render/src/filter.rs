//! The filter stage: an ordered chain of pixel filters applied through
//! ping-pong double buffering.
//!
//! Filter semantics are external to the engine — a filter is an opaque
//! function over raw RGBA bytes. The stage only sequences them: filter i
//! reads the previous output and writes a fresh buffer, and the final
//! buffer becomes the layer's raster. A filter must write every output
//! pixel; the output buffer's prior contents are unspecified.

use std::collections::HashMap;
use std::sync::Arc;

use strata_core::{RasterBuffer, StrataError, StrataResult};

/// Name of the fixed luminance-to-black/white filter used by grayscale
/// rendering and mask generation.
pub const FILTER_LUMINANCE: &str = "luminance";

/// Name of the synthetic alpha-mask filter applied by the mask stage.
pub const FILTER_MASK: &str = "mask";

/// Alpha-mask payload synthesized by the mask stage: a grayscale raster
/// whose coverage multiplies the filtered layer's alpha.
#[derive(Debug, Clone)]
pub struct MaskOptions {
    /// Tightly packed RGBA bytes of the rendered grayscale mask.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Mask offset within the layer buffer.
    pub dx: i32,
    pub dy: i32,
}

/// Options passed to one filter invocation.
#[derive(Debug, Clone)]
pub enum FilterOptions {
    /// Free-form parameters from the layer's filter list.
    Params(serde_json::Value),
    /// Mask payload for the synthetic [`FILTER_MASK`] filter.
    Mask(MaskOptions),
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions::Params(serde_json::Value::Null)
    }
}

/// One resolved filter invocation in a chain.
#[derive(Debug, Clone)]
pub struct FilterCall {
    pub name: String,
    pub options: FilterOptions,
}

impl FilterCall {
    pub fn new(name: impl Into<String>, options: FilterOptions) -> Self {
        Self { name: name.into(), options }
    }
}

impl From<&strata_ir::FilterSpec> for FilterCall {
    fn from(spec: &strata_ir::FilterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            options: FilterOptions::Params(spec.options.clone()),
        }
    }
}

/// A pixel filter: reads `input`, writes every pixel of `output`.
pub type FilterFn = Arc<
    dyn Fn(&[u8], &mut [u8], u32, u32, &FilterOptions) -> StrataResult<()> + Send + Sync,
>;

/// Registry of pixel filters, keyed by name.
#[derive(Clone)]
pub struct FilterRegistry {
    fns: HashMap<String, FilterFn>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self { fns: HashMap::new() }
    }

    /// Register a filter under a name.
    pub fn register(&mut self, name: impl Into<String>, f: FilterFn) {
        self.fns.insert(name.into(), f);
    }

    /// Look up a filter.
    pub fn get(&self, name: &str) -> Option<&FilterFn> {
        self.fns.get(name)
    }
}

impl Default for FilterRegistry {
    /// The reference registry: `luminance`, `mask`, `invert`, `opacity`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FILTER_LUMINANCE, Arc::new(luminance_filter));
        registry.register(FILTER_MASK, Arc::new(mask_filter));
        registry.register("invert", Arc::new(invert_filter));
        registry.register("opacity", Arc::new(opacity_filter));
        registry
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.fns.keys().collect();
        names.sort();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

/// Apply an ordered filter chain to a buffer.
///
/// An empty chain is the identity and allocates nothing. Otherwise two
/// buffers alternate through the chain; the final output becomes the
/// result. The first failing filter aborts the stage.
pub fn apply_chain(
    registry: &FilterRegistry,
    input: RasterBuffer,
    chain: &[FilterCall],
) -> StrataResult<RasterBuffer> {
    if chain.is_empty() {
        return Ok(input);
    }

    let (width, height) = (input.width, input.height);
    let mut front = input;
    let mut back = RasterBuffer::new(width, height);

    for call in chain {
        let f = registry
            .get(&call.name)
            .ok_or_else(|| StrataError::filter(&call.name, "filter is not registered"))?;
        f(&front.data, &mut back.data, width, height, &call.options).map_err(|e| match e {
            err @ StrataError::FilterFailure { .. } => err,
            other => StrataError::filter(&call.name, other.to_string()),
        })?;
        std::mem::swap(&mut front, &mut back);
    }

    Ok(front)
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

/// Fixed luminance-to-black/white conversion; alpha is preserved.
fn luminance_filter(
    input: &[u8],
    output: &mut [u8],
    _width: u32,
    _height: u32,
    _options: &FilterOptions,
) -> StrataResult<()> {
    for (src, dst) in input.chunks_exact(4).zip(output.chunks_exact_mut(4)) {
        let l = luma(src[0], src[1], src[2]);
        dst[0] = l;
        dst[1] = l;
        dst[2] = l;
        dst[3] = src[3];
    }
    Ok(())
}

/// Channel inversion; alpha is preserved.
fn invert_filter(
    input: &[u8],
    output: &mut [u8],
    _width: u32,
    _height: u32,
    _options: &FilterOptions,
) -> StrataResult<()> {
    for (src, dst) in input.chunks_exact(4).zip(output.chunks_exact_mut(4)) {
        dst[0] = 255 - src[0];
        dst[1] = 255 - src[1];
        dst[2] = 255 - src[2];
        dst[3] = src[3];
    }
    Ok(())
}

/// Uniform alpha scaling; `options.amount` in [0, 1], default 1.
fn opacity_filter(
    input: &[u8],
    output: &mut [u8],
    _width: u32,
    _height: u32,
    options: &FilterOptions,
) -> StrataResult<()> {
    let amount = match options {
        FilterOptions::Params(value) => value
            .get("amount")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0),
        FilterOptions::Mask(_) => {
            return Err(StrataError::filter("opacity", "mask options are not applicable"))
        }
    };
    for (src, dst) in input.chunks_exact(4).zip(output.chunks_exact_mut(4)) {
        dst[0..3].copy_from_slice(&src[0..3]);
        dst[3] = (src[3] as f64 * amount).round() as u8;
    }
    Ok(())
}

/// Multiply the layer's alpha by a grayscale mask's coverage. Pixels
/// outside the mask become fully transparent.
fn mask_filter(
    input: &[u8],
    output: &mut [u8],
    width: u32,
    _height: u32,
    options: &FilterOptions,
) -> StrataResult<()> {
    let mask = match options {
        FilterOptions::Mask(mask) => mask,
        FilterOptions::Params(_) => {
            return Err(StrataError::filter(FILTER_MASK, "missing mask payload"))
        }
    };

    for (i, (src, dst)) in input
        .chunks_exact(4)
        .zip(output.chunks_exact_mut(4))
        .enumerate()
    {
        dst[0..3].copy_from_slice(&src[0..3]);

        let x = (i as i64) % (width as i64) - mask.dx as i64;
        let y = (i as i64) / (width as i64) - mask.dy as i64;
        if x < 0 || y < 0 || x >= mask.width as i64 || y >= mask.height as i64 {
            dst[3] = 0;
            continue;
        }
        let m = ((y as usize) * (mask.width as usize) + (x as usize)) * 4;
        // The mask is already luminance-converted, so any color channel is
        // its coverage; its own alpha still participates.
        let coverage = (mask.data[m] as u32) * (mask.data[m + 3] as u32) / 255;
        dst[3] = ((src[3] as u32 * coverage) / 255) as u8;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Color;

    fn registry() -> FilterRegistry {
        FilterRegistry::default()
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let buf = RasterBuffer::solid(4, 4, &Color::RED);
        let out = apply_chain(&registry(), buf.clone(), &[]).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_unregistered_filter_fails() {
        let buf = RasterBuffer::new(2, 2);
        let chain = [FilterCall::new("emboss", FilterOptions::default())];
        let result = apply_chain(&registry(), buf, &chain);
        assert!(matches!(
            result,
            Err(StrataError::FilterFailure { name, .. }) if name == "emboss"
        ));
    }

    #[test]
    fn test_invert_round_trip() {
        let buf = RasterBuffer::solid(2, 2, &Color::rgba(0.2, 0.4, 0.6, 1.0));
        let once = apply_chain(
            &registry(),
            buf.clone(),
            &[FilterCall::new("invert", FilterOptions::default())],
        )
        .unwrap();
        assert_ne!(once, buf);

        let twice = apply_chain(
            &registry(),
            buf.clone(),
            &[
                FilterCall::new("invert", FilterOptions::default()),
                FilterCall::new("invert", FilterOptions::default()),
            ],
        )
        .unwrap();
        assert_eq!(twice, buf);
    }

    #[test]
    fn test_chain_order_matters() {
        let buf = RasterBuffer::solid(1, 1, &Color::RED);

        // luminance(invert(red)) = luminance(cyan).
        let a = apply_chain(
            &registry(),
            buf.clone(),
            &[
                FilterCall::new("invert", FilterOptions::default()),
                FilterCall::new(FILTER_LUMINANCE, FilterOptions::default()),
            ],
        )
        .unwrap();
        // invert(luminance(red)) = invert(gray).
        let b = apply_chain(
            &registry(),
            buf,
            &[
                FilterCall::new(FILTER_LUMINANCE, FilterOptions::default()),
                FilterCall::new("invert", FilterOptions::default()),
            ],
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_luminance_output_is_gray() {
        let buf = RasterBuffer::solid(2, 1, &Color::RED);
        let out = apply_chain(
            &registry(),
            buf,
            &[FilterCall::new(FILTER_LUMINANCE, FilterOptions::default())],
        )
        .unwrap();
        let [r, g, b, a] = out.get_pixel(0, 0).unwrap();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
        // BT.601 weight of pure red.
        assert!((r as i32 - 76).abs() <= 1);
    }

    #[test]
    fn test_opacity_filter_scales_alpha() {
        let buf = RasterBuffer::solid(1, 1, &Color::WHITE);
        let out = apply_chain(
            &registry(),
            buf,
            &[FilterCall::new(
                "opacity",
                FilterOptions::Params(serde_json::json!({ "amount": 0.5 })),
            )],
        )
        .unwrap();
        assert_eq!(out.get_pixel(0, 0), Some([255, 255, 255, 128]));
    }

    #[test]
    fn test_mask_filter_multiplies_alpha() {
        let buf = RasterBuffer::solid(2, 1, &Color::RED);
        // Left mask pixel white (keep), right black (drop).
        let mask = MaskOptions {
            data: vec![255, 255, 255, 255, 0, 0, 0, 255],
            width: 2,
            height: 1,
            dx: 0,
            dy: 0,
        };
        let out = apply_chain(
            &registry(),
            buf,
            &[FilterCall::new(FILTER_MASK, FilterOptions::Mask(mask))],
        )
        .unwrap();
        assert_eq!(out.get_pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 0), Some([255, 0, 0, 0]));
    }

    #[test]
    fn test_mask_filter_zeroes_outside_mask() {
        let buf = RasterBuffer::solid(3, 1, &Color::RED);
        let mask = MaskOptions {
            data: vec![255, 255, 255, 255],
            width: 1,
            height: 1,
            dx: 1,
            dy: 0,
        };
        let out = apply_chain(
            &registry(),
            buf,
            &[FilterCall::new(FILTER_MASK, FilterOptions::Mask(mask))],
        )
        .unwrap();
        assert_eq!(out.get_pixel(0, 0).unwrap()[3], 0);
        assert_eq!(out.get_pixel(1, 0).unwrap()[3], 255);
        assert_eq!(out.get_pixel(2, 0).unwrap()[3], 0);
    }
}
