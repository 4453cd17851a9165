//! Blend-mode configuration: the native capability table and the manual
//! blend registry.
//!
//! Both are explicit immutable configuration handed to the renderer at
//! construction — never ambient globals — so concurrent renders against
//! backends with different capabilities cannot interfere.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strata_core::{StrataError, StrataResult};
use strata_ir::layer::BLEND_SOURCE_OVER;

/// Extracted, transformed source pixels handed to a manual blend function.
#[derive(Debug)]
pub struct BlendInput<'a> {
    /// Tightly packed RGBA bytes, `width * height * 4`.
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Layer opacity in [0, 1], applied by the blend function.
    pub opacity: f64,
    /// Offset of the extracted region within the canvas.
    pub dx: i32,
    pub dy: i32,
}

/// A manual blend function: combines extracted source pixels with the base
/// buffer into the output buffer. `base` and `out` are full canvas-sized
/// RGBA buffers; `out` starts as a copy of `base` and the function writes
/// the blended region into it.
pub type BlendFn =
    Arc<dyn Fn(&[u8], &mut [u8], u32, u32, &BlendInput<'_>) -> StrataResult<()> + Send + Sync>;

/// Which blend modes the rasterization backend can execute natively.
///
/// The default mode (`source-over`) is always native regardless of the
/// table contents.
#[derive(Debug, Clone, Default)]
pub struct BlendCapabilities {
    native: HashSet<String>,
}

impl BlendCapabilities {
    /// A table declaring nothing native (besides `source-over`).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from an iterator of native mode names.
    pub fn from_native<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            native: modes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `mode` can be composited natively by the backend.
    pub fn is_native(&self, mode: &str) -> bool {
        mode == BLEND_SOURCE_OVER || self.native.contains(mode)
    }
}

/// Registry of manual blend functions, keyed by blend mode name.
///
/// A mode that is neither native nor registered here is a fatal
/// [`StrataError::NoSuchBlendMode`] at composite time.
#[derive(Clone)]
pub struct BlendRegistry {
    fns: HashMap<String, BlendFn>,
}

impl BlendRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self { fns: HashMap::new() }
    }

    /// Register a blend function under a mode name.
    pub fn register(&mut self, name: impl Into<String>, f: BlendFn) {
        self.fns.insert(name.into(), f);
    }

    /// Look up a blend function.
    pub fn get(&self, name: &str) -> Option<&BlendFn> {
        self.fns.get(name)
    }

    /// Look up a blend function, failing with `NoSuchBlendMode`.
    pub fn require(&self, name: &str) -> StrataResult<&BlendFn> {
        self.get(name)
            .ok_or_else(|| StrataError::NoSuchBlendMode(name.to_string()))
    }
}

impl Default for BlendRegistry {
    /// The reference registry: `multiply`, `screen`, and `overlay`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("multiply", separable(|cb, cs| cb * cs));
        registry.register("screen", separable(|cb, cs| cb + cs - cb * cs));
        registry.register("overlay", separable(|cb, cs| {
            if cb <= 0.5 {
                2.0 * cb * cs
            } else {
                1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
            }
        }));
        registry
    }
}

impl std::fmt::Debug for BlendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.fns.keys().collect();
        names.sort();
        f.debug_struct("BlendRegistry").field("modes", &names).finish()
    }
}

/// Build a [`BlendFn`] from a separable per-channel blend formula
/// `B(cb, cs)` over non-premultiplied components in [0, 1].
///
/// The result follows the standard compositing equation: the blended color
/// is mixed with the raw source by the backdrop's alpha, then composited
/// over the backdrop with the source's (opacity-scaled) alpha.
pub fn separable(formula: impl Fn(f32, f32) -> f32 + Send + Sync + 'static) -> BlendFn {
    Arc::new(move |base, out, canvas_w, canvas_h, input| {
        let opacity = input.opacity.clamp(0.0, 1.0) as f32;
        for row in 0..input.height as i64 {
            let y = input.dy as i64 + row;
            if y < 0 || y >= canvas_h as i64 {
                continue;
            }
            for col in 0..input.width as i64 {
                let x = input.dx as i64 + col;
                if x < 0 || x >= canvas_w as i64 {
                    continue;
                }
                let src_off = ((row as usize) * (input.width as usize) + (col as usize)) * 4;
                let dst_off = ((y as usize) * (canvas_w as usize) + (x as usize)) * 4;

                let sa = (input.data[src_off + 3] as f32 / 255.0) * opacity;
                if sa <= 0.0 {
                    continue;
                }
                let ba = base[dst_off + 3] as f32 / 255.0;
                let out_a = sa + ba * (1.0 - sa);
                if out_a <= 0.0 {
                    continue;
                }

                for ch in 0..3 {
                    let cs = input.data[src_off + ch] as f32 / 255.0;
                    let cb = base[dst_off + ch] as f32 / 255.0;
                    let mixed = (1.0 - ba) * cs + ba * formula(cb, cs);
                    let premult = sa * mixed + (1.0 - sa) * ba * cb;
                    out[dst_off + ch] = ((premult / out_a) * 255.0).round().clamp(0.0, 255.0) as u8;
                }
                out[dst_off + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    })
}
