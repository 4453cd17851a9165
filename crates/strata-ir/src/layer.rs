use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strata_core::{Color, RasterBuffer};

use crate::canvas::Canvas;
use crate::gradient::GradientSpec;

/// The default blend mode: plain alpha compositing.
pub const BLEND_SOURCE_OVER: &str = "source-over";

/// Decoded RGBA pixels with declared dimensions — the wire form of an
/// image handle produced by an external decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Whether dimensions are non-zero and the byte length matches them.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

/// The content of a layer — what it renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LayerContent {
    /// An image decoded from a file path or URI.
    FileReference { path: PathBuf },
    /// A uniform color fill.
    SolidFill { color: Color },
    /// A linear or radial gradient fill.
    Gradient { gradient: GradientSpec },
    /// An opaque pre-rendered raster, used as-is at its natural size.
    ExternalRaster { raster: RasterBuffer },
    /// Decoded image pixels handed over by the caller.
    RawImage { image: ImageData },
    /// A nested canvas, flattened recursively and used as the buffer.
    NestedCanvas { canvas: Canvas },
}

/// One filter invocation in a layer's filter chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    /// Free-form options interpreted by the filter implementation.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(name: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Geometric placement of a layer: translation, scale, rotation, flips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerTransform {
    /// Translation in canvas pixels.
    pub tx: f64,
    pub ty: f64,
    /// Scale factors, 1.0 = natural size.
    pub sx: f64,
    pub sy: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl LayerTransform {
    /// No translation, scale 1, no rotation, no flips.
    pub fn identity() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            sx: 1.0,
            sy: 1.0,
            rotation: 0.0,
            flip_h: false,
            flip_v: false,
        }
    }

    /// Whether the scale/rotate/flip group is a no-op (translation aside).
    pub fn is_plain_translation(&self) -> bool {
        self.sx == 1.0 && self.sy == 1.0 && self.rotation == 0.0 && !self.flip_h && !self.flip_v
    }
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A layer in a canvas — one visual element with content, transform,
/// opacity, blend mode, optional mask, and an optional filter chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// The visual content this layer renders.
    pub content: LayerContent,
    /// Opacity in [0, 1].
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Blend mode name used when compositing onto the layers below.
    #[serde(default = "default_blend_mode")]
    pub blend_mode: String,
    /// Geometric placement.
    #[serde(default)]
    pub transform: LayerTransform,
    /// Optional mask canvas; its grayscale render modulates this layer's
    /// alpha. `None` (or a mask with zero layers) means "no mask".
    #[serde(default)]
    pub mask: Option<Canvas>,
    /// Ordered filter chain; empty = identity.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// Optional size override for fills and gradients (defaults to the
    /// owning canvas's size).
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_blend_mode() -> String {
    BLEND_SOURCE_OVER.to_string()
}

impl Layer {
    /// Create a layer with default transform, full opacity, and the
    /// default blend mode.
    pub fn new(content: LayerContent) -> Self {
        Self {
            content,
            opacity: 1.0,
            blend_mode: BLEND_SOURCE_OVER.to_string(),
            transform: LayerTransform::identity(),
            mask: None,
            filters: Vec::new(),
            width: None,
            height: None,
        }
    }

    /// Shorthand for a solid color fill.
    pub fn fill(color: Color) -> Self {
        Self::new(LayerContent::SolidFill { color })
    }

    /// Builder: set opacity (clamped to [0, 1]).
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the blend mode name.
    pub fn with_blend_mode(mut self, mode: impl Into<String>) -> Self {
        self.blend_mode = mode.into();
        self
    }

    /// Builder: set translation.
    pub fn with_translation(mut self, tx: f64, ty: f64) -> Self {
        self.transform.tx = tx;
        self.transform.ty = ty;
        self
    }

    /// Builder: set scale.
    pub fn with_scale(mut self, sx: f64, sy: f64) -> Self {
        self.transform.sx = sx;
        self.transform.sy = sy;
        self
    }

    /// Builder: set rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.transform.rotation = degrees;
        self
    }

    /// Builder: set horizontal/vertical flips.
    pub fn with_flip(mut self, flip_h: bool, flip_v: bool) -> Self {
        self.transform.flip_h = flip_h;
        self.transform.flip_v = flip_v;
        self
    }

    /// Builder: attach a mask canvas.
    pub fn with_mask(mut self, mask: Canvas) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Builder: append a filter to the chain.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    /// Builder: override the natural size for fills and gradients.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
