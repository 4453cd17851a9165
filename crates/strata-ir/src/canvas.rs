use serde::{Deserialize, Serialize};

use crate::layer::Layer;

/// An ordered stack of layers plus pixel dimensions.
///
/// Index 0 is the bottommost layer. A canvas with zero layers renders to
/// "no image" — that is a defined outcome, not an error. Canvases nest:
/// a layer's content or mask may itself be a canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Canvas {
    /// Create an empty canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Append a layer on top of the stack.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Builder: append a layer on top of the stack.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
