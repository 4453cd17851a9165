//! # strata-ir
//!
//! The Strata document model: an ordered stack of layers plus pixel
//! dimensions, the unit of composition. A canvas document is plain data —
//! fully serializable, with no rendering state — and is consumed by
//! `strata-render` to produce a flattened raster.

pub mod canvas;
pub mod gradient;
pub mod layer;

pub use canvas::Canvas;
pub use gradient::{GradientKind, GradientSpec};
pub use layer::{FilterSpec, ImageData, Layer, LayerContent, LayerTransform};
