//! # strata-core
//!
//! Core types and primitives for the Strata compositing engine.
//! This crate contains the foundational types shared across all Strata
//! crates: raster buffers, colors, affine math, rectangles, content
//! hashing, and error types.

pub mod color;
pub mod error;
pub mod hash;
pub mod math;
pub mod raster;

pub use color::Color;
pub use error::{StrataError, StrataResult};
pub use hash::ContentHash;
pub use math::{Affine2D, Point2D, Rect};
pub use raster::RasterBuffer;
