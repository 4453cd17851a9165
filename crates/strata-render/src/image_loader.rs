//! Image loading module.
//! Decodes PNG, JPEG, WebP, and other formats into raster buffers.

use std::path::Path;

use strata_core::{RasterBuffer, StrataError, StrataResult};

/// Load an image file and convert it to a raster buffer.
pub fn load_image(path: &Path) -> StrataResult<RasterBuffer> {
    let img = image::open(path)
        .map_err(|e| StrataError::source_load(format!("failed to decode image: {}", e), path))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut buf = RasterBuffer::new(width, height);
    buf.data = rgba.into_raw();
    Ok(buf)
}

/// Load an image from raw encoded bytes (e.g. an embedded asset).
pub fn load_image_from_bytes(data: &[u8]) -> StrataResult<RasterBuffer> {
    let img = image::load_from_memory(data)
        .map_err(|e| StrataError::source_load(format!("failed to decode image: {}", e), "<memory>"))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut buf = RasterBuffer::new(width, height);
    buf.data = rgba.into_raw();
    Ok(buf)
}
