use serde::{Deserialize, Serialize};

use crate::math::Rect;

/// A raster image as a raw RGBA8 pixel buffer (4 bytes per pixel,
/// non-premultiplied, row-major).
///
/// Buffers are produced fresh per pipeline stage and are never shared
/// mutably between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterBuffer {
    /// Raw pixel data, `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RasterBuffer {
    /// Create a buffer filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width as usize) * (height as usize) * 4],
            width,
            height,
        }
    }

    /// Create a buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &crate::Color) -> Self {
        let mut buf = Self::new(width, height);
        buf.fill(color);
        buf
    }

    /// Fill the whole buffer with one color.
    pub fn fill(&mut self, color: &crate::Color) {
        let pixel = color.to_rgba8();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Total byte size of the pixel data.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// The RGBA value at a pixel coordinate, or `None` if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[offset..offset + 4].copy_from_slice(&rgba);
    }

    /// Copy the pixels covered by `rect` into a tightly packed RGBA vector.
    /// Pixels outside the buffer read as transparent black.
    pub fn read_region(&self, rect: &Rect) -> Vec<u8> {
        let mut out = vec![0u8; (rect.width as usize) * (rect.height as usize) * 4];
        let out_stride = rect.width as usize * 4;
        for row in 0..rect.height as i64 {
            let src_y = rect.y as i64 + row;
            if src_y < 0 || src_y >= self.height as i64 {
                continue;
            }
            for col in 0..rect.width as i64 {
                let src_x = rect.x as i64 + col;
                if src_x < 0 || src_x >= self.width as i64 {
                    continue;
                }
                let src = ((src_y as usize) * (self.width as usize) + (src_x as usize)) * 4;
                let dst = (row as usize) * out_stride + (col as usize) * 4;
                out[dst..dst + 4].copy_from_slice(&self.data[src..src + 4]);
            }
        }
        out
    }

    /// Overwrite the pixels covered by `rect` from a tightly packed RGBA
    /// slice. Pixels falling outside the buffer are dropped.
    pub fn write_region(&mut self, rect: &Rect, pixels: &[u8]) {
        let in_stride = rect.width as usize * 4;
        for row in 0..rect.height as i64 {
            let dst_y = rect.y as i64 + row;
            if dst_y < 0 || dst_y >= self.height as i64 {
                continue;
            }
            for col in 0..rect.width as i64 {
                let dst_x = rect.x as i64 + col;
                if dst_x < 0 || dst_x >= self.width as i64 {
                    continue;
                }
                let src = (row as usize) * in_stride + (col as usize) * 4;
                let dst = ((dst_y as usize) * (self.width as usize) + (dst_x as usize)) * 4;
                self.data[dst..dst + 4].copy_from_slice(&pixels[src..src + 4]);
            }
        }
    }

    /// Alpha-composite `src` over `self` at position (dx, dy), Porter-Duff
    /// "over" in integer math. Rows are clipped to the destination.
    pub fn composite_over(&mut self, src: &RasterBuffer, dx: i32, dy: i32) {
        let dst_width = self.width as i32;
        let dst_height = self.height as i32;

        let start_y = if dy < 0 { -dy } else { 0 };
        let end_y = (src.height as i32).min(dst_height - dy);
        let start_x = if dx < 0 { -dx } else { 0 };
        let end_x = (src.width as i32).min(dst_width - dx);

        if start_x >= end_x || start_y >= end_y {
            return;
        }

        let src_stride = src.stride();
        let dst_stride = self.stride();

        for sy in start_y..end_y {
            let dst_y = (dy + sy) as usize;
            let src_row = (sy as usize * src_stride) + (start_x as usize * 4);
            let dst_row = (dst_y * dst_stride) + ((dx + start_x) as usize * 4);
            let len = (end_x - start_x) as usize * 4;

            let src_slice = &src.data[src_row..src_row + len];
            let dst_slice = &mut self.data[dst_row..dst_row + len];

            for (s, d) in src_slice.chunks_exact(4).zip(dst_slice.chunks_exact_mut(4)) {
                let sa = s[3] as u32;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    d.copy_from_slice(s);
                    continue;
                }

                let da = d[3] as u32;
                let inv_sa = 255 - sa;
                let out_a = sa + (da * inv_sa) / 255;
                if out_a == 0 {
                    continue;
                }

                for ch in 0..3 {
                    let sc = s[ch] as u32;
                    let dc = d[ch] as u32;
                    d[ch] = ((sc * sa * 255 + dc * da * inv_sa) / (out_a * 255)) as u8;
                }
                d[3] = out_a as u8;
            }
        }
    }
}
