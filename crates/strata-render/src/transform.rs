//! The transform engine: per-layer affine placement and on-canvas
//! bounding rectangles.
//!
//! Two closely related transforms exist for each layer:
//!
//! * the **placement transform** used for drawing, which translates by
//!   (tx, ty) and then applies the rotate/scale/flip group pivoted on the
//!   canvas center;
//! * the **bounds transform** used for the bounding rectangle, which pivots
//!   the same group on the layer's own center after the centering offset.
//!
//! The bounding rectangle clamps all per-layer raster work to the canvas,
//! so pixels outside it are never extracted or blended.

use strata_core::{Affine2D, Point2D, Rect};
use strata_ir::LayerTransform;

/// Effective scale factors with flips folded in as negative axes.
fn flipped_scale(t: &LayerTransform) -> (f64, f64) {
    let sx = if t.flip_h { -t.sx } else { t.sx };
    let sy = if t.flip_v { -t.sy } else { t.sy };
    (sx, sy)
}

/// The rotate/scale/flip group pivoted about `pivot`. Scale applies before
/// rotation.
fn pivot_group(t: &LayerTransform, pivot: Point2D) -> Affine2D {
    let (sx, sy) = flipped_scale(t);
    Affine2D::translation(-pivot.x, -pivot.y)
        .then(&Affine2D::scaling(sx, sy))
        .then(&Affine2D::rotation_deg(t.rotation))
        .then(&Affine2D::translation(pivot.x, pivot.y))
}

/// The layer's placement transform on a canvas of the given size:
/// translation first, then (when non-identity) the pivot group about the
/// canvas center.
pub fn placement_transform(t: &LayerTransform, canvas_w: u32, canvas_h: u32) -> Affine2D {
    let translate = Affine2D::translation(t.tx, t.ty);
    if t.is_plain_translation() {
        return translate;
    }
    let center = Point2D::new(canvas_w as f64 / 2.0, canvas_h as f64 / 2.0);
    translate.then(&pivot_group(t, center))
}

/// The full source-space to canvas-space transform for drawing a raster of
/// the given natural size: the centering offset followed by the placement
/// transform.
pub fn draw_transform(
    t: &LayerTransform,
    raster_w: u32,
    raster_h: u32,
    canvas_w: u32,
    canvas_h: u32,
) -> Affine2D {
    let offset = centering_offset(raster_w, raster_h, canvas_w, canvas_h);
    Affine2D::translation(offset.x, offset.y).then(&placement_transform(t, canvas_w, canvas_h))
}

/// The draw offset centering a raster's natural size on the canvas.
pub fn centering_offset(raster_w: u32, raster_h: u32, canvas_w: u32, canvas_h: u32) -> Point2D {
    Point2D::new(
        (canvas_w as f64 - raster_w as f64) / 2.0,
        (canvas_h as f64 - raster_h as f64) / 2.0,
    )
}

/// The minimal on-canvas bounding rectangle of a transformed layer.
///
/// The four corners of the untransformed raster are mapped through the
/// bounds transform (centering offset + translation, with the pivot on the
/// raster center), the axis-aligned extents are intersected with the canvas
/// bounds in float space (clamping to non-negative size), and the result is
/// rounded: origin to nearest, size up.
pub fn bounding_rect(
    t: &LayerTransform,
    raster_w: u32,
    raster_h: u32,
    canvas_w: u32,
    canvas_h: u32,
) -> Rect {
    let w = raster_w as f64;
    let h = raster_h as f64;
    let offset = centering_offset(raster_w, raster_h, canvas_w, canvas_h);

    let local = if t.is_plain_translation() {
        Affine2D::identity()
    } else {
        pivot_group(t, Point2D::new(w / 2.0, h / 2.0))
    };
    let m = local.then(&Affine2D::translation(offset.x + t.tx, offset.y + t.ty));

    let corners = [
        m.apply(Point2D::new(0.0, 0.0)),
        m.apply(Point2D::new(w, 0.0)),
        m.apply(Point2D::new(w, h)),
        m.apply(Point2D::new(0.0, h)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    // Intersect with the canvas in float space before rounding.
    let ix = min_x.max(0.0);
    let iy = min_y.max(0.0);
    let ir = max_x.min(canvas_w as f64);
    let ib = max_y.min(canvas_h as f64);

    Rect::from_extents(ix, iy, ir, ib)
}
