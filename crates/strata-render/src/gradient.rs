//! Gradient geometry: derives the drawable form of a gradient spec —
//! axis endpoints or center/radius plus color stops — for a target size,
//! and paints it into a raster buffer.

use strata_core::{Color, Point2D, RasterBuffer};
use strata_ir::{GradientKind, GradientSpec};

/// One color stop on a gradient axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the axis in [0, 1].
    pub position: f64,
    pub color: Color,
}

/// The drawable form of a gradient for a concrete target size.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientGeometry {
    Linear {
        start: Point2D,
        end: Point2D,
        stops: [ColorStop; 2],
    },
    Radial {
        center: Point2D,
        radius: f64,
        stops: [ColorStop; 2],
    },
}

/// Compute the drawable geometry of a gradient over a `width` x `height`
/// surface.
///
/// Radial gradients center on the surface with radius `min(w, h) / 2`.
/// Linear gradients normalize the rotation into [0, 360) and derive the
/// axis endpoints by piecewise-linear interpolation across five angular
/// sectors; each sector sweeps one pair of surface edges into each other,
/// so at 0/45/135/225/315 degrees the endpoints land exactly on corners or
/// edge midpoints.
pub fn geometry(width: u32, height: u32, spec: &GradientSpec) -> GradientGeometry {
    let stops = [
        ColorStop { position: spec.spread, color: spec.start_color },
        ColorStop { position: 1.0, color: spec.end_color },
    ];
    let w = width as f64;
    let h = height as f64;

    match spec.kind {
        GradientKind::Radial => GradientGeometry::Radial {
            center: Point2D::new(w / 2.0, h / 2.0),
            radius: w.min(h) / 2.0,
            stops,
        },
        GradientKind::Linear => {
            let rot = spec.rotation.rem_euclid(360.0);
            let (x1, y1, x2, y2) = if rot < 45.0 {
                // Left edge sweeping from the vertical midpoint up to the
                // top-left corner; right edge mirrored.
                let y = h / 2.0 * (45.0 - rot) / 45.0;
                (0.0, y, w, h - y)
            } else if rot < 135.0 {
                let x = w * (rot - 45.0) / 90.0;
                (x, 0.0, w - x, h)
            } else if rot < 225.0 {
                let y = h * (rot - 135.0) / 90.0;
                (w, y, 0.0, h - y)
            } else if rot < 315.0 {
                let x = w * (1.0 - (rot - 225.0) / 90.0);
                (x, h, w - x, 0.0)
            } else {
                let y = h - h / 2.0 * (rot - 315.0) / 45.0;
                (0.0, y, w, h - y)
            };
            GradientGeometry::Linear {
                start: Point2D::new(x1, y1),
                end: Point2D::new(x2, y2),
                stops,
            }
        }
    }
}

/// Evaluate the two-stop ramp at axis position `t`.
fn ramp(stops: &[ColorStop; 2], t: f64) -> Color {
    let [start, end] = stops;
    if t <= start.position {
        return start.color;
    }
    if t >= end.position {
        return end.color;
    }
    let span = end.position - start.position;
    if span <= 0.0 {
        return end.color;
    }
    start
        .color
        .lerp(&end.color, ((t - start.position) / span) as f32)
}

/// Paint a gradient into a buffer using its derived geometry.
pub fn paint(buf: &mut RasterBuffer, spec: &GradientSpec) {
    let geom = geometry(buf.width, buf.height, spec);
    let width = buf.width as usize;

    match geom {
        GradientGeometry::Linear { start, end, stops } => {
            let axis_x = end.x - start.x;
            let axis_y = end.y - start.y;
            let len_sq = axis_x * axis_x + axis_y * axis_y;
            if len_sq <= 0.0 {
                buf.fill(&stops[1].color);
                return;
            }
            for (i, pixel) in buf.data.chunks_exact_mut(4).enumerate() {
                let x = (i % width) as f64 + 0.5;
                let y = (i / width) as f64 + 0.5;
                let t = ((x - start.x) * axis_x + (y - start.y) * axis_y) / len_sq;
                pixel.copy_from_slice(&ramp(&stops, t).to_rgba8());
            }
        }
        GradientGeometry::Radial { center, radius, stops } => {
            if radius <= 0.0 {
                buf.fill(&stops[1].color);
                return;
            }
            for (i, pixel) in buf.data.chunks_exact_mut(4).enumerate() {
                let x = (i % width) as f64 + 0.5;
                let y = (i / width) as f64 + 0.5;
                let t = ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt() / radius;
                pixel.copy_from_slice(&ramp(&stops, t).to_rgba8());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(rotation: f64) -> GradientSpec {
        GradientSpec::linear(Color::BLACK, Color::WHITE).with_rotation(rotation)
    }

    fn endpoints(rotation: f64, w: u32, h: u32) -> (Point2D, Point2D) {
        match geometry(w, h, &linear(rotation)) {
            GradientGeometry::Linear { start, end, .. } => (start, end),
            _ => panic!("expected linear geometry"),
        }
    }

    fn assert_close(p: Point2D, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-9, "x: {} vs {}", p.x, x);
        assert!((p.y - y).abs() < 1e-9, "y: {} vs {}", p.y, y);
    }

    #[test]
    fn test_linear_sector_boundaries_exact() {
        let (w, h) = (200u32, 100u32);

        // 0 degrees: left midpoint to right midpoint.
        let (s, e) = endpoints(0.0, w, h);
        assert_close(s, 0.0, 50.0);
        assert_close(e, 200.0, 50.0);

        // 45 degrees: top-left corner to bottom-right corner.
        let (s, e) = endpoints(45.0, w, h);
        assert_close(s, 0.0, 0.0);
        assert_close(e, 200.0, 100.0);

        // 135 degrees: top-right corner to bottom-left corner.
        let (s, e) = endpoints(135.0, w, h);
        assert_close(s, 200.0, 0.0);
        assert_close(e, 0.0, 100.0);

        // 225 degrees: bottom-right corner to top-left corner.
        let (s, e) = endpoints(225.0, w, h);
        assert_close(s, 200.0, 100.0);
        assert_close(e, 0.0, 0.0);

        // 315 degrees: bottom-left corner to top-right corner.
        let (s, e) = endpoints(315.0, w, h);
        assert_close(s, 0.0, 100.0);
        assert_close(e, 200.0, 0.0);
    }

    #[test]
    fn test_linear_sector_midpoints() {
        let (w, h) = (200u32, 100u32);

        // 90 degrees: top midpoint to bottom midpoint.
        let (s, e) = endpoints(90.0, w, h);
        assert_close(s, 100.0, 0.0);
        assert_close(e, 100.0, 100.0);

        // 180 degrees: right midpoint to left midpoint.
        let (s, e) = endpoints(180.0, w, h);
        assert_close(s, 200.0, 50.0);
        assert_close(e, 0.0, 50.0);

        // 270 degrees: bottom midpoint to top midpoint.
        let (s, e) = endpoints(270.0, w, h);
        assert_close(s, 100.0, 100.0);
        assert_close(e, 100.0, 0.0);
    }

    #[test]
    fn test_linear_rotation_periodicity() {
        for rot in [-90.0, 10.0, 100.0, 250.0, 359.0] {
            let (s1, e1) = endpoints(rot, 64, 64);
            let (s2, e2) = endpoints(rot + 360.0, 64, 64);
            assert_close(s1, s2.x, s2.y);
            assert_close(e1, e2.x, e2.y);
        }
    }

    #[test]
    fn test_radial_geometry() {
        let spec = GradientSpec::radial(Color::RED, Color::BLUE).with_spread(0.25);
        match geometry(100, 60, &spec) {
            GradientGeometry::Radial { center, radius, stops } => {
                assert_close(center, 50.0, 30.0);
                assert!((radius - 30.0).abs() < 1e-9);
                assert_eq!(stops[0].position, 0.25);
                assert_eq!(stops[0].color, Color::RED);
                assert_eq!(stops[1].position, 1.0);
                assert_eq!(stops[1].color, Color::BLUE);
            }
            _ => panic!("expected radial geometry"),
        }
    }

    #[test]
    fn test_paint_linear_horizontal_ramp() {
        let mut buf = RasterBuffer::new(100, 10);
        paint(&mut buf, &linear(0.0));
        let left = buf.get_pixel(0, 5).unwrap();
        let right = buf.get_pixel(99, 5).unwrap();
        assert!(left[0] < 5);
        assert!(right[0] > 250);
        // Monotonic along the axis.
        let mid = buf.get_pixel(50, 5).unwrap();
        assert!(left[0] < mid[0] && mid[0] < right[0]);
        // Constant down a column.
        assert_eq!(buf.get_pixel(50, 0), buf.get_pixel(50, 9));
    }

    #[test]
    fn test_paint_respects_spread() {
        let mut buf = RasterBuffer::new(100, 1);
        let spec = linear(0.0).with_spread(0.5);
        paint(&mut buf, &spec);
        // The first half of the axis stays at the start color.
        assert_eq!(buf.get_pixel(0, 0).unwrap()[0], 0);
        assert_eq!(buf.get_pixel(40, 0).unwrap()[0], 0);
        assert!(buf.get_pixel(99, 0).unwrap()[0] > 250);
    }

    #[test]
    fn test_paint_radial_center_vs_edge() {
        let mut buf = RasterBuffer::new(50, 50);
        paint(&mut buf, &GradientSpec::radial(Color::WHITE, Color::BLACK));
        let center = buf.get_pixel(25, 25).unwrap();
        let corner = buf.get_pixel(0, 0).unwrap();
        assert!(center[0] > 240);
        assert_eq!(corner[0], 0);
    }
}
