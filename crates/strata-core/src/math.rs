use serde::{Deserialize, Serialize};

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Linear interpolation between two points.
    pub fn lerp(&self, other: &Point2D, t: f64) -> Point2D {
        Point2D {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::zero()
    }
}

/// A 2D affine transform in the canvas convention:
///
/// ```text
/// x' = a*x + c*y + tx
/// y' = b*x + d*y + ty
/// ```
///
/// Transforms compose with [`Affine2D::then`]: `t1.then(t2)` applies `t1`
/// first, then `t2`. Rotation is clockwise-positive in a y-down coordinate
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Affine2D {
    /// The identity transform.
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 }
    }

    /// A pure translation.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self { tx, ty, ..Self::identity() }
    }

    /// A scale about the origin.
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::identity() }
    }

    /// A rotation about the origin, in degrees.
    pub fn rotation_deg(degrees: f64) -> Self {
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, tx: 0.0, ty: 0.0 }
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Affine2D) -> Affine2D {
        Affine2D {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            tx: next.a * self.tx + next.c * self.ty + next.tx,
            ty: next.b * self.tx + next.d * self.ty + next.ty,
        }
    }

    /// Map a point through the transform.
    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D {
            x: self.a * p.x + self.c * p.y + self.tx,
            y: self.b * p.x + self.d * p.y + self.ty,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Invert the transform. Returns `None` for a degenerate (zero-area)
    /// transform.
    pub fn invert(&self) -> Option<Affine2D> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        Some(Affine2D {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + c * self.ty),
            ty: -(b * self.tx + d * self.ty),
        })
    }

    /// Whether this transform is a whole-pixel translation (no scale,
    /// rotation, or shear, and integer offsets).
    pub fn is_integer_translation(&self) -> bool {
        self.a == 1.0
            && self.b == 0.0
            && self.c == 0.0
            && self.d == 1.0
            && self.tx.fract() == 0.0
            && self.ty.fract() == 0.0
    }
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// An integer-rounded, axis-aligned rectangle.
///
/// Width and height are always non-negative; an empty rectangle has zero
/// area but is not an error anywhere in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// The rectangle covering a full `width` x `height` surface.
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect two rectangles. The result is commutative and its
    /// dimensions are clamped to zero when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let width = (self.right().min(other.right()) - x as i64).max(0) as u32;
        let height = (self.bottom().min(other.bottom()) - y as i64).max(0) as u32;
        Rect { x, y, width, height }
    }

    /// Round float extents into a `Rect`: the origin rounds to nearest, the
    /// size rounds up to the next integer. Negative extents collapse to an
    /// empty rectangle.
    pub fn from_extents(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Rect {
        Rect {
            x: min_x.round() as i32,
            y: min_y.round() as i32,
            width: (max_x - min_x).max(0.0).ceil() as u32,
            height: (max_y - min_y).max(0.0).ceil() as u32,
        }
    }
}
