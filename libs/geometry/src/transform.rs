//! Complex transformations: magnification, rotation, mirroring and displacement.

use serde::{Deserialize, Serialize};

use crate::cos_sin_deg;
use crate::point::{Point, Vector};

/// A transformation `p' = disp + mag * R(rot) * M(mirror) * p`.
///
/// `M` reflects across the x-axis and is applied first, followed by the
/// counterclockwise rotation `R` (in degrees), magnification, and finally the
/// displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    mag: f64,
    rot: f64,
    mirror: bool,
    disp: Vector,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

/// A geometric object that can be transformed.
pub trait Transform: Sized {
    /// Returns a transformed copy of `self`.
    fn transform(&self, trans: Transformation) -> Self;
}

impl<T: Transform> Transform for Vec<T> {
    fn transform(&self, trans: Transformation) -> Self {
        self.iter().map(|item| item.transform(trans)).collect()
    }
}

impl Transformation {
    /// Returns the identity transform, leaving any transformed object unmodified.
    pub const fn identity() -> Self {
        Self {
            mag: 1.,
            rot: 0.,
            mirror: false,
            disp: Vector::zero(),
        }
    }

    /// Creates a transformation from its components.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let trans = Transformation::new(2., 90., false, Vector::new(10., 0.));
    /// assert_eq!(trans.apply_point(Point::new(1., 0.)), Point::new(10., 2.));
    /// ```
    pub fn new(mag: f64, rot: f64, mirror: bool, disp: Vector) -> Self {
        Self {
            mag,
            rot: crate::wrap_angle(rot),
            mirror,
            disp,
        }
    }

    /// A pure translation.
    pub fn translate(disp: impl Into<Vector>) -> Self {
        Self {
            disp: disp.into(),
            ..Self::identity()
        }
    }

    /// A pure counterclockwise rotation about the origin, in degrees.
    pub fn rotate(rot: f64) -> Self {
        Self::new(1., rot, false, Vector::zero())
    }

    /// A rotation by `rot` degrees followed by a translation to `origin`.
    pub fn rotate_about_origin_then_move(rot: f64, origin: Point) -> Self {
        Self::new(1., rot, false, origin.to_vector())
    }

    /// The magnification.
    #[inline]
    pub fn mag(&self) -> f64 {
        self.mag
    }

    /// The rotation angle in degrees, within `[0, 360)`.
    #[inline]
    pub fn rot(&self) -> f64 {
        self.rot
    }

    /// Whether the transformation mirrors across the x-axis before rotating.
    #[inline]
    pub fn is_mirror(&self) -> bool {
        self.mirror
    }

    /// The displacement applied last.
    #[inline]
    pub fn disp(&self) -> Vector {
        self.disp
    }

    /// Applies the linear part (no displacement) to a vector.
    pub fn apply_vector(&self, v: Vector) -> Vector {
        let y = if self.mirror { -v.y } else { v.y };
        let (c, s) = cos_sin_deg(self.rot);
        Vector::new(self.mag * (c * v.x - s * y), self.mag * (s * v.x + c * y))
    }

    /// Applies the full transformation to a point.
    pub fn apply_point(&self, p: Point) -> Point {
        self.apply_vector(p.to_vector()).to_point() + self.disp
    }

    /// Returns the transformation applying `inner` first and then `outer`.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let outer = Transformation::translate((5., 0.));
    /// let inner = Transformation::rotate(90.);
    /// let p = Point::new(1., 0.);
    /// let cascaded = Transformation::cascade(outer, inner);
    /// assert_eq!(cascaded.apply_point(p), outer.apply_point(inner.apply_point(p)));
    /// ```
    pub fn cascade(outer: Transformation, inner: Transformation) -> Transformation {
        let rot = if outer.mirror {
            outer.rot - inner.rot
        } else {
            outer.rot + inner.rot
        };
        Transformation::new(
            outer.mag * inner.mag,
            rot,
            outer.mirror ^ inner.mirror,
            outer.apply_vector(inner.disp) + outer.disp,
        )
    }

    /// The inverse transformation.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let trans = Transformation::new(3., 30., true, Vector::new(5., -2.));
    /// let p = Point::new(1.5, 2.5);
    /// let back = trans.inverse().apply_point(trans.apply_point(p));
    /// assert!(back.approx_eq(p, 1e-9));
    /// ```
    pub fn inverse(&self) -> Transformation {
        let rot = if self.mirror { self.rot } else { -self.rot };
        let lin = Transformation::new(1. / self.mag, rot, self.mirror, Vector::zero());
        let disp = -lin.apply_vector(self.disp);
        Transformation { disp, ..lin }
    }
}

impl std::ops::Mul<Transformation> for Transformation {
    type Output = Transformation;

    /// Composition, with the right-hand side applied first.
    fn mul(self, rhs: Transformation) -> Self::Output {
        Transformation::cascade(self, rhs)
    }
}

impl std::ops::Mul<Point> for Transformation {
    type Output = Point;
    fn mul(self, rhs: Point) -> Self::Output {
        self.apply_point(rhs)
    }
}

impl std::ops::Mul<Vector> for Transformation {
    type Output = Vector;
    fn mul(self, rhs: Vector) -> Self::Output {
        self.apply_vector(rhs)
    }
}
