//! 2-D points and displacement vectors.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::cos_sin_deg;
use crate::transform::{Transform, Transformation};

/// A point in two-dimensional space, in micrometres.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Point {
    /// The x-coordinate of the point.
    pub x: f64,
    /// The y-coordinate of the point.
    pub y: f64,
}

/// A displacement in two-dimensional space, in micrometres.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Vector {
    /// The x-component.
    pub x: f64,
    /// The y-component.
    pub y: f64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, `(0, 0)`.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let origin = Point::zero();
    /// assert_eq!(origin, Point::new(0., 0.));
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0., y: 0. }
    }

    /// The Euclidean distance to `other`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Point::new(0., 0.).distance(Point::new(3., 4.)), 5.);
    /// ```
    pub fn distance(&self, other: Point) -> f64 {
        (other - *self).length()
    }

    /// The vector from the origin to this point.
    #[inline]
    pub const fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Whether the two points coincide within `tol`.
    pub fn approx_eq(&self, other: Point, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol && (self.y - other.y).abs() <= tol
    }
}

impl Vector {
    /// Creates a new [`Vector`].
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The zero vector.
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0., y: 0. }
    }

    /// A unit vector pointing at `angle` degrees from the positive x-axis.
    pub fn from_angle_deg(angle: f64) -> Self {
        let (c, s) = cos_sin_deg(angle);
        Self::new(c, s)
    }

    /// The Euclidean length.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// This vector scaled to unit length.
    ///
    /// The zero vector is returned unchanged.
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0. {
            *self
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// The vector rotated by +90 degrees.
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// The angle of this vector from the positive x-axis, in degrees within `[0, 360)`.
    pub fn angle_deg(&self) -> f64 {
        crate::wrap_angle(self.y.atan2(self.x).to_degrees())
    }

    /// Dot product.
    pub fn dot(&self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The z-component of the cross product.
    pub fn cross(&self, other: Vector) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// The point at this displacement from the origin.
    #[inline]
    pub const fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Transform for Point {
    fn transform(&self, trans: Transformation) -> Self {
        trans.apply_point(*self)
    }
}

impl Transform for Vector {
    fn transform(&self, trans: Transformation) -> Self {
        trans.apply_vector(*self)
    }
}

impl Add<Vector> for Point {
    type Output = Point;
    fn add(self, rhs: Vector) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub<Vector> for Point {
    type Output = Point;
    fn sub(self, rhs: Vector) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign<Vector> for Point {
    fn sub_assign(&mut self, rhs: Vector) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Sub<Point> for Point {
    type Output = Vector;
    fn sub(self, rhs: Point) -> Self::Output {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Self::Output {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub<Vector> for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Self::Output {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Self::Output {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Self::Output {
        Vector::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<(f64, f64)> for Vector {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<Vector> for Point {
    fn from(value: Vector) -> Self {
        value.to_point()
    }
}

impl From<Point> for Vector {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}
