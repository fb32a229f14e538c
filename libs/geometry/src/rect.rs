//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::point::{Point, Vector};
use crate::polygon::Polygon;

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    /// The lower-left corner.
    p0: Point,
    /// The upper-right corner.
    p1: Point,
}

impl Rect {
    /// Creates a rectangle spanning the two given corners, in any order.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::new(Point::new(220., 220.), Point::new(-220., -220.));
    /// assert_eq!(rect.left(), -220.);
    /// assert_eq!(rect.top(), 220.);
    /// ```
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            p0: Point::new(a.x.min(b.x), a.y.min(b.y)),
            p1: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a rectangle from its left, bottom, right and top coordinates.
    pub fn from_sides(left: f64, bot: f64, right: f64, top: f64) -> Self {
        Self::new(Point::new(left, bot), Point::new(right, top))
    }

    /// Creates a rectangle of the given dimensions centred on `center`.
    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        let half = Vector::new(width / 2., height / 2.);
        Self::new(center - half, center + half)
    }

    /// The lower-left corner.
    #[inline]
    pub fn p0(&self) -> Point {
        self.p0
    }

    /// The upper-right corner.
    #[inline]
    pub fn p1(&self) -> Point {
        self.p1
    }

    /// The left edge coordinate.
    #[inline]
    pub fn left(&self) -> f64 {
        self.p0.x
    }

    /// The bottom edge coordinate.
    #[inline]
    pub fn bot(&self) -> f64 {
        self.p0.y
    }

    /// The right edge coordinate.
    #[inline]
    pub fn right(&self) -> f64 {
        self.p1.x
    }

    /// The top edge coordinate.
    #[inline]
    pub fn top(&self) -> f64 {
        self.p1.y
    }

    /// The horizontal extent.
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    /// The vertical extent.
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }

    /// The center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }

    /// The area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Grows the rectangle by `d` on every side. Negative values shrink it.
    pub fn enlarged(&self, d: f64) -> Self {
        Self::from_sides(self.left() - d, self.bot() - d, self.right() + d, self.top() + d)
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Self {
        Self::from_sides(
            self.left().min(other.left()),
            self.bot().min(other.bot()),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }

    /// Whether the closed rectangles overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.bot() <= other.top()
            && other.bot() <= self.top()
    }

    /// Whether the point lies within the closed rectangle.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bot() && p.y <= self.top()
    }

    /// The rectangle's corners, counterclockwise from the lower left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// Converts the rectangle into a four-vertex polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }
}

impl Bbox for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl Bbox for Point {
    fn bbox(&self) -> Option<Rect> {
        Some(Rect::new(*self, *self))
    }
}
