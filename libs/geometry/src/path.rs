//! Wires of constant width.

use serde::{Deserialize, Serialize};

use crate::point::{Point, Vector};
use crate::polygon::Polygon;
use crate::EPSILON;

/// Below this cosine of the half turn angle, joins are bevelled instead of mitred.
const MITER_LIMIT_COS: f64 = 0.25;

/// A centre line with a width and optional end extensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
    width: f64,
    bgn_ext: f64,
    end_ext: f64,
}

impl Path {
    /// Creates a path with flush ends.
    pub fn new(points: Vec<Point>, width: f64) -> Self {
        Self {
            points,
            width,
            bgn_ext: 0.,
            end_ext: 0.,
        }
    }

    /// Extends the path beyond its first and last points.
    pub fn with_extensions(mut self, bgn_ext: f64, end_ext: f64) -> Self {
        self.bgn_ext = bgn_ext;
        self.end_ext = end_ext;
        self
    }

    /// The centre line vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The path width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The length of the centre line, including extensions.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum::<f64>()
            + self.bgn_ext
            + self.end_ext
    }

    /// The outline of the path with mitred joins.
    ///
    /// Returns `None` if the centre line has fewer than two distinct points
    /// or the width is not positive.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let path = Path::new(vec![Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.)], 2.);
    /// let poly = path.polygon().unwrap();
    /// assert!((poly.area() - 40.).abs() < 1e-9);
    /// ```
    pub fn polygon(&self) -> Option<Polygon> {
        let mut pts = self.points.clone();
        pts.dedup_by(|a, b| a.distance(*b) < EPSILON);
        if pts.len() < 2 || self.width <= 0. {
            return None;
        }
        let last = pts.len() - 1;
        let d_first = (pts[1] - pts[0]).normalized();
        let d_last = (pts[last] - pts[last - 1]).normalized();
        pts[0] -= d_first * self.bgn_ext;
        pts[last] += d_last * self.end_ext;

        let hw = self.width / 2.;
        let mut left = Vec::with_capacity(pts.len() + 2);
        let mut right = Vec::with_capacity(pts.len() + 2);
        for i in 0..pts.len() {
            let n_in = (i > 0).then(|| (pts[i] - pts[i - 1]).normalized().perpendicular());
            let n_out = (i < last).then(|| (pts[i + 1] - pts[i]).normalized().perpendicular());
            match (n_in, n_out) {
                (Some(n1), Some(n2)) => join(pts[i], n1, n2, hw, &mut left, &mut right),
                (Some(n), None) | (None, Some(n)) => {
                    left.push(pts[i] + n * hw);
                    right.push(pts[i] - n * hw);
                }
                (None, None) => unreachable!("path has at least two points"),
            }
        }
        right.reverse();
        left.extend(right);
        Some(Polygon::new(left))
    }
}

fn join(p: Point, n1: Vector, n2: Vector, hw: f64, left: &mut Vec<Point>, right: &mut Vec<Point>) {
    let bisector = (n1 + n2).normalized();
    let cos_half = bisector.dot(n1);
    if cos_half < MITER_LIMIT_COS {
        left.extend([p + n1 * hw, p + n2 * hw]);
        right.extend([p - n1 * hw, p - n2 * hw]);
    } else {
        let m = bisector * (hw / cos_half);
        left.push(p + m);
        right.push(p - m);
    }
}
