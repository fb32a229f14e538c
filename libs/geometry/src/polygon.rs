//! Polygons with optional holes.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::bbox::Bbox;
use crate::error::{Error, Result};
use crate::point::{Point, Vector};
use crate::rect::Rect;
use crate::transform::{Transform, Transformation};
use crate::EPSILON;

/// A simple polygon hull with zero or more holes.
///
/// The hull is stored counterclockwise and holes clockwise, so the filled
/// interior always lies to the left of every edge.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    hull: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

impl Polygon {
    /// Creates a polygon with the given hull vertices.
    ///
    /// Consecutive duplicates and an explicit closing vertex are removed, and the
    /// winding is normalised to counterclockwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let tri = Polygon::new(vec![
    ///     Point::new(0., 0.),
    ///     Point::new(0., 4.),
    ///     Point::new(3., 0.),
    /// ]);
    /// assert_eq!(tri.area(), 6.);
    /// ```
    pub fn new(hull: Vec<Point>) -> Self {
        Self {
            hull: oriented(clean_contour(hull), true),
            holes: Vec::new(),
        }
    }

    /// Creates a polygon with holes.
    pub fn with_holes(hull: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            hull: oriented(clean_contour(hull), true),
            holes: holes
                .into_iter()
                .map(|h| oriented(clean_contour(h), false))
                .filter(|h| h.len() >= 3)
                .collect(),
        }
    }

    /// Creates a rectangular polygon.
    pub fn from_rect(rect: Rect) -> Self {
        rect.to_polygon()
    }

    /// The hull vertices, counterclockwise.
    pub fn hull(&self) -> &[Point] {
        &self.hull
    }

    /// The hole contours, each clockwise.
    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    /// Iterates over the hull followed by every hole.
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.hull.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// The total number of vertices over all contours.
    pub fn num_points(&self) -> usize {
        self.contours().map(<[Point]>::len).sum()
    }

    /// The filled area (hull minus holes).
    pub fn area(&self) -> f64 {
        self.contours().map(signed_area).sum()
    }

    /// The summed length of all contour edges.
    pub fn perimeter(&self) -> f64 {
        self.contours()
            .map(|c| edges(c).map(|(a, b)| a.distance(b)).sum::<f64>())
            .sum()
    }

    /// Whether `p` lies strictly inside the filled area.
    ///
    /// Points exactly on an edge may be reported either way.
    pub fn contains(&self, p: Point) -> bool {
        point_in_contour(p, &self.hull) && !self.holes.iter().any(|h| point_in_contour(p, h))
    }

    /// Returns a copy with every corner replaced by a circular arc.
    ///
    /// Convex corners get radius `r_outer`, concave corners radius `r_inner`.
    /// `n` is the number of points per full circle. Radii are reduced where
    /// adjacent edges are too short to hold the full arc.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let square = Polygon::from_rect(Rect::from_sides(0., 0., 10., 10.));
    /// let rounded = square.round_corners(0., 2., 64).unwrap();
    /// assert!(rounded.area() < 100.);
    /// assert!(rounded.hull().len() > 4);
    /// ```
    pub fn round_corners(&self, r_inner: f64, r_outer: f64, n: usize) -> Result<Self> {
        for r in [r_inner, r_outer] {
            if !r.is_finite() || r < 0. {
                return Err(Error::InvalidRadius(r));
            }
        }
        Ok(Self {
            hull: round_contour(&self.hull, r_inner, r_outer, n),
            holes: self
                .holes
                .iter()
                .map(|h| round_contour(h, r_inner, r_outer, n))
                .collect(),
        })
    }
}

impl Bbox for Polygon {
    fn bbox(&self) -> Option<Rect> {
        self.hull.bbox()
    }
}

impl Transform for Polygon {
    fn transform(&self, trans: Transformation) -> Self {
        let map = |c: &Vec<Point>| {
            let mut pts: Vec<Point> = c.iter().map(|p| trans.apply_point(*p)).collect();
            if trans.is_mirror() {
                pts.reverse();
            }
            pts
        };
        Self {
            hull: map(&self.hull),
            holes: self.holes.iter().map(map).collect(),
        }
    }
}

impl From<Rect> for Polygon {
    fn from(value: Rect) -> Self {
        value.to_polygon()
    }
}

/// Iterates over the closed edges of a contour.
pub(crate) fn edges(contour: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = contour.len();
    (0..n).map(move |i| (contour[i], contour[(i + 1) % n]))
}

/// Shoelace area, positive for counterclockwise contours.
pub fn signed_area(contour: &[Point]) -> f64 {
    if contour.len() < 3 {
        return 0.;
    }
    edges(contour).map(|(a, b)| a.x * b.y - b.x * a.y).sum::<f64>() * 0.5
}

/// Even-odd ray cast test.
pub fn point_in_contour(p: Point, contour: &[Point]) -> bool {
    let mut inside = false;
    for (a, b) in edges(contour) {
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

fn clean_contour(mut pts: Vec<Point>) -> Vec<Point> {
    pts.dedup_by(|a, b| a.approx_eq(*b, EPSILON));
    while pts.len() > 1 && pts[0].approx_eq(pts[pts.len() - 1], EPSILON) {
        pts.pop();
    }
    pts
}

fn oriented(mut pts: Vec<Point>, ccw: bool) -> Vec<Point> {
    if (signed_area(&pts) > 0.) != ccw && pts.len() >= 3 {
        pts.reverse();
    }
    pts
}

fn round_contour(contour: &[Point], r_inner: f64, r_outer: f64, n: usize) -> Vec<Point> {
    let len = contour.len();
    if len < 3 {
        return contour.to_vec();
    }
    let mut out = Vec::with_capacity(len * 4);
    for i in 0..len {
        let prev = contour[(i + len - 1) % len];
        let p = contour[i];
        let next = contour[(i + 1) % len];
        let d_in = p - prev;
        let d_out = next - p;
        let (l_in, l_out) = (d_in.length(), d_out.length());
        if l_in < EPSILON || l_out < EPSILON {
            out.push(p);
            continue;
        }
        let (u_in, u_out) = (d_in * (1. / l_in), d_out * (1. / l_out));
        let cross = u_in.cross(u_out);
        let theta = cross.atan2(u_in.dot(u_out)).abs();
        let r = if cross > 0. { r_outer } else { r_inner };
        if r <= 0. || theta < 1e-9 {
            out.push(p);
            continue;
        }
        let half_tan = (theta / 2.).tan();
        let t = (r * half_tan).min(l_in / 2.).min(l_out / 2.);
        let r_eff = t / half_tan;
        let start = p - u_in * t;
        let normal = if cross > 0. {
            u_in.perpendicular()
        } else {
            -u_in.perpendicular()
        };
        let center = start + normal * r_eff;
        let a0 = (start - center).y.atan2((start - center).x);
        let sweep = if cross > 0. { theta } else { -theta };
        let steps = ((n as f64) * theta / (2. * PI)).ceil().max(1.) as usize;
        for k in 0..=steps {
            let a = a0 + sweep * k as f64 / steps as f64;
            out.push(center + Vector::new(a.cos(), a.sin()) * r_eff);
        }
    }
    clean_contour(out)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn clockwise_input_is_normalised() {
        let poly = Polygon::new(vec![
            Point::new(0., 0.),
            Point::new(0., 2.),
            Point::new(2., 2.),
            Point::new(2., 0.),
            Point::new(0., 0.),
        ]);
        assert_eq!(poly.hull().len(), 4);
        assert!(signed_area(poly.hull()) > 0.);
        assert_eq!(poly.area(), 4.);
    }

    #[test]
    fn holes_subtract_area() {
        let poly = Polygon::with_holes(
            Rect::from_sides(0., 0., 10., 10.).corners().to_vec(),
            vec![Rect::from_sides(2., 2., 4., 4.).corners().to_vec()],
        );
        assert_relative_eq!(poly.area(), 96.);
        assert!(!poly.contains(Point::new(3., 3.)));
        assert!(poly.contains(Point::new(5., 5.)));
    }

    #[test]
    fn rounded_square_approaches_circle_area() {
        let square = Polygon::from_rect(Rect::from_sides(-1., -1., 1., 1.));
        let rounded = square.round_corners(0., 1., 2048).unwrap();
        assert_relative_eq!(rounded.area(), PI, epsilon = 1e-3);
    }

    #[test]
    fn mirrored_polygon_stays_counterclockwise() {
        let poly = Polygon::from_rect(Rect::from_sides(0., 0., 3., 1.));
        let mirrored = poly.transform(Transformation::new(1., 0., true, Vector::zero()));
        assert!(signed_area(mirrored.hull()) > 0.);
    }

    #[test]
    fn negative_radius_is_rejected() {
        let poly = Polygon::from_rect(Rect::from_sides(0., 0., 3., 1.));
        assert_eq!(
            poly.round_corners(-1., 1., 32),
            Err(Error::InvalidRadius(-1.))
        );
    }
}
