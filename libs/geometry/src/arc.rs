//! Arc and circle approximations.

use std::f64::consts::PI;

use crate::point::{Point, Vector};
use crate::polygon::Polygon;

/// Samples a circular arc of radius `r` centred on `origin`.
///
/// Angles are in radians. `n` is the number of points a full circle would
/// use; the arc gets a proportional share, but never fewer than two points.
/// Both end points are included, and `stop < start` walks clockwise.
///
/// # Examples
///
/// ```
/// # use geometry::prelude::*;
/// let pts = arc_points(10., 0., std::f64::consts::PI, 64, Point::zero());
/// assert_eq!(pts.len(), 32);
/// assert!(pts[0].approx_eq(Point::new(10., 0.), 1e-9));
/// assert!(pts[31].approx_eq(Point::new(-10., 0.), 1e-9));
/// ```
pub fn arc_points(r: f64, start: f64, stop: f64, n: usize, origin: Point) -> Vec<Point> {
    let n_steps = (((stop - start).abs() * n as f64 / (2. * PI)).round() as usize).max(2);
    let step = (stop - start) / (n_steps - 1) as f64;
    (0..n_steps)
        .map(|i| {
            let a = start + i as f64 * step;
            origin + Vector::new(r * a.cos(), r * a.sin())
        })
        .collect()
}

/// A regular `n`-gon of circumradius `r` centred on `origin`, starting at angle 0.
///
/// ```
/// # use geometry::prelude::*;
/// let square = circle_polygon(1., 4, Point::zero());
/// assert_eq!(square.hull().len(), 4);
/// assert!((square.area() - 2.).abs() < 1e-12);
/// ```
pub fn circle_polygon(r: f64, n: usize, origin: Point) -> Polygon {
    Polygon::new(
        (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * 2. * PI;
                origin + Vector::new(r * a.cos(), r * a.sin())
            })
            .collect(),
    )
}
