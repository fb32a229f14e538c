//! 2-D geometry for superconducting circuit mask layout.
//!
//! Coordinates are `f64` micrometres. Conversion to integer database units
//! happens only at export time (see [`Region::snapped`](crate::region::Region::snapped)).
//!
//! # Examples
//!
//! Subtract a disk from a box:
//!
//! ```
//! # use geometry::prelude::*;
//! let square = Region::from(Rect::from_sides(-10., -10., 10., 10.));
//! let hole = Region::from(circle_polygon(5., 64, Point::zero()));
//! let ring = &square - &hole;
//! assert!(ring.area() < 400.);
//! ```
#![warn(missing_docs)]

pub mod arc;
pub mod bbox;
mod boolean;
pub mod error;
pub mod path;
pub mod point;
pub mod polygon;
pub mod prelude;
pub mod rect;
pub mod region;
pub mod snap;
pub mod transform;

/// Absolute tolerance used when comparing coordinates, in micrometres.
pub const EPSILON: f64 = 1e-9;

/// Wraps the given angle to the interval `[0, 360)` degrees.
///
/// # Examples
///
/// ```
/// use geometry::wrap_angle;
///
/// assert_eq!(wrap_angle(10.), 10.);
/// assert_eq!(wrap_angle(-10.), 350.);
/// assert_eq!(wrap_angle(-740.), 340.);
/// assert_eq!(wrap_angle(725.), 5.);
/// assert_eq!(wrap_angle(360.), 0.);
/// ```
pub fn wrap_angle(angle: f64) -> f64 {
    ((angle % 360.) + 360.) % 360.
}

/// Returns `(cos, sin)` of an angle in degrees.
///
/// Multiples of 90 degrees are evaluated exactly so that Manhattan
/// transformations do not accumulate rounding noise.
pub fn cos_sin_deg(angle: f64) -> (f64, f64) {
    let wrapped = wrap_angle(angle);
    if (wrapped % 90.).abs() < 1e-12 {
        match (wrapped / 90.).round() as i64 % 4 {
            0 => (1., 0.),
            1 => (0., 1.),
            2 => (-1., 0.),
            _ => (0., -1.),
        }
    } else {
        let rad = wrapped.to_radians();
        (rad.cos(), rad.sin())
    }
}
