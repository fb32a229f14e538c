//! Meandering waveguides of a given length.

use std::f64::consts::FRAC_PI_2;

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use super::airbridge::{place_on_segment, Airbridge};
use super::waveguide::{waveguide_length, WaveguideCoplanar};
use crate::config::{default_a, default_b, default_n, default_r};
use crate::error::{Error, Result};
use crate::layout::{CellBuilder, Element};

/// Relative length tolerance under which a meander degenerates into a straight line.
const STRAIGHT_TOLERANCE: f64 = 1e-6;

/// A waveguide from `start` to `end` folded into U-turns so that its length is `length`.
///
/// Legs are perpendicular to `start -> end`, spaced `2 r` apart and centred
/// between the two ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meander {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Total length of the waveguide.
    pub length: f64,
    /// Center conductor width.
    #[serde(default = "default_a")]
    pub a: f64,
    /// Gap width.
    #[serde(default = "default_b")]
    pub b: f64,
    /// Bend radius.
    #[serde(default = "default_r")]
    pub r: f64,
    /// Points per full circle in bends.
    #[serde(default = "default_n")]
    pub n: usize,
    /// Number of legs, or `None` to use as many as fit.
    #[serde(default)]
    pub meanders: Option<usize>,
    /// Number of airbridges distributed over the legs.
    #[serde(default)]
    pub n_bridges: usize,
}

impl Meander {
    /// A meander with default cross section and automatic leg count.
    pub fn new(start: Point, end: Point, length: f64) -> Self {
        Self {
            start,
            end,
            length,
            a: default_a(),
            b: default_b(),
            r: default_r(),
            n: default_n(),
            meanders: None,
            n_bridges: 0,
        }
    }
}

/// Leg layout along the local x-axis from `(0, 0)` to `(d, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Legs {
    count: usize,
    height: f64,
}

impl Legs {
    fn solve(length: f64, d: f64, r: f64, fixed: Option<usize>) -> Result<Option<Legs>> {
        if length < d * (1. - STRAIGHT_TOLERANCE) {
            return Err(Error::MeanderTooShort { length, distance: d });
        }
        if length <= d * (1. + STRAIGHT_TOLERANCE) {
            return Ok(None);
        }
        let no_fit = Error::MeanderDoesNotFit {
            length,
            distance: d,
            r,
        };
        let max_count = ((d / (2. * r)).floor() as usize).saturating_sub(1);
        let height = |m: usize| {
            let m = m as f64;
            (length - d + 2. * m * (2. - FRAC_PI_2) * r) / (2. * (m - 1.))
        };
        match fixed {
            Some(m) => {
                if m < 2 || m > max_count || height(m) < 2. * r {
                    return Err(no_fit);
                }
                Ok(Some(Legs {
                    count: m,
                    height: height(m),
                }))
            }
            None => {
                let mut m = max_count;
                while m >= 2 && height(m) < 2. * r {
                    m -= 1;
                }
                if m < 2 {
                    return Err(no_fit);
                }
                Ok(Some(Legs {
                    count: m,
                    height: height(m),
                }))
            }
        }
    }

    /// Polyline vertices in the local frame.
    fn points(&self, d: f64, r: f64) -> Vec<Point> {
        let m = self.count;
        let leg_x = |k: usize| d / 2. + (k as f64 - (m as f64 - 1.) / 2.) * 2. * r;
        let side = |k: usize| if k % 2 == 0 { self.height } else { -self.height };
        // The first and last legs are half height, the ones between full height.
        let mut pts = vec![Point::zero(), Point::new(leg_x(0), 0.)];
        for k in 0..m - 1 {
            pts.push(Point::new(leg_x(k), side(k)));
            pts.push(Point::new(leg_x(k + 1), side(k)));
        }
        pts.push(Point::new(leg_x(m - 1), 0.));
        pts.push(Point::new(d, 0.));
        pts
    }
}

impl Element for Meander {
    const NAME: &'static str = "Meander";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let dir = self.end - self.start;
        let d = dir.length();
        if d < geometry::EPSILON {
            return Err(Error::invalid("meander start and end coincide"));
        }
        let local = match Legs::solve(self.length, d, self.r, self.meanders)? {
            Some(legs) => legs.points(d, self.r),
            None => vec![Point::zero(), Point::new(d, 0.)],
        };
        let trans = Transformation::rotate_about_origin_then_move(dir.angle_deg(), self.start);
        let points: Vec<Point> = local.iter().map(|p| trans.apply_point(*p)).collect();

        let wg = WaveguideCoplanar {
            points: points.clone(),
            a: self.a,
            b: self.b,
            r: self.r,
            n: self.n,
            term1: 0.,
            term2: 0.,
        };
        let (_, refs) = cell.insert(&wg, Transformation::identity(), None)?;
        cell.add_refpoint("port_a", refs.get("port_a")?);
        cell.add_refpoint("port_b", refs.get("port_b")?);
        cell.add_refpoint("port_a_corner", refs.get("port_a_corner")?);
        cell.add_refpoint("port_b_corner", refs.get("port_b_corner")?);

        if self.n_bridges > 0 && points.len() > 4 {
            // Legs are the segments from index 1 to len - 2, alternating with 2r links.
            let legs: Vec<(Point, Point)> = (1..points.len() - 2)
                .step_by(2)
                .map(|i| (points[i], points[i + 1]))
                .collect();
            let bridge = Airbridge::default();
            for j in 0..self.n_bridges.min(legs.len()) {
                let k = (j * legs.len()) / self.n_bridges.min(legs.len());
                let (p0, p1) = legs[k];
                place_on_segment(cell, &bridge, p0, p1, 1)?;
            }
        }

        let length = waveguide_length(&points, self.r);
        tracing::debug!(target = self.length, length, "meander");
        cell.set_length(length);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    fn realized(meander: &Meander) -> f64 {
        let mut layout = Layout::default();
        let id = layout.build(meander).unwrap();
        layout.cell(id).length().unwrap()
    }

    #[test]
    fn meander_realizes_length() {
        for length in [1500., 3000., 6840.] {
            let m = Meander::new(Point::new(0., 0.), Point::new(1000., 0.), length);
            assert_relative_eq!(realized(&m), length, max_relative = 1e-9);
        }
    }

    #[test]
    fn rotated_meander_realizes_length() {
        let m = Meander {
            n_bridges: 4,
            ..Meander::new(Point::new(2738., 6438.), Point::new(2738., 3854.), 6800.)
        };
        assert_relative_eq!(realized(&m), 6800., max_relative = 1e-9);
    }

    #[test]
    fn ports_are_at_the_ends() {
        let mut layout = Layout::default();
        let m = Meander::new(Point::new(0., 0.), Point::new(0., -800.), 2000.);
        let id = layout.build(&m).unwrap();
        let refs = layout.cell(id).refpoints();
        assert!(refs.get("port_a").unwrap().approx_eq(Point::new(0., 0.), 1e-9));
        assert!(refs.get("port_b").unwrap().approx_eq(Point::new(0., -800.), 1e-9));
    }

    #[test]
    fn fixed_leg_count() {
        let m = Meander {
            meanders: Some(4),
            ..Meander::new(Point::new(0., 0.), Point::new(1000., 0.), 2500.)
        };
        assert_relative_eq!(realized(&m), 2500., max_relative = 1e-9);
    }

    #[test]
    fn equal_length_is_straight() {
        let m = Meander::new(Point::new(0., 0.), Point::new(300., 0.), 300.);
        assert_relative_eq!(realized(&m), 300., max_relative = 1e-9);
    }

    #[test]
    fn too_short_is_an_error() {
        let mut layout = Layout::default();
        let m = Meander::new(Point::new(0., 0.), Point::new(1000., 0.), 900.);
        assert!(matches!(
            layout.build(&m),
            Err(Error::MeanderTooShort { .. })
        ));
        let m = Meander::new(Point::new(0., 0.), Point::new(1000., 0.), 1010.);
        assert!(matches!(
            layout.build(&m),
            Err(Error::MeanderDoesNotFit { .. })
        ));
    }
}
