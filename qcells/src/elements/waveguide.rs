//! Coplanar waveguides with rounded bends.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b, default_n, default_r};
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// A coplanar waveguide following a polyline, with tangent arcs at the corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideCoplanar {
    /// Polyline vertices.
    pub points: Vec<Point>,
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
    /// Gap extension beyond the first point, closing off the center conductor.
    #[serde(default)]
    pub term1: f64,
    /// Gap extension beyond the last point.
    #[serde(default)]
    pub term2: f64,
}

impl WaveguideCoplanar {
    /// A waveguide through `points` with default cross section.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            a: default_a(),
            b: default_b(),
            r: default_r(),
            n: default_n(),
            term1: 0.,
            term2: 0.,
        }
    }
}

/// A polyline corner after fitting a bend into it.
#[derive(Debug, Clone, Copy)]
struct Bend {
    /// Signed turn angle in radians, counterclockwise positive.
    theta: f64,
    /// Radius actually used.
    r: f64,
}

impl Bend {
    fn tangent(&self) -> f64 {
        self.r * (self.theta.abs() / 2.).tan()
    }
}

fn clean_points(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.dedup_by(|a, b| a.distance(*b) < geometry::EPSILON);
    pts
}

/// Fits a bend of radius `r` into every interior corner.
///
/// A segment between two bends lends half its length to each, an end segment
/// all of it. Bends that do not fit get a smaller radius.
fn fit_bends(pts: &[Point], r: f64) -> Vec<Bend> {
    let n = pts.len();
    let seg_len = |i: usize| pts[i].distance(pts[i + 1]);
    (1..n.saturating_sub(1))
        .map(|i| {
            let d_in = (pts[i] - pts[i - 1]).normalized();
            let d_out = (pts[i + 1] - pts[i]).normalized();
            let theta = d_in.cross(d_out).atan2(d_in.dot(d_out));
            let half_tan = (theta.abs() / 2.).tan();
            if half_tan < 1e-12 {
                return Bend { theta: 0., r };
            }
            let avail_in = if i == 1 { seg_len(0) } else { seg_len(i - 1) / 2. };
            let avail_out = if i == n - 2 {
                seg_len(i)
            } else {
                seg_len(i) / 2.
            };
            let avail = avail_in.min(avail_out);
            if r * half_tan > avail * (1. + 1e-9) {
                let clipped = avail / half_tan;
                tracing::warn!(
                    corner = ?pts[i],
                    radius = r,
                    clipped,
                    "segments too short for bend radius; reducing radius"
                );
                Bend { theta, r: clipped }
            } else {
                Bend { theta, r }
            }
        })
        .collect()
}

/// The length of a waveguide through `points` with bend radius `r`.
///
/// Bends are measured along their arcs, and terminations are not included.
///
/// ```
/// # use geometry::prelude::*;
/// # use qcells::elements::waveguide::waveguide_length;
/// let pts = vec![Point::new(0., 0.), Point::new(100., 0.), Point::new(100., 100.)];
/// let expected = 200. - 2. * 10. + 10. * std::f64::consts::FRAC_PI_2;
/// assert!((waveguide_length(&pts, 10.) - expected).abs() < 1e-9);
/// ```
pub fn waveguide_length(points: &[Point], r: f64) -> f64 {
    let pts = clean_points(points);
    let straight: f64 = pts.windows(2).map(|w| w[0].distance(w[1])).sum();
    let saved: f64 = fit_bends(&pts, r)
        .iter()
        .map(|b| 2. * b.tangent() - b.r * b.theta.abs())
        .sum();
    straight - saved
}

/// The centre line of the waveguide with bends sampled at `n` points per circle.
pub(crate) fn rounded_centerline(points: &[Point], r: f64, n: usize) -> Vec<Point> {
    let pts = clean_points(points);
    if pts.len() < 3 {
        return pts;
    }
    let bends = fit_bends(&pts, r);
    let mut out = vec![pts[0]];
    for (i, bend) in bends.iter().enumerate() {
        let p = pts[i + 1];
        if bend.theta == 0. || bend.r < geometry::EPSILON {
            out.push(p);
            continue;
        }
        let d_in = (p - pts[i]).normalized();
        let d_out = (pts[i + 2] - p).normalized();
        let t = bend.tangent();
        let start = p - d_in * t;
        let side = if bend.theta > 0. { 1. } else { -1. };
        let center = start + d_in.perpendicular() * (bend.r * side);
        let a0 = (start - center).angle_deg().to_radians();
        let mut arc = arc_points(bend.r, a0, a0 + bend.theta, n, center);
        if let Some(last) = arc.last_mut() {
            *last = p + d_out * t;
        }
        out.extend(arc);
    }
    out.push(pts[pts.len() - 1]);
    out
}

impl Element for WaveguideCoplanar {
    const NAME: &'static str = "Waveguide Coplanar";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let pts = clean_points(&self.points);
        if pts.len() < 2 {
            return Err(Error::invalid("waveguide needs at least two distinct points"));
        }
        if self.a <= 0. || self.b <= 0. {
            return Err(Error::invalid(format!(
                "waveguide cross section a = {}, b = {} must be positive",
                self.a, self.b
            )));
        }
        let center = rounded_centerline(&pts, self.r, self.n);
        let outer_width = self.a + 2. * self.b;
        let margin = cell.config().margin;

        let terminated = Path::new(center.clone(), outer_width)
            .with_extensions(self.term1, self.term2)
            .polygon();
        let signal = Path::new(center.clone(), self.a).polygon();
        let avoidance = Path::new(center, outer_width + 2. * margin)
            .with_extensions(self.term1 + margin, self.term2 + margin)
            .polygon();

        let mut gap = Region::from_polygons(terminated);
        gap -= Region::from_polygons(signal);
        cell.draw(Layer::BaseMetalGapWoGrid, gap);
        cell.draw(Layer::GroundGridAvoidance, Region::from_polygons(avoidance));

        let last = pts.len() - 1;
        cell.set_corner_distance(self.r);
        cell.add_port("a", pts[0], Some(pts[0] - pts[1]));
        cell.add_port("b", pts[last], Some(pts[last] - pts[last - 1]));
        cell.set_length(waveguide_length(&pts, self.r));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn straight_waveguide() {
        let mut layout = Layout::default();
        let wg = WaveguideCoplanar::new(vec![Point::new(0., 0.), Point::new(100., 0.)]);
        let id = layout.build(&wg).unwrap();
        let cell = layout.cell(id);
        let gap = cell.shapes(Layer::BaseMetalGapWoGrid).unwrap();
        assert_relative_eq!(gap.area(), 2. * 6. * 100., max_relative = 1e-9);
        assert_relative_eq!(cell.length().unwrap(), 100.);
        assert_eq!(cell.refpoints().get("port_a_corner").unwrap(), Point::new(-50., 0.));
        assert_eq!(cell.refpoints().get("port_b_corner").unwrap(), Point::new(150., 0.));
    }

    #[test]
    fn terminations_extend_the_gap() {
        let mut layout = Layout::default();
        let wg = WaveguideCoplanar {
            term2: 6.,
            ..WaveguideCoplanar::new(vec![Point::new(0., 0.), Point::new(100., 0.)])
        };
        let id = layout.build(&wg).unwrap();
        let gap = layout.cell(id).shapes(Layer::BaseMetalGapWoGrid).unwrap();
        assert_relative_eq!(gap.area(), 1200. + 6. * 22., max_relative = 1e-9);
        assert!(gap.contains(Point::new(103., 0.)));
        assert_relative_eq!(layout.cell(id).length().unwrap(), 100.);
    }

    #[test]
    fn bend_length_matches_arc() {
        let pts = vec![
            Point::new(0., 0.),
            Point::new(200., 0.),
            Point::new(200., 200.),
            Point::new(400., 200.),
        ];
        let expected = 600. - 4. * 50. + 2. * 50. * PI / 2.;
        assert_relative_eq!(waveguide_length(&pts, 50.), expected, max_relative = 1e-12);

        let center = rounded_centerline(&pts, 50., 64);
        let sampled: f64 = center.windows(2).map(|w| w[0].distance(w[1])).sum();
        assert_relative_eq!(sampled, expected, max_relative = 1e-3);
    }

    #[test_log::test]
    fn short_segments_clip_radius() {
        let pts = vec![Point::new(0., 0.), Point::new(20., 0.), Point::new(20., 100.)];
        let clipped = waveguide_length(&pts, 50.);
        let expected = 120. - 2. * 20. + 20. * PI / 2.;
        assert_relative_eq!(clipped, expected, max_relative = 1e-9);
    }

    #[test]
    fn degenerate_waveguide_is_an_error() {
        let mut layout = Layout::default();
        let wg = WaveguideCoplanar::new(vec![Point::new(1., 1.), Point::new(1., 1.)]);
        assert!(matches!(layout.build(&wg), Err(Error::InvalidParameter(_))));
    }
}
