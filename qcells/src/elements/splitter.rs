//! Waveguide junctions with any number of arms.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b};
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// A star junction of straight coplanar arms meeting at the origin.
///
/// Arm `i` ends in port `port_<letter>`, lettered `a`, `b`, `c`, ... in the
/// order of `angles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideCoplanarSplitter {
    /// Arm directions in degrees.
    pub angles: Vec<f64>,
    /// Arm lengths measured from the origin.
    pub lengths: Vec<f64>,
    /// Center conductor width.
    #[serde(default = "default_a")]
    pub a: f64,
    /// Gap width.
    #[serde(default = "default_b")]
    pub b: f64,
}

impl WaveguideCoplanarSplitter {
    /// A tee with the given arm angles and lengths.
    pub fn new(angles: Vec<f64>, lengths: Vec<f64>) -> Self {
        Self {
            angles,
            lengths,
            a: default_a(),
            b: default_b(),
        }
    }
}

fn port_letter(i: usize) -> char {
    (b'a' + i as u8) as char
}

fn arm(angle: f64, length: f64, width: f64, overlap: f64) -> Polygon {
    Rect::from_sides(-overlap, -width / 2., length, width / 2.)
        .to_polygon()
        .transform(Transformation::rotate(angle))
}

impl Element for WaveguideCoplanarSplitter {
    const NAME: &'static str = "Waveguide Coplanar Splitter";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        if self.angles.len() != self.lengths.len() || self.angles.len() < 2 || self.angles.len() > 26
        {
            return Err(Error::invalid(format!(
                "splitter needs matching angles and lengths for 2 to 26 arms, got {} and {}",
                self.angles.len(),
                self.lengths.len()
            )));
        }
        let outer = self.a / 2. + self.b;
        if let Some(l) = self.lengths.iter().find(|l| **l <= outer) {
            return Err(Error::invalid(format!(
                "splitter arm length {l} does not clear the junction ({outer})"
            )));
        }

        let mut gap = Region::new();
        let mut signal = Region::new();
        for (angle, length) in self.angles.iter().zip(&self.lengths) {
            gap.insert(arm(*angle, *length, self.a + 2. * self.b, outer));
            signal.insert(arm(*angle, *length, self.a, self.a / 2.));
        }
        let margin = cell.config().margin;
        cell.draw(Layer::GroundGridAvoidance, gap.sized(margin));
        cell.draw(Layer::BaseMetalGapWoGrid, gap - signal);

        for (i, (angle, length)) in self.angles.iter().zip(&self.lengths).enumerate() {
            let dir = Vector::from_angle_deg(*angle);
            let pos = Point::zero() + dir * *length;
            cell.add_port(&port_letter(i).to_string(), pos, Some(dir));
        }
        cell.add_refpoint("base", Point::zero());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn tee_ports_and_connectivity() {
        let mut layout = Layout::default();
        let tee = WaveguideCoplanarSplitter::new(vec![180., 135., 0.], vec![50., 150., 50.]);
        let id = layout.build(&tee).unwrap();
        let cell = layout.cell(id);
        let refs = cell.refpoints();
        assert!(refs.get("port_a").unwrap().approx_eq(Point::new(-50., 0.), 1e-9));
        assert!(refs.get("port_c").unwrap().approx_eq(Point::new(50., 0.), 1e-9));
        let b = refs.get("port_b").unwrap();
        assert!((b.distance(Point::zero()) - 150.).abs() < 1e-9);

        let gap = cell.shapes(Layer::BaseMetalGapWoGrid).unwrap();
        // The junction itself is metal, the arm gaps are etched.
        assert!(!gap.contains(Point::zero()));
        assert!(gap.contains(Point::new(-25., 8.)));
        assert!(gap.contains(Point::new(25., -8.)));
        assert!(!gap.contains(Point::new(25., 0.)));
    }

    #[test]
    fn mismatched_arms() {
        let mut layout = Layout::default();
        let tee = WaveguideCoplanarSplitter::new(vec![0., 90.], vec![50.]);
        assert!(matches!(layout.build(&tee), Err(Error::InvalidParameter(_))));
    }
}
