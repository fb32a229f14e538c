//! Parallel coplanar waveguides for impedance and loss simulations.

use arcstr::ArcStr;
use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b};
use crate::error::{Error, Result};

/// Metal shapes of one chip face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    /// Face identifier, such as `1t1` (top of chip 1) or `2b1` (bottom of chip 2).
    pub face: ArcStr,
    /// Ground metal.
    pub ground: Region,
    /// Signal metal, one region per conductor.
    pub signals: Vec<Region>,
}

impl FaceGeometry {
    /// Whether the face's metal points down, toward a chip below it.
    pub fn is_flipped(&self) -> bool {
        self.face.get(1..2) == Some("b")
    }
}

/// The planar geometry of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimGeometry {
    /// Simulation name.
    pub name: ArcStr,
    /// Simulation area.
    pub sim_box: Rect,
    /// Metal per face, in stack order.
    pub faces: Vec<FaceGeometry>,
}

/// `n_guides` straight coplanar waveguides along x, stacked in y around the origin.
///
/// With two entries in `face_stack`, the second chip carries the same
/// guides on its bottom face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveGuidesSim {
    /// Simulation name.
    pub name: ArcStr,
    /// Simulation area.
    #[serde(rename = "box")]
    pub sim_box: Rect,
    /// Guide length, centred on the origin.
    pub cpw_length: f64,
    /// Number of guides.
    pub n_guides: usize,
    /// Center conductor width.
    pub a: f64,
    /// Gap width.
    pub b: f64,
    /// Ground width between the gaps of neighbouring guides.
    pub spacing: f64,
    /// Faces carrying metal, bottom chip first.
    pub face_stack: Vec<ArcStr>,
}

impl Default for WaveGuidesSim {
    fn default() -> Self {
        Self {
            name: ArcStr::from("waveguides"),
            sim_box: Rect::from_sides(-50., -500., 50., 500.),
            cpw_length: 100.,
            n_guides: 1,
            a: default_a(),
            b: default_b(),
            spacing: 50.,
            face_stack: vec![ArcStr::from("1t1")],
        }
    }
}

impl WaveGuidesSim {
    fn pitch(&self) -> f64 {
        self.a + 2. * self.b + self.spacing
    }

    /// The y coordinate of guide `k`.
    pub fn guide_y(&self, k: usize) -> f64 {
        (k as f64 - (self.n_guides as f64 - 1.) / 2.) * self.pitch()
    }

    /// Builds the metal of every face.
    pub fn geometry(&self) -> Result<SimGeometry> {
        if self.face_stack.is_empty() || self.face_stack.len() > 2 {
            return Err(Error::invalid(format!(
                "face stack must have one or two faces, got {}",
                self.face_stack.len()
            )));
        }
        if self.n_guides == 0 || self.a <= 0. || self.b <= 0. {
            return Err(Error::invalid("waveguide simulation needs at least one guide with positive a and b"));
        }
        let half = self.cpw_length / 2.;
        let outer = self.guide_y(self.n_guides - 1) + self.a / 2. + self.b;
        if outer >= self.sim_box.top() || -outer <= self.sim_box.bot() {
            return Err(Error::invalid(format!(
                "{} guides do not fit in the simulation box",
                self.n_guides
            )));
        }

        let mut gaps = Region::new();
        let mut signals = Vec::new();
        for k in 0..self.n_guides {
            let y = self.guide_y(k);
            let hg = self.a / 2. + self.b;
            gaps.insert(Rect::from_sides(-half, y - hg, half, y + hg));
            signals.push(Region::from(Rect::from_sides(
                -half,
                y - self.a / 2.,
                half,
                y + self.a / 2.,
            )));
        }
        let ground = Region::from(self.sim_box) - gaps;
        let faces = self
            .face_stack
            .iter()
            .map(|face| FaceGeometry {
                face: face.clone(),
                ground: ground.clone(),
                signals: signals.clone(),
            })
            .collect();
        Ok(SimGeometry {
            name: self.name.clone(),
            sim_box: self.sim_box,
            faces,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn guides_are_separate_signals() {
        let sim = WaveGuidesSim {
            n_guides: 3,
            ..Default::default()
        };
        let geometry = sim.geometry().unwrap();
        let face = &geometry.faces[0];
        assert_eq!(face.signals.len(), 3);
        assert!(face.signals[0].contains(Point::new(0., -72.)));
        assert!(face.signals[2].contains(Point::new(0., 72.)));
        assert!(!face.ground.contains(Point::new(0., 9.)));
        assert!(face.ground.contains(Point::new(0., 20.)));
        assert_relative_eq!(
            face.ground.area(),
            100. * 1000. - 3. * 100. * 22.,
            max_relative = 1e-9
        );
        assert!(!face.is_flipped());
    }

    #[test]
    fn two_face_stack() {
        let sim = WaveGuidesSim {
            face_stack: vec!["1t1".into(), "2b1".into()],
            ..Default::default()
        };
        let geometry = sim.geometry().unwrap();
        assert_eq!(geometry.faces.len(), 2);
        assert!(geometry.faces[1].is_flipped());
    }

    #[test]
    fn too_many_guides() {
        let sim = WaveGuidesSim {
            n_guides: 20,
            ..Default::default()
        };
        assert!(matches!(sim.geometry(), Err(Error::InvalidParameter(_))));
    }
}
