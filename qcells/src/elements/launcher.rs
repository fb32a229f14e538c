//! Bond pads with a taper down to a waveguide.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b, default_r};
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// A launcher whose waveguide leaves along +x.
///
/// The taper ends at the origin, where `base` and `port` coincide and a
/// waveguide of width `a` and gap `b` attaches. The pad lies on the -x side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Launcher {
    /// Pad width.
    pub s: f64,
    /// Pad length.
    pub l: f64,
    /// Gap around the pad.
    pub b_launcher: f64,
    /// Taper length.
    pub taper_length: f64,
    /// Center conductor width at the port.
    pub a: f64,
    /// Gap width at the port.
    pub b: f64,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            s: 300.,
            l: 300.,
            b_launcher: 150.,
            taper_length: 300.,
            a: default_a(),
            b: default_b(),
        }
    }
}

impl Launcher {
    /// The distance from the outer edge of the cutout to `port`.
    pub fn reach(&self) -> f64 {
        self.b_launcher + self.l + self.taper_length
    }
}

fn pad_outline(half_width: f64, start: f64, taper: f64, port_half_width: f64) -> Polygon {
    Polygon::new(vec![
        Point::new(start, -half_width),
        Point::new(-taper, -half_width),
        Point::new(0., -port_half_width),
        Point::new(0., port_half_width),
        Point::new(-taper, half_width),
        Point::new(start, half_width),
    ])
}

impl Element for Launcher {
    const NAME: &'static str = "Launcher";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        if self.s <= self.a || self.l <= 0. || self.taper_length <= 0. {
            return Err(Error::invalid(
                "launcher pad must be wider than the waveguide, with positive length and taper",
            ));
        }
        let hs = self.s / 2.;
        let pad_start = -self.taper_length - self.l;
        let metal = pad_outline(hs, pad_start, self.taper_length, self.a / 2.);
        let cutout = pad_outline(
            hs + self.b_launcher,
            pad_start - self.b_launcher,
            self.taper_length,
            self.a / 2. + self.b,
        );
        let margin = cell.config().margin;
        let cutout = Region::from(cutout);
        cell.draw(Layer::GroundGridAvoidance, cutout.sized(margin));
        cell.draw(Layer::BaseMetalGapWoGrid, cutout - Region::from(metal));

        cell.add_refpoint("base", Point::zero());
        cell.add_refpoint("port", Point::zero());
        cell.add_refpoint("port_corner", Point::new(default_r(), 0.));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    #[test]
    fn launcher_refpoints() {
        let mut layout = Layout::default();
        let id = layout.build(&Launcher::default()).unwrap();
        let cell = layout.cell(id);
        let refs = cell.refpoints();
        assert_eq!(refs.get("base").unwrap(), Point::zero());
        assert_eq!(refs.get("port").unwrap(), Point::zero());
        assert_eq!(refs.get("port_corner").unwrap(), Point::new(50., 0.));

        let gap = cell.shapes(Layer::BaseMetalGapWoGrid).unwrap();
        assert!(!gap.contains(Point::new(-450., 0.)));
        assert!(gap.contains(Point::new(-450., 200.)));
        assert!(gap.contains(Point::new(-700., 0.)));
        assert!(gap.contains(Point::new(-1., 8.)));
        assert!(!gap.contains(Point::new(1., 8.)));
        assert_eq!(Launcher::default().reach(), 750.);
    }
}
