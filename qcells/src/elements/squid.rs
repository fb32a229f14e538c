//! SQUID junction loops.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// A Manhattan SQUID loop hanging below the origin.
///
/// `origin_squid` is the top lead at the origin; `port_common` is the bottom
/// lead at `(0, -height)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Squid {
    /// Outer loop width.
    pub width: f64,
    /// Outer loop height, lead to lead.
    pub height: f64,
    /// Loop wire width.
    pub wire: f64,
    /// Junction overlap of the shadow evaporation.
    pub junction: f64,
}

impl Default for Squid {
    fn default() -> Self {
        Self {
            width: 12.,
            height: 16.,
            wire: 1.5,
            junction: 0.3,
        }
    }
}

impl Element for Squid {
    const NAME: &'static str = "Squid";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let (hw, h, w) = (self.width / 2., self.height, self.wire);
        if 2. * w >= self.width || 3. * w >= h {
            return Err(Error::invalid(format!(
                "squid wire {w} too wide for a {} x {h} loop",
                self.width
            )));
        }
        let outer = Region::from(Rect::from_sides(-hw, -h, hw, 0.));
        let inner = Region::from(Rect::from_sides(-hw + w, -h + w, hw - w, -w));
        cell.draw(Layer::SisJunction, outer - inner);

        // Shadow patches where the two junctions cross the loop arms.
        let j = self.junction;
        let y = -h / 2.;
        cell.draw(
            Layer::SisShadow,
            Region::from_polygons([
                Rect::from_sides(-hw - j, y - w / 2., -hw + w + j, y + w / 2.).to_polygon(),
                Rect::from_sides(hw - w - j, y - w / 2., hw + j, y + w / 2.).to_polygon(),
            ]),
        );

        cell.add_refpoint("origin_squid", Point::zero());
        cell.add_refpoint("port_common", Point::new(0., -h));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn loop_has_a_hole() {
        let mut layout = Layout::default();
        let id = layout.build(&Squid::default()).unwrap();
        let cell = layout.cell(id);
        let loop_ = cell.shapes(Layer::SisJunction).unwrap();
        assert_relative_eq!(loop_.area(), 12. * 16. - 9. * 13., max_relative = 1e-9);
        assert!(!loop_.contains(Point::new(0., -8.)));
        assert_eq!(cell.refpoints().get("port_common").unwrap(), Point::new(0., -16.));
    }
}
