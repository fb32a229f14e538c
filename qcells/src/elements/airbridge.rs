//! Airbridges crossing waveguides.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// An airbridge spanning along the local y-axis, centred on the origin.
///
/// Placed with the rotation of the waveguide it crosses, the bridge connects
/// the ground planes on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airbridge {
    /// Width of the landing pads.
    pub pad_width: f64,
    /// Length of the landing pads along the bridge.
    pub pad_length: f64,
    /// Free span between the pads.
    pub bridge_length: f64,
    /// Width of the span.
    pub bridge_width: f64,
    /// How far the span overlaps each pad.
    pub pad_overlap: f64,
}

impl Default for Airbridge {
    fn default() -> Self {
        Self {
            pad_width: 20.,
            pad_length: 14.,
            bridge_length: 44.,
            bridge_width: 14.,
            pad_overlap: 10.,
        }
    }
}

impl Element for Airbridge {
    const NAME: &'static str = "Airbridge";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let half_span = self.bridge_length / 2.;
        let pad_outer = half_span + self.pad_length;
        let hw = self.pad_width / 2.;
        let top_pad = Rect::from_sides(-hw, half_span, hw, pad_outer);
        let bot_pad = Rect::from_sides(-hw, -pad_outer, hw, -half_span);
        cell.draw(
            Layer::AirbridgePads,
            Region::from_polygons([top_pad.to_polygon(), bot_pad.to_polygon()]),
        );

        let bw = self.bridge_width / 2.;
        let reach = half_span + self.pad_overlap.min(self.pad_length);
        cell.draw(
            Layer::AirbridgeFlyover,
            Rect::from_sides(-bw, -reach, bw, reach),
        );
        cell.add_refpoint("port_a", top_pad.center());
        cell.add_refpoint("port_b", bot_pad.center());
        Ok(())
    }
}

/// Places `n` airbridges evenly on the straight segment `p0 -> p1`.
pub(crate) fn place_on_segment(
    cell: &mut CellBuilder<'_>,
    bridge: &Airbridge,
    p0: Point,
    p1: Point,
    n: usize,
) -> Result<()> {
    if n == 0 || p0.distance(p1) < geometry::EPSILON {
        return Ok(());
    }
    let id = cell.add_element(bridge)?;
    let angle = (p1 - p0).angle_deg();
    for i in 0..n {
        let pos = p0 + (p1 - p0) * ((i + 1) as f64 / (n + 1) as f64);
        cell.insert_cell(id, Transformation::rotate_about_origin_then_move(angle, pos), None)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn pads_and_span() {
        let mut layout = Layout::default();
        let id = layout.build(&Airbridge::default()).unwrap();
        let cell = layout.cell(id);
        assert_relative_eq!(
            cell.shapes(Layer::AirbridgePads).unwrap().area(),
            2. * 20. * 14.
        );
        assert_relative_eq!(
            cell.shapes(Layer::AirbridgeFlyover).unwrap().area(),
            14. * 64.
        );
        assert_eq!(cell.refpoints().get("port_a").unwrap(), Point::new(0., 29.));
    }
}
