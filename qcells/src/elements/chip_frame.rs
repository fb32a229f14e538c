//! The frame around a chip: dicing edge, corner markers and the chip name.

use arcstr::ArcStr;
use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use super::marker::Marker;
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// Chip edge decorations for the chip area `chip_box`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipFrame {
    /// The chip area.
    pub chip_box: Rect,
    /// Chip name written in the top left corner.
    pub name_chip: ArcStr,
    /// Width of the etched dicing edge.
    pub dice_width: f64,
    /// Distance of the marker centres from the chip corners, along both axes.
    pub marker_dist: f64,
    /// The corner marker.
    pub marker: Marker,
    /// Whether to draw the corner markers.
    pub use_markers: bool,
}

impl Default for ChipFrame {
    fn default() -> Self {
        Self {
            chip_box: Rect::from_sides(0., 0., 10000., 10000.),
            name_chip: ArcStr::from("CTest"),
            dice_width: 200.,
            marker_dist: 1500.,
            marker: Marker::default(),
            use_markers: true,
        }
    }
}

impl Element for ChipFrame {
    const NAME: &'static str = "Chip Frame";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let b = self.chip_box;
        if 2. * self.dice_width >= b.width().min(b.height()) {
            return Err(Error::invalid(format!(
                "dicing edge {} does not fit in a {} x {} chip",
                self.dice_width,
                b.width(),
                b.height()
            )));
        }
        let edge = Region::from(b) - Region::from(b.enlarged(-self.dice_width));
        cell.draw(Layer::GroundGridAvoidance, edge.clone());
        cell.draw(Layer::BaseMetalGapWoGrid, edge);

        if self.use_markers {
            let id = cell.add_element(&self.marker)?;
            let d = self.marker_dist;
            for (name, corner) in [
                ("nw", Point::new(b.left() + d, b.top() - d)),
                ("ne", Point::new(b.right() - d, b.top() - d)),
                ("sw", Point::new(b.left() + d, b.bot() + d)),
                ("se", Point::new(b.right() - d, b.bot() + d)),
            ] {
                let inst = format!("marker_{name}");
                cell.insert_cell(id, Transformation::translate(corner), Some(inst.as_str()))?;
            }
        }

        let anchor = Point::new(b.left() + self.marker_dist, b.top() - self.dice_width - 100.);
        cell.add_text(Layer::Annotations, self.name_chip.clone(), anchor);
        for (name, p) in ["box_sw", "box_se", "box_ne", "box_nw"].into_iter().zip(b.corners()) {
            cell.add_refpoint(name, p);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn frame_has_markers_and_edge() {
        let mut layout = Layout::default();
        let frame = ChipFrame {
            name_chip: "WS1".into(),
            ..Default::default()
        };
        let id = layout.build(&frame).unwrap();
        let cell = layout.cell(id);
        assert_eq!(cell.instances().len(), 4);
        assert_eq!(cell.texts()[0].string, "WS1");
        assert_eq!(
            cell.refpoints().get("marker_se_base").unwrap(),
            Point::new(8500., 1500.)
        );
        let edge = cell.shapes(Layer::BaseMetalGapWoGrid).unwrap();
        assert_relative_eq!(edge.area(), 1e8 - 9600. * 9600., max_relative = 1e-9);
        assert!(edge.contains(Point::new(100., 5000.)));
        assert!(!edge.contains(Point::new(5000., 5000.)));
    }
}
