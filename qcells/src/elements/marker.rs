//! Alignment markers.

use std::str::FromStr;

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// Marker variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerType {
    /// Nested corners with a diagonal of squares.
    #[default]
    Standard,
}

impl FromStr for MarkerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Standard" | "Marker Standard" => Ok(MarkerType::Standard),
            _ => Err(Error::UnknownMarkerType(s.into())),
        }
    }
}

/// An alignment marker centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marker {
    /// The marker variant.
    pub kind: MarkerType,
    /// Number of squares along the diagonal.
    pub diagonal_squares: usize,
    /// Opens a window in the airbridge flyover layer instead of covering the marker.
    pub window: bool,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            kind: MarkerType::Standard,
            diagonal_squares: 10,
            window: false,
        }
    }
}

impl Marker {
    /// Creates a marker of the named type.
    ///
    /// ```
    /// # use qcells::elements::marker::Marker;
    /// let marker = Marker::create("Standard", 5, true).unwrap();
    /// assert_eq!(marker.diagonal_squares, 5);
    /// assert!(Marker::create("Fancy", 5, true).is_err());
    /// ```
    pub fn create(kind: &str, diagonal_squares: usize, window: bool) -> Result<Self> {
        Ok(Self {
            kind: kind.parse()?,
            diagonal_squares,
            window,
        })
    }

    fn main_layers(&self) -> Vec<Layer> {
        let mut layers = vec![Layer::BaseMetalGapWoGrid, Layer::BaseMetalGapForEbl];
        if !self.window {
            layers.push(Layer::AirbridgeFlyover);
        }
        layers
    }
}

fn corner() -> Polygon {
    Polygon::new(
        [(100., 100.), (10., 100.), (10., 80.), (80., 80.), (80., 10.), (100., 10.)]
            .into_iter()
            .map(Point::from)
            .collect(),
    )
}

fn flyover_window() -> Polygon {
    Polygon::new(
        [
            (800., 800.),
            (800., 10.),
            (80., 10.),
            (80., 2.),
            (2., 2.),
            (2., 80.),
            (10., 80.),
            (10., 800.),
        ]
        .into_iter()
        .map(Point::from)
        .collect(),
    )
}

impl Element for Marker {
    const NAME: &'static str = "Marker";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let main = self.main_layers();
        let draw_main = |cell: &mut CellBuilder<'_>, region: &Region| {
            for layer in &main {
                cell.draw(*layer, region.clone());
            }
        };

        let protection_box = Rect::from_sides(-220., -220., 220., 220.);
        cell.draw(Layer::GroundGridAvoidance, protection_box);

        let corner = corner();
        let mut corners = Region::new();
        for mag in [1., 2.] {
            for a in 0..4 {
                corners.insert(corner.transform(Transformation::new(
                    mag,
                    a as f64 * 90.,
                    false,
                    Vector::zero(),
                )));
            }
        }
        draw_main(cell, &corners);

        let center_box = Region::from(Rect::from_sides(-10., -10., 10., 10.));
        draw_main(cell, &center_box);

        let inv_corners = Region::from(protection_box) - &corners;
        cell.draw(Layer::AirbridgePads, inv_corners - &center_box);

        if self.window {
            let window = flyover_window();
            for a in 0..4 {
                cell.draw(
                    Layer::AirbridgeFlyover,
                    window.transform(Transformation::rotate(a as f64 * 90.)),
                );
            }
        }

        let square = Rect::from_sides(2., 2., 10., 10.).to_polygon();
        for i in 5..5 + self.diagonal_squares {
            let offset = 50. * i as f64;
            let diagonal = Region::from(square.transform(Transformation::new(
                3.,
                0.,
                false,
                Vector::new(offset - 18., offset - 18.),
            )));
            draw_main(cell, &diagonal);
            cell.draw(Layer::AirbridgePads, diagonal);
            cell.draw(
                Layer::GroundGridAvoidance,
                square.transform(Transformation::new(
                    20.,
                    0.,
                    false,
                    Vector::new(offset - 120., offset - 120.),
                )),
            );
        }
        cell.add_refpoint("base", Point::zero());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    fn build(marker: &Marker) -> (Layout, crate::layout::CellId) {
        let mut layout = Layout::default();
        let id = layout.build(marker).unwrap();
        (layout, id)
    }

    #[test]
    fn marker_geometry_is_deterministic() {
        let (a, ida) = build(&Marker::default());
        let (b, idb) = build(&Marker::default());
        for layer in Layer::ALL {
            assert_eq!(a.cell(ida).shapes(layer), b.cell(idb).shapes(layer));
        }
    }

    #[test]
    fn corner_and_center_areas() {
        let (layout, id) = build(&Marker {
            diagonal_squares: 0,
            ..Default::default()
        });
        let gap = layout.cell(id).shapes(Layer::BaseMetalGapWoGrid).unwrap();
        // Each corner is 20 * 90 + 20 * 70 = 3200, magnified copies have 4x the area.
        let expected = 4. * 3200. + 4. * 4. * 3200. + 400.;
        assert_relative_eq!(gap.area(), expected, max_relative = 1e-9);
        let protection = layout
            .cell(id)
            .shapes(Layer::GroundGridAvoidance)
            .unwrap();
        assert_relative_eq!(protection.area(), 440. * 440., max_relative = 1e-9);
    }

    #[test]
    fn diagonal_squares() {
        let (layout, id) = build(&Marker::default());
        let pads = layout.cell(id).shapes(Layer::AirbridgePads).unwrap();
        // The first diagonal square is the 24 x 24 box centred on (250, 250).
        assert!(pads.contains(Point::new(250., 250.)));
        assert!(pads.contains(Point::new(250. + 50. * 9., 250. + 50. * 9.)));
        assert!(!pads.contains(Point::new(250. + 50. * 10., 250. + 50. * 10.)));
        let avoidance = layout
            .cell(id)
            .shapes(Layer::GroundGridAvoidance)
            .unwrap()
            .merged();
        assert!(avoidance.contains(Point::new(700., 700.)));
    }

    #[test]
    fn window_mode_uses_flyover_window() {
        let (layout, id) = build(&Marker {
            window: true,
            ..Default::default()
        });
        let flyover = layout.cell(id).shapes(Layer::AirbridgeFlyover).unwrap();
        assert!(flyover.contains(Point::new(400., 400.)));
        assert!(flyover.contains(Point::new(-400., -400.)));
        assert!(!flyover.contains(Point::new(0., 0.)));

        let (layout, id) = build(&Marker::default());
        let flyover = layout.cell(id).shapes(Layer::AirbridgeFlyover).unwrap();
        assert!(flyover.contains(Point::new(0., 0.)));
    }

    #[test]
    fn unknown_marker_type() {
        assert!(matches!(
            "Circle".parse::<MarkerType>(),
            Err(Error::UnknownMarkerType(_))
        ));
    }
}
