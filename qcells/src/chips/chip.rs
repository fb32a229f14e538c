//! Parameters and building blocks shared by all chips.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b};
use crate::elements::chip_frame::ChipFrame;
use crate::elements::launcher::Launcher;
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::CellBuilder;

/// Common chip parameters.
///
/// Chip elements embed this struct and call its `produce_*` methods from
/// their [`Element::build`](crate::layout::Element::build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chip {
    /// Chip name shown in the frame.
    pub name_chip: ArcStr,
    /// The chip area.
    #[serde(rename = "box")]
    pub chip_box: Rect,
    /// Whether to fill the ground plane with a grid of holes.
    pub with_grid: bool,
    /// Center conductor width of the chip's waveguides.
    pub a: f64,
    /// Gap width of the chip's waveguides.
    pub b: f64,
    /// Distance between neighbouring launchers on one side.
    pub launcher_pitch: f64,
    /// Distance of the launcher ports from the chip edge.
    pub launcher_indent: f64,
    /// Ground grid period.
    pub grid_step: f64,
    /// Ground grid hole size.
    pub grid_square: f64,
    /// The chip frame, whose name and box follow the chip's.
    pub frame: ChipFrame,
}

impl Default for Chip {
    fn default() -> Self {
        Self {
            name_chip: ArcStr::from("CTest"),
            chip_box: Rect::from_sides(0., 0., 10000., 10000.),
            with_grid: false,
            a: default_a(),
            b: default_b(),
            launcher_pitch: 3000.,
            launcher_indent: 800.,
            grid_step: 100.,
            grid_square: 5.,
            frame: ChipFrame::default(),
        }
    }
}

/// The edge a launcher sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Direction of the launcher's waveguide, into the chip.
    fn inward_angle(self) -> f64 {
        match self {
            Side::Top => 270.,
            Side::Right => 180.,
            Side::Bottom => 90.,
            Side::Left => 0.,
        }
    }
}

impl Chip {
    /// Draws the chip frame.
    pub fn produce_frame(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let frame = ChipFrame {
            chip_box: self.chip_box,
            name_chip: self.name_chip.clone(),
            ..self.frame.clone()
        };
        cell.insert(&frame, Transformation::identity(), None)?;
        Ok(())
    }

    /// Launcher positions for the named layout, numbered from 1.
    fn launcher_sites(&self, layout_name: &str) -> Result<Vec<(Side, Point)>> {
        match layout_name {
            "SMA8" => {
                let b = self.chip_box;
                let c = b.center();
                let h = self.launcher_pitch / 2.;
                let d = self.launcher_indent;
                Ok(vec![
                    (Side::Top, Point::new(c.x - h, b.top() - d)),
                    (Side::Top, Point::new(c.x + h, b.top() - d)),
                    (Side::Right, Point::new(b.right() - d, c.y + h)),
                    (Side::Right, Point::new(b.right() - d, c.y - h)),
                    (Side::Bottom, Point::new(c.x + h, b.bot() + d)),
                    (Side::Bottom, Point::new(c.x - h, b.bot() + d)),
                    (Side::Left, Point::new(b.left() + d, c.y - h)),
                    (Side::Left, Point::new(b.left() + d, c.y + h)),
                ])
            }
            _ => Err(Error::UnknownLauncherLayout(layout_name.into())),
        }
    }

    /// Places the launchers of `layout_name`.
    ///
    /// Launchers are numbered clockwise from the top left. Each is inserted
    /// with the name assigned to its number in `assignments`, or the number
    /// itself, so its refpoints appear as e.g. `PL-IN_port_corner`.
    pub fn produce_launchers(
        &self,
        cell: &mut CellBuilder<'_>,
        layout_name: &str,
        assignments: &IndexMap<usize, ArcStr>,
    ) -> Result<()> {
        let sites = self.launcher_sites(layout_name)?;
        let launcher = Launcher {
            a: self.a,
            b: self.b,
            ..Default::default()
        };
        if launcher.reach() > self.launcher_indent {
            return Err(Error::invalid(format!(
                "launchers of length {} do not fit within indent {}",
                launcher.reach(),
                self.launcher_indent
            )));
        }
        let id = cell.add_element(&launcher)?;
        for (i, (side, pos)) in sites.into_iter().enumerate() {
            let number = i + 1;
            let name = assignments
                .get(&number)
                .cloned()
                .unwrap_or_else(|| arcstr::format!("{number}"));
            let trans = Transformation::rotate_about_origin_then_move(side.inward_angle(), pos);
            cell.insert_cell(id, trans, Some(name.as_str()))?;
        }
        Ok(())
    }

    /// Fills the ground plane with grid holes wherever nothing asks to be avoided.
    ///
    /// Call this last: it only sees the avoidance shapes placed so far.
    pub fn produce_ground_grid(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        if self.grid_step <= self.grid_square || self.grid_square <= 0. {
            return Err(Error::invalid(format!(
                "grid squares of {} do not fit a grid step of {}",
                self.grid_square, self.grid_step
            )));
        }
        let avoidance = cell.flat_region(Layer::GroundGridAvoidance);
        let area = self.chip_box.enlarged(-self.frame.dice_width);
        let nx = ((area.width() - self.grid_square) / self.grid_step).floor() as usize + 1;
        let ny = ((area.height() - self.grid_square) / self.grid_step).floor() as usize + 1;
        let mut grid = Region::new();
        for i in 0..nx {
            for j in 0..ny {
                let x = area.left() + i as f64 * self.grid_step;
                let y = area.bot() + j as f64 * self.grid_step;
                let square = Rect::from_sides(x, y, x + self.grid_square, y + self.grid_square);
                if !avoidance.interacts_with_rect(&square) {
                    grid.insert(square);
                }
            }
        }
        tracing::debug!(holes = grid.len(), "ground grid");
        cell.draw(Layer::GroundGrid, grid);
        Ok(())
    }

    /// Draws the frame and, if enabled, the ground grid.
    pub fn finish(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        self.produce_frame(cell)?;
        if self.with_grid {
            self.produce_ground_grid(cell)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, Layout};

    #[derive(Serialize)]
    struct LaunchersOnly {
        chip: Chip,
        layout_name: &'static str,
    }

    impl Element for LaunchersOnly {
        const NAME: &'static str = "Launchers Only";

        fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
            let assignments = IndexMap::from([(1, ArcStr::from("IN")), (5, ArcStr::from("OUT"))]);
            self.chip
                .produce_launchers(cell, self.layout_name, &assignments)?;
            self.chip.finish(cell)
        }
    }

    #[test]
    fn sma8_launchers() {
        let mut layout = Layout::default();
        let chip = LaunchersOnly {
            chip: Chip::default(),
            layout_name: "SMA8",
        };
        let id = layout.build(&chip).unwrap();
        let refs = layout.cell(id).refpoints();
        assert_eq!(refs.get("IN_base").unwrap(), Point::new(3500., 9200.));
        assert!(refs
            .get("IN_port_corner")
            .unwrap()
            .approx_eq(Point::new(3500., 9150.), 1e-9));
        assert!(refs
            .get("OUT_port_corner")
            .unwrap()
            .approx_eq(Point::new(6500., 850.), 1e-9));
        assert!(refs
            .get("3_port_corner")
            .unwrap()
            .approx_eq(Point::new(9150., 6500.), 1e-9));
        assert!(refs
            .get("8_port_corner")
            .unwrap()
            .approx_eq(Point::new(850., 6500.), 1e-9));
    }

    #[test]
    fn unknown_launcher_layout() {
        let mut layout = Layout::default();
        let chip = LaunchersOnly {
            chip: Chip::default(),
            layout_name: "SMA12",
        };
        assert!(matches!(
            layout.build(&chip),
            Err(Error::UnknownLauncherLayout(_))
        ));
    }

    #[test]
    fn ground_grid_avoids_launchers() {
        let mut layout = Layout::default();
        let chip = LaunchersOnly {
            chip: Chip {
                chip_box: Rect::from_sides(0., 0., 4000., 4000.),
                launcher_pitch: 1000.,
                with_grid: true,
                grid_step: 50.,
                ..Default::default()
            },
            layout_name: "SMA8",
        };
        let id = layout.build(&chip).unwrap();
        let cell = layout.cell(id);
        let grid = cell.shapes(Layer::GroundGrid).unwrap();
        assert!(!grid.is_empty());
        let avoidance = layout.flat_region(id, Layer::GroundGridAvoidance);
        for square in grid.polygons() {
            let bbox = square.bbox().unwrap();
            assert!(!avoidance.interacts_with_rect(&bbox));
        }
        // Between the bottom launchers and below the markers nothing is avoided.
        assert!(grid.interacts_with_rect(&Rect::from_center(Point::new(2000., 1000.), 60., 60.)));
    }
}
