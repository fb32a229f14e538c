//! Concentric transmons.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::elements::squid::Squid;
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// Radius of the rounded corners of the coupler islands.
const COUPLER_CORNER_RADIUS: f64 = 5.;
/// How far the coupler signal lines reach into the coupler islands.
const OVERLAP_MARGIN: f64 = 0.5;
/// Half width of the lead from the junction to the inner island.
const LEAD_HALF_WIDTH: f64 = 4.;

/// A transmon with an inner disk island and an outer ring island, joined by a SQUID.
///
/// Any number of arc-shaped coupler islands sit outside the ring, each fed by
/// a short waveguide stub ending in port `port_coupler_<i>` (numbered from 1)
/// at the edge of the ground cutout. A driveline ends at `port_drive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentricTransmon {
    /// Radius of the inner island.
    pub r_inner: f64,
    /// Outer radius of the ring island.
    pub r_outer: f64,
    /// Radial width of the ring island.
    pub outer_island_width: f64,
    /// Ground clearance outside the ring island.
    pub ground_gap: f64,
    /// Angular position of the junction, in degrees.
    pub squid_angle: f64,
    /// Outer radius of the coupler islands.
    pub couplers_r: f64,
    /// Center conductor width of each coupler stub.
    pub couplers_a: Vec<f64>,
    /// Gap width of each coupler stub.
    pub couplers_b: Vec<f64>,
    /// Angular position of each coupler, in degrees.
    pub couplers_angle: Vec<f64>,
    /// Radial width of each coupler island.
    pub couplers_width: Vec<f64>,
    /// Angular extent of each coupler island, in degrees.
    pub couplers_arc_amplitude: Vec<f64>,
    /// Direction of the drive port, in degrees.
    pub drive_angle: f64,
    /// Distance of the drive port from the centre.
    pub drive_distance: f64,
    /// Points per full circle.
    pub n: usize,
    /// The junction.
    pub squid: Squid,
}

impl Default for ConcentricTransmon {
    fn default() -> Self {
        Self {
            r_inner: 120.,
            r_outer: 250.,
            outer_island_width: 80.,
            ground_gap: 80.,
            squid_angle: 120.,
            couplers_r: 290.,
            couplers_a: vec![10., 3., 4.5],
            couplers_b: vec![6., 32., 20.],
            couplers_angle: vec![340., 60., 210.],
            couplers_width: vec![10., 20., 30.],
            couplers_arc_amplitude: vec![35., 45., 15.],
            drive_angle: 300.,
            drive_distance: 400.,
            n: 180,
            squid: Squid::default(),
        }
    }
}

/// An annular sector of the given outer radius and radial width, centred on the +x axis.
///
/// A sweep of 360 degrees gives a full ring.
pub fn arc_island(outer_r: f64, width: f64, swept_angle: f64, n: usize) -> Polygon {
    let half = swept_angle.to_radians() / 2.;
    let mut points = arc_points(outer_r, -half, half, n, Point::zero());
    points.extend(arc_points(outer_r - width, half, -half, n, Point::zero()));
    Polygon::new(points)
}

fn on_circle(r: f64, angle: f64) -> Point {
    Point::zero() + Vector::from_angle_deg(angle) * r
}

impl ConcentricTransmon {
    fn x_end(&self) -> f64 {
        self.r_outer + self.ground_gap
    }

    fn validate(&self) -> Result<()> {
        let count = self.couplers_angle.len();
        if [
            self.couplers_a.len(),
            self.couplers_b.len(),
            self.couplers_width.len(),
            self.couplers_arc_amplitude.len(),
        ]
        .iter()
        .any(|len| *len != count)
        {
            return Err(Error::invalid("coupler parameter lists must have equal lengths"));
        }
        if self.r_inner >= self.r_outer - self.outer_island_width {
            return Err(Error::invalid(format!(
                "inner island radius {} overlaps the outer island starting at {}",
                self.r_inner,
                self.r_outer - self.outer_island_width
            )));
        }
        if let Some(w) = self
            .couplers_width
            .iter()
            .find(|w| self.couplers_r - **w <= self.r_outer)
        {
            return Err(Error::invalid(format!(
                "coupler island of width {w} at radius {} overlaps the outer island",
                self.couplers_r
            )));
        }
        if self.x_end() <= self.couplers_r {
            return Err(Error::invalid(format!(
                "coupler radius {} is outside the ground cutout {}",
                self.couplers_r,
                self.x_end()
            )));
        }
        if self.n < 3 {
            return Err(Error::invalid("at least 3 points per circle are needed"));
        }
        Ok(())
    }

    fn qubit_islands(&self) -> Region {
        Region::from_polygons([
            circle_polygon(self.r_inner, self.n, Point::zero()),
            arc_island(self.r_outer, self.outer_island_width, 360., self.n),
        ])
    }

    fn coupler_islands(&self) -> Result<Region> {
        let mut region = Region::new();
        for ((angle, width), amplitude) in self
            .couplers_angle
            .iter()
            .zip(&self.couplers_width)
            .zip(&self.couplers_arc_amplitude)
        {
            let island = arc_island(self.couplers_r, *width, *amplitude, self.n)
                .round_corners(COUPLER_CORNER_RADIUS, COUPLER_CORNER_RADIUS, self.n)?;
            region += island.transform(Transformation::rotate(*angle));
        }
        Ok(region)
    }

    /// Signal and gap regions of the coupler stubs.
    fn waveguides(&self) -> (Region, Region) {
        let mut signal = Region::new();
        let mut gap = Region::new();
        let x_end = self.x_end();
        for ((a, b), angle) in self
            .couplers_a
            .iter()
            .zip(&self.couplers_b)
            .zip(&self.couplers_angle)
        {
            let rot = Transformation::rotate(*angle);
            signal += Rect::from_sides(
                self.couplers_r - OVERLAP_MARGIN,
                -a / 2.,
                x_end + OVERLAP_MARGIN,
                a / 2.,
            )
            .to_polygon()
            .transform(rot);
            gap += Rect::from_sides(self.couplers_r, -a / 2. - b, x_end, a / 2. + b)
                .to_polygon()
                .transform(rot);
        }
        (signal, gap)
    }

    /// Places the junction on the inner edge of the outer island and returns
    /// the lead connecting it to the inner island.
    fn add_junction(&self, cell: &mut CellBuilder<'_>) -> Result<Region> {
        let r = self.r_outer - self.outer_island_width;
        let trans =
            Transformation::rotate_about_origin_then_move(self.squid_angle - 90., on_circle(r, self.squid_angle));
        let (_, refs) = cell.insert(&self.squid, trans, Some("squid"))?;
        let common = refs.get("port_common")?;
        let reach = common.distance(Point::zero()) - self.r_inner + OVERLAP_MARGIN;
        let lead = Rect::from_sides(
            -LEAD_HALF_WIDTH,
            -self.squid.height - reach,
            LEAD_HALF_WIDTH,
            -self.squid.height,
        );
        Ok(Region::from(lead).transformed(trans))
    }

    fn add_ports(&self, cell: &mut CellBuilder<'_>) {
        for (i, angle) in self.couplers_angle.iter().enumerate() {
            let dir = Vector::from_angle_deg(*angle);
            cell.add_port(
                &format!("coupler_{}", i + 1),
                on_circle(self.x_end(), *angle),
                Some(dir),
            );
        }
        cell.add_port(
            "drive",
            on_circle(self.drive_distance, self.drive_angle),
            Some(Vector::from_angle_deg(self.drive_angle)),
        );
    }
}

impl Element for ConcentricTransmon {
    const NAME: &'static str = "Concentric Transmon";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        self.validate()?;
        let mut islands = self.qubit_islands();
        let coupler_islands = self.coupler_islands()?;
        let (signal, gap) = self.waveguides();
        islands += self.add_junction(cell)?;
        let ground = Region::from(circle_polygon(self.x_end(), self.n, Point::zero()));

        // Subtraction order matters: the stub gaps cut the ground, then the
        // coupler islands and signals are put back.
        let qubit = (((&ground - &islands) | gap) - coupler_islands) - signal;
        cell.draw(Layer::BaseMetalGapWoGrid, qubit);
        let margin = cell.config().margin;
        cell.draw(Layer::GroundGridAvoidance, ground.sized(margin));

        cell.add_refpoint("base", Point::zero());
        self.add_ports(cell);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::Layout;

    #[test]
    fn arc_island_is_symmetric() {
        let island = Region::from(arc_island(290., 10., 35., 180));
        let mirrored = island.transformed(Transformation::new(1., 0., true, Vector::new(0., 0.)));
        assert!((&island ^ &mirrored).area() < 1e-6);
        // A simple annular sector, up to the sampling of the arcs.
        let exact = 35f64.to_radians() / 2. * (290f64.powi(2) - 280f64.powi(2));
        assert_relative_eq!(island.area(), exact, max_relative = 1e-3);
    }

    #[test]
    fn full_ring_has_a_hole() {
        let ring = Region::from(arc_island(250., 80., 360., 180));
        assert!(!ring.contains(Point::zero()));
        assert!(ring.contains(Point::new(200., 0.)));
        let exact = PI * (250f64.powi(2) - 170f64.powi(2));
        assert_relative_eq!(ring.area(), exact, max_relative = 1e-3);
    }

    #[test]
    fn default_transmon() {
        let mut layout = Layout::default();
        let id = layout.build(&ConcentricTransmon::default()).unwrap();
        let cell = layout.cell(id);
        let refs = cell.refpoints();
        assert!(refs
            .get("port_coupler_2")
            .unwrap()
            .approx_eq(on_circle(330., 60.), 1e-9));
        assert!(refs
            .get("port_drive_corner")
            .unwrap()
            .approx_eq(on_circle(450., 300.), 1e-9));
        assert!(refs.contains("squid_port_common"));

        let gap = cell.shapes(Layer::BaseMetalGapWoGrid).unwrap();
        // Islands and ground are metal, the space between is etched.
        assert!(!gap.contains(Point::zero()));
        assert!(gap.contains(Point::new(-145., 0.)));
        assert!(!gap.contains(Point::new(-210., 0.)));
        assert!(gap.contains(Point::new(-270., 0.)));
        // The first coupler stub: metal signal between two etched gaps.
        assert!(!gap.contains(on_circle(310., 340.)));
        let side = Vector::from_angle_deg(70.) * 8.;
        assert!(gap.contains(on_circle(310., 340.) + side));
    }

    #[test]
    fn junction_lead_reaches_the_inner_island() {
        let mut layout = Layout::default();
        let id = layout.build(&ConcentricTransmon::default()).unwrap();
        let gap = layout.cell(id).shapes(Layer::BaseMetalGapWoGrid).unwrap();
        assert!(!gap.contains(on_circle(140., 120.)));
        assert!(gap.contains(on_circle(140., 130.)));
    }

    #[test]
    fn parameters_are_validated() {
        let mut layout = Layout::default();
        let uneven = ConcentricTransmon {
            couplers_a: vec![10.],
            ..Default::default()
        };
        assert!(matches!(layout.build(&uneven), Err(Error::InvalidParameter(_))));
        let overlapping = ConcentricTransmon {
            r_inner: 200.,
            ..Default::default()
        };
        assert!(matches!(
            layout.build(&overlapping),
            Err(Error::InvalidParameter(_))
        ));
    }
}
