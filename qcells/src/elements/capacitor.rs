//! Series capacitors for coupling waveguides.

use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{default_a, default_b};
use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::layout::{CellBuilder, Element};

/// An interdigital capacitor with a continuously tunable finger count.
///
/// `finger_control` sets the number of fingers to its ceiling, and scales
/// their overlap by `finger_control / fingers`, so coupling grows smoothly
/// with the control value. Ports `port_a` and `port_b` sit at
/// `(-fixed_length / 2, 0)` and `(fixed_length / 2, 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothCapacitor {
    /// Finger count control, see the type documentation.
    pub finger_control: f64,
    /// Width of each finger.
    pub finger_width: f64,
    /// Gap between fingers and between finger tips and the opposite pad.
    pub finger_gap: f64,
    /// Full finger overlap length.
    pub finger_length: f64,
    /// Ground clearance around the capacitor body.
    pub ground_padding: f64,
    /// Port-to-port length.
    pub fixed_length: f64,
    /// Center conductor width of the connecting waveguides.
    pub a: f64,
    /// Gap width of the connecting waveguides.
    pub b: f64,
}

impl Default for SmoothCapacitor {
    fn default() -> Self {
        Self {
            finger_control: 3.,
            finger_width: 5.,
            finger_gap: 3.,
            finger_length: 40.,
            ground_padding: 20.,
            fixed_length: 160.,
            a: default_a(),
            b: default_b(),
        }
    }
}

/// Parameters of a capacitive coupler of the named type.
///
/// ```
/// # use qcells::elements::capacitor::cap_params;
/// let cap = cap_params(1.99, "smooth", Some(160.)).unwrap();
/// assert_eq!(cap.fixed_length, 160.);
/// assert!(cap_params(2., "plate", None).is_err());
/// ```
pub fn cap_params(
    fingers: f64,
    coupler_type: &str,
    fixed_length: Option<f64>,
) -> Result<SmoothCapacitor> {
    match coupler_type {
        "smooth" => {
            let defaults = SmoothCapacitor::default();
            Ok(SmoothCapacitor {
                finger_control: fingers,
                fixed_length: fixed_length.unwrap_or(defaults.fixed_length),
                ..defaults
            })
        }
        _ => Err(Error::UnknownCouplerType(coupler_type.into())),
    }
}

impl SmoothCapacitor {
    fn fingers(&self) -> usize {
        self.finger_control.ceil().max(1.) as usize
    }

    fn overlap(&self) -> f64 {
        self.finger_length * self.finger_control / self.fingers() as f64
    }
}

impl Element for SmoothCapacitor {
    const NAME: &'static str = "Smooth Capacitor";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        if self.finger_control <= 0. {
            return Err(Error::invalid(format!(
                "finger control must be positive, got {}",
                self.finger_control
            )));
        }
        let fingers = self.fingers();
        let (w, g) = (self.finger_width, self.finger_gap);
        let half_overlap = self.overlap() / 2.;
        let pad_inner = half_overlap + g;
        let pad_outer = pad_inner + w;
        let half_height = (fingers as f64 * w + (fingers as f64 - 1.) * g).max(self.a) / 2.;
        let half_length = self.fixed_length / 2.;
        if pad_outer + self.b >= half_length {
            return Err(Error::invalid(format!(
                "capacitor body ({}) does not fit in fixed length {}",
                2. * pad_outer,
                self.fixed_length
            )));
        }

        let mut metal = Region::new();
        metal.insert(Rect::from_sides(-pad_outer, -half_height, -pad_inner, half_height));
        metal.insert(Rect::from_sides(pad_inner, -half_height, pad_outer, half_height));
        for i in 0..fingers {
            let y0 = -half_height + i as f64 * (w + g);
            let (x0, x1) = if i % 2 == 0 {
                (-pad_inner, half_overlap)
            } else {
                (-half_overlap, pad_inner)
            };
            metal.insert(Rect::from_sides(x0, y0, x1, y0 + w));
        }
        let ha = self.a / 2.;
        metal.insert(Rect::from_sides(-half_length, -ha, -pad_outer, ha));
        metal.insert(Rect::from_sides(pad_outer, -ha, half_length, ha));

        let body = Region::from(Rect::from_sides(
            -pad_outer,
            -half_height,
            pad_outer,
            half_height,
        ))
        .sized(self.ground_padding);
        let hg = ha + self.b;
        let mut cutout = body;
        cutout.insert(Rect::from_sides(-half_length, -hg, 0., hg));
        cutout.insert(Rect::from_sides(0., -hg, half_length, hg));
        // Keep the cutout within the port-to-port length.
        let cutout = cutout
            & Region::from(Rect::from_sides(
                -half_length,
                -half_height - 2. * self.ground_padding,
                half_length,
                half_height + 2. * self.ground_padding,
            ));

        let margin = cell.config().margin;
        cell.draw(Layer::GroundGridAvoidance, cutout.sized(margin));
        cell.draw(Layer::BaseMetalGapWoGrid, cutout - metal);

        cell.add_port("a", Point::new(-half_length, 0.), Some(Vector::new(-1., 0.)));
        cell.add_port("b", Point::new(half_length, 0.), Some(Vector::new(1., 0.)));
        Ok(())
    }
}
