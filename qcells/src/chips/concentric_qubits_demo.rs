//! A demonstration chip with two concentric transmons.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::chip::Chip;
use crate::elements::capacitor::cap_params;
use crate::elements::composite::{
    produce_fixed_length_waveguide, Node, NodeElement, WaveguideComposite,
};
use crate::elements::meander::Meander;
use crate::elements::splitter::WaveguideCoplanarSplitter;
use crate::error::{Error, Result};
use crate::layout::{CellBuilder, Element};
use crate::qubits::ConcentricTransmon;

/// Height of the feedline above the chip's bottom edge.
const PROBELINE_Y: f64 = 3500.;

/// Two concentric transmons with readout resonators on a shared feedline,
/// one driveline each and a resonant coupler between them.
///
/// Per-qubit parameters are lists with one entry per qubit; the coupler
/// lists hold one entry per coupler of that qubit. Coupler 1 of each qubit
/// is its readout resonator, coupler 2 the inter-qubit coupler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcentricQubitsDemo {
    /// Common chip parameters.
    #[serde(flatten)]
    pub chip: Chip,
    /// Target lengths of the readout resonators.
    pub readout_res_lengths: Vec<f64>,
    /// Finger control of the resonator input capacitors.
    pub kappa_finger_control: Vec<f64>,
    /// Target length of the resonant coupler.
    pub coupler_length: f64,
    /// Coupler stub center conductor widths, per qubit.
    pub couplers_a: Vec<Vec<f64>>,
    /// Coupler stub gap widths, per qubit.
    pub couplers_b: Vec<Vec<f64>>,
    /// Coupler angles, per qubit.
    pub couplers_angle: Vec<Vec<f64>>,
    /// Coupler island widths, per qubit.
    pub couplers_width: Vec<Vec<f64>>,
    /// Coupler island angular extents, per qubit.
    pub couplers_arc_amplitude: Vec<Vec<f64>>,
    /// Distance of each driveline end from its qubit's centre.
    pub drive_line_offsets: Vec<f64>,
}

impl Default for ConcentricQubitsDemo {
    fn default() -> Self {
        Self {
            chip: Chip {
                name_chip: ArcStr::from("WS1"),
                ..Default::default()
            },
            readout_res_lengths: vec![8000., 10000.],
            kappa_finger_control: vec![1.99, 2.035],
            coupler_length: 10000.,
            couplers_a: vec![vec![10., 3.], vec![10., 3.]],
            couplers_b: vec![vec![6., 32.], vec![6., 32.]],
            couplers_angle: vec![vec![225., 315.], vec![315., 225.]],
            couplers_width: vec![vec![10., 10.], vec![10., 10.]],
            couplers_arc_amplitude: vec![vec![35., 55.], vec![55., 45.]],
            drive_line_offsets: vec![450., 450.],
        }
    }
}

const QUBIT_POSITIONS: [Point; 2] = [Point::new(3000., 7000.), Point::new(7000., 7000.)];
const DRIVE_ANGLES: [f64; 2] = [110., 70.];
const TEE_ANGLES: [f64; 2] = [135., 45.];

impl ConcentricQubitsDemo {
    fn validate(&self) -> Result<()> {
        let lists = [
            self.readout_res_lengths.len(),
            self.kappa_finger_control.len(),
            self.couplers_a.len(),
            self.couplers_b.len(),
            self.couplers_angle.len(),
            self.couplers_width.len(),
            self.couplers_arc_amplitude.len(),
            self.drive_line_offsets.len(),
        ];
        if lists.iter().any(|len| *len != QUBIT_POSITIONS.len()) {
            return Err(Error::invalid(format!(
                "per-qubit parameters need {} entries each",
                QUBIT_POSITIONS.len()
            )));
        }
        if self.couplers_a.iter().any(|c| c.len() < 2) || self.couplers_b.iter().any(|c| c.len() < 2)
        {
            return Err(Error::invalid(
                "each qubit needs a readout coupler and an inter-qubit coupler",
            ));
        }
        Ok(())
    }

    /// Places the qubits as `QB1` and `QB2`.
    pub fn produce_qubits(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        for (i, pos) in QUBIT_POSITIONS.iter().enumerate() {
            let qubit = ConcentricTransmon {
                r_inner: 100.,
                r_outer: 280.,
                outer_island_width: 80.,
                ground_gap: 40.,
                squid_angle: 90.,
                drive_angle: DRIVE_ANGLES[i],
                drive_distance: self.drive_line_offsets[i],
                couplers_r: 300.,
                couplers_a: self.couplers_a[i].clone(),
                couplers_b: self.couplers_b[i].clone(),
                couplers_angle: self.couplers_angle[i].clone(),
                couplers_width: self.couplers_width[i].clone(),
                couplers_arc_amplitude: self.couplers_arc_amplitude[i].clone(),
                ..Default::default()
            };
            let name = format!("QB{}", i + 1);
            cell.insert(&qubit, Transformation::translate(*pos), Some(name.as_str()))?;
        }
        Ok(())
    }

    /// Routes the resonant coupler between the qubits and returns its length.
    pub fn produce_coupler(&self, cell: &mut CellBuilder<'_>) -> Result<f64> {
        let start = cell.refpoint("QB1_port_coupler_2")?;
        let start_corner = cell.refpoint("QB1_port_coupler_2_corner")?;
        let end = cell.refpoint("QB2_port_coupler_2")?;
        let end_corner = cell.refpoint("QB2_port_coupler_2_corner")?;
        let params = WaveguideComposite {
            a: self.couplers_a[0][1],
            b: self.couplers_b[0][1],
            ..WaveguideComposite::new(Vec::new())
        };
        let (_, _, length) = produce_fixed_length_waveguide(
            cell,
            |x| {
                vec![
                    Node::new(start),
                    Node::new(start_corner).bridges(1),
                    Node::new(Point::new(4500., 6500.)).bridges(2),
                    Node::new(Point::new(5500., 6500.))
                        .length_before(x)
                        .bridges(6),
                    Node::new(end_corner).bridges(2),
                    Node::new(end),
                ]
            },
            5000.,
            self.coupler_length,
            &params,
        )?;
        tracing::info!("Coupler line length: {length:.2}");
        Ok(length)
    }

    /// Connects the drive launchers to the qubit drive ports.
    pub fn produce_drivelines(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        for qubit in 1..=QUBIT_POSITIONS.len() {
            let launcher_corner = cell.refpoint(&format!("DL-QB{qubit}_port_corner"))?;
            let nodes = vec![
                Node::new(cell.refpoint(&format!("DL-QB{qubit}_base"))?),
                Node::new(launcher_corner).bridges(1),
                Node::new(launcher_corner + Vector::new(0., -1200.)).bridges(1),
                Node::new(cell.refpoint(&format!("QB{qubit}_port_drive_corner"))?).bridges(1),
                Node::new(cell.refpoint(&format!("QB{qubit}_port_drive"))?),
            ];
            let driveline = WaveguideComposite {
                a: self.chip.a,
                b: self.chip.b,
                term2: self.chip.b,
                ..WaveguideComposite::new(nodes)
            };
            cell.insert(&driveline, Transformation::identity(), None)?;
        }
        Ok(())
    }

    /// Routes the feedline through the two readout tees, as instance `pl`.
    pub fn produce_feedline(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let input_corner = cell.refpoint("PL-IN_port_corner")?;
        let output_base = cell.refpoint("PL-OUT_base")?;
        let tee = |angle: f64| {
            NodeElement::Splitter(WaveguideCoplanarSplitter::new(
                vec![180., angle, 0.],
                vec![50., 150., 50.],
            ))
        };
        let nodes = vec![
            Node::new(cell.refpoint("PL-IN_base")?),
            Node::new(input_corner).bridges(1),
            Node::new(Point::new(input_corner.x, PROBELINE_Y)).bridges(2),
            Node::new(Point::new(input_corner.x + 200., PROBELINE_Y)).element(
                tee(TEE_ANGLES[0]),
                ("port_a", "port_c"),
                Some("QB1_tee"),
            ),
            Node::new(Point::new(output_base.x - 200., PROBELINE_Y))
                .element(tee(TEE_ANGLES[1]), ("port_a", "port_c"), Some("QB2_tee"))
                .bridges(3),
            Node::new(Point::new(output_base.x, PROBELINE_Y)),
            Node::new(cell.refpoint("PL-OUT_port_corner")?).bridges(2),
            Node::new(output_base).bridges(1),
        ];
        let feedline = WaveguideComposite {
            a: self.chip.a,
            b: self.chip.b,
            ..WaveguideComposite::new(nodes)
        };
        cell.insert(&feedline, Transformation::identity(), Some("pl"))?;
        Ok(())
    }

    /// Builds a readout resonator from each feedline tee to coupler 1 of
    /// its qubit and returns their lengths.
    ///
    /// Each resonator is an input capacitor on the tee, a fixed bottom run, a
    /// fixed top run from the qubit, and a meander between them making up the
    /// rest of the target length.
    pub fn produce_readout_resonators(&self, cell: &mut CellBuilder<'_>) -> Result<Vec<f64>> {
        let mut lengths = Vec::new();
        for (i, angle) in TEE_ANGLES.iter().enumerate() {
            let qb = i + 1;
            let capacitor = cap_params(self.kappa_finger_control[i], "smooth", Some(160.))?;
            let cap_id = cell.add_element(&capacitor)?;
            let tee_port = cell.refpoint(&format!("pl_QB{qb}_tee_port_b"))?;
            let cap_refs = cell.insert_cell_aligned(
                cap_id,
                Transformation::rotate(*angle),
                tee_port,
                "port_a",
                None,
            )?;

            let coupler_corner = cell.refpoint(&format!("QB{qb}_port_coupler_1_corner"))?;
            let cap_corner = cap_refs.get("port_b_corner")?;
            let bottom = WaveguideComposite::new(vec![
                Node::new(cap_refs.get("port_b")?),
                Node::new(cap_corner),
                Node::new(Point::new(coupler_corner.x, cap_corner.y + 50.)),
                Node::new(Point::new(coupler_corner.x, cap_corner.y + 150.)).bridges(1),
            ]);
            let bottom_name = format!("resonator_bottom_{qb}");
            let (bottom_id, _) =
                cell.insert(&bottom, Transformation::identity(), Some(bottom_name.as_str()))?;
            let bottom_length = cell.cell_length(bottom_id).unwrap_or_default();

            let meander_start = coupler_corner + Vector::new(0., -300.);
            let top = WaveguideComposite::new(vec![
                Node::new(cell.refpoint(&format!("QB{qb}_port_coupler_1"))?),
                Node::new(coupler_corner),
                Node::new(meander_start),
            ]);
            let top_name = format!("resonator_top_{qb}");
            let (top_id, _) =
                cell.insert(&top, Transformation::identity(), Some(top_name.as_str()))?;
            let top_length = cell.cell_length(top_id).unwrap_or_default();

            let meander = Meander {
                n_bridges: 10,
                ..Meander::new(
                    meander_start,
                    cell.refpoint(&format!("{bottom_name}_port_b"))?,
                    self.readout_res_lengths[i] - top_length - bottom_length,
                )
            };
            let (meander_id, _) = cell.insert(&meander, Transformation::identity(), None)?;
            let length = bottom_length + top_length + cell.cell_length(meander_id).unwrap_or_default();
            tracing::info!("Resonator QB{qb} length: {length:.2}");
            lengths.push(length);
        }
        Ok(lengths)
    }
}

impl Element for ConcentricQubitsDemo {
    const NAME: &'static str = "Concentric Qubits Demo";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        self.validate()?;
        let assignments = IndexMap::from([
            (1, ArcStr::from("DL-QB1")),
            (2, ArcStr::from("DL-QB2")),
            (5, ArcStr::from("PL-OUT")),
            (6, ArcStr::from("PL-IN")),
        ]);
        self.chip.produce_launchers(cell, "SMA8", &assignments)?;
        self.produce_qubits(cell)?;
        self.produce_coupler(cell)?;
        self.produce_drivelines(cell)?;
        self.produce_feedline(cell)?;
        self.produce_readout_resonators(cell)?;
        self.chip.finish(cell)
    }
}
