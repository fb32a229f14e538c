//! Two-dimensional cross sections of planar simulations.
//!
//! A cross section cuts the planar metal of every face along a line and
//! extrudes it into a side view: `x` runs along the cut, centred on its
//! midpoint, and `y` is height above the surface of the bottom chip. Thin
//! dielectric interface layers (metal-air, metal-substrate, substrate-air)
//! are modelled explicitly, so the whole section is magnified by
//! `10^magnification_order` to keep them representable.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::waveguides_sim::{FaceGeometry, SimGeometry};
use crate::error::{Error, Result};

/// Material and stack parameters of a cross section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XSectionParams {
    /// Relative permittivity of the metal-air interface layer.
    pub ma_permittivity: f64,
    /// Relative permittivity of the metal-substrate interface layer.
    pub ms_permittivity: f64,
    /// Relative permittivity of the substrate-air interface layer.
    pub sa_permittivity: f64,
    /// Thickness of the metal-air interface layer, in µm.
    pub ma_thickness: f64,
    /// Thickness of the metal-substrate interface layer, in µm.
    pub ms_thickness: f64,
    /// Thickness of the substrate-air interface layer, in µm.
    pub sa_thickness: f64,
    /// The section is scaled by `10^magnification_order`.
    pub magnification_order: i32,
    /// Relative permittivity of the substrate.
    pub substrate_permittivity: f64,
    /// Substrate thickness, in µm.
    pub substrate_height: f64,
    /// Metal thickness, in µm.
    pub metal_height: f64,
    /// Vacuum above a single chip, in µm.
    pub vacuum_height: f64,
    /// Distance between the facing surfaces of two chips, in µm.
    pub chip_distance: f64,
}

impl Default for XSectionParams {
    fn default() -> Self {
        Self {
            ma_permittivity: 8.0,
            ms_permittivity: 11.4,
            sa_permittivity: 4.0,
            ma_thickness: 0.0048,
            ms_thickness: 0.0003,
            sa_thickness: 0.0024,
            magnification_order: 3,
            substrate_permittivity: 11.45,
            substrate_height: 500.,
            metal_height: 0.2,
            vacuum_height: 1000.,
            chip_distance: 8.,
        }
    }
}

/// One material region of a cross section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XLayer {
    /// The region, in magnified section coordinates.
    pub region: Region,
    /// Relative permittivity, or `None` for conductors.
    pub permittivity: Option<f64>,
}

/// A cross section ready for a 2-D field solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XSection {
    /// Name of the simulation it was cut from.
    pub name: ArcStr,
    /// Scale applied to all coordinates.
    pub magnification: f64,
    /// Layers by name: `<b|t>_substrate`, `<b|t>_ground`, `<b|t>_signal_<k>`,
    /// `ma_layer`, `ms_layer`, `sa_layer` and `vacuum`.
    pub layers: IndexMap<ArcStr, XLayer>,
}

impl XSection {
    /// The layer named `name`, if present.
    pub fn layer(&self, name: &str) -> Option<&XLayer> {
        self.layers.get(name)
    }

    /// Serializes the section as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Rectangles spanning `intervals` along x and `z0..z1` in height.
fn slab(intervals: &[(f64, f64)], z0: f64, z1: f64) -> Region {
    let (lo, hi) = (z0.min(z1), z0.max(z1));
    intervals
        .iter()
        .filter(|(s, e)| e - s > geometry::EPSILON)
        .map(|(s, e)| Rect::from_sides(*s, lo, *e, hi).to_polygon())
        .collect()
}

/// The parts of `0..len` not covered by the sorted `intervals`.
fn complement(intervals: &[(f64, f64)], len: f64) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let mut cursor = 0.;
    for (s, e) in intervals {
        if *s > cursor {
            out.push((cursor, *s));
        }
        cursor = f64::max(cursor, *e);
    }
    if cursor < len {
        out.push((cursor, len));
    }
    out
}

/// Accumulates the layers of a section in unmagnified coordinates.
struct SectionBuilder<'a> {
    params: &'a XSectionParams,
    cut: (Point, Point),
    len: f64,
    layers: IndexMap<ArcStr, XLayer>,
    ma: Region,
    ms: Region,
    sa: Region,
}

impl SectionBuilder<'_> {
    fn add(&mut self, name: ArcStr, region: Region, permittivity: Option<f64>) {
        if region.is_empty() {
            return;
        }
        self.layers.insert(
            name,
            XLayer {
                region,
                permittivity,
            },
        );
    }

    fn intervals(&self, region: &Region) -> Vec<(f64, f64)> {
        region.intervals_along(self.cut.0, self.cut.1)
    }

    /// Adds the substrate, metal and interface layers of one face.
    ///
    /// `surface` is the height of the substrate surface carrying the metal,
    /// and `up` is +1 when the metal sits on top of the substrate, -1 below it.
    fn add_face(&mut self, prefix: &str, face: &FaceGeometry, surface: f64, up: f64) {
        let p = self.params;
        let t = p.metal_height;

        let ground = self.intervals(&face.ground);
        let signals: Vec<_> = face.signals.iter().map(|s| self.intervals(s)).collect();
        let mut metal: Vec<(f64, f64)> = ground.iter().chain(signals.iter().flatten()).copied().collect();
        metal.sort_by(|a, b| a.0.total_cmp(&b.0));
        let exposed = complement(&metal, self.len);

        let ms = slab(&metal, surface, surface - up * p.ms_thickness);
        let substrate = slab(&[(0., self.len)], surface, surface - up * p.substrate_height) - &ms;
        self.add(
            arcstr::format!("{prefix}_substrate"),
            substrate,
            Some(p.substrate_permittivity),
        );
        self.add(
            arcstr::format!("{prefix}_ground"),
            slab(&ground, surface, surface + up * t),
            None,
        );
        for (k, intervals) in signals.iter().enumerate() {
            self.add(
                arcstr::format!("{prefix}_signal_{}", k + 1),
                slab(intervals, surface, surface + up * t),
                None,
            );
        }

        self.ms += ms;
        self.sa += slab(&exposed, surface, surface + up * p.sa_thickness);
        self.ma += slab(&metal, surface + up * t, surface + up * (t + p.ma_thickness));
        // Side walls above the substrate-air layer.
        let wall_bottom = surface + up * p.sa_thickness.min(t);
        for (s, e) in &metal {
            if *s > geometry::EPSILON {
                self.ma += slab(&[(s - p.ma_thickness, *s)], wall_bottom, surface + up * t);
            }
            if *e < self.len - geometry::EPSILON {
                self.ma += slab(&[(*e, e + p.ma_thickness)], wall_bottom, surface + up * t);
            }
        }
    }
}

/// Cuts `sim` along `cut` into a cross section.
///
/// The first face is the top of the bottom chip at height 0. A second face
/// is the bottom of the top chip, `chip_distance` above it.
pub fn create_xsection(
    sim: &SimGeometry,
    cut: (Point, Point),
    params: &XSectionParams,
) -> Result<XSection> {
    let len = cut.0.distance(cut.1);
    if len < geometry::EPSILON {
        return Err(Error::invalid("cross section cut has zero length"));
    }
    let top = match sim.faces.as_slice() {
        [_] => params.vacuum_height,
        [_, _] => params.chip_distance,
        faces => {
            return Err(Error::invalid(format!(
                "cross sections support one or two faces, got {}",
                faces.len()
            )))
        }
    };
    if params.metal_height + params.ma_thickness >= top {
        return Err(Error::invalid("metal does not fit between the chips"));
    }

    let mut builder = SectionBuilder {
        params,
        cut,
        len,
        layers: IndexMap::new(),
        ma: Region::new(),
        ms: Region::new(),
        sa: Region::new(),
    };
    builder.add_face("b", &sim.faces[0], 0., 1.);
    if let Some(face) = sim.faces.get(1) {
        builder.add_face("t", face, params.chip_distance, -1.);
    }

    let mut solid = Region::new();
    for layer in builder.layers.values() {
        solid += &layer.region;
    }
    let (ma, ms, sa) = (
        std::mem::take(&mut builder.ma) - &solid,
        std::mem::take(&mut builder.ms),
        std::mem::take(&mut builder.sa),
    );
    // Walls may overlap the substrate-air layer at metal edges.
    let sa = sa - &ma;
    let vacuum = slab(&[(0., len)], 0., top) - &solid - &ma - &sa;
    builder.add("ma_layer".into(), ma, Some(params.ma_permittivity));
    builder.add("ms_layer".into(), ms, Some(params.ms_permittivity));
    builder.add("sa_layer".into(), sa, Some(params.sa_permittivity));
    builder.add("vacuum".into(), vacuum, Some(1.));

    let magnification = 10f64.powi(params.magnification_order);
    let trans = Transformation::new(magnification, 0., false, Vector::new(-len / 2. * magnification, 0.));
    let layers = builder
        .layers
        .into_iter()
        .map(|(name, layer)| {
            (
                name,
                XLayer {
                    region: layer.region.transformed(trans),
                    ..layer
                },
            )
        })
        .collect();
    tracing::debug!(name = %sim.name, magnification, "created cross section");
    Ok(XSection {
        name: sim.name.clone(),
        magnification,
        layers,
    })
}

/// Cuts every simulation along the same line.
pub fn create_xsections(
    sims: &[SimGeometry],
    cut: (Point, Point),
    params: &XSectionParams,
) -> Result<Vec<XSection>> {
    sims.iter()
        .map(|sim| create_xsection(sim, cut, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::simulation::WaveGuidesSim;

    const CUT: (Point, Point) = (Point::new(0., 150.), Point::new(0., -150.));

    fn section(sim: &WaveGuidesSim) -> XSection {
        create_xsection(&sim.geometry().unwrap(), CUT, &XSectionParams::default()).unwrap()
    }

    #[test]
    fn single_face_layers() {
        let xs = section(&WaveGuidesSim::default());
        assert_eq!(xs.magnification, 1000.);
        let signal = xs.layer("b_signal_1").unwrap();
        assert_eq!(signal.permittivity, None);
        let bbox = signal.region.bbox().unwrap();
        assert_relative_eq!(bbox.left(), -5000., max_relative = 1e-9);
        assert_relative_eq!(bbox.right(), 5000., max_relative = 1e-9);
        assert_relative_eq!(bbox.top(), 200., max_relative = 1e-9);

        let ground = xs.layer("b_ground").unwrap();
        assert_eq!(ground.region.len(), 2);
        assert_relative_eq!(ground.region.area(), 2. * 139. * 0.2 * 1e6, max_relative = 1e-9);

        // Interface layers, in magnified units.
        assert_relative_eq!(
            xs.layer("ms_layer").unwrap().region.area(),
            288. * 0.0003 * 1e6,
            max_relative = 1e-6
        );
        assert_eq!(xs.layer("sa_layer").unwrap().permittivity, Some(4.0));
        assert!(xs.layer("t_substrate").is_none());
        assert!(xs.layer("vacuum").is_some());
    }

    #[test]
    fn layers_do_not_overlap() {
        let xs = section(&WaveGuidesSim {
            n_guides: 2,
            ..Default::default()
        });
        let total: f64 = xs.layers.values().map(|l| l.region.area()).sum();
        let mut all = Region::new();
        for layer in xs.layers.values() {
            all += &layer.region;
        }
        assert_relative_eq!(all.area(), total, max_relative = 1e-6);
    }

    #[test]
    fn two_faces() {
        let xs = section(&WaveGuidesSim {
            face_stack: vec!["1t1".into(), "2b1".into()],
            n_guides: 3,
            ..Default::default()
        });
        for name in ["t_substrate", "t_signal_3", "b_signal_1", "vacuum"] {
            assert!(xs.layer(name).is_some(), "missing {name}");
        }
        let top_signal = xs.layer("t_signal_1").unwrap().region.bbox().unwrap();
        assert_relative_eq!(top_signal.top(), 8000., max_relative = 1e-9);
        assert_relative_eq!(top_signal.bot(), 7800., max_relative = 1e-9);
        assert!(xs.to_json().unwrap().contains("\"ma_layer\""));
    }

    #[test]
    fn degenerate_cut() {
        let geometry = WaveGuidesSim::default().geometry().unwrap();
        let p = Point::new(1., 1.);
        assert!(create_xsection(&geometry, (p, p), &XSectionParams::default()).is_err());
    }
}
