use approx::assert_relative_eq;
use gds::{GdsElement, GdsRecord, GdsResult, RecordReader, RecordType};
use serde::Serialize;

use super::*;
use crate::error::Error;

#[derive(Debug, Clone, Serialize)]
struct Pad {
    width: f64,
    height: f64,
}

impl Element for Pad {
    const NAME: &'static str = "Pad";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let (hw, hh) = (self.width / 2., self.height / 2.);
        cell.draw(
            Layer::BaseMetalGapWoGrid,
            Rect::from_sides(-hw, -hh, hw, hh),
        );
        cell.add_port("a", Point::new(hw, 0.), Some(Vector::new(1., 0.)));
        cell.add_refpoint("base", Point::zero());
        Ok(())
    }
}

/// Two pads, the second one joined to the first one's port.
#[derive(Debug, Clone, Serialize)]
struct PadPair {
    pad: Pad,
}

impl Element for PadPair {
    const NAME: &'static str = "Pad Pair";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let (id, first) = cell.insert(&self.pad, Transformation::identity(), Some("first"))?;
        cell.insert_cell_aligned(
            id,
            Transformation::rotate(180.),
            first.get("port_a")?,
            "port_a",
            Some("second"),
        )?;
        Ok(())
    }
}

fn records(bytes: &[u8]) -> Vec<GdsRecord> {
    RecordReader::new(bytes)
        .collect::<GdsResult<Vec<_>>>()
        .unwrap()
}

#[test]
fn equal_parameters_share_a_cell() {
    let mut layout = Layout::default();
    let pad = Pad {
        width: 10.,
        height: 20.,
    };
    let a = layout.build(&pad).unwrap();
    let b = layout.build(&pad.clone()).unwrap();
    assert_eq!(a, b);
    assert_eq!(layout.num_cells(), 1);
}

#[test]
fn different_parameters_get_unique_names() {
    let mut layout = Layout::default();
    let a = layout
        .build(&Pad {
            width: 10.,
            height: 20.,
        })
        .unwrap();
    let b = layout
        .build(&Pad {
            width: 12.,
            height: 20.,
        })
        .unwrap();
    assert_ne!(a, b);
    assert_eq!(layout.cell(a).name(), "Pad");
    assert_eq!(layout.cell(b).name(), "Pad_1");
    assert_eq!(layout.cell_id_named("Pad_1"), Some(b));
    assert!(layout.cell_named("Pad_2").is_none());
}

#[test_log::test]
fn named_instances_expose_refpoints() {
    let mut layout = Layout::default();
    let pair = layout
        .build(&PadPair {
            pad: Pad {
                width: 10.,
                height: 20.,
            },
        })
        .unwrap();
    let refs = layout.cell(pair).refpoints();
    assert_eq!(refs.get("first_port_a").unwrap(), Point::new(5., 0.));
    assert_eq!(refs.get("first_port_a_corner").unwrap(), Point::new(55., 0.));
    // The second pad is turned around so that its port meets the first one's.
    let joined = refs.get("second_port_a").unwrap();
    assert_relative_eq!(joined.x, 5., epsilon = 1e-9);
    assert_relative_eq!(joined.y, 0., epsilon = 1e-9);
    let base = refs.get("second_base").unwrap();
    assert_relative_eq!(base.x, 10., epsilon = 1e-9);
    assert_relative_eq!(base.y, 0., epsilon = 1e-9);
    let corner = refs.get("second_port_a_corner").unwrap();
    assert_relative_eq!(corner.x, -45., epsilon = 1e-9);
    assert!(matches!(refs.get("port_a"), Err(Error::UnknownRefpoint(_))));
}

#[test]
fn flat_region_collects_instances() {
    let mut layout = Layout::default();
    let pair = layout
        .build(&PadPair {
            pad: Pad {
                width: 10.,
                height: 20.,
            },
        })
        .unwrap();
    assert!(layout.cell(pair).shapes(Layer::BaseMetalGapWoGrid).is_none());
    let flat = layout.flat_region(pair, Layer::BaseMetalGapWoGrid);
    assert_relative_eq!(flat.merged().area(), 400., epsilon = 1e-6);
    assert!(flat.contains(Point::new(14., 9.)));
    assert!(!flat.contains(Point::new(16., 0.)));
    assert!(layout.flat_region(pair, Layer::SisJunction).is_empty());
}

#[test]
fn children_come_before_parents() {
    let mut layout = Layout::default();
    let pad = Pad {
        width: 10.,
        height: 20.,
    };
    let unused = layout
        .build(&Pad {
            width: 1.,
            height: 1.,
        })
        .unwrap();
    let pair = layout.build(&PadPair { pad: pad.clone() }).unwrap();
    let child = layout.build(&pad).unwrap();

    let order = layout.topological_order();
    let pos = |id| order.iter().position(|x| *x == id).unwrap();
    assert!(pos(child) < pos(pair));
    assert_eq!(order.len(), 3);

    assert_eq!(layout.cells_used_by([pair]), vec![child, pair]);
    assert!(!layout.cells_used_by([pair]).contains(&unused));
}

#[test]
fn missing_align_refpoint() {
    let mut layout = Layout::default();
    let pad = layout
        .build(&Pad {
            width: 10.,
            height: 20.,
        })
        .unwrap();
    let mut cell = CellBuilder::new(&mut layout, "Top");
    let result = cell.insert_cell_aligned(
        pad,
        Transformation::identity(),
        Point::zero(),
        "port_b",
        None,
    );
    assert!(matches!(result, Err(Error::UnknownRefpoint(name)) if name == "port_b"));
}

#[test]
fn gds_export() {
    let mut layout = Layout::default();
    let pair = layout
        .build(&PadPair {
            pad: Pad {
                width: 10.,
                height: 20.,
            },
        })
        .unwrap();
    let lib = export_gds(&layout, pair, "pads").unwrap();
    let names: Vec<_> = lib.structs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Pad", "Pad Pair"]);

    let pad = &lib.structs[0];
    let boundaries: Vec<_> = pad
        .elems
        .iter()
        .filter_map(|e| match e {
            GdsElement::Boundary(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(boundaries.len(), 1);
    let xs: Vec<_> = boundaries[0].xy.iter().map(|p| p.x).collect();
    assert!(xs.contains(&-5000) && xs.contains(&5000));
    // Reference points are exported as labels.
    let labels = pad
        .elems
        .iter()
        .filter(|e| matches!(e, GdsElement::Text(t) if t.string == "port_a_corner"))
        .count();
    assert_eq!(labels, 1);

    let refs = lib.structs[1]
        .elems
        .iter()
        .filter(|e| matches!(e, GdsElement::StructRef(r) if r.name == "Pad"))
        .count();
    assert_eq!(refs, 2);

    let bytes = lib.to_bytes().unwrap();
    let recs = records(&bytes);
    let struct_names: Vec<_> = recs
        .iter()
        .filter(|r| r.rtype == RecordType::StrName)
        .map(GdsRecord::string)
        .collect();
    assert_eq!(struct_names, ["Pad", "Pad Pair"]);
    let srefs = recs.iter().filter(|r| r.rtype == RecordType::Sref).count();
    assert_eq!(srefs, 2);
    assert_eq!(recs.last().map(|r| r.rtype), Some(RecordType::EndLib));
}

#[derive(Debug, Clone, Serialize)]
struct Disk {
    r: f64,
    n: usize,
}

impl Element for Disk {
    const NAME: &'static str = "Disk";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        cell.draw(
            Layer::BaseMetalGapWoGrid,
            circle_polygon(self.r, self.n, Point::zero()),
        );
        Ok(())
    }
}

#[test]
fn large_polygons_fit_in_boundaries() {
    let mut layout = Layout::default();
    let disk = layout.build(&Disk { r: 1000., n: 20_000 }).unwrap();
    let lib = export_gds(&layout, disk, "disk").unwrap();
    let sizes: Vec<_> = lib.structs[0]
        .elems
        .iter()
        .filter_map(|e| match e {
            GdsElement::Boundary(b) => Some(b.xy.len()),
            _ => None,
        })
        .collect();
    assert!(sizes.len() > 1);
    assert!(sizes.iter().all(|n| *n < gds::record::MAX_XY_POINTS));
    assert!(sizes.iter().sum::<usize>() > gds::record::MAX_XY_POINTS);
    assert!(lib.to_bytes().is_ok());
}
