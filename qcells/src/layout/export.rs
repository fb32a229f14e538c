//! GDS export.

use arcstr::ArcStr;
use gds::{
    GdsBoundary, GdsElement, GdsLibrary, GdsPoint, GdsStrans, GdsStruct, GdsStructRef, GdsTextElem,
    GdsUnits,
};
use geometry::prelude::*;

use super::{Cell, CellId, Instance, Layout, Text};
use crate::error::{Error, Result};
use crate::layers::{GdsLayer, Layer};

/// Most vertices of one boundary, leaving room for the closing point.
const MAX_BOUNDARY_POINTS: usize = gds::record::MAX_XY_POINTS - 1;

/// Converts `top` and every cell it uses into a GDS library.
///
/// Coordinates are snapped to the database unit, polygons with holes or too
/// many vertices are cut into pieces, and reference points become text labels on the
/// [`Layer::Refpoints`] layer.
pub fn export_gds(layout: &Layout, top: CellId, name: impl Into<ArcStr>) -> Result<GdsLibrary> {
    let exporter = GdsExporter { layout };
    exporter.export(top, name.into())
}

struct GdsExporter<'a> {
    layout: &'a Layout,
}

impl GdsExporter<'_> {
    fn dbu(&self) -> f64 {
        self.layout.config().dbu
    }

    fn gds_layer(&self, layer: Layer) -> GdsLayer {
        self.layout.config().layers.get(layer)
    }

    fn export(&self, top: CellId, name: ArcStr) -> Result<GdsLibrary> {
        let dbu = self.dbu();
        let mut gds = GdsLibrary::with_units(name, GdsUnits::new(dbu, dbu * 1e-6));
        for id in self.layout.cells_used_by([top]) {
            let strukt = self.export_cell(self.layout.cell(id))?;
            gds.structs.push(strukt);
        }
        tracing::info!(
            top = %self.layout.cell(top).name(),
            structs = gds.structs.len(),
            "exported layout to GDS"
        );
        Ok(gds)
    }

    fn export_cell(&self, cell: &Cell) -> Result<GdsStruct> {
        let mut gcell = GdsStruct::new(cell.name().clone());
        for (layer, region) in cell.layers() {
            let GdsLayer(l, d) = self.gds_layer(layer);
            for poly in region.hole_free_polygons_within(MAX_BOUNDARY_POINTS) {
                let mut xy = poly
                    .hull()
                    .iter()
                    .map(|p| self.export_point(*p))
                    .collect::<Result<Vec<_>>>()?;
                xy.dedup();
                if xy.len() > 1 && xy.first() == xy.last() {
                    xy.pop();
                }
                if xy.len() < 3 {
                    continue;
                }
                gcell.elems.push(
                    GdsBoundary {
                        layer: l as i16,
                        datatype: d as i16,
                        xy,
                    }
                    .into(),
                );
            }
        }
        for text in cell.texts() {
            gcell.elems.push(self.export_text(text)?);
        }
        for (name, point) in cell.refpoints().iter() {
            gcell.elems.push(self.export_text(&Text {
                layer: Layer::Refpoints,
                string: name.clone(),
                position: point,
            })?);
        }
        for inst in cell.instances() {
            gcell.elems.push(self.export_instance(inst)?);
        }
        Ok(gcell)
    }

    fn export_instance(&self, inst: &Instance) -> Result<GdsElement> {
        let cell = self.layout.cell(inst.cell());
        let trans = inst.trans();
        Ok(GdsStructRef {
            name: cell.name().clone(),
            xy: self.export_point(trans.disp().to_point())?,
            strans: export_strans(trans),
        }
        .into())
    }

    fn export_text(&self, text: &Text) -> Result<GdsElement> {
        let GdsLayer(l, d) = self.gds_layer(text.layer);
        Ok(GdsTextElem {
            string: text.string.clone(),
            layer: l as i16,
            texttype: d as i16,
            xy: self.export_point(text.position)?,
            strans: None,
        }
        .into())
    }

    fn export_point(&self, p: Point) -> Result<GdsPoint> {
        let coord = |v: f64| {
            i32::try_from(geometry::snap::to_dbu(v, self.dbu()))
                .map_err(|_| Error::CoordinateOverflow(v))
        };
        Ok(GdsPoint::new(coord(p.x)?, coord(p.y)?))
    }
}

fn export_strans(trans: Transformation) -> Option<GdsStrans> {
    let strans = GdsStrans {
        reflected: trans.is_mirror(),
        mag: ((trans.mag() - 1.).abs() > 1e-12).then_some(trans.mag()),
        angle: (trans.rot().abs() > 1e-12).then_some(trans.rot()),
    };
    (strans != GdsStrans::default()).then_some(strans)
}
