//! Building cells from parametric elements.

use arcstr::ArcStr;
use geometry::prelude::*;
use serde::Serialize;

use super::{Cell, CellId, Instance, Layout, Refpoints, Text};
use crate::config::{Config, DEFAULT_R};
use crate::error::Result;
use crate::layers::Layer;

/// A parametric cell.
///
/// The serialized parameters identify the cell: building an element twice
/// with equal parameters yields the same [`CellId`].
pub trait Element: Serialize {
    /// The base name of cells built from this element.
    const NAME: &'static str;

    /// Draws the element into `cell`.
    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()>;
}

/// A cell under construction.
pub struct CellBuilder<'a> {
    layout: &'a mut Layout,
    cell: Cell,
    r: f64,
}

impl<'a> CellBuilder<'a> {
    pub(crate) fn new(layout: &'a mut Layout, name: &str) -> Self {
        Self {
            layout,
            cell: Cell::new(name),
            r: DEFAULT_R,
        }
    }

    pub(crate) fn finish(self) -> Cell {
        self.cell
    }

    /// The layout settings.
    pub fn config(&self) -> &Config {
        self.layout.config()
    }

    /// The layout the cell is being built in.
    pub fn layout(&self) -> &Layout {
        self.layout
    }

    /// Sets the distance from a port to its corner reference point.
    pub fn set_corner_distance(&mut self, r: f64) {
        self.r = r;
    }

    /// Adds `region` to the shapes on `layer`.
    pub fn draw(&mut self, layer: Layer, region: impl Into<Region>) {
        let region = region.into();
        if region.is_empty() {
            return;
        }
        *self.cell.shapes.entry(layer).or_default() += region;
    }

    /// The shapes drawn so far on `layer`, excluding child instances.
    pub fn shapes(&self, layer: Layer) -> Option<&Region> {
        self.cell.shapes(layer)
    }

    /// Adds a text label.
    pub fn add_text(&mut self, layer: Layer, string: impl Into<ArcStr>, position: Point) {
        self.cell.texts.push(Text {
            layer,
            string: string.into(),
            position,
        });
    }

    /// Adds or replaces a reference point.
    pub fn add_refpoint(&mut self, name: impl Into<ArcStr>, point: Point) {
        self.cell.refpoints.insert(name, point);
    }

    /// Adds a port.
    ///
    /// Creates `port_<name>` at `pos` and, when a direction is given,
    /// `port_<name>_corner` one corner distance (the bend radius) further
    /// along it.
    pub fn add_port(&mut self, name: &str, pos: Point, direction: Option<Vector>) {
        self.add_refpoint(arcstr::format!("port_{name}"), pos);
        if let Some(dir) = direction {
            let corner = pos + dir.normalized() * self.r;
            self.add_refpoint(arcstr::format!("port_{name}_corner"), corner);
        }
    }

    /// The reference points of the cell so far, including those of named instances.
    pub fn refpoints(&self) -> &Refpoints {
        &self.cell.refpoints
    }

    /// Looks up one reference point.
    pub fn refpoint(&self, name: &str) -> Result<Point> {
        self.cell.refpoints.get(name)
    }

    /// Sets the routed length reported by [`Cell::length`].
    pub fn set_length(&mut self, length: f64) {
        self.cell.length = Some(length);
    }

    /// Builds (or reuses) the cell of a child element without placing it.
    pub fn add_element<E: Element>(&mut self, element: &E) -> Result<CellId> {
        self.layout.build(element)
    }

    /// The routed length of an already built cell.
    pub fn cell_length(&self, id: CellId) -> Option<f64> {
        self.layout.cell(id).length()
    }

    /// Places cell `id` with transformation `trans`.
    ///
    /// Returns the child's reference points in this cell's coordinates. If
    /// `inst_name` is given, they are also added to this cell prefixed with
    /// `<inst_name>_`.
    pub fn insert_cell(
        &mut self,
        id: CellId,
        trans: Transformation,
        inst_name: Option<&str>,
    ) -> Result<Refpoints> {
        let refs = self.layout.cell(id).refpoints().transformed(trans);
        if let Some(name) = inst_name {
            self.cell.refpoints.extend(&refs.prefixed(name));
        }
        self.cell.instances.push(Instance {
            cell: id,
            trans,
            name: inst_name.map(ArcStr::from),
        });
        Ok(refs)
    }

    /// Places cell `id` so that its reference point `align`, after
    /// applying `trans`, lands on `align_to`.
    pub fn insert_cell_aligned(
        &mut self,
        id: CellId,
        trans: Transformation,
        align_to: Point,
        align: &str,
        inst_name: Option<&str>,
    ) -> Result<Refpoints> {
        let local = self.layout.cell(id).refpoints().get(align)?;
        let shift = Transformation::translate(align_to - trans.apply_point(local));
        self.insert_cell(id, shift * trans, inst_name)
    }

    /// Builds `element` and places it. See [`CellBuilder::insert_cell`].
    pub fn insert<E: Element>(
        &mut self,
        element: &E,
        trans: Transformation,
        inst_name: Option<&str>,
    ) -> Result<(CellId, Refpoints)> {
        let id = self.add_element(element)?;
        let refs = self.insert_cell(id, trans, inst_name)?;
        Ok((id, refs))
    }

    /// All shapes on `layer` drawn so far, including those of placed instances.
    pub fn flat_region(&self, layer: Layer) -> Region {
        let mut region = self.cell.shapes(layer).cloned().unwrap_or_default();
        for inst in &self.cell.instances {
            region += self
                .layout
                .flat_region(inst.cell(), layer)
                .transformed(inst.trans());
        }
        region
    }
}
