//! Cells, instances, and the layout database that owns them.

use std::collections::{HashMap, HashSet, VecDeque};

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::layers::Layer;

pub mod builder;
pub mod export;
mod names;
pub mod refpoints;

pub use builder::{CellBuilder, Element};
pub use export::export_gds;
pub use refpoints::Refpoints;

use names::Names;

/// Identifies a cell within a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(u64);

/// A placement of a cell inside another cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    cell: CellId,
    trans: Transformation,
    name: Option<ArcStr>,
}

impl Instance {
    /// The placed cell.
    #[inline]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    /// The placement transformation.
    #[inline]
    pub fn trans(&self) -> Transformation {
        self.trans
    }

    /// The instance name, if one was given.
    #[inline]
    pub fn name(&self) -> Option<&ArcStr> {
        self.name.as_ref()
    }
}

/// A text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// The layer the label is on.
    pub layer: Layer,
    /// The label string.
    pub string: ArcStr,
    /// The label anchor.
    pub position: Point,
}

/// A finished cell: shapes per layer, labels, child instances and reference points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    name: ArcStr,
    shapes: IndexMap<Layer, Region>,
    texts: Vec<Text>,
    instances: Vec<Instance>,
    refpoints: Refpoints,
    length: Option<f64>,
}

impl Cell {
    pub(crate) fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The unique cell name.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// The shapes drawn directly in this cell on `layer`.
    pub fn shapes(&self, layer: Layer) -> Option<&Region> {
        self.shapes.get(&layer)
    }

    /// Iterates over `(layer, region)` pairs drawn directly in this cell.
    pub fn layers(&self) -> impl Iterator<Item = (Layer, &Region)> {
        self.shapes.iter().map(|(l, r)| (*l, r))
    }

    /// Text labels drawn in this cell.
    pub fn texts(&self) -> &[Text] {
        &self.texts
    }

    /// The child instances.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// The cell's reference points, in cell coordinates.
    pub fn refpoints(&self) -> &Refpoints {
        &self.refpoints
    }

    /// The routed length, for cells that represent transmission lines.
    pub fn length(&self) -> Option<f64> {
        self.length
    }
}

/// A collection of cells and the cache of parametric cells built so far.
#[derive(Debug, Clone)]
pub struct Layout {
    config: Config,
    next_id: u64,
    cells: IndexMap<CellId, Cell>,
    name_map: HashMap<ArcStr, CellId>,
    names: Names,
    cache: HashMap<String, CellId>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Layout {
    /// Creates an empty layout.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            next_id: 0,
            cells: IndexMap::new(),
            name_map: HashMap::new(),
            names: Names::default(),
            cache: HashMap::new(),
        }
    }

    /// The layout settings.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the cell for `element`, reusing a previously built cell with
    /// identical parameters.
    ///
    /// ```
    /// # use qcells::layout::Layout;
    /// # use qcells::elements::marker::Marker;
    /// let mut layout = Layout::default();
    /// let a = layout.build(&Marker::default()).unwrap();
    /// let b = layout.build(&Marker::default()).unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(layout.cell(a).name(), "Marker");
    /// ```
    pub fn build<E: Element>(&mut self, element: &E) -> Result<CellId> {
        let key = format!("{}{}", E::NAME, serde_json::to_string(element)?);
        if let Some(id) = self.cache.get(&key) {
            return Ok(*id);
        }
        let span = tracing::debug_span!("build", element = E::NAME);
        let _guard = span.enter();

        let mut builder = CellBuilder::new(self, E::NAME);
        element.build(&mut builder)?;
        let cell = builder.finish();
        let id = self.add_cell(cell);
        self.cache.insert(key, id);
        tracing::debug!(cell = %self.cell(id).name, "built cell");
        Ok(id)
    }

    /// Adds a finished cell, renaming it if its name is taken.
    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        self.next_id += 1;
        let id = CellId(self.next_id);
        cell.name = self.names.assign_name(&cell.name);
        self.name_map.insert(cell.name.clone(), id);
        self.cells.insert(id, cell);
        id
    }

    /// The cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not belong to this layout.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[&id]
    }

    /// The cell with the given ID, if it exists.
    pub fn try_cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    /// Gets the cell ID corresponding to the given name.
    pub fn cell_id_named(&self, name: &str) -> Option<CellId> {
        self.name_map.get(name).copied()
    }

    /// The cell with the given name, if it exists.
    pub fn cell_named(&self, name: &str) -> Option<&Cell> {
        self.try_cell(self.cell_id_named(name)?)
    }

    /// Iterates over the `(id, cell)` pairs in this layout.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// The number of cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns cell IDs in topological order, children before parents.
    pub fn topological_order(&self) -> Vec<CellId> {
        let mut state = IndexSet::new();
        for (cell, _) in self.cells() {
            self.dfs_postorder(cell, &mut state);
        }
        state.into_iter().collect()
    }

    fn dfs_postorder(&self, id: CellId, state: &mut IndexSet<CellId>) {
        if state.contains(&id) {
            return;
        }
        for inst in self.cell(id).instances() {
            self.dfs_postorder(inst.cell(), state);
        }
        state.insert(id);
    }

    /// The cells instantiated, directly or not, by the given roots.
    ///
    /// The roots themselves are included.
    pub fn cells_used_by(&self, roots: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        let mut stack: VecDeque<CellId> = roots.into_iter().collect();
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            stack.extend(self.cell(id).instances().iter().map(Instance::cell));
        }
        self.topological_order()
            .into_iter()
            .filter(|id| visited.contains(id))
            .collect()
    }

    /// All shapes on `layer` in `id` and its descendants, in the coordinates of `id`.
    pub fn flat_region(&self, id: CellId, layer: Layer) -> Region {
        let cell = self.cell(id);
        let mut region = cell.shapes(layer).cloned().unwrap_or_default();
        for inst in cell.instances() {
            region += self.flat_region(inst.cell(), layer).transformed(inst.trans());
        }
        region
    }
}

#[cfg(test)]
mod tests;
