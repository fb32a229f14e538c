//! GDSII stream data model and writer.
//!
//! Only the subset of the format needed for mask export is modelled:
//! boundaries, paths, structure references and text elements.
//!
//! # Examples
//!
//! ```
//! use gds::{GdsBoundary, GdsLibrary, GdsPoint, GdsStruct};
//!
//! let mut lib = GdsLibrary::new("demo");
//! let mut cell = GdsStruct::new("TOP");
//! cell.elems.push(
//!     GdsBoundary {
//!         layer: 1,
//!         datatype: 0,
//!         xy: vec![GdsPoint::new(0, 0), GdsPoint::new(10, 0), GdsPoint::new(10, 10)],
//!     }
//!     .into(),
//! );
//! lib.structs.push(cell);
//! let bytes = lib.to_bytes().unwrap();
//! assert_eq!(&bytes[2..4], &[0x00, 0x02]);
//! ```

use std::path::Path;

use arcstr::ArcStr;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod record;
mod write;

#[cfg(test)]
mod tests;

pub use record::{GdsRecord, RecordReader, RecordType};

/// The [`GdsError`] result type.
pub type GdsResult<T> = Result<T, GdsError>;

/// An error reading or writing a GDSII stream.
#[derive(thiserror::Error, Debug)]
pub enum GdsError {
    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A string does not fit into a single record.
    #[error("string of {0} bytes is too long for a GDS record")]
    StringTooLong(usize),
    /// An element has more points than a single XY record can carry.
    #[error("element has {0} points; at most {max} fit in one XY record", max = record::MAX_XY_POINTS)]
    TooManyPoints(usize),
    /// A record with an unknown type code was encountered while reading.
    #[error("unsupported record type 0x{0:02x}")]
    UnsupportedRecord(u8),
    /// A record header was inconsistent with its payload.
    #[error("malformed record: {0}")]
    Malformed(ArcStr),
}

/// Library units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GdsUnits {
    /// Size of a database unit in user units.
    pub user: f64,
    /// Size of a database unit in meters.
    pub db: f64,
}

impl GdsUnits {
    /// Creates a new set of units.
    pub const fn new(user: f64, db: f64) -> Self {
        Self { user, db }
    }
}

impl Default for GdsUnits {
    /// One nanometre database units with micrometre user units.
    fn default() -> Self {
        Self::new(1e-3, 1e-9)
    }
}

/// A point in database units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GdsPoint {
    /// The x-coordinate.
    pub x: i32,
    /// The y-coordinate.
    pub y: i32,
}

impl GdsPoint {
    /// Creates a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Reflection, magnification and rotation of a reference or text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsStrans {
    /// Reflect about the x-axis before rotating.
    pub reflected: bool,
    /// Magnification factor.
    pub mag: Option<f64>,
    /// Counterclockwise rotation in degrees.
    pub angle: Option<f64>,
}

/// A filled polygon.
///
/// The closing point may be omitted; the writer appends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsBoundary {
    /// Layer number.
    pub layer: i16,
    /// Datatype number.
    pub datatype: i16,
    /// Vertices.
    pub xy: Vec<GdsPoint>,
}

/// A wire of fixed width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsPath {
    /// Layer number.
    pub layer: i16,
    /// Datatype number.
    pub datatype: i16,
    /// Path width in database units.
    pub width: i32,
    /// End style: 0 flush, 1 round, 2 half-width extension.
    pub pathtype: i16,
    /// Centre line vertices.
    pub xy: Vec<GdsPoint>,
}

/// A placement of another structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsStructRef {
    /// Name of the referenced structure.
    pub name: ArcStr,
    /// Placement origin.
    pub xy: GdsPoint,
    /// Optional transformation.
    pub strans: Option<GdsStrans>,
}

/// A text label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GdsTextElem {
    /// The label string.
    pub string: ArcStr,
    /// Layer number.
    pub layer: i16,
    /// Texttype number.
    pub texttype: i16,
    /// Anchor point.
    pub xy: GdsPoint,
    /// Optional transformation.
    pub strans: Option<GdsStrans>,
}

/// An element of a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GdsElement {
    /// A polygon.
    Boundary(GdsBoundary),
    /// A wire.
    Path(GdsPath),
    /// A structure reference.
    StructRef(GdsStructRef),
    /// A text label.
    Text(GdsTextElem),
}

impl From<GdsBoundary> for GdsElement {
    fn from(value: GdsBoundary) -> Self {
        Self::Boundary(value)
    }
}

impl From<GdsPath> for GdsElement {
    fn from(value: GdsPath) -> Self {
        Self::Path(value)
    }
}

impl From<GdsStructRef> for GdsElement {
    fn from(value: GdsStructRef) -> Self {
        Self::StructRef(value)
    }
}

impl From<GdsTextElem> for GdsElement {
    fn from(value: GdsTextElem) -> Self {
        Self::Text(value)
    }
}

/// A named structure (cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsStruct {
    /// Structure name.
    pub name: ArcStr,
    /// Elements.
    pub elems: Vec<GdsElement>,
}

impl GdsStruct {
    /// Creates an empty structure.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            elems: Vec::new(),
        }
    }
}

/// A GDSII library: units plus a list of structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdsLibrary {
    /// Library name.
    pub name: ArcStr,
    /// Library units.
    pub units: GdsUnits,
    /// Structures, children before parents.
    pub structs: Vec<GdsStruct>,
    /// Modification and access timestamp written to BGNLIB/BGNSTR.
    pub modified: NaiveDateTime,
}

impl GdsLibrary {
    /// Creates an empty library with default units.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self::with_units(name, GdsUnits::default())
    }

    /// Creates an empty library with the given units.
    pub fn with_units(name: impl Into<ArcStr>, units: GdsUnits) -> Self {
        Self {
            name: name.into(),
            units,
            structs: Vec::new(),
            modified: Utc::now().naive_utc(),
        }
    }

    /// Writes the library as a GDSII stream.
    pub fn write(&self, dest: impl std::io::Write) -> GdsResult<()> {
        write::GdsWriter::new(dest).write_library(self)
    }

    /// Encodes the library into an in-memory GDSII stream.
    pub fn to_bytes(&self) -> GdsResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }

    /// Writes the library to a file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> GdsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        self.write(std::io::BufWriter::new(file))?;
        tracing::debug!(path = %path.display(), structs = self.structs.len(), "wrote GDS library");
        Ok(())
    }
}
