//! Parametric layout cells for superconducting quantum circuits.
//!
//! Elements are serializable parameter structs. A [`Layout`](layout::Layout)
//! builds them into cells of polygons on named [`Layer`](layers::Layer)s,
//! caching cells by parameters, and records named reference points that
//! later elements use to connect to each other.
//!
//! ```
//! # use qcells::layout::{export_gds, Layout};
//! # use qcells::qubits::ConcentricTransmon;
//! let mut layout = Layout::default();
//! let qubit = layout.build(&ConcentricTransmon::default()).unwrap();
//! assert!(layout.cell(qubit).refpoints().contains("port_drive_corner"));
//! let gds = export_gds(&layout, qubit, "qubit").unwrap();
//! assert_eq!(gds.structs.len(), 2);
//! ```
#![warn(missing_docs)]

pub mod chips;
pub mod config;
pub mod elements;
pub mod error;
pub mod layers;
pub mod layout;
pub mod qubits;
pub mod simulation;

#[doc(inline)]
pub use geometry;
