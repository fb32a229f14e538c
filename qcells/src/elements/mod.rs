//! Parametric elements.
//!
//! Every element is a serializable parameter struct implementing
//! [`Element`](crate::layout::Element). Building it draws the element's
//! shapes and reference points into a new cell.

pub mod airbridge;
pub mod capacitor;
pub mod chip_frame;
pub mod composite;
pub mod launcher;
pub mod marker;
pub mod meander;
pub mod splitter;
pub mod squid;
pub mod waveguide;

pub use airbridge::Airbridge;
pub use capacitor::{cap_params, SmoothCapacitor};
pub use chip_frame::ChipFrame;
pub use composite::{produce_fixed_length_waveguide, Node, NodeElement, WaveguideComposite};
pub use launcher::Launcher;
pub use marker::{Marker, MarkerType};
pub use meander::Meander;
pub use splitter::WaveguideCoplanarSplitter;
pub use squid::Squid;
pub use waveguide::{waveguide_length, WaveguideCoplanar};
