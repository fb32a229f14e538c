//! Complete chips.

pub mod chip;
pub mod concentric_qubits_demo;

pub use chip::Chip;
pub use concentric_qubits_demo::ConcentricQubitsDemo;
