//! Qubit elements.

pub mod concentric_transmon;

pub use concentric_transmon::ConcentricTransmon;
