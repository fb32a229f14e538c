//! Simulation geometries and cross sections.

pub mod sweep;
pub mod waveguides_sim;
pub mod xsection;

pub use sweep::sweep_simulation;
pub use waveguides_sim::{FaceGeometry, SimGeometry, WaveGuidesSim};
pub use xsection::{create_xsection, create_xsections, XLayer, XSection, XSectionParams};
