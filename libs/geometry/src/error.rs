//! Geometry error types.

/// The geometry [`Result`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error produced by a geometric construction.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A rounding or sizing radius was negative or not finite.
    #[error("invalid radius: {0}")]
    InvalidRadius(f64),
}
