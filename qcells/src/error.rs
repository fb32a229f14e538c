//! Error types and error handling utilities.

use arcstr::ArcStr;
use gds::GdsError;

/// A result type returning layout generation errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for cell generators.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A geometric construction failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] geometry::error::Error),
    /// GDS error.
    #[error("gds error: {0}")]
    Gds(#[from] GdsError),
    /// An I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration file could not be parsed.
    #[error("error parsing configuration: {0}")]
    Config(#[from] toml::de::Error),
    /// Parameters could not be serialized or deserialized.
    #[error("error serializing parameters: {0}")]
    Json(#[from] serde_json::Error),
    /// A reference point was looked up that does not exist.
    #[error("no reference point named `{0}`")]
    UnknownRefpoint(ArcStr),
    /// A layer name did not match any known layer.
    #[error("unknown layer `{0}`")]
    UnknownLayer(ArcStr),
    /// A parameter value is outside its valid range or inconsistent with others.
    #[error("invalid parameter: {0}")]
    InvalidParameter(ArcStr),
    /// A marker type name was not recognized.
    #[error("unknown marker type `{0}`")]
    UnknownMarkerType(ArcStr),
    /// A coupler type name was not recognized.
    #[error("unknown coupler type `{0}`")]
    UnknownCouplerType(ArcStr),
    /// A launcher layout name was not recognized.
    #[error("unknown launcher layout `{0}`")]
    UnknownLauncherLayout(ArcStr),
    /// A meander was asked to be shorter than the distance it spans.
    #[error("meander length {length} is shorter than the distance {distance} between its ends")]
    MeanderTooShort {
        /// The requested length.
        length: f64,
        /// The straight distance between start and end.
        distance: f64,
    },
    /// No meander shape with the given bend radius realizes the requested length.
    #[error("cannot fit a meander of length {length} over distance {distance} with radius {r}")]
    MeanderDoesNotFit {
        /// The requested length.
        length: f64,
        /// The straight distance between start and end.
        distance: f64,
        /// The bend radius.
        r: f64,
    },
    /// A fixed-length route did not reach its target length.
    #[error("routing did not converge to length {target} after {iterations} iterations (best {achieved})")]
    RoutingDidNotConverge {
        /// The target length.
        target: f64,
        /// The closest length achieved.
        achieved: f64,
        /// The number of solver iterations performed.
        iterations: usize,
    },
    /// A coordinate does not fit into the GDS integer range.
    #[error("coordinate {0} is out of range for GDS export")]
    CoordinateOverflow(f64),
}

impl Error {
    pub(crate) fn invalid(msg: impl std::fmt::Display) -> Self {
        Self::InvalidParameter(arcstr::format!("{msg}"))
    }
}
