//! Layout-wide settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layers::LayerMap;

/// Default coplanar waveguide center conductor width, in µm.
pub const DEFAULT_A: f64 = 10.;
/// Default coplanar waveguide gap width, in µm.
pub const DEFAULT_B: f64 = 6.;
/// Default bend radius, in µm.
pub const DEFAULT_R: f64 = 50.;
/// Default number of points per full circle.
pub const DEFAULT_N: usize = 64;

/// Settings shared by every cell in a [`Layout`](crate::layout::Layout).
///
/// Missing keys take their default values, so a configuration file only has
/// to list what it changes:
///
/// ```
/// # use qcells::config::Config;
/// # use qcells::layers::{GdsLayer, Layer};
/// let config = Config::from_toml_str(r#"
///     margin = 10.0
///
///     [layers]
///     ground_grid = [33, 0]
/// "#).unwrap();
/// assert_eq!(config.margin, 10.);
/// assert_eq!(config.dbu, 0.001);
/// assert_eq!(config.layers.get(Layer::GroundGrid), GdsLayer(33, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database unit in µm.
    pub dbu: f64,
    /// Width of ground grid avoidance around structures, in µm.
    pub margin: f64,
    /// Layer numbers used for GDS export.
    pub layers: LayerMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dbu: 0.001,
            margin: 5.,
            layers: LayerMap::default(),
        }
    }
}

impl Config {
    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

pub(crate) fn default_a() -> f64 {
    DEFAULT_A
}

pub(crate) fn default_b() -> f64 {
    DEFAULT_B
}

pub(crate) fn default_r() -> f64 {
    DEFAULT_R
}

pub(crate) fn default_n() -> usize {
    DEFAULT_N
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{GdsLayer, Layer};

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn layer_overrides_keep_other_layers() {
        let config = Config::from_toml_str("[layers]\nSIS_junction = [1, 2]\n").unwrap();
        assert_eq!(config.layers.get(Layer::SisJunction), GdsLayer(1, 2));
        assert_eq!(
            config.layers.get(Layer::BaseMetalGapWoGrid),
            LayerMap::default().get(Layer::BaseMetalGapWoGrid)
        );
    }

    #[test]
    fn bad_layer_name_is_an_error() {
        assert!(Config::from_toml_str("[layers]\nmetal = [1, 0]\n").is_err());
    }
}
