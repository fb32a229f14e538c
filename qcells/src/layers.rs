//! Named mask layers and their GDS numbers.

use std::fmt::Display;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// A GDS layer and datatype pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GdsLayer(pub u16, pub u16);

/// The layers cells draw into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    /// Etched gaps in the base metal, excluding the ground grid.
    #[serde(rename = "base_metal_gap_wo_grid")]
    BaseMetalGapWoGrid,
    /// Metal added back on top of etched regions.
    #[serde(rename = "base_metal_addition")]
    BaseMetalAddition,
    /// Base metal gaps written with electron beam lithography.
    #[serde(rename = "base_metal_gap_for_EBL")]
    BaseMetalGapForEbl,
    /// Ground grid holes.
    #[serde(rename = "ground_grid")]
    GroundGrid,
    /// Areas kept free of ground grid holes.
    #[serde(rename = "ground_grid_avoidance")]
    GroundGridAvoidance,
    /// Airbridge landing pads.
    #[serde(rename = "airbridge_pads")]
    AirbridgePads,
    /// Airbridge spans.
    #[serde(rename = "airbridge_flyover")]
    AirbridgeFlyover,
    /// Josephson junction electrodes.
    #[serde(rename = "SIS_junction")]
    SisJunction,
    /// Shadow evaporation mask for junctions.
    #[serde(rename = "SIS_shadow")]
    SisShadow,
    /// Reference point labels.
    #[serde(rename = "refpoints")]
    Refpoints,
    /// Free-form annotations such as chip names.
    #[serde(rename = "annotations")]
    Annotations,
}

impl Layer {
    /// Every layer, in export order.
    pub const ALL: [Layer; 11] = [
        Layer::BaseMetalGapWoGrid,
        Layer::BaseMetalAddition,
        Layer::BaseMetalGapForEbl,
        Layer::GroundGrid,
        Layer::GroundGridAvoidance,
        Layer::AirbridgePads,
        Layer::AirbridgeFlyover,
        Layer::SisJunction,
        Layer::SisShadow,
        Layer::Refpoints,
        Layer::Annotations,
    ];

    /// The layer name used in configuration files.
    pub const fn name(&self) -> &'static str {
        match self {
            Layer::BaseMetalGapWoGrid => "base_metal_gap_wo_grid",
            Layer::BaseMetalAddition => "base_metal_addition",
            Layer::BaseMetalGapForEbl => "base_metal_gap_for_EBL",
            Layer::GroundGrid => "ground_grid",
            Layer::GroundGridAvoidance => "ground_grid_avoidance",
            Layer::AirbridgePads => "airbridge_pads",
            Layer::AirbridgeFlyover => "airbridge_flyover",
            Layer::SisJunction => "SIS_junction",
            Layer::SisShadow => "SIS_shadow",
            Layer::Refpoints => "refpoints",
            Layer::Annotations => "annotations",
        }
    }

    const fn default_gds(&self) -> GdsLayer {
        match self {
            Layer::BaseMetalGapWoGrid => GdsLayer(130, 1),
            Layer::BaseMetalGapForEbl => GdsLayer(131, 1),
            Layer::BaseMetalAddition => GdsLayer(132, 1),
            Layer::GroundGrid => GdsLayer(133, 1),
            Layer::GroundGridAvoidance => GdsLayer(134, 1),
            Layer::SisJunction => GdsLayer(136, 1),
            Layer::SisShadow => GdsLayer(137, 1),
            Layer::AirbridgePads => GdsLayer(138, 1),
            Layer::AirbridgeFlyover => GdsLayer(139, 1),
            Layer::Refpoints => GdsLayer(220, 0),
            Layer::Annotations => GdsLayer(220, 1),
        }
    }
}

impl Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Layer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| Error::UnknownLayer(s.into()))
    }
}

/// Maps layers to GDS layer/datatype numbers.
///
/// Deserializing only overrides the listed layers; the rest keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerMap(IndexMap<Layer, GdsLayer>);

impl Default for LayerMap {
    fn default() -> Self {
        Self(Layer::ALL.into_iter().map(|l| (l, l.default_gds())).collect())
    }
}

impl LayerMap {
    /// The GDS numbers of `layer`.
    pub fn get(&self, layer: Layer) -> GdsLayer {
        self.0.get(&layer).copied().unwrap_or(layer.default_gds())
    }

    /// Reassigns the GDS numbers of `layer`.
    pub fn set(&mut self, layer: Layer, gds: GdsLayer) {
        self.0.insert(layer, gds);
    }

    /// Iterates over all `(layer, gds)` assignments.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, GdsLayer)> + '_ {
        self.0.iter().map(|(l, g)| (*l, *g))
    }
}

impl<'de> Deserialize<'de> for LayerMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = IndexMap::<Layer, GdsLayer>::deserialize(deserializer)?;
        let mut map = LayerMap::default();
        for (layer, gds) in overrides {
            map.set(layer, gds);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(layer.name().parse::<Layer>().unwrap(), layer);
        }
        assert!(matches!(
            "base_metal".parse::<Layer>(),
            Err(Error::UnknownLayer(_))
        ));
    }

    #[test]
    fn default_numbers_are_distinct() {
        let map = LayerMap::default();
        let mut seen = std::collections::HashSet::new();
        for (_, gds) in map.iter() {
            assert!(seen.insert(gds));
        }
        assert_eq!(seen.len(), Layer::ALL.len());
    }
}
