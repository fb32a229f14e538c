//! Named reference points.

use arcstr::ArcStr;
use geometry::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered map from names to points, used to connect cells to each other.
///
/// Ports are stored as `port_<name>` with an optional `port_<name>_corner`
/// one bend radius further out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Refpoints(IndexMap<ArcStr, Point>);

impl Refpoints {
    /// Creates an empty set of reference points.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a reference point by name.
    pub fn get(&self, name: &str) -> Result<Point> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownRefpoint(name.into()))
    }

    /// Looks up a reference point, returning `None` if it does not exist.
    pub fn try_get(&self, name: &str) -> Option<Point> {
        self.0.get(name).copied()
    }

    /// Whether a point with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Inserts or replaces a reference point.
    pub fn insert(&mut self, name: impl Into<ArcStr>, point: Point) {
        self.0.insert(name.into(), point);
    }

    /// The number of reference points.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no reference points.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, point)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArcStr, Point)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// A copy with every point transformed.
    pub fn transformed(&self, trans: Transformation) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), trans.apply_point(*v)))
                .collect(),
        )
    }

    /// A copy with every name prefixed by `<prefix>_`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (arcstr::format!("{prefix}_{k}"), *v))
                .collect(),
        )
    }

    /// Inserts every point of `other`, replacing existing names.
    pub fn extend(&mut self, other: &Refpoints) {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

impl Transform for Refpoints {
    fn transform(&self, trans: Transformation) -> Self {
        self.transformed(trans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_are_errors() {
        let mut refs = Refpoints::new();
        refs.insert("port_a", Point::new(1., 2.));
        assert_eq!(refs.get("port_a").unwrap(), Point::new(1., 2.));
        assert!(matches!(refs.get("port_b"), Err(Error::UnknownRefpoint(name)) if name == "port_b"));
    }

    #[test]
    fn prefix_and_transform() {
        let mut refs = Refpoints::new();
        refs.insert("port_a", Point::new(10., 0.));
        let placed = refs
            .transformed(Transformation::new(1., 90., false, Vector::new(5., 5.)))
            .prefixed("QB1");
        assert_eq!(placed.get("QB1_port_a").unwrap(), Point::new(5., 15.));
        assert!(!placed.contains("port_a"));
    }
}
