//! Polygon sets with boolean algebra.
//!
//! A [`Region`] is a bag of polygons. Concatenation (`+`) keeps the polygons
//! as they are; every boolean operator (`|`, `-`, `&`, `^`) merges its
//! operands first, so overlapping input polygons behave as their union.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, BitAnd, BitOr, BitOrAssign, BitXor, Sub, SubAssign};

use crate::arc::circle_polygon;
use crate::bbox::Bbox;
use crate::boolean::{overlay, BoolOp};
use crate::error::Result;
use crate::point::Point;
use crate::polygon::{edges, Polygon};
use crate::rect::Rect;
use crate::snap::snap_to_grid;
use crate::transform::{Transform, Transformation};
use crate::EPSILON;

/// Vertices per full circle used for the rounded corners produced by [`Region::sized`].
const SIZING_POINTS: usize = 32;

/// Maximum recursion depth when cutting holes out of polygons.
const MAX_CUT_DEPTH: usize = 64;

/// A set of polygons.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    polygons: Vec<Polygon>,
}

impl Region {
    /// Creates an empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a region from the given polygons without merging them.
    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon>) -> Self {
        Self {
            polygons: polygons.into_iter().collect(),
        }
    }

    /// Adds a polygon without merging.
    pub fn insert(&mut self, polygon: impl Into<Polygon>) {
        self.polygons.push(polygon.into());
    }

    /// The polygons in this region, unmerged.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Consumes the region, returning its polygons.
    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    /// The number of stored polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the region holds no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Returns the union of all polygons, with overlaps resolved.
    pub fn merged(&self) -> Region {
        Self::from_polygons(overlay(&self.polygons, &[], BoolOp::Union))
    }

    /// The covered area. Overlapping polygons are counted once.
    pub fn area(&self) -> f64 {
        self.merged().polygons.iter().map(Polygon::area).sum()
    }

    /// Whether `p` lies inside any polygon of the region.
    pub fn contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    /// Merged union of `self` and `other`.
    pub fn union(&self, other: &Region) -> Region {
        Self::from_polygons(overlay(&self.polygons, &other.polygons, BoolOp::Union))
    }

    /// The parts of `self` not covered by `other`.
    pub fn difference(&self, other: &Region) -> Region {
        Self::from_polygons(overlay(&self.polygons, &other.polygons, BoolOp::Difference))
    }

    /// The parts covered by both regions.
    pub fn intersection(&self, other: &Region) -> Region {
        Self::from_polygons(overlay(&self.polygons, &other.polygons, BoolOp::Intersection))
    }

    /// The parts covered by exactly one of the regions.
    pub fn xor(&self, other: &Region) -> Region {
        Self::from_polygons(overlay(&self.polygons, &other.polygons, BoolOp::Xor))
    }

    /// A transformed copy of the region.
    pub fn transformed(&self, trans: Transformation) -> Region {
        self.transform(trans)
    }

    /// Grows (`d > 0`) or shrinks (`d < 0`) the region isotropically by `d`.
    ///
    /// Convex corners of grown regions become arcs.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let square = Region::from(Rect::from_sides(0., 0., 10., 10.));
    /// let shrunk = square.sized(-2.);
    /// assert!((shrunk.area() - 36.).abs() < 1e-3);
    /// ```
    pub fn sized(&self, d: f64) -> Region {
        if d.abs() < EPSILON {
            return self.merged();
        }
        if d < 0. {
            let Some(bbox) = self.bbox() else {
                return Region::new();
            };
            let frame = Region::from(bbox.enlarged(-2. * d + 1.)) - self;
            return self - &frame.sized(-d);
        }
        let merged = self.merged();
        let mut pieces = merged.polygons.clone();
        for poly in &merged.polygons {
            for contour in poly.contours() {
                for (a, b) in edges(contour) {
                    let dir = b - a;
                    if dir.length() < EPSILON {
                        continue;
                    }
                    let n = dir.normalized().perpendicular() * d;
                    pieces.push(Polygon::new(vec![a - n, b - n, b + n, a + n]));
                }
                pieces.extend(contour.iter().map(|v| circle_polygon(d, SIZING_POINTS, *v)));
            }
        }
        Self::from_polygons(pieces).merged()
    }

    /// Rounds all corners of the merged region.
    ///
    /// See [`Polygon::round_corners`].
    pub fn round_corners(&self, r_inner: f64, r_outer: f64, n: usize) -> Result<Region> {
        self.merged()
            .polygons
            .iter()
            .map(|p| p.round_corners(r_inner, r_outer, n))
            .collect::<Result<Vec<_>>>()
            .map(Self::from_polygons)
    }

    /// Merged polygons with every hole removed by cutting the polygon apart.
    ///
    /// GDS boundaries cannot describe holes, so a polygon with holes is split
    /// along vertical lines through its holes until none remain.
    pub fn hole_free_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        for poly in self.merged().polygons {
            cut_holes(poly, 0, &mut out);
        }
        out
    }

    /// Hole-free polygons of at most `max_points` vertices each.
    ///
    /// Larger polygons are halved across the longer side of their bounding
    /// box until every piece fits.
    pub fn hole_free_polygons_within(&self, max_points: usize) -> Vec<Polygon> {
        let mut out = Vec::new();
        for poly in self.hole_free_polygons() {
            split_large(poly, max_points, 0, &mut out);
        }
        out
    }

    /// Whether any polygon of the region touches or overlaps `rect`.
    pub fn interacts_with_rect(&self, rect: &Rect) -> bool {
        let rect_corners = rect.corners();
        self.polygons.iter().any(|poly| {
            let Some(bbox) = poly.bbox() else {
                return false;
            };
            if !bbox.intersects(rect) {
                return false;
            }
            poly.hull().iter().any(|p| rect.contains(*p))
                || rect_corners.iter().any(|c| poly.contains(*c))
                || poly.contours().any(|contour| {
                    edges(contour).any(|(a, b)| {
                        edges(&rect_corners).any(|(c, d)| segments_intersect(a, b, c, d))
                    })
                })
        })
    }

    /// The sub-intervals of the segment `p0 -> p1` that lie inside the region.
    ///
    /// Intervals are returned as distances from `p0`, sorted and non-overlapping.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let mut region = Region::from(Rect::from_sides(1., -1., 2., 1.));
    /// region.insert(Rect::from_sides(3., -1., 5., 1.));
    /// let spans = region.intervals_along(Point::new(0., 0.), Point::new(10., 0.));
    /// assert_eq!(spans.len(), 2);
    /// assert!((spans[1].0 - 3.).abs() < 1e-9 && (spans[1].1 - 5.).abs() < 1e-9);
    /// ```
    pub fn intervals_along(&self, p0: Point, p1: Point) -> Vec<(f64, f64)> {
        let total = p0.distance(p1);
        if total < EPSILON {
            return Vec::new();
        }
        let merged = self.merged();
        let mut ts = vec![0., 1.];
        for poly in &merged.polygons {
            for contour in poly.contours() {
                for (a, b) in edges(contour) {
                    if let Some(t) = segment_param(p0, p1, a, b) {
                        ts.push(t);
                    }
                }
            }
        }
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        let mut out: Vec<(f64, f64)> = Vec::new();
        for w in ts.windows(2) {
            let mid = p0 + (p1 - p0) * ((w[0] + w[1]) / 2.);
            if !merged.contains(mid) {
                continue;
            }
            let (s, e) = (w[0] * total, w[1] * total);
            match out.last_mut() {
                Some(last) if (last.1 - s).abs() < 1e-9 => last.1 = e,
                _ => out.push((s, e)),
            }
        }
        out
    }

    /// A copy with every vertex snapped to `grid`, dropping collapsed polygons.
    pub fn snapped(&self, grid: f64) -> Region {
        Self::from_polygons(self.polygons.iter().filter_map(|poly| {
            let snap = |c: &[Point]| {
                c.iter()
                    .map(|p| Point::new(snap_to_grid(p.x, grid), snap_to_grid(p.y, grid)))
                    .collect::<Vec<_>>()
            };
            let snapped = Polygon::with_holes(
                snap(poly.hull()),
                poly.holes().iter().map(|h| snap(h.as_slice())).collect(),
            );
            (snapped.hull().len() >= 3 && snapped.area().abs() > 0.).then_some(snapped)
        }))
    }
}

fn cut_holes(poly: Polygon, depth: usize, out: &mut Vec<Polygon>) {
    let Some(hole) = poly.holes().first() else {
        out.push(poly);
        return;
    };
    if depth >= MAX_CUT_DEPTH {
        tracing::warn!("giving up cutting holes after {depth} levels; polygon kept with holes");
        out.push(poly);
        return;
    }
    let (Some(hole_box), Some(bbox)) = (hole.bbox(), poly.bbox()) else {
        out.push(poly);
        return;
    };
    let cx = hole_box.center().x;
    let left = Region::from(Rect::from_sides(bbox.left() - 1., bbox.bot() - 1., cx, bbox.top() + 1.));
    let right = Region::from(Rect::from_sides(cx, bbox.bot() - 1., bbox.right() + 1., bbox.top() + 1.));
    let whole = Region::from(poly);
    for half in [&whole & &left, &whole & &right] {
        for piece in half.polygons {
            cut_holes(piece, depth + 1, out);
        }
    }
}

fn split_large(poly: Polygon, max_points: usize, depth: usize, out: &mut Vec<Polygon>) {
    if poly.num_points() <= max_points {
        out.push(poly);
        return;
    }
    if depth >= MAX_CUT_DEPTH {
        tracing::warn!(
            points = poly.num_points(),
            "giving up splitting after {depth} levels; polygon kept whole"
        );
        out.push(poly);
        return;
    }
    let Some(bbox) = poly.bbox() else {
        out.push(poly);
        return;
    };
    let c = bbox.center();
    let (first, second) = if bbox.width() >= bbox.height() {
        (
            Rect::from_sides(bbox.left() - 1., bbox.bot() - 1., c.x, bbox.top() + 1.),
            Rect::from_sides(c.x, bbox.bot() - 1., bbox.right() + 1., bbox.top() + 1.),
        )
    } else {
        (
            Rect::from_sides(bbox.left() - 1., bbox.bot() - 1., bbox.right() + 1., c.y),
            Rect::from_sides(bbox.left() - 1., c.y, bbox.right() + 1., bbox.top() + 1.),
        )
    };
    let whole = Region::from(poly);
    for half in [&whole & &Region::from(first), &whole & &Region::from(second)] {
        for piece in half.polygons {
            split_large(piece, max_points, depth + 1, out);
        }
    }
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let (d1, d2) = (orient(c, d, a), orient(c, d, b));
    let (d3, d4) = (orient(a, b, c), orient(a, b, d));
    (d1 * d2 <= 0.) && (d3 * d4 <= 0.) && !(d1 == 0. && d2 == 0. && d3 == 0. && d4 == 0.)
}

/// Parameter along `p0 -> p1` where it crosses segment `a -> b`, if any.
fn segment_param(p0: Point, p1: Point, a: Point, b: Point) -> Option<f64> {
    let r = p1 - p0;
    let s = b - a;
    let denom = r.cross(s);
    if denom.abs() < 1e-15 {
        return None;
    }
    let t = (a - p0).cross(s) / denom;
    let u = (a - p0).cross(r) / denom;
    ((0. ..=1.).contains(&t) && (0. ..=1.).contains(&u)).then_some(t)
}

impl Bbox for Region {
    fn bbox(&self) -> Option<Rect> {
        self.polygons.bbox()
    }
}

impl Transform for Region {
    fn transform(&self, trans: Transformation) -> Self {
        Self {
            polygons: self.polygons.transform(trans),
        }
    }
}

impl From<Polygon> for Region {
    fn from(value: Polygon) -> Self {
        Self {
            polygons: vec![value],
        }
    }
}

impl From<Rect> for Region {
    fn from(value: Rect) -> Self {
        Self::from(value.to_polygon())
    }
}

impl FromIterator<Polygon> for Region {
    fn from_iter<T: IntoIterator<Item = Polygon>>(iter: T) -> Self {
        Self::from_polygons(iter)
    }
}

impl Extend<Polygon> for Region {
    fn extend<T: IntoIterator<Item = Polygon>>(&mut self, iter: T) {
        self.polygons.extend(iter);
    }
}

macro_rules! region_binop {
    ($trait:ident, $method:ident, $impl:ident) => {
        impl $trait<&Region> for &Region {
            type Output = Region;
            fn $method(self, rhs: &Region) -> Region {
                self.$impl(rhs)
            }
        }

        impl $trait<Region> for Region {
            type Output = Region;
            fn $method(self, rhs: Region) -> Region {
                (&self).$impl(&rhs)
            }
        }

        impl $trait<&Region> for Region {
            type Output = Region;
            fn $method(self, rhs: &Region) -> Region {
                (&self).$impl(rhs)
            }
        }
    };
}

region_binop!(BitOr, bitor, union);
region_binop!(Sub, sub, difference);
region_binop!(BitAnd, bitand, intersection);
region_binop!(BitXor, bitxor, xor);

impl Add<Region> for Region {
    type Output = Region;

    /// Concatenation without merging.
    fn add(mut self, rhs: Region) -> Region {
        self.polygons.extend(rhs.polygons);
        self
    }
}

impl Add<&Region> for Region {
    type Output = Region;
    fn add(mut self, rhs: &Region) -> Region {
        self.polygons.extend(rhs.polygons.iter().cloned());
        self
    }
}

impl AddAssign<Region> for Region {
    fn add_assign(&mut self, rhs: Region) {
        self.polygons.extend(rhs.polygons);
    }
}

impl AddAssign<&Region> for Region {
    fn add_assign(&mut self, rhs: &Region) {
        self.polygons.extend(rhs.polygons.iter().cloned());
    }
}

impl AddAssign<Polygon> for Region {
    fn add_assign(&mut self, rhs: Polygon) {
        self.polygons.push(rhs);
    }
}

impl SubAssign<&Region> for Region {
    fn sub_assign(&mut self, rhs: &Region) {
        *self = self.difference(rhs);
    }
}

impl SubAssign<Region> for Region {
    fn sub_assign(&mut self, rhs: Region) {
        *self = self.difference(&rhs);
    }
}

impl BitOrAssign<&Region> for Region {
    fn bitor_assign(&mut self, rhs: &Region) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::arc::circle_polygon;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Region {
        Region::from(Rect::from_sides(x0, y0, x1, y1))
    }

    #[test]
    fn overlapping_union_counts_area_once() {
        let r = square(0., 0., 2., 2.) | square(1., 0., 3., 2.);
        assert_eq!(r.len(), 1);
        assert_relative_eq!(r.area(), 6., epsilon = 1e-9);
    }

    #[test]
    fn concatenation_keeps_polygons() {
        let r = square(0., 0., 2., 2.) + square(1., 0., 3., 2.);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r.area(), 6., epsilon = 1e-9);
    }

    #[test]
    fn difference_creates_hole() {
        let r = square(0., 0., 10., 10.) - square(4., 4., 6., 6.);
        assert_eq!(r.len(), 1);
        assert_eq!(r.polygons()[0].holes().len(), 1);
        assert_relative_eq!(r.area(), 96., epsilon = 1e-9);
    }

    #[test]
    fn intersection_and_xor() {
        let a = square(0., 0., 2., 2.);
        let b = square(1., 1., 3., 3.);
        assert_relative_eq!((&a & &b).area(), 1., epsilon = 1e-9);
        assert_relative_eq!((&a ^ &b).area(), 6., epsilon = 1e-9);
        assert!((&a & &square(5., 5., 6., 6.)).is_empty());
    }

    #[test]
    fn empty_operands() {
        let a = square(0., 0., 2., 2.);
        let empty = Region::new();
        assert_relative_eq!((&a - &empty).area(), 4., epsilon = 1e-9);
        assert!((&empty - &a).is_empty());
        assert_relative_eq!((&empty | &a).area(), 4., epsilon = 1e-9);
    }

    #[test]
    fn sizing_grows_disk_radius() {
        let disk = Region::from(circle_polygon(100., 256, Point::zero()));
        let grown = disk.sized(5.);
        let bbox = grown.bbox().unwrap();
        assert_relative_eq!(bbox.right(), 105., epsilon = 1e-6);
        assert!(grown.area() > disk.area());
        let shrunk = disk.sized(-5.);
        assert!(shrunk.bbox().unwrap().right() < 95.01);
    }

    #[test]
    fn hole_free_polygons_preserve_area() {
        let ring = square(0., 0., 10., 10.) - square(4., 4., 6., 6.) - square(7., 7., 8., 8.);
        let pieces = ring.hole_free_polygons();
        assert!(pieces.iter().all(|p| p.holes().is_empty()));
        let area: f64 = pieces.iter().map(Polygon::area).sum();
        assert_relative_eq!(area, 95., epsilon = 1e-6);
    }

    #[test]
    fn large_polygons_are_split() {
        let disk = Region::from(circle_polygon(100., 1000, Point::zero()));
        let pieces = disk.hole_free_polygons_within(300);
        assert!(pieces.len() >= 4);
        assert!(pieces.iter().all(|p| p.num_points() <= 300));
        let area: f64 = pieces.iter().map(Polygon::area).sum();
        assert_relative_eq!(area, disk.area(), max_relative = 1e-9);
    }

    #[test]
    fn rect_interaction() {
        let ring = square(0., 0., 10., 10.) - square(2., 2., 8., 8.);
        assert!(!ring.interacts_with_rect(&Rect::from_sides(4., 4., 6., 6.)));
        assert!(ring.interacts_with_rect(&Rect::from_sides(-1., 4., 1., 6.)));
        assert!(ring.interacts_with_rect(&Rect::from_sides(-5., -5., 15., 15.)));
        assert!(!ring.interacts_with_rect(&Rect::from_sides(20., 20., 21., 21.)));
    }

    #[test]
    fn snapping_drops_slivers() {
        let sliver = square(0., 0., 10., 0.0001);
        assert!(sliver.snapped(0.001).is_empty());
        let ok = square(0.0004, 0., 10., 1.);
        assert_eq!(ok.snapped(0.001).polygons()[0].hull()[0].x, 0.);
    }
}
