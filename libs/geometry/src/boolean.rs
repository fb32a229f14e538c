//! Polygon boolean operations backed by `i_overlay`.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

use crate::point::Point;
use crate::polygon::Polygon;

/// Polygons smaller than this (in µm²) are dropped from boolean results.
const MIN_AREA: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    Union,
    Difference,
    Intersection,
    Xor,
}

impl BoolOp {
    fn rule(self) -> OverlayRule {
        match self {
            BoolOp::Union => OverlayRule::Union,
            BoolOp::Difference => OverlayRule::Difference,
            BoolOp::Intersection => OverlayRule::Intersect,
            BoolOp::Xor => OverlayRule::Xor,
        }
    }
}

/// Applies `op` to two polygon sets, each interpreted with the non-zero fill rule.
pub(crate) fn overlay(subject: &[Polygon], clip: &[Polygon], op: BoolOp) -> Vec<Polygon> {
    let subject_paths = to_paths(subject);
    let clip_paths = to_paths(clip);
    match (subject_paths.is_empty(), clip_paths.is_empty()) {
        (true, true) => Vec::new(),
        (true, false) => match op {
            BoolOp::Union | BoolOp::Xor => run(&clip_paths, &Vec::new(), OverlayRule::Union),
            BoolOp::Difference | BoolOp::Intersection => Vec::new(),
        },
        (false, true) => match op {
            BoolOp::Intersection => Vec::new(),
            _ => run(&subject_paths, &Vec::new(), OverlayRule::Union),
        },
        (false, false) => run(&subject_paths, &clip_paths, op.rule()),
    }
}

fn run(subject: &Vec<Vec<[f64; 2]>>, clip: &Vec<Vec<[f64; 2]>>, rule: OverlayRule) -> Vec<Polygon> {
    let shapes = subject.overlay(clip, rule, FillRule::NonZero);
    from_shapes(shapes)
}

fn to_paths(polys: &[Polygon]) -> Vec<Vec<[f64; 2]>> {
    polys
        .iter()
        .flat_map(|p| p.contours())
        .filter(|c| c.len() >= 3)
        .map(|c| c.iter().map(|p| [p.x, p.y]).collect())
        .collect()
}

/// Each shape is a list of contours: the outer boundary first, then holes.
fn from_shapes(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Polygon> {
    shapes
        .into_iter()
        .filter_map(|shape| {
            let mut contours = shape.into_iter().map(|c| {
                c.into_iter()
                    .map(|[x, y]| Point::new(x, y))
                    .collect::<Vec<_>>()
            });
            let hull = contours.next()?;
            let poly = Polygon::with_holes(hull, contours.collect());
            (poly.hull().len() >= 3 && poly.area() > MIN_AREA).then_some(poly)
        })
        .collect()
}
