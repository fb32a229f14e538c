//! Waveguides assembled from nodes, with meanders and inline elements.
//!
//! A [`WaveguideComposite`] routes coplanar runs through a list of [`Node`]s.
//! A node can replace the segment leading to it with a [`Meander`] of a given
//! length, or place an element such as a tee so that the route passes through
//! two of the element's ports.

use arcstr::ArcStr;
use geometry::prelude::*;
use serde::{Deserialize, Serialize};

use super::airbridge::{place_on_segment, Airbridge};
use super::meander::Meander;
use super::splitter::WaveguideCoplanarSplitter;
use super::waveguide::WaveguideCoplanar;
use crate::config::{default_a, default_b, default_n, default_r};
use crate::error::{Error, Result};
use crate::layout::{CellBuilder, CellId, Element, Refpoints};

/// Absolute length tolerance of [`produce_fixed_length_waveguide`], in µm.
pub const LENGTH_TOLERANCE: f64 = 1e-3;
/// Iteration limit of [`produce_fixed_length_waveguide`].
pub const MAX_ITERATIONS: usize = 20;

/// An element placed inline at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeElement {
    /// A waveguide junction. Its `a` and `b` are replaced by the composite's.
    Splitter(WaveguideCoplanarSplitter),
}

/// A point of a [`WaveguideComposite`] route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Where the route passes.
    pub position: Point,
    /// Airbridges on the segment leading to this node.
    #[serde(default)]
    pub n_bridges: usize,
    /// Replaces the segment leading to this node with a meander of this length.
    #[serde(default)]
    pub length_before: Option<f64>,
    /// An element placed at this node.
    #[serde(default)]
    pub element: Option<NodeElement>,
    /// The element ports the route enters and leaves through.
    #[serde(default)]
    pub align: Option<(ArcStr, ArcStr)>,
    /// Instance name of the element; its refpoints are exported as `<inst_name>_<name>`.
    #[serde(default)]
    pub inst_name: Option<ArcStr>,
}

impl Node {
    /// A plain route point.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            n_bridges: 0,
            length_before: None,
            element: None,
            align: None,
            inst_name: None,
        }
    }

    /// Sets the number of airbridges before this node.
    pub fn bridges(mut self, n: usize) -> Self {
        self.n_bridges = n;
        self
    }

    /// Makes the segment before this node a meander of the given length.
    pub fn length_before(mut self, length: f64) -> Self {
        self.length_before = Some(length);
        self
    }

    /// Places `element` at this node, entering through port `align.0` and leaving through `align.1`.
    pub fn element(
        mut self,
        element: NodeElement,
        align: (&str, &str),
        inst_name: Option<&str>,
    ) -> Self {
        self.element = Some(element);
        self.align = Some((align.0.into(), align.1.into()));
        self.inst_name = inst_name.map(ArcStr::from);
        self
    }
}

/// A coplanar waveguide through a list of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveguideComposite {
    /// The route.
    pub nodes: Vec<Node>,
    /// Center conductor width.
    #[serde(default = "default_a")]
    pub a: f64,
    /// Gap width.
    #[serde(default = "default_b")]
    pub b: f64,
    /// Bend radius.
    #[serde(default = "default_r")]
    pub r: f64,
    /// Points per full circle in bends.
    #[serde(default = "default_n")]
    pub n: usize,
    /// Termination gap at the first node.
    #[serde(default)]
    pub term1: f64,
    /// Termination gap at the last node.
    #[serde(default)]
    pub term2: f64,
}

impl WaveguideComposite {
    /// A composite waveguide with the default cross section.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            a: default_a(),
            b: default_b(),
            r: default_r(),
            n: default_n(),
            term1: 0.,
            term2: 0.,
        }
    }

    /// The same cross section and terminations with different nodes.
    pub fn with_nodes(&self, nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..self.clone()
        }
    }

    fn waveguide(&self, points: Vec<Point>, term1: f64, term2: f64) -> WaveguideCoplanar {
        WaveguideCoplanar {
            points,
            a: self.a,
            b: self.b,
            r: self.r,
            n: self.n,
            term1,
            term2,
        }
    }
}

/// Turns smaller than this, in radians, are treated as straight.
const TURN_TOLERANCE: f64 = 1e-9;

/// Accumulates the route while walking the nodes.
struct Router<'p> {
    params: &'p WaveguideComposite,
    run: Vec<Point>,
    /// Direction of travel at the end of the run.
    heading: Option<Vector>,
    first_run: bool,
    length: f64,
    /// Airbridges by segment index of the pending run.
    bridges: Vec<(usize, usize)>,
}

impl Router<'_> {
    fn last(&self) -> Point {
        self.run[self.run.len() - 1]
    }

    fn push(&mut self, p: Point) {
        if let Some(d) = direction(self.last(), p) {
            self.heading = Some(d);
        }
        self.run.push(p);
    }

    /// The turn from the current heading towards `target`, if there is one.
    fn turn_to(&self, target: Point) -> Option<(f64, Vector)> {
        let d = direction(self.last(), target)?;
        let angle = turn(self.heading?, d);
        (angle > TURN_TOLERANCE).then_some((angle, d))
    }

    /// Adds straight leads so that the route turns towards `target` through
    /// a bend instead of a square corner.
    ///
    /// A run that starts on a port first leaves it straight. With
    /// `square_end` the run also turns onto the line towards `target` and
    /// ends there. Returns the length of the leads.
    fn lead_towards(&mut self, target: Point, square_end: bool) -> f64 {
        let r = self.params.r;
        let mut added = 0.;
        if self.run.len() == 1 {
            if let (Some((angle, _)), Some(heading)) = (self.turn_to(target), self.heading) {
                let lead = lead_length(r, angle);
                let p = self.last() + heading * lead;
                self.push(p);
                added += lead;
            }
        }
        if square_end {
            if let Some((angle, d)) = self.turn_to(target) {
                let lead = lead_length(r, angle);
                let p = self.last() + d * lead;
                self.push(p);
                added += lead;
            }
        }
        added
    }

    /// Draws the pending run, if it has a length, and starts a new one at `next`.
    fn flush(&mut self, cell: &mut CellBuilder<'_>, next: Point, last_run: bool) -> Result<()> {
        let run = std::mem::replace(&mut self.run, vec![next]);
        let bridges = std::mem::take(&mut self.bridges);
        let spans = run.windows(2).any(|w| w[0].distance(w[1]) > geometry::EPSILON);
        if spans {
            let term1 = if self.first_run { self.params.term1 } else { 0. };
            let term2 = if last_run { self.params.term2 } else { 0. };
            let (id, _) = cell.insert(
                &self.params.waveguide(run.clone(), term1, term2),
                Transformation::identity(),
                None,
            )?;
            self.length += cell.cell_length(id).unwrap_or_default();

            let bridge = Airbridge::default();
            for (segment, n) in bridges {
                let (p0, p1) = straight_part(&run, segment, self.params.r);
                if p0.distance(p1) < geometry::EPSILON {
                    tracing::warn!(
                        from = ?run[segment],
                        to = ?run[segment + 1],
                        "no straight waveguide left for airbridges"
                    );
                    continue;
                }
                place_on_segment(cell, &bridge, p0, p1, n)?;
            }
        }
        self.first_run = false;
        Ok(())
    }
}

/// The unit direction from `from` to `to`, if they are distinct.
fn direction(from: Point, to: Point) -> Option<Vector> {
    let v = to - from;
    (v.length() > geometry::EPSILON).then(|| v.normalized())
}

/// The unsigned angle between two unit directions, in radians.
fn turn(from: Vector, to: Vector) -> f64 {
    from.cross(to).atan2(from.dot(to)).abs()
}

/// Straight length that fits a bend of radius `r` turning by `angle`.
fn lead_length(r: f64, angle: f64) -> f64 {
    r * (angle / 2.).tan().max(1.)
}

/// Segment `i` of `run` without the tangent lengths of the bends at its ends.
fn straight_part(run: &[Point], i: usize, r: f64) -> (Point, Point) {
    let (p0, p1) = (run[i], run[i + 1]);
    let Some(d) = direction(p0, p1) else {
        return (p0, p1);
    };
    let tangent = |other: Option<Vector>| other.map_or(0., |o| r * (turn(o, d) / 2.).tan());
    let t0 = if i > 0 {
        tangent(direction(run[i - 1], p0))
    } else {
        0.
    };
    let t1 = run.get(i + 2).map_or(0., |p2| tangent(direction(p1, *p2)));
    // Bends that do not fit are clipped to meet.
    let len = p0.distance(p1);
    let scale = if t0 + t1 > len { len / (t0 + t1) } else { 1. };
    (p0 + d * (t0 * scale), p1 - d * (t1 * scale))
}

impl Element for WaveguideComposite {
    const NAME: &'static str = "Waveguide Composite";

    fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
        let Some((first, rest)) = self.nodes.split_first() else {
            return Err(Error::invalid("composite waveguide needs at least two nodes"));
        };
        if rest.is_empty() {
            return Err(Error::invalid("composite waveguide needs at least two nodes"));
        }
        let mut router = Router {
            params: self,
            run: vec![first.position],
            heading: None,
            first_run: true,
            length: 0.,
            bridges: Vec::new(),
        };
        let mut start_dir = None;

        for (k, node) in rest.iter().enumerate() {
            if start_dir.is_none() {
                start_dir = direction(router.last(), node.position);
            }

            if let Some(length) = node.length_before {
                let lead_in = router.lead_towards(node.position, true);
                let start = router.last();
                router.flush(cell, start, false)?;
                let axis = direction(start, node.position);
                // Stop short of the node if the route turns there, so the
                // turn gets a bend.
                let next = rest
                    .get(k + 1)
                    .and_then(|next| direction(node.position, next.position));
                let lead_out = match (axis, next) {
                    (Some(axis), Some(next)) if turn(axis, next) > TURN_TOLERANCE => {
                        lead_length(self.r, turn(axis, next))
                    }
                    _ => 0.,
                };
                let end = axis.map_or(node.position, |axis| node.position - axis * lead_out);
                let meander = Meander {
                    a: self.a,
                    b: self.b,
                    r: self.r,
                    n: self.n,
                    n_bridges: node.n_bridges,
                    ..Meander::new(start, end, length - lead_in - lead_out)
                };
                let (id, _) = cell.insert(&meander, Transformation::identity(), None)?;
                router.length += cell.cell_length(id).unwrap_or_default();
                // The lead out is drawn with the next run.
                router.run = vec![end];
                router.heading = axis.or(router.heading);
                if lead_out > 0. {
                    router.push(node.position);
                }
            } else {
                router.lead_towards(node.position, false);
                let segment = router.run.len() - 1;
                router.push(node.position);
                if node.n_bridges > 0 {
                    router.bridges.push((segment, node.n_bridges));
                }
            }

            if let Some(element) = &node.element {
                let (enter, leave) = node.align.clone().ok_or_else(|| {
                    Error::invalid("node element needs the ports to align the route to")
                })?;
                let incoming = router.heading.ok_or_else(|| {
                    Error::invalid("node element needs a route leading to it")
                })?;
                router.flush(cell, node.position, false)?;
                let id = match element {
                    NodeElement::Splitter(splitter) => cell.add_element(&WaveguideCoplanarSplitter {
                        a: self.a,
                        b: self.b,
                        ..splitter.clone()
                    })?,
                };
                let local = cell.layout().cell(id).refpoints();
                let (p_in, p_out) = (local.get(&enter)?, local.get(&leave)?);
                let rot = incoming.angle_deg() - (p_out - p_in).angle_deg();
                let refs = cell.insert_cell_aligned(
                    id,
                    Transformation::rotate(rot),
                    node.position,
                    &enter,
                    node.inst_name.as_deref(),
                )?;
                let exit = refs.get(&leave)?;
                router.length += p_in.distance(p_out);
                router.run = vec![exit];
            }
        }

        let end = router.last();
        let end_dir = router.heading;
        router.flush(cell, end, true)?;

        cell.set_corner_distance(self.r);
        cell.add_port("a", first.position, start_dir.map(|d| -d));
        cell.add_port("b", end, end_dir);
        tracing::debug!(length = router.length, "composite waveguide");
        cell.set_length(router.length);
        Ok(())
    }
}

/// Builds and places a composite waveguide whose length is `length`.
///
/// `node_fn` maps a free parameter, typically the `length_before` of a
/// meander node, to the route. The parameter is found by secant iteration
/// starting from `initial_guess`. Returns the placed cell, its refpoints in
/// the parent and the realized length.
pub fn produce_fixed_length_waveguide(
    cell: &mut CellBuilder<'_>,
    node_fn: impl Fn(f64) -> Vec<Node>,
    initial_guess: f64,
    length: f64,
    params: &WaveguideComposite,
) -> Result<(CellId, Refpoints, f64)> {
    let (id, realized) = solve_length(
        |x| {
            let id = cell.add_element(&params.with_nodes(node_fn(x)))?;
            Ok((id, cell.cell_length(id).unwrap_or_default()))
        },
        initial_guess,
        length,
    )?;
    let refs = cell.insert_cell(id, Transformation::identity(), None)?;
    Ok((id, refs, realized))
}

/// Secant iteration on the free parameter of `realize` until the length it
/// reports is within [`LENGTH_TOLERANCE`] of `length`.
fn solve_length<T>(
    mut realize: impl FnMut(f64) -> Result<(T, f64)>,
    initial_guess: f64,
    length: f64,
) -> Result<(T, f64)> {
    let mut x0 = initial_guess;
    let (_, l0) = realize(x0)?;
    let mut f0 = l0 - length;
    let mut x1 = initial_guess * 1.01 + 1.;
    let mut best = l0;
    for iteration in 1..=MAX_ITERATIONS {
        let (value, l1) = realize(x1)?;
        let f1 = l1 - length;
        if f1.abs() < (best - length).abs() {
            best = l1;
        }
        if f1.abs() < LENGTH_TOLERANCE {
            tracing::debug!(iteration, length = l1, "fixed length waveguide converged");
            return Ok((value, l1));
        }
        if (f1 - f0).abs() < f64::EPSILON {
            return Err(Error::RoutingDidNotConverge {
                target: length,
                achieved: best,
                iterations: iteration,
            });
        }
        let x2 = x1 - f1 * (x1 - x0) / (f1 - f0);
        (x0, f0) = (x1, f1);
        x1 = x2;
    }
    Err(Error::RoutingDidNotConverge {
        target: length,
        achieved: best,
        iterations: MAX_ITERATIONS,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layers::Layer;
    use crate::layout::Layout;

    /// A test element that routes a fixed-length waveguide.
    #[derive(Serialize)]
    struct FixedLength {
        target: f64,
    }

    impl Element for FixedLength {
        const NAME: &'static str = "Fixed Length";

        fn build(&self, cell: &mut CellBuilder<'_>) -> Result<()> {
            let (_, refs, length) = produce_fixed_length_waveguide(
                cell,
                |x| {
                    vec![
                        Node::new(Point::new(0., 0.)),
                        Node::new(Point::new(0., -200.)).bridges(1),
                        Node::new(Point::new(1000., -200.))
                            .length_before(x)
                            .bridges(4),
                        Node::new(Point::new(1000., 0.)),
                    ]
                },
                2000.,
                self.target,
                &WaveguideComposite::new(Vec::new()),
            )?;
            cell.add_refpoint("end", refs.get("port_b")?);
            cell.set_length(length);
            Ok(())
        }
    }

    #[test_log::test]
    fn fixed_length_converges() {
        let mut layout = Layout::default();
        let id = layout.build(&FixedLength { target: 4000. }).unwrap();
        let cell = layout.cell(id);
        assert!((cell.length().unwrap() - 4000.).abs() < LENGTH_TOLERANCE);
        assert!(cell
            .refpoints()
            .get("end")
            .unwrap()
            .approx_eq(Point::new(1000., 0.), 1e-9));
        assert_eq!(cell.instances().len(), 1);
    }

    #[test]
    fn infeasible_length_is_an_error() {
        let mut layout = Layout::default();
        assert!(layout.build(&FixedLength { target: 1000. }).is_err());
    }

    #[test]
    fn stalled_solver_reports_closest_length() {
        let mut lengths = [990., 1050., 1020., 1020.].into_iter();
        let result = solve_length(|_| Ok(((), lengths.next().unwrap_or_default())), 0., 1000.);
        assert!(matches!(
            result,
            Err(Error::RoutingDidNotConverge { achieved, iterations: 3, .. }) if achieved == 990.
        ));
    }

    #[test]
    fn straight_runs_sum_up() {
        let mut layout = Layout::default();
        let wg = WaveguideComposite::new(vec![
            Node::new(Point::new(0., 0.)),
            Node::new(Point::new(500., 0.)).bridges(2),
            Node::new(Point::new(500., 500.)),
        ]);
        let id = layout.build(&wg).unwrap();
        let cell = layout.cell(id);
        let expected = 1000. - 2. * 50. + 50. * std::f64::consts::FRAC_PI_2;
        assert_relative_eq!(cell.length().unwrap(), expected, max_relative = 1e-9);
        let refs = cell.refpoints();
        assert!(refs
            .get("port_a_corner")
            .unwrap()
            .approx_eq(Point::new(-50., 0.), 1e-9));
        assert!(refs
            .get("port_b_corner")
            .unwrap()
            .approx_eq(Point::new(500., 550.), 1e-9));
        let pads = layout.flat_region(id, Layer::AirbridgePads);
        assert_eq!(pads.len(), 4);
    }

    /// Whether `p` lies on the etched gap of the flattened cell.
    fn etched(layout: &Layout, id: CellId, p: Point) -> bool {
        layout
            .flat_region(id, Layer::BaseMetalGapWoGrid)
            .contains(p)
    }

    #[test_log::test]
    fn meander_joins_bend_without_shorts() {
        let mut layout = Layout::default();
        let wg = WaveguideComposite::new(vec![
            Node::new(Point::new(0., 0.)),
            Node::new(Point::new(1000., -200.)),
            Node::new(Point::new(2000., -200.)).length_before(1500.),
            Node::new(Point::new(2500., 100.)),
        ]);
        let id = layout.build(&wg).unwrap();

        // Outer side of the turn into the meander: signal, gap, then ground.
        let corner = Point::new(1000., -200.);
        let outer = Vector::new(-0.19612, -1.98058).normalized();
        assert!(!etched(&layout, id, corner + outer * 2.));
        assert!(etched(&layout, id, corner + outer * 7.));
        assert!(etched(&layout, id, corner + outer * 9.));
        assert!(!etched(&layout, id, corner + outer * 14.));

        // Outer side of the turn out of the meander.
        let corner = Point::new(2000., -200.);
        let outer = Vector::new(0.51450, -1.85749).normalized();
        assert!(etched(&layout, id, corner + outer * 5.));
        assert!(etched(&layout, id, corner + outer * 8.));
        assert!(!etched(&layout, id, corner + outer * 12.));

        let refs = layout.cell(id).refpoints();
        assert!(refs
            .get("port_b")
            .unwrap()
            .approx_eq(Point::new(2500., 100.), 1e-9));
    }

    #[test]
    fn bridges_avoid_bends() {
        let mut layout = Layout::default();
        let wg = WaveguideComposite::new(vec![
            Node::new(Point::new(0., 0.)),
            Node::new(Point::new(300., 0.)).bridges(1),
            Node::new(Point::new(300., 300.)),
        ]);
        let id = layout.build(&wg).unwrap();
        let pads = layout.flat_region(id, Layer::AirbridgePads);
        assert_eq!(pads.len(), 2);
        // The bend takes the last 50 µm of the first segment.
        let center = pads.bbox().unwrap().center();
        assert_relative_eq!(center.x, 125., epsilon = 1e-9);
        assert_relative_eq!(center.y, 0., epsilon = 1e-9);
    }

    #[test]
    fn bridges_follow_the_leg_after_an_element() {
        let mut layout = Layout::default();
        let tee = WaveguideCoplanarSplitter::new(vec![180., 90., 0.], vec![50., 100., 50.]);
        let wg = WaveguideComposite::new(vec![
            Node::new(Point::new(0., 0.)),
            Node::new(Point::new(500., 0.)).element(
                NodeElement::Splitter(tee),
                ("port_a", "port_c"),
                Some("tee"),
            ),
            Node::new(Point::new(700., 300.)),
        ]);
        let id = layout.build(&wg).unwrap();
        // The route leaves the tee straight along +x before turning.
        assert!(!etched(&layout, id, Point::new(605., 0.)));
        assert!(etched(&layout, id, Point::new(605., -8.)));
    }

    #[test]
    fn tee_is_aligned_with_the_route() {
        let mut layout = Layout::default();
        let tee = WaveguideCoplanarSplitter::new(vec![180., 90., 0.], vec![50., 100., 50.]);
        let wg = WaveguideComposite::new(vec![
            Node::new(Point::new(0., 0.)),
            Node::new(Point::new(0., 500.)).element(
                NodeElement::Splitter(tee),
                ("port_a", "port_c"),
                Some("tee"),
            ),
            Node::new(Point::new(0., 1000.)),
        ]);
        let id = layout.build(&wg).unwrap();
        let cell = layout.cell(id);
        let refs = cell.refpoints();
        assert!(refs
            .get("tee_port_a")
            .unwrap()
            .approx_eq(Point::new(0., 500.), 1e-9));
        assert!(refs
            .get("tee_port_c")
            .unwrap()
            .approx_eq(Point::new(0., 600.), 1e-9));
        // The branch arm at 90 degrees ends up pointing along -x.
        assert!(refs
            .get("tee_port_b")
            .unwrap()
            .approx_eq(Point::new(-100., 550.), 1e-9));
        assert_relative_eq!(cell.length().unwrap(), 1000., max_relative = 1e-9);
        assert!(refs
            .get("port_b")
            .unwrap()
            .approx_eq(Point::new(0., 1000.), 1e-9));
    }

    #[test]
    fn single_node_is_an_error() {
        let mut layout = Layout::default();
        let wg = WaveguideComposite::new(vec![Node::new(Point::zero())]);
        assert!(matches!(layout.build(&wg), Err(Error::InvalidParameter(_))));
    }
}
