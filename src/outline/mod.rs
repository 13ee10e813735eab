mod simplify;
mod trace;

pub use simplify::SimplifyOutline;
pub use trace::TraceBoundary;

use crate::math::Point2;

/// An ordered pair of points, one straight boundary segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point2,
    pub end: Point2,
}

impl Edge {
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// A cyclic sequence of edges whose consecutive endpoints connect
/// head-to-tail.
///
/// Coordinates coming out of the tracer are lattice-quantized, so closure
/// is an exact coordinate match, no epsilon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeLoop {
    pub edges: Vec<Edge>,
}

impl EdgeLoop {
    #[must_use]
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Builds a loop from consecutive points, closing back to the first.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Self {
        let n = points.len();
        let edges = (0..n)
            .map(|i| Edge::new(points[i], points[(i + 1) % n]))
            .collect();
        Self { edges }
    }

    /// `true` when the last edge's endpoint equals the first edge's start
    /// point exactly.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) => last.end == first.start,
            _ => false,
        }
    }

    /// Projects the loop onto its vertex sequence (each edge's start).
    #[must_use]
    pub fn points(&self) -> Outline {
        self.edges.iter().map(|e| e.start).collect()
    }
}

/// One closed polygon loop as an ordered vertex list.
///
/// Outer boundaries are counter-clockwise, holes clockwise, as produced by
/// the tracer.
pub type Outline = Vec<Point2>;
