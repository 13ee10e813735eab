use super::{Edge, EdgeLoop};

/// Reduces an [`EdgeLoop`] by merging collinear runs and short edges.
///
/// Both passes are single forward sweeps producing a new edge list; they
/// are idempotent at fixed parameters but must be re-run from raw tracer
/// output whenever parameters change.
#[derive(Debug, Clone, Copy)]
pub struct SimplifyOutline {
    merge_distance: f64,
    collinear_epsilon: f64,
}

impl SimplifyOutline {
    /// Creates a simplifier with exact-equality collinearity testing.
    ///
    /// A non-positive `merge_distance` disables the distance pass.
    #[must_use]
    pub fn new(merge_distance: f64) -> Self {
        Self {
            merge_distance,
            collinear_epsilon: 0.0,
        }
    }

    /// Opts into epsilon-widened collinearity testing.
    ///
    /// The default exact test matches the original output bit-for-bit;
    /// widening it changes which vertices survive.
    #[must_use]
    pub fn with_epsilon(merge_distance: f64, collinear_epsilon: f64) -> Self {
        Self {
            merge_distance,
            collinear_epsilon: collinear_epsilon.max(0.0),
        }
    }

    /// Runs the collinear pass, then the distance pass.
    #[must_use]
    pub fn execute(&self, input: &EdgeLoop) -> EdgeLoop {
        let merged = self.merge_collinear(input);
        self.merge_by_distance(&merged)
    }

    /// Drops interior vertices where consecutive edges are collinear under
    /// the cross-product test
    /// `(shared.x - v1.x) * (v2.y - v1.y) == (v2.x - v1.x) * (shared.y - v1.y)`.
    ///
    /// The wraparound pair (last edge, first edge) is only considered when
    /// the loop is closed.
    #[must_use]
    pub fn merge_collinear(&self, input: &EdgeLoop) -> EdgeLoop {
        if input.edges.len() < 2 {
            return input.clone();
        }
        let was_closed = input.is_closed();

        let mut edges: Vec<Edge> = Vec::with_capacity(input.edges.len());
        edges.push(input.edges[0]);
        for &next in &input.edges[1..] {
            let last = edges[edges.len() - 1];
            if self.collinear(&last, &next) {
                let n = edges.len();
                edges[n - 1] = Edge::new(last.start, next.end);
            } else {
                edges.push(next);
            }
        }

        // Seam vertex between the last and first edge.
        if was_closed && edges.len() > 2 {
            let last = edges[edges.len() - 1];
            let first = edges[0];
            if self.collinear(&last, &first) {
                edges[0] = Edge::new(last.start, first.end);
                edges.pop();
            }
        }

        EdgeLoop::new(edges)
    }

    /// Fuses an edge into its successor whenever the edge is shorter than
    /// the merge distance. Disabled for non-positive distances.
    #[must_use]
    pub fn merge_by_distance(&self, input: &EdgeLoop) -> EdgeLoop {
        if self.merge_distance <= 0.0 || input.edges.len() < 2 {
            return input.clone();
        }

        let mut edges: Vec<Edge> = Vec::with_capacity(input.edges.len());
        edges.push(input.edges[0]);
        for &next in &input.edges[1..] {
            let last = edges[edges.len() - 1];
            if last.length() < self.merge_distance {
                let n = edges.len();
                edges[n - 1] = Edge::new(last.start, next.end);
            } else {
                edges.push(next);
            }
        }

        EdgeLoop::new(edges)
    }

    fn collinear(&self, a: &Edge, b: &Edge) -> bool {
        let v1 = a.start;
        let shared = a.end;
        let v2 = b.end;
        let lhs = (shared.x - v1.x) * (v2.y - v1.y);
        let rhs = (v2.x - v1.x) * (shared.y - v1.y);
        if self.collinear_epsilon == 0.0 {
            // Exact equality on purpose: tracer coordinates are
            // lattice-quantized, so the products are exact.
            lhs == rhs
        } else {
            (lhs - rhs).abs() <= self.collinear_epsilon
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn staircase_free_square() -> EdgeLoop {
        // A 2x2 square traced as 8 unit edges; every mid-side vertex is
        // collinear with its neighbors.
        EdgeLoop::from_points(&[
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 1.0),
        ])
    }

    #[test]
    fn collinear_merge_reduces_square_to_corners() {
        let out = SimplifyOutline::new(0.0).merge_collinear(&staircase_free_square());
        assert_eq!(out.edges.len(), 4);
        assert!(out.is_closed());
        let pts = out.points();
        assert!(pts.contains(&p(0.0, 0.0)));
        assert!(pts.contains(&p(2.0, 0.0)));
        assert!(pts.contains(&p(2.0, 2.0)));
        assert!(pts.contains(&p(0.0, 2.0)));
    }

    #[test]
    fn seam_vertex_merges_only_when_closed() {
        // Same square but seeded mid-side, so the seam splits a straight run.
        let lp = EdgeLoop::from_points(&[
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 0.0),
        ]);
        let out = SimplifyOutline::new(0.0).merge_collinear(&lp);
        assert_eq!(out.edges.len(), 4);

        let mut open = lp.clone();
        open.edges.pop();
        let kept = SimplifyOutline::new(0.0).merge_collinear(&open);
        // Open chain: no seam merge.
        assert_eq!(kept.edges.len(), 4);
        assert!(!kept.is_closed());
    }

    #[test]
    fn distance_merge_drops_short_edges() {
        let lp = EdgeLoop::from_points(&[
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.5, 0.2),
            p(10.0, 10.0),
            p(0.0, 10.0),
        ]);
        let out = SimplifyOutline::new(1.0).merge_by_distance(&lp);
        assert_eq!(out.edges.len(), 4);
        assert!(out.is_closed());
        assert!(!out.points().contains(&p(10.5, 0.2)));
    }

    #[test]
    fn non_positive_distance_disables_pass() {
        let lp = staircase_free_square();
        let out = SimplifyOutline::new(0.0).merge_by_distance(&lp);
        assert_eq!(out.edges.len(), lp.edges.len());
    }

    #[test]
    fn simplify_is_idempotent() {
        let simplifier = SimplifyOutline::new(1.5);
        let once = simplifier.execute(&staircase_free_square());
        let twice = simplifier.execute(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn epsilon_widens_collinearity() {
        let lp = EdgeLoop::from_points(&[
            p(0.0, 0.0),
            p(5.0, 0.001),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(0.0, 10.0),
        ]);
        let exact = SimplifyOutline::new(0.0).merge_collinear(&lp);
        assert_eq!(exact.edges.len(), 5);
        let widened = SimplifyOutline::with_epsilon(0.0, 0.1).merge_collinear(&lp);
        assert_eq!(widened.edges.len(), 4);
    }
}
