use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{Result, TessellationError};
use crate::math::polygon_2d::is_ccw;
use crate::math::{Point2, Point3, TOLERANCE};
use crate::operations::OutlineGroup;

use super::{SpriteMesh, WindingRule, MAX_MESH_VERTICES};

/// Net direction of constraint insertions per undirected vertex pair,
/// keyed by `(low index, high index)`: +1 per low-to-high insertion,
/// -1 per high-to-low.
type ConstraintDirections = HashMap<(usize, usize), i32>;

/// Triangulates one outline group (outer boundary plus holes) into a
/// vertex/index buffer under the selected winding rule.
///
/// Before triangulating, each contour runs through an edge-smoothing
/// pre-pass that drops near-collinear vertices based on a dot-product
/// threshold of `0.99 + edge_smoothing^3 * 0.01`.
#[derive(Debug)]
pub struct TriangulateGroup<'a> {
    group: &'a OutlineGroup,
    edge_smoothing: f64,
    winding_rule: WindingRule,
}

impl<'a> TriangulateGroup<'a> {
    /// Creates a new triangulation operation.
    #[must_use]
    pub fn new(group: &'a OutlineGroup, edge_smoothing: f64, winding_rule: WindingRule) -> Self {
        Self {
            group,
            edge_smoothing,
            winding_rule,
        }
    }

    /// Executes the triangulation.
    ///
    /// A group whose outer contour degenerates below 3 points produces an
    /// empty mesh.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::CapacityExceeded`] if the vertex count
    /// reaches the 16-bit index ceiling, or [`TessellationError::Failed`]
    /// if the triangulation kernel rejects the input.
    pub fn execute(&self) -> Result<SpriteMesh> {
        let mut outer = smooth_contour(&self.group.outer, self.edge_smoothing);
        if outer.len() < 3 {
            return Ok(SpriteMesh::default());
        }
        // Outer boundaries are counter-clockwise, holes clockwise, so the
        // signed winding below sees +1 inside the outer contour and 0
        // inside each hole under either fill rule.
        if !is_ccw(&outer) {
            outer.reverse();
        }
        let mut holes = Vec::with_capacity(self.group.holes.len());
        for hole in &self.group.holes {
            let mut smoothed = smooth_contour(hole, self.edge_smoothing);
            if smoothed.len() < 3 {
                continue;
            }
            if is_ccw(&smoothed) {
                smoothed.reverse();
            }
            holes.push(smoothed);
        }

        let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
        let mut directions = ConstraintDirections::new();
        insert_constraint_loop(&mut cdt, &outer, &mut directions)?;
        for hole in &holes {
            insert_constraint_loop(&mut cdt, hole, &mut directions)?;
        }

        let vertex_total = cdt.num_vertices();
        if vertex_total >= MAX_MESH_VERTICES {
            return Err(TessellationError::CapacityExceeded {
                vertices: vertex_total,
            }
            .into());
        }

        let interior = classify_interior_faces(&cdt, &directions, self.winding_rule);

        let mut mesh = SpriteMesh::default();
        let mut vertex_map: HashMap<usize, u16> = HashMap::new();

        for face_handle in cdt.inner_faces() {
            if !interior.contains(&face_handle.fix().index()) {
                continue;
            }

            let verts = face_handle.vertices();
            let mut tri = [0u16; 3];
            for (i, vh) in verts.iter().enumerate() {
                let idx = vh.fix().index();
                let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                    existing
                } else {
                    let pos = vh.position();
                    #[allow(clippy::cast_possible_truncation)]
                    let new_idx = mesh.vertices.len() as u16;
                    mesh.vertices.push(Point3::new(pos.x, pos.y, 0.0));
                    vertex_map.insert(idx, new_idx);
                    new_idx
                };
                tri[i] = mesh_idx;
            }
            mesh.indices.push(tri);
        }

        Ok(mesh)
    }
}

/// Drops near-collinear vertices from a contour.
///
/// A vertex is skipped when the unit directions from its predecessor to
/// itself and from its predecessor to its successor agree beyond the
/// smoothing threshold.
fn smooth_contour(points: &[Point2], edge_smoothing: f64) -> Vec<Point2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let threshold = 0.99 + edge_smoothing.clamp(0.0, 1.0).powi(3) * 0.01;

    let mut kept = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let curr = points[i];
        let next = points[(i + 1) % n];
        let to_curr = (curr - prev).try_normalize(TOLERANCE);
        let to_next = (next - prev).try_normalize(TOLERANCE);
        if let (Some(to_curr), Some(to_next)) = (to_curr, to_next) {
            if to_curr.dot(&to_next) > threshold {
                continue;
            }
        }
        kept.push(curr);
    }
    kept
}

/// Inserts a closed polygon as constraint edges into the CDT, recording
/// each edge's direction for the winding classification.
fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[Point2],
    directions: &mut ConstraintDirections,
) -> Result<()> {
    let mut handles = Vec::with_capacity(points.len());
    for pt in points {
        let h = cdt
            .insert(SpadePoint2::new(pt.x, pt.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
            let (a, b) = (from.index(), to.index());
            let (key, sign) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
            *directions.entry(key).or_insert(0) += sign;
        }
    }

    Ok(())
}

/// Net constraint direction along a directed edge from `a` to `b`.
///
/// Constraint sub-edges produced by splitting lose their recorded
/// direction and count as a single crossing.
fn crossing_delta(directions: &ConstraintDirections, a: usize, b: usize) -> i32 {
    let (key, sign) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
    directions.get(&key).map_or(1, |net| sign * net)
}

/// Classifies which inner faces of the CDT are inside the polygon.
///
/// Breadth-first flood fill from the outer (infinite) face at winding 0;
/// crossing a constraint edge adds the edge's net direction, crossing an
/// unconstrained edge changes nothing. A face is interior when its
/// winding satisfies the fill rule.
fn classify_interior_faces(
    cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    directions: &ConstraintDirections,
    rule: WindingRule,
) -> HashSet<usize> {
    let inside = |winding: i32| match rule {
        WindingRule::EvenOdd => winding.rem_euclid(2) == 1,
        WindingRule::NonZero => winding != 0,
    };

    let mut interior = HashSet::new();
    let mut winding_map: HashMap<usize, i32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, i32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    // Seed: inner faces adjacent to the outer face, crossing inward.
    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            let rev_face = edge.rev().face();
            if let Some(inner) = rev_face.as_inner() {
                let idx = inner.fix().index();
                if winding_map.contains_key(&idx) {
                    continue;
                }
                let winding = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                    -crossing_delta(
                        directions,
                        edge.from().fix().index(),
                        edge.to().fix().index(),
                    )
                } else {
                    0
                };
                winding_map.insert(idx, winding);
                if inside(winding) {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), winding));
            }
        }
    }

    // BFS flood-fill across the remaining faces.
    while let Some((face_fix, winding)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let neighbor = edge.rev().face();
            if let Some(inner_neighbor) = neighbor.as_inner() {
                let n_idx = inner_neighbor.fix().index();
                if winding_map.contains_key(&n_idx) {
                    continue;
                }
                let new_winding = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                    winding
                        - crossing_delta(
                            directions,
                            edge.from().fix().index(),
                            edge.to().fix().index(),
                        )
                } else {
                    winding
                };
                winding_map.insert(n_idx, new_winding);
                if inside(new_winding) {
                    interior.insert(n_idx);
                }
                queue.push_back((inner_neighbor.fix(), new_winding));
            }
        }
    }

    interior
}
