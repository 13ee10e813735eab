use std::collections::HashMap;

use crate::error::{Result, TessellationError};
use crate::math::Point3;

use super::{SpriteMesh, MAX_MESH_VERTICES};

/// Extrudes a flat triangulated mesh into a closed 3D shell of the given
/// thickness.
///
/// Every vertex is duplicated at `z = -thickness / 2` and
/// `z = +thickness / 2`; the caps face outward, and each boundary edge of
/// the 2D triangulation grows a two-triangle wall connecting them. A
/// boundary edge is one that appears in exactly one triangle: an
/// undirected edge seen a second time, in either direction, cancels out.
#[derive(Debug)]
pub struct ExtrudeShell<'a> {
    mesh: &'a SpriteMesh,
    thickness: f64,
}

impl<'a> ExtrudeShell<'a> {
    /// Creates a new extrusion operation.
    #[must_use]
    pub fn new(mesh: &'a SpriteMesh, thickness: f64) -> Self {
        Self { mesh, thickness }
    }

    /// Executes the extrusion.
    ///
    /// A non-positive thickness or an empty input returns the mesh
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::CapacityExceeded`] if doubling the
    /// vertex buffer would reach the 16-bit index ceiling.
    pub fn execute(&self) -> Result<SpriteMesh> {
        if self.thickness <= 0.0 || self.mesh.is_empty() {
            return Ok(self.mesh.clone());
        }

        let n = self.mesh.vertex_count();
        if n * 2 >= MAX_MESH_VERTICES {
            return Err(TessellationError::CapacityExceeded { vertices: n * 2 }.into());
        }
        #[allow(clippy::cast_possible_truncation)]
        let base = n as u16;

        let half = self.thickness / 2.0;
        let mut shell = SpriteMesh {
            vertices: Vec::with_capacity(n * 2),
            indices: Vec::with_capacity(self.mesh.triangle_count() * 2),
        };
        for v in &self.mesh.vertices {
            shell.vertices.push(Point3::new(v.x, v.y, -half));
        }
        for v in &self.mesh.vertices {
            shell.vertices.push(Point3::new(v.x, v.y, half));
        }

        // The triangulation winds counter-clockwise in the plane, so the
        // +z cap keeps that winding and the -z cap reverses it; both then
        // face away from the slab.
        for &[a, b, c] in &self.mesh.indices {
            shell.indices.push([a, c, b]);
            shell.indices.push([a + base, b + base, c + base]);
        }

        for (a, b) in boundary_edges(&self.mesh.indices) {
            shell.indices.push([a, b, b + base]);
            shell.indices.push([a, b + base, a + base]);
        }

        Ok(shell)
    }
}

/// Collects the directed boundary edges of a triangulation.
///
/// Tracks undirected edges in a map; a second sighting in either
/// direction cancels the first, leaving exactly the edges that border a
/// single triangle, still directed as their triangle wound them.
fn boundary_edges(indices: &[[u16; 3]]) -> Vec<(u16, u16)> {
    let mut survivors: HashMap<(u16, u16), (u16, u16)> = HashMap::new();
    for tri in indices {
        for i in 0..3 {
            let a = tri[i];
            let b = tri[(i + 1) % 3];
            let key = (a.min(b), a.max(b));
            if survivors.remove(&key).is_none() {
                survivors.insert(key, (a, b));
            }
        }
    }
    let mut edges: Vec<(u16, u16)> = survivors.into_values().collect();
    // Deterministic wall order regardless of hash iteration.
    edges.sort_unstable();
    edges
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::operations::OutlineGroup;
    use crate::tessellation::{TriangulateGroup, WindingRule};

    fn quad_mesh(size: f64) -> SpriteMesh {
        SpriteMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(size, 0.0, 0.0),
                Point3::new(size, size, 0.0),
                Point3::new(0.0, size, 0.0),
            ],
            indices: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// Signed volume of a closed triangle mesh via the divergence theorem.
    fn signed_volume(mesh: &SpriteMesh) -> f64 {
        mesh.indices
            .iter()
            .map(|t| {
                let a = mesh.vertices[t[0] as usize].coords;
                let b = mesh.vertices[t[1] as usize].coords;
                let c = mesh.vertices[t[2] as usize].coords;
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Every undirected edge of a closed shell borders exactly 2 triangles.
    fn assert_closed_manifold(mesh: &SpriteMesh) {
        let mut counts: HashMap<(u16, u16), u32> = HashMap::new();
        for tri in &mesh.indices {
            for i in 0..3 {
                let a = tri[i];
                let b = tri[(i + 1) % 3];
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        for (edge, count) in counts {
            assert_eq!(count, 2, "edge {edge:?} borders {count} triangles");
        }
    }

    // ── Unit cube ──────────────────────────────────────────────

    #[test]
    fn quad_extrudes_to_a_cube() {
        let shell = ExtrudeShell::new(&quad_mesh(1.0), 1.0).execute().unwrap();
        // 2 caps x 2 triangles + 4 walls x 2 triangles.
        assert_eq!(shell.vertex_count(), 8);
        assert_eq!(shell.triangle_count(), 12);
        assert_closed_manifold(&shell);
    }

    #[test]
    fn shell_volume_matches_area_times_thickness() {
        let shell = ExtrudeShell::new(&quad_mesh(2.0), 3.0).execute().unwrap();
        let volume = signed_volume(&shell);
        // Positive volume means consistently outward-facing normals.
        assert!((volume - 12.0).abs() < 1e-9, "volume was {volume}");
    }

    #[test]
    fn non_positive_thickness_is_identity() {
        let flat = quad_mesh(1.0);
        assert_eq!(ExtrudeShell::new(&flat, 0.0).execute().unwrap(), flat);
        assert_eq!(ExtrudeShell::new(&flat, -1.0).execute().unwrap(), flat);
    }

    #[test]
    fn empty_mesh_stays_empty() {
        let empty = SpriteMesh::default();
        assert!(ExtrudeShell::new(&empty, 2.0).execute().unwrap().is_empty());
    }

    #[test]
    fn shell_with_hole_is_closed() {
        let mut group = OutlineGroup::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ]);
        group.holes.push(vec![
            Point2::new(3.0, 3.0),
            Point2::new(7.0, 3.0),
            Point2::new(7.0, 7.0),
            Point2::new(3.0, 7.0),
        ]);
        let flat = TriangulateGroup::new(&group, 0.0, WindingRule::EvenOdd)
            .execute()
            .unwrap();
        let shell = ExtrudeShell::new(&flat, 2.0).execute().unwrap();
        assert_eq!(shell.vertex_count(), flat.vertex_count() * 2);
        assert_closed_manifold(&shell);
        let volume = signed_volume(&shell);
        assert!((volume - 84.0 * 2.0).abs() < 1e-9, "volume was {volume}");
    }

    #[test]
    fn capacity_overflow_is_reported() {
        let big = SpriteMesh {
            vertices: vec![Point3::origin(); 40_000],
            indices: vec![[0, 1, 2]],
        };
        let err = ExtrudeShell::new(&big, 1.0).execute().unwrap_err();
        assert!(err.is_capacity_exceeded());
    }
}
