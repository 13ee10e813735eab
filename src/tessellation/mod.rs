mod extrude;
mod triangulate;

pub use extrude::ExtrudeShell;
pub use triangulate::TriangulateGroup;

use crate::error::{Result, TessellationError};
use crate::math::Point3;

/// Vertex ceiling imposed by 16-bit triangle indices.
pub const MAX_MESH_VERTICES: usize = u16::MAX as usize;

/// Fill convention deciding which enclosed regions count as inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindingRule {
    /// A region is inside when it is enclosed an odd number of times.
    #[default]
    EvenOdd,
    /// A region is inside when its winding number is non-zero.
    NonZero,
}

/// A triangle mesh over a flat vertex buffer with 16-bit indices.
///
/// Vertices stay in the z = 0 plane until extruded into a shell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u16; 3]>,
}

impl SpriteMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Merges per-group meshes into one buffer, rebasing indices.
///
/// # Errors
///
/// Returns [`TessellationError::CapacityExceeded`] if the merged buffer
/// would reach the 16-bit vertex ceiling.
pub fn assemble(parts: Vec<SpriteMesh>) -> Result<SpriteMesh> {
    let total: usize = parts.iter().map(SpriteMesh::vertex_count).sum();
    if total >= MAX_MESH_VERTICES {
        return Err(TessellationError::CapacityExceeded { vertices: total }.into());
    }

    let mut merged = SpriteMesh {
        vertices: Vec::with_capacity(total),
        indices: Vec::with_capacity(parts.iter().map(SpriteMesh::triangle_count).sum()),
    };
    for part in parts {
        #[allow(clippy::cast_possible_truncation)]
        let base = merged.vertices.len() as u16;
        merged.vertices.extend(part.vertices);
        merged
            .indices
            .extend(part.indices.iter().map(|t| t.map(|i| i + base)));
    }
    Ok(merged)
}
