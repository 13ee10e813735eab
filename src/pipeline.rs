//! Entry points composing the tracer, simplifier, clipping operations and
//! triangulator into sprite meshes.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::{Result, TessellationError};
use crate::math::polygon_2d::is_ccw;
use crate::math::Point3;
use crate::operations::{GroupOutlines, OffsetOutlines, SubtractOutlines};
use crate::outline::{Outline, SimplifyOutline, TraceBoundary};
use crate::raster::AlphaGrid;
use crate::tessellation::{
    assemble, ExtrudeShell, SpriteMesh, TriangulateGroup, WindingRule, MAX_MESH_VERTICES,
};

/// Alpha tolerance above which only fully opaque pixels (alpha 255) count.
const OPAQUE_TOLERANCE: u8 = 254;

/// Exponent applied to `detail` before mapping it to a merge distance.
const DETAIL_EXPONENT: f64 = 2.5;

/// Merge distance in pixels at maximum detail aggressiveness.
const DETAIL_MERGE_SCALE: f64 = 4.0;

/// The mesh variants a sprite can be converted into.
///
/// Each kind maps to a fixed sequence of pipeline stages; there is no
/// per-kind state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshKind {
    /// One quad covering the full grid bounds (also the capacity
    /// fallback).
    FullRect,
    /// A tight mesh around the visible region.
    #[default]
    TightFit,
    /// A tight mesh around the fully opaque region only.
    Opaque,
    /// Two meshes: the transparent-capable region (visible minus grown
    /// opaque) and the opaque region, for separate materials.
    Separated,
    /// Per-cell quads over cells containing any visible pixel.
    Grid,
}

/// Scalar knobs for one pipeline invocation.
///
/// All fields are read-only for the duration of a run; out-of-range
/// values are clamped, never rejected.
#[derive(Debug, Clone, Copy)]
pub struct MeshConfig {
    pub kind: MeshKind,
    /// Outline simplification aggressiveness, 0..1.
    pub detail: f64,
    /// Pixels with alpha strictly above this are visible, 0..=254.
    pub alpha_tolerance: u8,
    /// Extra floor on the simplifier merge distance, in pixels.
    pub vertex_merge_distance: f64,
    /// Keep clockwise loops as holes; dropping them fills holes in.
    pub detect_holes: bool,
    /// Near-collinear vertex dropping before triangulation, 0..1.
    pub edge_smoothing: f64,
    pub winding_rule: WindingRule,
    /// Outward growth of the opaque outline before subtraction.
    pub extrude_distance: f64,
    /// Shell thickness for 3D extrusion; non-positive stays flat.
    pub shell_thickness: f64,
    /// Cell edge length in pixels for [`MeshKind::Grid`].
    pub grid_cell: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            kind: MeshKind::TightFit,
            detail: 0.5,
            alpha_tolerance: 0,
            vertex_merge_distance: 0.0,
            detect_holes: true,
            edge_smoothing: 0.0,
            winding_rule: WindingRule::EvenOdd,
            extrude_distance: 0.0,
            shell_thickness: 0.0,
            grid_cell: 16,
        }
    }
}

impl MeshConfig {
    /// Clamps every field into its valid range (slider semantics).
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            kind: self.kind,
            detail: self.detail.clamp(0.0, 1.0),
            alpha_tolerance: self.alpha_tolerance.min(OPAQUE_TOLERANCE),
            vertex_merge_distance: self.vertex_merge_distance.max(0.0),
            detect_holes: self.detect_holes,
            edge_smoothing: self.edge_smoothing.clamp(0.0, 1.0),
            winding_rule: self.winding_rule,
            extrude_distance: self.extrude_distance,
            shell_thickness: self.shell_thickness,
            grid_cell: self.grid_cell.max(1),
        }
    }

    fn merge_distance(&self) -> f64 {
        detail_merge_distance(self.detail).max(self.vertex_merge_distance)
    }
}

/// Maps `detail` to a simplifier merge distance in pixels.
///
/// Non-linear on purpose: the useful range of the knob is crowded toward
/// the aggressive end.
fn detail_merge_distance(detail: f64) -> f64 {
    detail.clamp(0.0, 1.0).powf(DETAIL_EXPONENT) * DETAIL_MERGE_SCALE
}

/// Traces the grid at `threshold` and simplifies every loop.
fn trace_outlines(grid: &AlphaGrid, threshold: u8, merge_distance: f64) -> Result<Vec<Outline>> {
    let loops = TraceBoundary::new(grid, threshold).execute()?;
    let simplifier = SimplifyOutline::new(merge_distance);
    Ok(loops.iter().map(|l| simplifier.execute(l).points()).collect())
}

fn visible_outlines(grid: &AlphaGrid, cfg: &MeshConfig) -> Result<Vec<Outline>> {
    let mut outlines = trace_outlines(grid, cfg.alpha_tolerance, cfg.merge_distance())?;
    if !cfg.detect_holes {
        outlines.retain(|o| is_ccw(o));
    }
    Ok(outlines)
}

fn opaque_outlines(grid: &AlphaGrid, cfg: &MeshConfig, extrude: f64) -> Result<Vec<Outline>> {
    let outlines = trace_outlines(grid, OPAQUE_TOLERANCE, cfg.merge_distance())?;
    OffsetOutlines::new(outlines, extrude).execute()
}

/// Traces and simplifies the visible region's outlines.
///
/// `detail` is the simplification aggressiveness (0 = keep everything);
/// with `detect_holes` off, clockwise loops are discarded and holes fill
/// in.
///
/// # Errors
///
/// Returns a [`crate::error::TraceError`] if boundary stitching fails.
pub fn generate_outline(
    grid: &AlphaGrid,
    detail: f64,
    alpha_tolerance: u8,
    detect_holes: bool,
) -> Result<Vec<Outline>> {
    let cfg = MeshConfig {
        detail,
        alpha_tolerance,
        detect_holes,
        ..MeshConfig::default()
    }
    .sanitized();
    visible_outlines(grid, &cfg)
}

/// Traces the fully opaque region (alpha 255 only) and optionally grows
/// it outward by `extrude_distance`.
///
/// `alpha_tolerance` participates only as a lower bound; opacity never
/// drops below alpha 255.
///
/// # Errors
///
/// Returns a [`crate::error::TraceError`] if boundary stitching fails.
pub fn generate_opaque_outline(
    grid: &AlphaGrid,
    detail: f64,
    alpha_tolerance: u8,
    extrude_distance: f64,
) -> Result<Vec<Outline>> {
    let cfg = MeshConfig {
        detail,
        alpha_tolerance: alpha_tolerance.max(OPAQUE_TOLERANCE),
        ..MeshConfig::default()
    }
    .sanitized();
    let outlines = trace_outlines(grid, cfg.alpha_tolerance, cfg.merge_distance())?;
    OffsetOutlines::new(outlines, extrude_distance).execute()
}

/// Isolates the transparent-capable region: the visible outline minus the
/// opaque outline grown by `config.extrude_distance`.
///
/// # Errors
///
/// Returns a [`crate::error::TraceError`] if boundary stitching fails.
pub fn generate_separated_transparent_outline(
    grid: &AlphaGrid,
    config: &MeshConfig,
) -> Result<Vec<Outline>> {
    let cfg = config.sanitized();
    let full = visible_outlines(grid, &cfg)?;
    let opaque = opaque_outlines(grid, &cfg, cfg.extrude_distance)?;
    SubtractOutlines::new(full, opaque).execute()
}

/// Groups outlines into outers-with-holes, triangulates each group and
/// merges the results into one buffer.
///
/// Empty input produces an empty mesh.
///
/// # Errors
///
/// Returns [`TessellationError::CapacityExceeded`] when the summed vertex
/// count reaches the 16-bit index ceiling (checked up front, per group,
/// and at assembly), or [`TessellationError::Failed`] if the kernel
/// rejects the input.
pub fn build_mesh(
    outlines: Vec<Outline>,
    edge_smoothing: f64,
    winding_rule: WindingRule,
) -> Result<SpriteMesh> {
    let total: usize = outlines.iter().map(Vec::len).sum();
    if total >= MAX_MESH_VERTICES {
        return Err(TessellationError::CapacityExceeded { vertices: total }.into());
    }

    let groups = GroupOutlines::new(outlines).execute();
    let mut parts = Vec::with_capacity(groups.len());
    for group in &groups {
        parts.push(TriangulateGroup::new(group, edge_smoothing, winding_rule).execute()?);
    }
    assemble(parts)
}

/// Converts a grid into one or more meshes according to `config.kind`.
///
/// Most kinds produce a single mesh; [`MeshKind::Separated`] produces
/// two (transparent-capable part first, opaque part second). A capacity
/// overflow in any part degrades that part to the full-rect fallback
/// quad. A positive `shell_thickness` extrudes every part into a closed
/// 3D shell.
///
/// # Errors
///
/// Returns a [`crate::error::TraceError`] if boundary stitching fails, or
/// a [`TessellationError::Failed`] if the triangulation kernel rejects
/// its input. Capacity overflows never escape; they fall back.
pub fn generate_mesh(grid: &AlphaGrid, config: &MeshConfig) -> Result<Vec<SpriteMesh>> {
    let cfg = config.sanitized();
    debug!("generating {:?} mesh for {}x{} grid", cfg.kind, grid.width(), grid.height());

    let parts = match cfg.kind {
        MeshKind::FullRect => vec![full_rect_mesh(grid)],
        MeshKind::TightFit => {
            let outlines = visible_outlines(grid, &cfg)?;
            vec![build_or_fallback(grid, outlines, &cfg)?]
        }
        MeshKind::Opaque => {
            let outlines = opaque_outlines(grid, &cfg, 0.0)?;
            vec![build_or_fallback(grid, outlines, &cfg)?]
        }
        MeshKind::Separated => {
            let transparent = generate_separated_transparent_outline(grid, &cfg)?;
            let opaque = opaque_outlines(grid, &cfg, 0.0)?;
            vec![
                build_or_fallback(grid, transparent, &cfg)?,
                build_or_fallback(grid, opaque, &cfg)?,
            ]
        }
        MeshKind::Grid => {
            let mesh = match grid_mesh(grid, &cfg) {
                Err(e) if e.is_capacity_exceeded() => {
                    warn!("grid mesh over capacity, falling back to full rect");
                    full_rect_mesh(grid)
                }
                other => other?,
            };
            vec![mesh]
        }
    };

    if cfg.shell_thickness > 0.0 {
        let mut shells = Vec::with_capacity(parts.len());
        for part in &parts {
            shells.push(ExtrudeShell::new(part, cfg.shell_thickness).execute()?);
        }
        return Ok(shells);
    }
    Ok(parts)
}

fn build_or_fallback(
    grid: &AlphaGrid,
    outlines: Vec<Outline>,
    cfg: &MeshConfig,
) -> Result<SpriteMesh> {
    match build_mesh(outlines, cfg.edge_smoothing, cfg.winding_rule) {
        Err(e) if e.is_capacity_exceeded() => {
            warn!("mesh over the 16-bit index ceiling, falling back to full rect");
            Ok(full_rect_mesh(grid))
        }
        other => other,
    }
}

/// One quad covering the grid bounds; the default/fallback mesh.
///
/// An empty grid produces an empty mesh.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn full_rect_mesh(grid: &AlphaGrid) -> SpriteMesh {
    if grid.width() == 0 || grid.height() == 0 {
        return SpriteMesh::default();
    }
    let (w, h) = (grid.width() as f64, grid.height() as f64);
    SpriteMesh {
        vertices: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(w, 0.0, 0.0),
            Point3::new(w, h, 0.0),
            Point3::new(0.0, h, 0.0),
        ],
        indices: vec![[0, 1, 2], [0, 2, 3]],
    }
}

/// One quad per `grid_cell`-sized cell containing any visible pixel, over
/// shared lattice vertices. Cells at the right/top rim are clipped to the
/// grid bounds.
fn grid_mesh(grid: &AlphaGrid, cfg: &MeshConfig) -> Result<SpriteMesh> {
    let cell = cfg.grid_cell as usize;
    let (w, h) = (grid.width(), grid.height());
    let cells_x = w.div_ceil(cell);
    let cells_y = h.div_ceil(cell);

    let mut mesh = SpriteMesh::default();
    let mut vertex_map: HashMap<(usize, usize), u16> = HashMap::new();

    for cy in 0..cells_y {
        for cx in 0..cells_x {
            if !cell_has_visible(grid, cfg.alpha_tolerance, cx * cell, cy * cell, cell) {
                continue;
            }
            let x0 = cx * cell;
            let y0 = cy * cell;
            let x1 = (x0 + cell).min(w);
            let y1 = (y0 + cell).min(h);

            let mut quad = [0u16; 4];
            for (slot, corner) in [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].iter().enumerate() {
                quad[slot] = grid_vertex(&mut mesh, &mut vertex_map, *corner)?;
            }
            mesh.indices.push([quad[0], quad[1], quad[2]]);
            mesh.indices.push([quad[0], quad[2], quad[3]]);
        }
    }

    Ok(mesh)
}

fn cell_has_visible(grid: &AlphaGrid, tolerance: u8, x0: usize, y0: usize, cell: usize) -> bool {
    let x1 = (x0 + cell).min(grid.width());
    let y1 = (y0 + cell).min(grid.height());
    for y in y0..y1 {
        for x in x0..x1 {
            #[allow(clippy::cast_possible_wrap)]
            if grid.is_solid(x as i64, y as i64, tolerance) {
                return true;
            }
        }
    }
    false
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn grid_vertex(
    mesh: &mut SpriteMesh,
    vertex_map: &mut HashMap<(usize, usize), u16>,
    corner: (usize, usize),
) -> Result<u16> {
    if let Some(&idx) = vertex_map.get(&corner) {
        return Ok(idx);
    }
    if mesh.vertices.len() + 1 >= MAX_MESH_VERTICES {
        return Err(TessellationError::CapacityExceeded {
            vertices: mesh.vertices.len() + 1,
        }
        .into());
    }
    let idx = mesh.vertices.len() as u16;
    mesh.vertices
        .push(Point3::new(corner.0 as f64, corner.1 as f64, 0.0));
    vertex_map.insert(corner, idx);
    Ok(idx)
}
