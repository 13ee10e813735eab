use std::collections::HashMap;

use log::debug;

use crate::error::{Result, TraceError};
use crate::math::Point2;
use crate::raster::AlphaGrid;

use super::{Edge, EdgeLoop};

/// Lattice point in pixel coordinates.
type Lattice = (i64, i64);

/// A directed unit boundary edge between two lattice points.
#[derive(Debug, Clone, Copy)]
struct RawEdge {
    from: Lattice,
    to: Lattice,
}

impl RawEdge {
    fn dir(&self) -> (i64, i64) {
        (self.to.0 - self.from.0, self.to.1 - self.from.1)
    }
}

/// Traces the boundary between solid and transparent pixels of an alpha
/// grid into closed lattice-aligned loops.
///
/// A pixel is solid when its alpha is strictly above `threshold`; pixels
/// outside the grid are never solid. Boundary edges are emitted directed
/// so the solid pixel lies on the left of the travel direction, which
/// makes outer loops counter-clockwise and hole loops clockwise.
#[derive(Debug)]
pub struct TraceBoundary<'a> {
    grid: &'a AlphaGrid,
    threshold: u8,
}

impl<'a> TraceBoundary<'a> {
    /// Creates a new trace operation.
    #[must_use]
    pub fn new(grid: &'a AlphaGrid, threshold: u8) -> Self {
        Self { grid, threshold }
    }

    /// Executes the trace, returning one closed loop per boundary.
    ///
    /// Disjoint solid islands produce independent loops; a fully
    /// transparent grid produces an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::MalformedBoundary`] if the emitted edges
    /// cannot be stitched into closed loops.
    pub fn execute(&self) -> Result<Vec<EdgeLoop>> {
        let raw = self.emit_edges();
        let loops = stitch_loops(&raw)?;
        debug!(
            "traced {} boundary loop(s) from {} edges at threshold {}",
            loops.len(),
            raw.len(),
            self.threshold
        );
        Ok(loops)
    }

    /// Emits one directed lattice edge per solid pixel side whose
    /// 4-neighbor across that side is not solid.
    fn emit_edges(&self) -> Vec<RawEdge> {
        let mut edges = Vec::new();
        #[allow(clippy::cast_possible_wrap)]
        let (w, h) = (self.grid.width() as i64, self.grid.height() as i64);

        for y in 0..h {
            for x in 0..w {
                if !self.grid.is_solid(x, y, self.threshold) {
                    continue;
                }
                // Bottom side: travel +x.
                if !self.grid.is_solid(x, y - 1, self.threshold) {
                    edges.push(RawEdge {
                        from: (x, y),
                        to: (x + 1, y),
                    });
                }
                // Right side: travel +y.
                if !self.grid.is_solid(x + 1, y, self.threshold) {
                    edges.push(RawEdge {
                        from: (x + 1, y),
                        to: (x + 1, y + 1),
                    });
                }
                // Top side: travel -x.
                if !self.grid.is_solid(x, y + 1, self.threshold) {
                    edges.push(RawEdge {
                        from: (x + 1, y + 1),
                        to: (x, y + 1),
                    });
                }
                // Left side: travel -y.
                if !self.grid.is_solid(x - 1, y, self.threshold) {
                    edges.push(RawEdge {
                        from: (x, y + 1),
                        to: (x, y),
                    });
                }
            }
        }
        edges
    }
}

/// Stitches directed edges into closed loops via an endpoint hash map.
///
/// At a lattice point with several outgoing candidates (two solid pixels
/// meeting diagonally), the walk takes the left-most turn relative to the
/// incoming direction, so every loop hugs its own 4-connected region and
/// diagonal neighbors stay separate loops.
fn stitch_loops(raw: &[RawEdge]) -> Result<Vec<EdgeLoop>> {
    let mut outgoing: HashMap<Lattice, Vec<usize>> = HashMap::new();
    for (i, e) in raw.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; raw.len()];
    let mut loops = Vec::new();

    for seed in 0..raw.len() {
        if used[seed] {
            continue;
        }
        let mut chain = Vec::new();
        let mut current = seed;
        used[seed] = true;
        chain.push(raw[seed]);

        loop {
            let at = raw[current].to;
            let incoming = raw[current].dir();
            let next = select_next(raw, &used, &outgoing, at, incoming, seed).ok_or_else(|| {
                TraceError::MalformedBoundary {
                    remaining: used.iter().filter(|u| !**u).count() + chain.len(),
                }
            })?;
            if next == seed {
                break;
            }
            used[next] = true;
            chain.push(raw[next]);
            current = next;
        }

        loops.push(to_edge_loop(&chain));
    }

    Ok(loops)
}

/// Picks the left-most-turn outgoing edge at `at`, considering unused
/// edges plus the seed edge (selecting the seed closes the loop).
fn select_next(
    raw: &[RawEdge],
    used: &[bool],
    outgoing: &HashMap<Lattice, Vec<usize>>,
    at: Lattice,
    incoming: (i64, i64),
    seed: usize,
) -> Option<usize> {
    let candidates = outgoing.get(&at)?;
    let mut best: Option<(i64, usize)> = None;
    for &idx in candidates {
        if used[idx] && idx != seed {
            continue;
        }
        let out = raw[idx].dir();
        // cross > 0: left turn; cross < 0: right turn; 0: straight on.
        let cross = incoming.0 * out.1 - incoming.1 * out.0;
        if best.is_none_or(|(b, _)| cross > b) {
            best = Some((cross, idx));
        }
    }
    best.map(|(_, idx)| idx)
}

#[allow(clippy::cast_precision_loss)]
fn to_edge_loop(chain: &[RawEdge]) -> EdgeLoop {
    let edges = chain
        .iter()
        .map(|e| {
            Edge::new(
                Point2::new(e.from.0 as f64, e.from.1 as f64),
                Point2::new(e.to.0 as f64, e.to.1 as f64),
            )
        })
        .collect();
    EdgeLoop::new(edges)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;

    fn grid_from_rows(rows: &[&[u8]]) -> AlphaGrid {
        // Rows are given top-down for readability; flip so row 0 is bottom.
        let height = rows.len();
        let width = rows[0].len();
        let mut data = Vec::with_capacity(width * height);
        for row in rows.iter().rev() {
            data.extend_from_slice(row);
        }
        AlphaGrid::from_bytes(width, height, data).unwrap()
    }

    #[test]
    fn empty_grid_traces_nothing() {
        let grid = AlphaGrid::new_fill(4, 4, 0);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert!(loops.is_empty());
    }

    #[test]
    fn single_pixel_traces_unit_square() {
        let grid = grid_from_rows(&[&[255]]);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(loops.len(), 1);
        assert!(loops[0].is_closed());
        assert_eq!(loops[0].edges.len(), 4);
        // Counter-clockwise outer loop.
        assert!(signed_area_2d(&loops[0].points()) > 0.0);
    }

    #[test]
    fn filled_rectangle_traces_one_ccw_loop() {
        let grid = AlphaGrid::new_fill(4, 3, 255);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(loops.len(), 1);
        assert!(loops[0].is_closed());
        // Perimeter in unit edges: 2 * (4 + 3).
        assert_eq!(loops[0].edges.len(), 14);
        let area = signed_area_2d(&loops[0].points());
        assert!((area - 12.0).abs() < 1e-12);
    }

    #[test]
    fn ring_traces_outer_ccw_and_hole_cw() {
        let grid = grid_from_rows(&[
            &[255, 255, 255],
            &[255, 0, 255],
            &[255, 255, 255],
        ]);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(loops.len(), 2);
        let areas: Vec<f64> = loops.iter().map(|l| signed_area_2d(&l.points())).collect();
        // One positive (outer) and one negative (hole) loop.
        assert!(areas.iter().any(|&a| (a - 9.0).abs() < 1e-12));
        assert!(areas.iter().any(|&a| (a + 1.0).abs() < 1e-12));
    }

    #[test]
    fn islands_trace_separate_loops() {
        let grid = grid_from_rows(&[
            &[255, 0, 255],
            &[0, 0, 0],
            &[255, 0, 255],
        ]);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(loops.len(), 4);
        for l in &loops {
            assert!(l.is_closed());
            assert_eq!(l.edges.len(), 4);
        }
    }

    #[test]
    fn diagonal_pixels_stay_separate_loops() {
        // Checkerboard corner: two solid pixels touching only diagonally
        // must not merge into one self-touching loop.
        let grid = grid_from_rows(&[
            &[0, 255],
            &[255, 0],
        ]);
        let loops = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(l.is_closed());
            assert_eq!(l.edges.len(), 4);
            assert!(signed_area_2d(&l.points()) > 0.0);
        }
    }

    #[test]
    fn threshold_excludes_faint_pixels() {
        let grid = grid_from_rows(&[
            &[10, 200],
            &[200, 10],
        ]);
        let loops = TraceBoundary::new(&grid, 128).execute().unwrap();
        assert_eq!(loops.len(), 2);
        let all = TraceBoundary::new(&grid, 0).execute().unwrap();
        assert_eq!(all.len(), 1);
    }
}
