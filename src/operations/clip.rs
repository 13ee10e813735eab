//! Conversions between outlines and the clipping kernel's polygon types.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::math::Point2;
use crate::outline::Outline;

/// Scale factor applied before the kernel's integer quantization.
///
/// Coordinates are multiplied by this and rounded inside the kernel, so
/// clipping runs on integers and stays robust; results are divided back.
pub(crate) const CLIPPER_SCALE: f64 = 1000.0;

/// Converts a set of closed outlines into a kernel multi-polygon.
///
/// Each outline becomes an independent exterior ring (closed explicitly);
/// nesting is re-derived downstream by containment, never carried through
/// the kernel. Outlines with fewer than 3 points are dropped.
pub(crate) fn outlines_to_multi(outlines: &[Outline]) -> MultiPolygon<f64> {
    let polygons = outlines
        .iter()
        .filter(|o| o.len() >= 3)
        .map(|o| {
            let mut ring: Vec<Coord<f64>> = o.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
            if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
                if first != last {
                    ring.push(first);
                }
            }
            Polygon::new(LineString::new(ring), vec![])
        })
        .collect();
    MultiPolygon::new(polygons)
}

/// Flattens a kernel multi-polygon back into plain outlines.
///
/// Exterior and interior rings alike come back as separate outlines, with
/// the duplicated closing point stripped.
pub(crate) fn multi_to_outlines(multi: &MultiPolygon<f64>) -> Vec<Outline> {
    let mut outlines = Vec::new();
    for polygon in &multi.0 {
        outlines.push(ring_to_outline(polygon.exterior()));
        for interior in polygon.interiors() {
            outlines.push(ring_to_outline(interior));
        }
    }
    outlines.retain(|o| o.len() >= 3);
    outlines
}

fn ring_to_outline(ring: &LineString<f64>) -> Outline {
    let mut points: Vec<Point2> = ring.coords().map(|c| Point2::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}
