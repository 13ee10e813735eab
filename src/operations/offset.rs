use geo_clipper::{Clipper, EndType, JoinType};
use log::debug;

use crate::error::Result;
use crate::outline::Outline;

use super::{multi_to_outlines, outlines_to_multi, CLIPPER_SCALE};

/// Miter limit as a multiple of the offset distance.
const MITER_LIMIT: f64 = 2.0;

/// Grows a set of closed outlines outward by a fixed distance.
///
/// Wraps the clipping kernel's offset with miter joins and closed-polygon
/// ends over integer-quantized coordinates. A non-positive distance is a
/// passthrough; only outward extrusion is exercised by the pipeline.
///
/// Large distances can self-intersect or collapse small islands; whatever
/// the kernel produces is returned unfiltered.
#[derive(Debug)]
pub struct OffsetOutlines {
    outlines: Vec<Outline>,
    distance: f64,
}

impl OffsetOutlines {
    /// Creates a new offset operation.
    #[must_use]
    pub fn new(outlines: Vec<Outline>, distance: f64) -> Self {
        Self { outlines, distance }
    }

    /// Executes the offset, returning the grown outlines.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` keeps the signature uniform with
    /// the other clipping operations.
    pub fn execute(self) -> Result<Vec<Outline>> {
        if self.distance <= 0.0 || self.outlines.is_empty() {
            return Ok(self.outlines);
        }

        let subject = outlines_to_multi(&self.outlines);
        let grown = subject.offset(
            self.distance,
            JoinType::Miter(MITER_LIMIT),
            EndType::ClosedPolygon,
            CLIPPER_SCALE,
        );
        let result = multi_to_outlines(&grown);
        debug!(
            "offset {} outline(s) by {} -> {} outline(s)",
            self.outlines.len(),
            self.distance,
            result.len()
        );
        Ok(result)
    }
}
