use geo_clipper::Clipper;
use log::debug;

use crate::error::Result;
use crate::outline::Outline;

use super::{multi_to_outlines, outlines_to_multi, CLIPPER_SCALE};

/// Computes the polygon set difference `subject - clip`.
///
/// Both operands run through the kernel at the same integer quantization
/// as the offsetter. Used by the pipeline to isolate the
/// transparent-capable region: visible outline minus the grown opaque
/// outline.
#[derive(Debug)]
pub struct SubtractOutlines {
    subject: Vec<Outline>,
    clip: Vec<Outline>,
}

impl SubtractOutlines {
    /// Creates a new difference operation.
    #[must_use]
    pub fn new(subject: Vec<Outline>, clip: Vec<Outline>) -> Self {
        Self { subject, clip }
    }

    /// Executes the difference.
    ///
    /// An empty subject yields an empty result; an empty clip returns the
    /// subject unchanged.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` keeps the signature uniform with
    /// the other clipping operations.
    pub fn execute(self) -> Result<Vec<Outline>> {
        if self.subject.is_empty() {
            return Ok(vec![]);
        }
        if self.clip.is_empty() {
            return Ok(self.subject);
        }

        let subject = outlines_to_multi(&self.subject);
        let clip = outlines_to_multi(&self.clip);
        let result = multi_to_outlines(&subject.difference(&clip, CLIPPER_SCALE));
        debug!(
            "difference: {} - {} outline(s) -> {}",
            self.subject.len(),
            self.clip.len(),
            result.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;
    use crate::math::Point2;

    fn square(x0: f64, y0: f64, size: f64) -> Outline {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    #[test]
    fn subtracting_self_is_empty() {
        let x = vec![square(0.0, 0.0, 10.0)];
        let result = SubtractOutlines::new(x.clone(), x).execute().unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn empty_clip_returns_subject() {
        let x = vec![square(0.0, 0.0, 10.0)];
        let result = SubtractOutlines::new(x.clone(), vec![]).execute().unwrap();
        assert_eq!(result, x);
    }

    #[test]
    fn empty_subject_returns_empty() {
        let result = SubtractOutlines::new(vec![], vec![square(0.0, 0.0, 10.0)])
            .execute()
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn centered_clip_leaves_a_ring() {
        let outer = vec![square(0.0, 0.0, 10.0)];
        let inner = vec![square(4.0, 4.0, 2.0)];
        let result = SubtractOutlines::new(outer, inner).execute().unwrap();
        // One exterior plus one interior ring, flattened.
        assert_eq!(result.len(), 2);
        let mut areas: Vec<f64> = result.iter().map(|o| signed_area_2d(o).abs()).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] - 4.0).abs() < 0.1, "hole area was {}", areas[0]);
        assert!((areas[1] - 100.0).abs() < 0.1, "outer area was {}", areas[1]);
    }

    #[test]
    fn disjoint_clip_changes_nothing_geometrically() {
        let subject = vec![square(0.0, 0.0, 4.0)];
        let clip = vec![square(10.0, 10.0, 4.0)];
        let result = SubtractOutlines::new(subject, clip).execute().unwrap();
        assert_eq!(result.len(), 1);
        let area = signed_area_2d(&result[0]).abs();
        assert!((area - 16.0).abs() < 0.1);
    }
}
