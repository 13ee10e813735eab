use log::trace;

use crate::math::polygon_2d::point_in_polygon;
use crate::outline::Outline;

/// One outer boundary plus the hole outlines strictly contained in it.
#[derive(Debug, Clone, Default)]
pub struct OutlineGroup {
    pub outer: Outline,
    pub holes: Vec<Outline>,
}

impl OutlineGroup {
    /// Creates a group with no holes.
    #[must_use]
    pub fn new(outer: Outline) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }
}

/// Sorts an unordered list of closed outlines into outer boundaries and
/// their holes by point-in-polygon containment.
///
/// Paths are processed in input order: the first existing group whose
/// outer boundary contains every vertex of a path claims it as a hole; a
/// path contained by no outer starts a new group. A path that already
/// lies inside a registered hole is dropped entirely (a hole of a hole is
/// not treated as a nested boundary).
#[derive(Debug)]
pub struct GroupOutlines {
    outlines: Vec<Outline>,
}

impl GroupOutlines {
    /// Creates a new grouping operation.
    #[must_use]
    pub fn new(outlines: Vec<Outline>) -> Self {
        Self { outlines }
    }

    /// Executes the grouping.
    ///
    /// Outlines with fewer than 3 points are ignored.
    #[must_use]
    pub fn execute(self) -> Vec<OutlineGroup> {
        let mut groups: Vec<OutlineGroup> = Vec::new();

        'paths: for path in self.outlines {
            if path.len() < 3 {
                continue;
            }
            for group in &mut groups {
                if !contains(&group.outer, &path) {
                    continue;
                }
                if group.holes.iter().any(|hole| contains(hole, &path)) {
                    trace!("dropping outline nested inside an existing hole");
                    continue 'paths;
                }
                group.holes.push(path);
                continue 'paths;
            }
            groups.push(OutlineGroup::new(path));
        }

        groups
    }
}

/// `true` when every vertex of `candidate` lies inside `outer`.
fn contains(outer: &Outline, candidate: &Outline) -> bool {
    candidate
        .iter()
        .all(|p| point_in_polygon(p.x, p.y, outer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
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
    fn lone_path_becomes_a_group() {
        let groups = GroupOutlines::new(vec![square(0.0, 0.0, 10.0)]).execute();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].holes.is_empty());
    }

    #[test]
    fn nested_path_becomes_a_hole() {
        let groups =
            GroupOutlines::new(vec![square(0.0, 0.0, 10.0), square(3.0, 3.0, 4.0)]).execute();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].holes.len(), 1);
    }

    #[test]
    fn disjoint_paths_become_separate_groups() {
        let groups =
            GroupOutlines::new(vec![square(0.0, 0.0, 4.0), square(10.0, 0.0, 4.0)]).execute();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.holes.is_empty()));
    }

    #[test]
    fn hole_of_a_hole_is_dropped() {
        let groups = GroupOutlines::new(vec![
            square(0.0, 0.0, 20.0),
            square(4.0, 4.0, 10.0),
            square(6.0, 6.0, 2.0),
        ])
        .execute();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].holes.len(), 1);
    }

    #[test]
    fn two_holes_in_one_outer() {
        let groups = GroupOutlines::new(vec![
            square(0.0, 0.0, 20.0),
            square(2.0, 2.0, 3.0),
            square(10.0, 10.0, 3.0),
        ])
        .execute();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].holes.len(), 2);
    }

    #[test]
    fn degenerate_paths_are_ignored() {
        let groups = GroupOutlines::new(vec![
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            square(0.0, 0.0, 4.0),
        ])
        .execute();
        assert_eq!(groups.len(), 1);
    }
}
