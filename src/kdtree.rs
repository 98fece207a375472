//! # KD-Tree Spatial Index
//!
//! A 2D tree over the current vehicle positions, used to prune the all-pairs
//! search down to vehicles within a radius of each other.
//!
//! The tree copies `(slice index, id, position)` out of the fleet when it is
//! built, so it never borrows the vehicles and stays valid while they are
//! mutated. It is a snapshot: rebuild it after positions change.

use crate::structs::{Agv, AgvId, Point};
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KdEntry {
    /// Position of the vehicle in the slice the tree was built from
    pub index: usize,
    pub id: AgvId,
    pub position: Point,
}

impl KdEntry {
    /// Coordinate on the split axis for `depth` (x on even depths, y on odd).
    fn coord(&self, depth: usize) -> f64 {
        if depth % 2 == 0 {
            self.position.x
        } else {
            self.position.y
        }
    }
}

#[derive(Debug)]
pub struct KdNode {
    pub entry: KdEntry,
    pub left: Option<Box<KdNode>>,
    pub right: Option<Box<KdNode>>,
    pub depth: usize,
}

impl KdNode {
    /// Builds a subtree by sorting `entries` on the split axis for `depth` and
    /// splitting at the median element.
    pub fn build(entries: &mut [KdEntry], depth: usize) -> Option<Box<KdNode>> {
        if entries.is_empty() {
            return None;
        }

        entries.sort_by_key(|e| OrderedFloat(e.coord(depth)));
        let median = entries.len() / 2;
        let (left, rest) = entries.split_at_mut(median);
        let (mid, right) = rest.split_first_mut()?;

        Some(Box::new(KdNode {
            entry: *mid,
            left: KdNode::build(left, depth + 1),
            right: KdNode::build(right, depth + 1),
            depth,
        }))
    }

    /// Collects the slice indices of every entry other than `target_id` within
    /// `radius` of `target`.
    ///
    /// The half-space containing the target is searched first; the other one
    /// only when the splitting plane is within `radius`.
    pub fn range_search(&self, target_id: AgvId, target: &Point, radius: f64, results: &mut Vec<usize>) {
        if self.entry.id != target_id && self.entry.position.distance(target) <= radius {
            results.push(self.entry.index);
        }

        let diff = if self.depth % 2 == 0 {
            target.x - self.entry.position.x
        } else {
            target.y - self.entry.position.y
        };

        let (near, far) = if diff <= 0.0 {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(node) = near {
            node.range_search(target_id, target, radius, results);
        }
        if diff.abs() <= radius {
            if let Some(node) = far {
                node.range_search(target_id, target, radius, results);
            }
        }
    }

    fn height(&self) -> usize {
        let left = self.left.as_ref().map_or(0, |n| n.height());
        let right = self.right.as_ref().map_or(0, |n| n.height());
        1 + left.max(right)
    }
}

/// Index over one snapshot of a fleet.
#[derive(Debug)]
pub struct KdTree {
    root: Option<Box<KdNode>>,
    len: usize,
}

impl KdTree {
    pub fn build(agvs: &[Agv]) -> Self {
        let mut entries: Vec<KdEntry> = agvs
            .iter()
            .enumerate()
            .map(|(index, agv)| KdEntry {
                index,
                id: agv.id,
                position: agv.position(),
            })
            .collect();

        KdTree {
            root: KdNode::build(&mut entries, 0),
            len: agvs.len(),
        }
    }

    /// Slice indices of the vehicles within `radius` of `target`, excluding
    /// `target` itself (matched by id).
    pub fn range_search(&self, target: &Agv, radius: f64) -> Vec<usize> {
        let mut results = Vec::new();
        if let Some(root) = &self.root {
            root.range_search(target.id, &target.position(), radius, &mut results);
        }
        results
    }

    pub fn root(&self) -> Option<&KdNode> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; 0 for an empty tree.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Pose;
    use std::collections::HashSet;

    fn agv(id: AgvId, x: f64, y: f64) -> Agv {
        Agv::new(id, 1.0, Pose::new(x, y, 0.0), 1.0, vec![Point::new(x, y)])
    }

    fn grid_fleet(side: usize, spacing: f64) -> Vec<Agv> {
        let mut fleet = Vec::new();
        for i in 0..side {
            for j in 0..side {
                fleet.push(agv(i * side + j, i as f64 * spacing, j as f64 * spacing));
            }
        }
        fleet
    }

    // ==================== build Tests ====================

    #[test]
    fn test_build_empty() {
        let tree = KdTree::build(&[]);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_build_splits_on_median_x() {
        let fleet = vec![agv(0, 5.0, 0.0), agv(1, 1.0, 9.0), agv(2, 3.0, 4.0)];
        let tree = KdTree::build(&fleet);
        let root = tree.root().unwrap();

        assert_eq!(root.entry.id, 2, "Median by x is the vehicle at x=3");
        assert_eq!(root.depth, 0);
        assert_eq!(root.left.as_ref().unwrap().entry.id, 1);
        assert_eq!(root.right.as_ref().unwrap().entry.id, 0);
        assert_eq!(root.left.as_ref().unwrap().depth, 1);
    }

    #[test]
    fn test_build_is_balanced() {
        let fleet = grid_fleet(4, 1.0);
        let tree = KdTree::build(&fleet);
        assert_eq!(tree.len(), 16);
        assert_eq!(tree.depth(), 5);
    }

    #[test]
    fn test_build_does_not_reorder_fleet() {
        let fleet = vec![agv(0, 5.0, 0.0), agv(1, 1.0, 9.0), agv(2, 3.0, 4.0)];
        let tree = KdTree::build(&fleet);
        let root = tree.root().unwrap();
        assert_eq!(fleet[root.entry.index].id, root.entry.id);
        assert_eq!(fleet[0].id, 0);
    }

    // ==================== range_search Tests ====================

    #[test]
    fn test_range_search_excludes_self() {
        let fleet = vec![agv(0, 0.0, 0.0), agv(1, 0.5, 0.0)];
        let tree = KdTree::build(&fleet);
        assert_eq!(tree.range_search(&fleet[0], 10.0), vec![1]);
    }

    #[test]
    fn test_range_search_radius_is_inclusive() {
        let fleet = vec![agv(0, 0.0, 0.0), agv(1, 3.0, 4.0), agv(2, 6.0, 8.0)];
        let tree = KdTree::build(&fleet);
        assert_eq!(tree.range_search(&fleet[0], 5.0), vec![1]);
    }

    #[test]
    fn test_range_search_matches_brute_force() {
        let fleet = grid_fleet(6, 1.5);
        let tree = KdTree::build(&fleet);

        for radius in [0.0, 1.0, 1.5, 2.2, 4.0, 100.0] {
            for target in &fleet {
                let found: HashSet<usize> = tree.range_search(target, radius).into_iter().collect();
                let expected: HashSet<usize> = fleet
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| other.id != target.id && other.distance_to(target) <= radius)
                    .map(|(i, _)| i)
                    .collect();
                assert_eq!(found, expected, "radius {} around {}", radius, target);
            }
        }
    }

    #[test]
    fn test_range_search_duplicate_coordinates() {
        let fleet = vec![agv(0, 1.0, 1.0), agv(1, 1.0, 1.0), agv(2, 1.0, 1.0), agv(3, 1.0, 2.0)];
        let tree = KdTree::build(&fleet);
        let mut found = tree.range_search(&fleet[1], 0.0);
        found.sort();
        assert_eq!(found, vec![0, 2]);
    }
}
