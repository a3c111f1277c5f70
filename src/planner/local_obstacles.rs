//! Per-node local views of the obstacle cloud.
//!
//! Collision distances are evaluated in the frame of the tree node an edge
//! starts from, against only the obstacles a trajectory could possibly
//! reach. Each view clips the global cloud to a square around the node and
//! transforms the survivors into the node frame; views are cached per node
//! and invalidated when the node's pose changes (rewiring moves nodes).

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::core::{Point2D, Pose2D};
use crate::obstacles::ObstaclePoints;
use crate::tree::NodeId;

/// Cached node-local obstacle view.
#[derive(Clone, Debug)]
struct CacheEntry {
    /// Pose the view was computed at; compared exactly.
    pose: Pose2D,
    /// Obstacles within the clipping square, in the node frame.
    points: Vec<Point2D>,
}

/// Cache of node-local obstacle views, keyed by node ID.
#[derive(Clone, Debug, Default)]
pub struct LocalObstacleCache {
    entries: HashMap<NodeId, CacheEntry>,
}

impl LocalObstacleCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached views.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached views.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The obstacle view local to a node, recomputed unless the cached pose
    /// matches the node's current pose exactly.
    ///
    /// `half_side` is the half side length of the clipping square; points on
    /// the boundary are kept.
    pub fn local_view(
        &mut self,
        node_id: NodeId,
        node_pose: Pose2D,
        obstacles: &ObstaclePoints,
        half_side: f64,
    ) -> &[Point2D] {
        let entry = match self.entries.entry(node_id) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                let hit = entry.pose.x == node_pose.x
                    && entry.pose.y == node_pose.y
                    && entry.pose.phi == node_pose.phi;
                if !hit {
                    *entry = compute_view(node_pose, obstacles, half_side);
                }
                entry
            }
            Entry::Vacant(vacant) => vacant.insert(compute_view(node_pose, obstacles, half_side)),
        };
        &entry.points
    }
}

fn compute_view(node_pose: Pose2D, obstacles: &ObstaclePoints, half_side: f64) -> CacheEntry {
    let mut points = Vec::new();
    for p in obstacles.points() {
        if (p.x - node_pose.x).abs() <= half_side && (p.y - node_pose.y).abs() <= half_side {
            points.push(node_pose.inverse_transform_point(*p));
        }
    }
    CacheEntry {
        pose: node_pose,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn cloud() -> ObstaclePoints {
        ObstaclePoints::from_points(vec![
            Point2D::new(1.0, 0.0),
            Point2D::new(5.0, 5.0),
            Point2D::new(2.0, 0.0), // exactly on a 2.0 boundary from origin
        ])
    }

    #[test]
    fn test_clipping_keeps_boundary() {
        let mut cache = LocalObstacleCache::new();
        let view = cache.local_view(NodeId::ROOT, Pose2D::identity(), &cloud(), 2.0);
        // (5,5) clipped away; (2,0) sits exactly on the boundary and stays.
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_points_in_node_frame() {
        let mut cache = LocalObstacleCache::new();
        // Node at (1, 0) facing +Y: obstacle (1, 0) maps to the origin and
        // (2, 0) to (0, -1) in the node frame.
        let pose = Pose2D::new(1.0, 0.0, FRAC_PI_2);
        let view = cache.local_view(NodeId::ROOT, pose, &cloud(), 2.0);
        assert!(view
            .iter()
            .any(|p| p.x.abs() < 1e-12 && p.y.abs() < 1e-12));
        assert!(view
            .iter()
            .any(|p| p.x.abs() < 1e-12 && (p.y + 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_cache_hit_and_invalidation() {
        let mut cache = LocalObstacleCache::new();
        let obstacles = cloud();
        let pose = Pose2D::identity();

        let n1 = cache.local_view(NodeId::ROOT, pose, &obstacles, 2.0).len();
        assert_eq!(cache.len(), 1);
        let n2 = cache.local_view(NodeId::ROOT, pose, &obstacles, 2.0).len();
        assert_eq!(n1, n2);

        // A moved node recomputes its view.
        let moved = Pose2D::new(4.5, 4.5, 0.0);
        let view = cache.local_view(NodeId::ROOT, moved, &obstacles, 2.0);
        assert_eq!(view.len(), 1); // only (5,5) is near now
    }
}
