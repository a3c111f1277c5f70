//! Obstacle point cloud with nearest-neighbor queries.
//!
//! The planner treats the world as a set of 2D obstacle points. Two queries
//! matter: iterating the full cloud (for clipping into a node-local view)
//! and finding the nearest obstacle to a pose (for footprint checks during
//! sampling). The latter is backed by a kd-tree built once at construction.

use kiddo::{KdTree, SquaredEuclidean};

use crate::core::Point2D;

/// Immutable obstacle cloud with a 2D nearest-neighbor index.
#[derive(Clone)]
pub struct ObstaclePoints {
    points: Vec<Point2D>,
    tree: KdTree<f64, 2>,
}

impl ObstaclePoints {
    /// Empty cloud.
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            tree: KdTree::new(),
        }
    }

    /// Build a cloud (and its index) from a list of points.
    pub fn from_points(points: Vec<Point2D>) -> Self {
        let mut tree = KdTree::with_capacity(points.len());
        for (idx, p) in points.iter().enumerate() {
            tree.add(&[p.x, p.y], idx as u64);
        }
        Self { points, tree }
    }

    /// All obstacle points.
    #[inline]
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Number of points in the cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the cloud holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest obstacle to (x, y), with the squared distance to it.
    ///
    /// Returns `None` on an empty cloud.
    pub fn nearest(&self, x: f64, y: f64) -> Option<(Point2D, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let hit = self.tree.nearest_one::<SquaredEuclidean>(&[x, y]);
        Some((self.points[hit.item as usize], hit.distance))
    }
}

impl std::fmt::Debug for ObstaclePoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstaclePoints")
            .field("len", &self.points.len())
            .finish()
    }
}
