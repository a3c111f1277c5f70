//! Neighborhood query: tree nodes reachable from (or able to reach) a pose
//! within a TP-space metric ball.

use crate::core::Pose2D;
use crate::error::{PlanError, Result};
use crate::ptg::{DynamicState, PtgKind, TrajectoryGenerator};
use crate::tree::{MotionTree, NodeId};

/// One (node, generator, trajectory) candidate within the query ball.
#[derive(Clone, Copy, Debug)]
pub struct NeighborCandidate {
    /// Candidate source node.
    pub node: NodeId,
    /// Generator index into the planner's PTG set.
    pub ptg_index: usize,
    /// Trajectory index within the generator.
    pub trajectory_index: usize,
    /// Exact TP-space distance from the node to the query pose.
    pub distance: f64,
}

/// Enumerate (node, PTG, trajectory) tuples whose exact TP-space distance to
/// `query` is within `max_distance`, sorted by distance (ties keep scan
/// order: node ID, then PTG index).
///
/// Each distance is evaluated under the source node's own dynamic state, so
/// the reported trajectory is the one an extension from that node would
/// actually drive.
///
/// A zero distance means the query pose duplicates an existing node, which
/// indicates a broken tree and is a hard error.
pub fn find_nodes_within_ball(
    tree: &MotionTree,
    query: &Pose2D,
    max_distance: f64,
    ptgs: &mut [PtgKind],
) -> Result<Vec<NeighborCandidate>> {
    debug_assert!(!tree.is_empty());
    debug_assert!(!ptgs.is_empty());

    let mut candidates = Vec::new();

    for (node_id, node) in tree.nodes() {
        for (ptg_index, ptg) in ptgs.iter_mut().enumerate() {
            // Cheap lower bound before the exact inverse map.
            if ptg.cannot_be_nearer_than(&node.state, query, max_distance) {
                continue;
            }

            ptg.update_dynamic_state(DynamicState::from_state(&node.state));
            let Some((distance, trajectory_index)) = ptg.distance_to(&node.state, query) else {
                continue;
            };
            if distance <= 0.0 {
                return Err(PlanError::DuplicateNode { node: node_id });
            }
            if distance > max_distance {
                continue;
            }

            candidates.push(NeighborCandidate {
                node: node_id,
                ptg_index,
                trajectory_index,
                distance,
            });
        }
    }

    // Stable: equal distances keep scan order for reproducibility.
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(candidates)
}
