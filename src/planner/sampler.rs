//! Goal-biased sampling of collision-free poses.
//!
//! Two modes, selected by [`PlannerParams::draw_in_tps`]:
//!
//! - **Euclidean**: poses drawn uniformly from the world bounding box and
//!   accepted when the nearest obstacle lies outside the robot footprint.
//! - **TP-space**: a random (tree node, generator, trajectory, distance)
//!   tuple is expanded into the pose it reaches, so samples are reachable
//!   by construction; bounding box and footprint checks still apply.
//!
//! Either way, with probability `goal_bias` the goal pose is returned
//! directly.

use rand::rngs::StdRng;
use rand::Rng;

use crate::core::Pose2D;
use crate::error::{PlanError, Result};
use crate::obstacles::ObstaclePoints;
use crate::ptg::{DynamicState, PtgKind, TrajectoryGenerator};
use crate::tree::{MotionTree, NodeId};

use super::params::PlannerParams;
use super::PlannerInput;

/// Draw attempts before surfacing sampler exhaustion.
pub const MAX_DRAW_ATTEMPTS: usize = 1_000_000;

/// Draw a random collision-free pose for the next tree extension.
pub fn draw_random_free_pose(
    rng: &mut StdRng,
    params: &PlannerParams,
    input: &PlannerInput,
    tree: &MotionTree,
    ptgs: &mut [PtgKind],
) -> Result<Pose2D> {
    if rng.gen::<f64>() < params.goal_bias {
        return Ok(input.state_goal.pose);
    }
    if params.draw_in_tps {
        draw_random_tps(rng, params, input, tree, ptgs)
    } else {
        draw_random_euclidean(rng, input, ptgs)
    }
}

fn within_bbox(p: &Pose2D, min: &Pose2D, max: &Pose2D) -> bool {
    p.x >= min.x && p.y >= min.y && p.phi >= min.phi && p.x <= max.x && p.y <= max.y && p.phi <= max.phi
}

/// True if the nearest obstacle to `pose` lies inside the given footprint.
fn nearest_obstacle_collides(pose: &Pose2D, obstacles: &ObstaclePoints, ptg: &PtgKind) -> bool {
    match obstacles.nearest(pose.x, pose.y) {
        None => false,
        Some((closest, _)) => {
            let local = pose.inverse_transform_point(closest);
            ptg.point_inside_robot_shape(local.x, local.y)
        }
    }
}

fn draw_random_euclidean(
    rng: &mut StdRng,
    input: &PlannerInput,
    ptgs: &[PtgKind],
) -> Result<Pose2D> {
    let min = &input.world_bbox_min;
    let max = &input.world_bbox_max;

    for _ in 0..MAX_DRAW_ATTEMPTS {
        let q = Pose2D::new(
            rng.gen_range(min.x..max.x),
            rng.gen_range(min.y..max.y),
            rng.gen_range(min.phi..max.phi),
        );

        if !nearest_obstacle_collides(&q, &input.obstacles, &ptgs[0]) {
            return Ok(q);
        }
    }
    Err(PlanError::SamplerExhausted {
        attempts: MAX_DRAW_ATTEMPTS,
    })
}

fn draw_random_tps(
    rng: &mut StdRng,
    params: &PlannerParams,
    input: &PlannerInput,
    tree: &MotionTree,
    ptgs: &mut [PtgKind],
) -> Result<Pose2D> {
    for _ in 0..MAX_DRAW_ATTEMPTS {
        // Source node, then generator, then trajectory, then distance.
        let node_idx = rng.gen_range(0..tree.len());
        let node = tree.node(NodeId::from_index(node_idx)).state;

        let ptg_idx = rng.gen_range(0..ptgs.len());
        let ptg = &mut ptgs[ptg_idx];

        let traj_idx = rng.gen_range(0..ptg.alpha_count());
        let traj_dist = rng.gen_range(params.min_step_length..params.max_step_length);

        ptg.update_dynamic_state(DynamicState::from_state(&node));

        let Some(step) = ptg.path_step_for_dist(traj_idx, traj_dist) else {
            continue;
        };
        let rel_pose = ptg.path_pose(traj_idx, step);
        let q = node.pose.compose(&rel_pose);

        if !within_bbox(&q, &input.world_bbox_min, &input.world_bbox_max) {
            continue;
        }
        if nearest_obstacle_collides(&q, &input.obstacles, &ptgs[ptg_idx]) {
            continue;
        }
        return Ok(q);
    }
    Err(PlanError::SamplerExhausted {
        attempts: MAX_DRAW_ATTEMPTS,
    })
}
