//! Parameterized trajectory generators (PTGs).
//!
//! A PTG is a closed-form family of kinematically feasible trajectories,
//! indexed by a discretized direction parameter alpha. The planner never
//! integrates robot dynamics itself: PTGs own all path geometry, the
//! workspace-to-trajectory inversion, and per-trajectory collision
//! distances.
//!
//! Two families are provided:
//! - [`HolonomicBlend`]: velocity ramps in (vx, vy, omega) for holonomic
//!   platforms, with user-tunable speed laws.
//! - [`DiffDriveCircular`]: constant-curvature arcs for differential-drive
//!   platforms.

pub mod diff_drive;
pub mod expr;
pub mod holonomic_blend;

pub use diff_drive::{DiffDriveCircular, DiffDriveConfig};
pub use holonomic_blend::{HolonomicBlend, HolonomicBlendConfig};

use std::f64::consts::PI;

use crate::core::math::normalize_angle;
use crate::core::{KinState, Pose2D, RobotShape, Twist2D};
use crate::error::Result;

/// Alpha value (radians) of the k-th trajectory out of `count`.
///
/// Directions are the centers of `count` equal bins over (-pi, pi).
#[inline]
pub fn index2alpha(k: usize, count: usize) -> f64 {
    debug_assert!(k < count);
    PI * (-1.0 + 2.0 * (k as f64 + 0.5) / count as f64)
}

/// Trajectory index whose alpha bin contains the given direction.
#[inline]
pub fn alpha2index(alpha: f64, count: usize) -> usize {
    let a = normalize_angle(alpha);
    let k = (0.5 * (count as f64 * (1.0 + a / PI) - 1.0)).round() as i64;
    k.clamp(0, count as i64 - 1) as usize
}

/// Dynamic state a PTG's closed forms depend on.
///
/// Callers must pass the source robot state through
/// [`TrajectoryGenerator::update_dynamic_state`] before querying path
/// geometry or collision distances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicState {
    /// Current robot velocity in the robot's own frame.
    pub cur_vel_local: Twist2D,
    /// Navigation target relative to the robot.
    pub rel_target: Pose2D,
    /// Desired speed at the target, relative to the maximum (0..=1).
    pub target_rel_speed: f64,
}

impl Default for DynamicState {
    fn default() -> Self {
        Self {
            cur_vel_local: Twist2D::zero(),
            rel_target: Pose2D::new(1.0, 0.0, 0.0),
            target_rel_speed: 1.0,
        }
    }
}

impl DynamicState {
    /// Dynamic state for planning an edge out of `state`: local velocity
    /// taken from the state, unit relative target straight ahead.
    pub fn from_state(state: &KinState) -> Self {
        Self {
            cur_vel_local: state.local_vel(),
            rel_target: Pose2D::new(1.0, 0.0, 0.0),
            target_rel_speed: 1.0,
        }
    }
}

/// A workspace point expressed in trajectory-parameter space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TpPoint {
    /// Trajectory (alpha bin) index.
    pub trajectory: usize,
    /// Distance along the trajectory, normalized by the reference distance.
    pub normalized_dist: f64,
    /// False when the point is outside the family's exact domain and the
    /// result is a clamped approximation.
    pub exact: bool,
}

/// Capability set every trajectory family implements.
///
/// All geometry methods are pure with respect to the dynamic state last set
/// with [`update_dynamic_state`](Self::update_dynamic_state); a generator
/// must not be shared between concurrent callers.
pub trait TrajectoryGenerator {
    /// Number of discrete trajectory directions.
    fn alpha_count(&self) -> usize;

    /// Maximum look-ahead distance of any trajectory, in meters
    /// (pseudo-meters for families with an inflated path metric).
    fn ref_distance(&self) -> f64;

    /// Set the dynamic state subsequent queries are evaluated under.
    fn update_dynamic_state(&mut self, state: DynamicState);

    /// The dynamic state last set.
    fn dynamic_state(&self) -> &DynamicState;

    /// Robot footprint, in the robot frame.
    fn robot_shape(&self) -> &RobotShape;

    /// Pose on trajectory `k` after `step` path steps, relative to the path
    /// start frame.
    fn path_pose(&self, k: usize, step: u32) -> Pose2D;

    /// Velocity on trajectory `k` at `step`, expressed in the path start
    /// frame.
    fn path_twist(&self, k: usize, step: u32) -> Twist2D;

    /// Distance along trajectory `k` from the start to `step`.
    fn path_dist(&self, k: usize, step: u32) -> f64;

    /// Path step at which trajectory `k` reaches `dist`, or `None` when the
    /// closed forms have no solution.
    fn path_step_for_dist(&self, k: usize, dist: f64) -> Option<u32>;

    /// Number of steps trajectory `k` is defined for (up to the reference
    /// distance).
    fn path_step_count(&self, k: usize) -> u32;

    /// Map a workspace point (robot frame) into trajectory-parameter space.
    fn inverse_map_ws2tp(&self, x: f64, y: f64) -> Option<TpPoint>;

    /// Narrow the clear distance along trajectory `k` given one obstacle
    /// point in the robot frame. Never grows `dist`.
    fn update_tp_obstacle_single(&self, ox: f64, oy: f64, k: usize, dist: &mut f64);

    /// One-line description of the family and its parameters.
    fn description(&self) -> String;

    /// Alpha direction of trajectory `k`.
    #[inline]
    fn index_to_alpha(&self, k: usize) -> f64 {
        index2alpha(k, self.alpha_count())
    }

    /// Trajectory index for direction `alpha`.
    #[inline]
    fn alpha_to_index(&self, alpha: f64) -> usize {
        alpha2index(alpha, self.alpha_count())
    }

    /// True if the robot-frame point lies inside the footprint.
    #[inline]
    fn point_inside_robot_shape(&self, x: f64, y: f64) -> bool {
        self.robot_shape().contains(x, y)
    }

    /// Initial clear distance along trajectory `k`, before any obstacle is
    /// taken into account.
    fn init_tp_obstacle_single(&self, k: usize) -> f64 {
        let last_step = self.path_step_count(k).saturating_sub(1);
        self.ref_distance().min(self.path_dist(k, last_step))
    }

    /// Fold a newly found collision distance into the stored clear distance.
    ///
    /// Shrinks only. An obstacle already inside the footprint at the path
    /// origin is ignored while the trajectory moves away from it and clamps
    /// the clear distance to zero otherwise.
    fn clip_tp_obstacle(&self, ox: f64, oy: f64, collision_dist: f64, dist: &mut f64) {
        if !self.point_inside_robot_shape(ox, oy) {
            if collision_dist < *dist {
                *dist = collision_dist;
            }
        } else if collision_dist >= self.robot_shape().radius {
            *dist = 0.0;
        }
    }

    /// TP-space distance from a kinematic state to a query pose: the length
    /// of the shortest primitive of this family connecting them, together
    /// with its trajectory index. `None` when no exact primitive exists.
    ///
    /// A zero distance means the poses coincide; callers treat that as a
    /// duplicated tree node.
    fn distance_to(&self, from: &KinState, query: &Pose2D) -> Option<(f64, usize)> {
        let rel = from.pose.relative_to(query);
        if rel.x == 0.0 && rel.y == 0.0 {
            return Some((0.0, 0));
        }
        let tp = self.inverse_map_ws2tp(rel.x, rel.y)?;
        if !tp.exact {
            return None;
        }
        let dist = tp.normalized_dist * self.ref_distance();
        if dist <= 0.0 {
            // Below the path-step resolution; not representable.
            return None;
        }
        Some((dist, tp.trajectory))
    }

    /// Cheap lower-bound rejection for [`distance_to`](Self::distance_to):
    /// true when the state is provably farther than `max_dist` from the
    /// query along any primitive of this family.
    fn cannot_be_nearer_than(&self, from: &KinState, query: &Pose2D, max_dist: f64) -> bool {
        from.pose.position_distance(query) - self.ref_distance() > max_dist
    }
}

/// A concrete trajectory family, dispatched without trait objects so the
/// neighborhood scan stays monomorphic.
#[derive(Clone, Debug)]
pub enum PtgKind {
    /// Holonomic velocity-ramp family.
    HolonomicBlend(HolonomicBlend),
    /// Differential-drive constant-curvature family.
    DiffDriveCircular(DiffDriveCircular),
}

impl PtgKind {
    /// Serialize to a tagged, versioned binary archive.
    pub fn to_archive_bytes(&self) -> Result<Vec<u8>> {
        let (tag, inner) = match self {
            PtgKind::HolonomicBlend(p) => (0u8, p.to_archive_bytes()?),
            PtgKind::DiffDriveCircular(p) => (1u8, p.to_archive_bytes()?),
        };
        let mut out = Vec::with_capacity(inner.len() + 1);
        out.push(tag);
        out.extend_from_slice(&inner);
        Ok(out)
    }

    /// Deserialize from the archive form produced by
    /// [`to_archive_bytes`](Self::to_archive_bytes).
    pub fn from_archive_bytes(bytes: &[u8]) -> Result<Self> {
        use crate::error::PlanError;
        let (tag, rest) = bytes
            .split_first()
            .ok_or_else(|| PlanError::Serialization("empty PTG archive".into()))?;
        match tag {
            0 => Ok(PtgKind::HolonomicBlend(HolonomicBlend::from_archive_bytes(
                rest,
            )?)),
            1 => Ok(PtgKind::DiffDriveCircular(
                DiffDriveCircular::from_archive_bytes(rest)?,
            )),
            other => Err(PlanError::Serialization(format!(
                "unknown PTG archive tag {}",
                other
            ))),
        }
    }
}

impl TrajectoryGenerator for PtgKind {
    fn alpha_count(&self) -> usize {
        match self {
            PtgKind::HolonomicBlend(p) => p.alpha_count(),
            PtgKind::DiffDriveCircular(p) => p.alpha_count(),
        }
    }

    fn ref_distance(&self) -> f64 {
        match self {
            PtgKind::HolonomicBlend(p) => p.ref_distance(),
            PtgKind::DiffDriveCircular(p) => p.ref_distance(),
        }
    }

    fn update_dynamic_state(&mut self, state: DynamicState) {
        match self {
            PtgKind::HolonomicBlend(p) => p.update_dynamic_state(state),
            PtgKind::DiffDriveCircular(p) => p.update_dynamic_state(state),
        }
    }

    fn dynamic_state(&self) -> &DynamicState {
        match self {
            PtgKind::HolonomicBlend(p) => p.dynamic_state(),
            PtgKind::DiffDriveCircular(p) => p.dynamic_state(),
        }
    }

    fn robot_shape(&self) -> &RobotShape {
        match self {
            PtgKind::HolonomicBlend(p) => p.robot_shape(),
            PtgKind::DiffDriveCircular(p) => p.robot_shape(),
        }
    }

    fn path_pose(&self, k: usize, step: u32) -> Pose2D {
        match self {
            PtgKind::HolonomicBlend(p) => p.path_pose(k, step),
            PtgKind::DiffDriveCircular(p) => p.path_pose(k, step),
        }
    }

    fn path_twist(&self, k: usize, step: u32) -> Twist2D {
        match self {
            PtgKind::HolonomicBlend(p) => p.path_twist(k, step),
            PtgKind::DiffDriveCircular(p) => p.path_twist(k, step),
        }
    }

    fn path_dist(&self, k: usize, step: u32) -> f64 {
        match self {
            PtgKind::HolonomicBlend(p) => p.path_dist(k, step),
            PtgKind::DiffDriveCircular(p) => p.path_dist(k, step),
        }
    }

    fn path_step_for_dist(&self, k: usize, dist: f64) -> Option<u32> {
        match self {
            PtgKind::HolonomicBlend(p) => p.path_step_for_dist(k, dist),
            PtgKind::DiffDriveCircular(p) => p.path_step_for_dist(k, dist),
        }
    }

    fn path_step_count(&self, k: usize) -> u32 {
        match self {
            PtgKind::HolonomicBlend(p) => p.path_step_count(k),
            PtgKind::DiffDriveCircular(p) => p.path_step_count(k),
        }
    }

    fn inverse_map_ws2tp(&self, x: f64, y: f64) -> Option<TpPoint> {
        match self {
            PtgKind::HolonomicBlend(p) => p.inverse_map_ws2tp(x, y),
            PtgKind::DiffDriveCircular(p) => p.inverse_map_ws2tp(x, y),
        }
    }

    fn update_tp_obstacle_single(&self, ox: f64, oy: f64, k: usize, dist: &mut f64) {
        match self {
            PtgKind::HolonomicBlend(p) => p.update_tp_obstacle_single(ox, oy, k, dist),
            PtgKind::DiffDriveCircular(p) => p.update_tp_obstacle_single(ox, oy, k, dist),
        }
    }

    fn description(&self) -> String {
        match self {
            PtgKind::HolonomicBlend(p) => p.description(),
            PtgKind::DiffDriveCircular(p) => p.description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_index_round_trip() {
        let count = 31;
        for k in 0..count {
            let alpha = index2alpha(k, count);
            assert!(alpha > -PI && alpha < PI);
            assert_eq!(alpha2index(alpha, count), k);
        }
    }

    #[test]
    fn test_alpha2index_center() {
        // Middle bin of an odd count is exactly forward.
        assert_eq!(alpha2index(0.0, 31), 15);
        assert!((index2alpha(15, 31)).abs() < 1e-12);
    }

    #[test]
    fn test_alpha2index_clamps() {
        assert_eq!(alpha2index(PI, 31), 30);
        assert_eq!(alpha2index(-PI + 1e-9, 31), 0);
    }
}
