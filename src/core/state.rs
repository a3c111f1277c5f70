//! SE(2) kinematic state: pose plus velocity.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;
use super::twist::Twist2D;

/// A kinematic state on SE(2): global pose and global-frame twist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KinState {
    /// Global pose (x, y, phi)
    pub pose: Pose2D,
    /// Global velocity (vx, vy, omega)
    pub vel: Twist2D,
}

impl KinState {
    /// Create a state from pose and velocity.
    #[inline]
    pub fn new(pose: Pose2D, vel: Twist2D) -> Self {
        Self { pose, vel }
    }

    /// State at a pose with zero velocity.
    #[inline]
    pub fn at_pose(pose: Pose2D) -> Self {
        Self {
            pose,
            vel: Twist2D::zero(),
        }
    }

    /// Velocity expressed in the robot's own frame.
    #[inline]
    pub fn local_vel(&self) -> Twist2D {
        self.vel.rotated(-self.pose.phi)
    }
}
