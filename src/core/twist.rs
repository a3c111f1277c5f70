//! Planar twist (velocity) type.

use serde::{Deserialize, Serialize};

/// Velocity in the plane: linear (vx, vy) plus angular rate omega.
///
/// The frame the linear part is expressed in depends on context: node
/// velocities are stored in the world frame and rotated into the robot frame
/// with [`Twist2D::rotated`] where a local view is needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Twist2D {
    /// Linear velocity along X, m/s
    pub vx: f64,
    /// Linear velocity along Y, m/s
    pub vy: f64,
    /// Angular velocity, rad/s (CCW positive)
    pub omega: f64,
}

impl Twist2D {
    /// Create a new twist.
    #[inline]
    pub fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }

    /// Zero twist.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate the linear part by `angle` radians; omega is frame-invariant.
    #[inline]
    pub fn rotated(&self, angle: f64) -> Twist2D {
        let (sin_a, cos_a) = angle.sin_cos();
        Twist2D::new(
            self.vx * cos_a - self.vy * sin_a,
            self.vx * sin_a + self.vy * cos_a,
            self.omega,
        )
    }

    /// Magnitude of the linear part, m/s.
    #[inline]
    pub fn linear_norm(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}
