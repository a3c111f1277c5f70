//! Robot footprint predicate.

use serde::{Deserialize, Serialize};

/// Robot footprint in the robot's own frame.
///
/// Collision queries only ever need a point-inside test against the
/// footprint, so the shape is kept as simple as the trajectory math
/// requires: a circle centered on the robot origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotShape {
    /// Footprint radius in meters.
    pub radius: f64,
}

impl RobotShape {
    /// Circular footprint with the given radius.
    #[inline]
    pub fn circle(radius: f64) -> Self {
        Self { radius }
    }

    /// True if the point (in the robot frame) lies strictly inside the
    /// footprint.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x * x + y * y < self.radius * self.radius
    }
}

impl Default for RobotShape {
    fn default() -> Self {
        Self { radius: 0.25 }
    }
}
