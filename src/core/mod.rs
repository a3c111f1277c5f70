//! Fundamental geometric and kinematic types.

pub mod math;
pub mod point;
pub mod pose;
pub mod shape;
pub mod state;
pub mod twist;

pub use math::{normalize_angle, wrap_to_2pi};
pub use point::Point2D;
pub use pose::Pose2D;
pub use shape::RobotShape;
pub use state::KinState;
pub use twist::Twist2D;
