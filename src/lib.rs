//! # Marga-Plan: TP-Space RRT* Motion Planning
//!
//! A kinematically aware path planner for mobile robots in planar worlds.
//! Instead of connecting poses with straight segments, the planner searches
//! over **motion primitives**: closed-form trajectory families (PTGs) that
//! respect the vehicle's kinematics and dynamics. The result is a tree of
//! reachable states whose every edge the robot can actually drive.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use marga_plan::core::{KinState, Point2D, Pose2D};
//! use marga_plan::obstacles::ObstaclePoints;
//! use marga_plan::planner::{PlannerInput, PlannerParams, RrtStarPlanner};
//! use marga_plan::ptg::{HolonomicBlend, HolonomicBlendConfig, PtgKind};
//!
//! let ptg = HolonomicBlend::new(HolonomicBlendConfig::default()).unwrap();
//! let input = PlannerInput {
//!     state_start: KinState::at_pose(Pose2D::new(0.0, 0.0, 0.0)),
//!     state_goal: KinState::at_pose(Pose2D::new(5.0, 0.0, 0.0)),
//!     world_bbox_min: Pose2D::new(-10.0, -10.0, -std::f64::consts::PI),
//!     world_bbox_max: Pose2D::new(10.0, 10.0, std::f64::consts::PI),
//!     ptgs: vec![PtgKind::HolonomicBlend(ptg)],
//!     obstacles: Arc::new(ObstaclePoints::from_points(vec![Point2D::new(2.5, 1.0)])),
//! };
//!
//! let mut planner = RrtStarPlanner::new(PlannerParams::default().with_seed(42));
//! let output = planner.plan(input).unwrap();
//! println!(
//!     "tree has {} nodes, goal reached: {}",
//!     output.motion_tree.len(),
//!     output.success
//! );
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: poses, twists, kinematic states, scalar math
//! - [`obstacles`]: obstacle cloud with nearest-neighbor queries
//! - [`ptg`]: the trajectory-generator capability set and the two concrete
//!   families ([`ptg::HolonomicBlend`], [`ptg::DiffDriveCircular`])
//! - [`tree`]: the motion tree (dense IDs, typed edges)
//! - [`planner`]: sampling, neighborhood queries, the extend/rewire loop
//! - [`io`]: decimated debug snapshots of the tree
//!
//! ## Data Flow
//!
//! ```text
//!   sampler ──> neighborhood query ──> per-candidate collision check
//!      │                                        │ (PTG + local obstacles)
//!      │                                        ▼
//!      │                               best-parent selection
//!      │                                        │
//!      ▼                                        ▼
//!   obstacle cloud                      tree insertion ──> rewire
//! ```
//!
//! Planning is strictly single-threaded; a fixed seed and identical inputs
//! reproduce the output tree bit for bit.

pub mod core;
pub mod error;
pub mod io;
pub mod obstacles;
pub mod planner;
pub mod ptg;
pub mod tree;

pub use error::{PlanError, Result};
pub use planner::{PlannerInput, PlannerOutput, PlannerParams, RrtStarPlanner};
pub use ptg::{PtgKind, TrajectoryGenerator};
pub use tree::{MotionTree, MoveEdge, NodeId};
