//! Command-line demo: plan through a field of random obstacles.
//!
//! ```text
//! cargo run --bin rrt_demo -- --iterations 500 --obstacles 40 --seed 7
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use marga_plan::core::{KinState, Point2D, Pose2D};
use marga_plan::obstacles::ObstaclePoints;
use marga_plan::planner::{PlannerInput, PlannerParams, RrtStarPlanner};
use marga_plan::ptg::{HolonomicBlend, HolonomicBlendConfig, PtgKind};

#[derive(Parser, Debug)]
#[command(name = "rrt_demo", about = "TP-space RRT* planning demo")]
struct Args {
    /// Half side of the square world, meters
    #[arg(long, default_value_t = 10.0)]
    world_half_side: f64,

    /// Number of random obstacle points
    #[arg(long, default_value_t = 30)]
    obstacles: usize,

    /// Planner iterations
    #[arg(long, default_value_t = 1000)]
    iterations: usize,

    /// Goal X coordinate, meters
    #[arg(long, default_value_t = 7.0)]
    goal_x: f64,

    /// Goal Y coordinate, meters
    #[arg(long, default_value_t = 2.0)]
    goal_y: f64,

    /// Random seed (obstacles and planner)
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write a tree snapshot every N iterations (0 = never)
    #[arg(long, default_value_t = 0)]
    snapshot_every: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let half = args.world_half_side;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let start = Pose2D::new(0.0, 0.0, 0.0);
    let goal = Pose2D::new(args.goal_x, args.goal_y, 0.0);

    // Scatter obstacles, keeping start and goal clear.
    let mut points = Vec::with_capacity(args.obstacles);
    while points.len() < args.obstacles {
        let p = Point2D::new(
            rng.gen_range(-half..half),
            rng.gen_range(-half..half),
        );
        let clear_of = |q: &Pose2D| (p.x - q.x).hypot(p.y - q.y) > 1.0;
        if clear_of(&start) && clear_of(&goal) {
            points.push(p);
        }
    }

    let ptg = match HolonomicBlend::new(HolonomicBlendConfig::default()) {
        Ok(ptg) => ptg,
        Err(e) => {
            eprintln!("bad PTG configuration: {}", e);
            std::process::exit(1);
        }
    };

    let input = PlannerInput {
        state_start: KinState::at_pose(start),
        state_goal: KinState::at_pose(goal),
        world_bbox_min: Pose2D::new(-half, -half, -PI),
        world_bbox_max: Pose2D::new(half, half, PI),
        ptgs: vec![PtgKind::HolonomicBlend(ptg)],
        obstacles: Arc::new(ObstaclePoints::from_points(points)),
    };

    let params = PlannerParams::default()
        .with_max_iterations(args.iterations)
        .with_seed(args.seed);
    let params = PlannerParams {
        save_debug_visualization_decimation: args.snapshot_every,
        ..params
    };

    let mut planner = RrtStarPlanner::new(params);
    match planner.plan(input) {
        Ok(output) => {
            println!(
                "tree: {} nodes, goal reached: {}",
                output.motion_tree.len(),
                output.success
            );
            if let Some(goal_node) = output.goal_node {
                let cost = output.motion_tree.node(goal_node).cost;
                println!(
                    "best path: {} edge(s), cost {:.2} m",
                    output.path_to_goal.len(),
                    cost
                );
                for edge in &output.path_to_goal {
                    let to = output.motion_tree.node(edge.child).state.pose;
                    println!(
                        "  -> ({:+.2}, {:+.2}, {:+.2} rad)  via ptg {} k={} d={:.2}",
                        to.x, to.y, to.phi, edge.ptg_index, edge.trajectory_index, edge.ptg_dist
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("planning failed: {}", e);
            std::process::exit(1);
        }
    }
}
