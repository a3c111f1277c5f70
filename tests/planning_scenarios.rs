//! End-to-end planning scenarios and tree invariants.

use std::f64::consts::PI;
use std::sync::Arc;

use marga_plan::core::{KinState, Point2D, Pose2D};
use marga_plan::obstacles::ObstaclePoints;
use marga_plan::planner::{
    LocalObstacleCache, PlannerInput, PlannerOutput, PlannerParams, RrtStarPlanner,
};
use marga_plan::ptg::{DynamicState, HolonomicBlend, HolonomicBlendConfig, PtgKind};
use marga_plan::{PlanError, TrajectoryGenerator};

const ROBOT_RADIUS: f64 = 0.25;

fn holonomic_ptg() -> PtgKind {
    PtgKind::HolonomicBlend(
        HolonomicBlend::new(HolonomicBlendConfig {
            robot_radius: ROBOT_RADIUS,
            ..Default::default()
        })
        .unwrap(),
    )
}

/// Box +-10 m, start at the origin, goal at (5, 0, 0).
fn base_input(obstacles: Vec<Point2D>) -> PlannerInput {
    PlannerInput {
        state_start: KinState::at_pose(Pose2D::new(0.0, 0.0, 0.0)),
        state_goal: KinState::at_pose(Pose2D::new(5.0, 0.0, 0.0)),
        world_bbox_min: Pose2D::new(-10.0, -10.0, -PI),
        world_bbox_max: Pose2D::new(10.0, 10.0, PI),
        ptgs: vec![holonomic_ptg()],
        obstacles: Arc::new(ObstaclePoints::from_points(obstacles)),
    }
}

fn euclidean_params(seed: u64) -> PlannerParams {
    PlannerParams::default()
        .with_max_iterations(200)
        .with_search_radius(10.0)
        .with_goal_bias(0.1)
        .with_draw_in_tps(false)
        .with_seed(seed)
}

/// Check structural tree invariants: dense IDs, cost recursion, exact pose
/// reconstruction, and collision-free edges.
fn check_invariants(output: &PlannerOutput) {
    let tree = &output.motion_tree;
    let input = &output.original_input;
    let max_xy = input
        .ptgs
        .iter()
        .map(|p| p.ref_distance())
        .fold(0.0f64, f64::max);

    // Dense IDs, root at 0 with no parent and cost 0.
    for (i, (id, node)) in tree.nodes().enumerate() {
        assert_eq!(id.index(), i);
        if i == 0 {
            assert!(node.parent.is_none());
            assert_eq!(node.cost, 0.0);
        } else {
            assert!(node.parent.is_some());
        }
    }

    for (id, node) in tree.nodes() {
        if id == tree.root() {
            continue;
        }
        let edge = tree.incoming_edge(id).expect("non-root node without edge");
        let parent = tree.node(edge.parent);

        // Cost recursion.
        assert!(
            (node.cost - (parent.cost + edge.cost)).abs() < 1e-9,
            "cost invariant broken at node {:?}",
            id
        );
        assert!(edge.cost > 0.0);

        // Pose reconstruction: parent pose composed with the primitive pose.
        let mut ptg = input.ptgs[edge.ptg_index].clone();
        ptg.update_dynamic_state(DynamicState::from_state(&parent.state));
        let rel = ptg.path_pose(edge.trajectory_index, edge.ptg_step);
        let expect = parent.state.pose.compose(&rel);
        assert!(
            (expect.x - node.state.pose.x).abs() < 1e-6
                && (expect.y - node.state.pose.y).abs() < 1e-6
                && (expect.phi - node.state.pose.phi).abs() < 1e-6,
            "pose invariant broken at node {:?}",
            id
        );

        // Collision-free: the free distance along the edge's trajectory,
        // measured at the parent, strictly exceeds the traveled distance.
        let mut cache = LocalObstacleCache::new();
        let local = cache.local_view(edge.parent, parent.state.pose, &input.obstacles, max_xy);
        let mut free = ptg.init_tp_obstacle_single(edge.trajectory_index);
        for p in local {
            ptg.update_tp_obstacle_single(p.x, p.y, edge.trajectory_index, &mut free);
        }
        assert!(
            edge.ptg_dist < free,
            "edge into {:?} is not collision-free: dist {} vs free {}",
            id,
            edge.ptg_dist,
            free
        );
    }
}

#[test]
fn empty_world_planner_reaches_goal() {
    let input = base_input(Vec::new());
    let mut planner = RrtStarPlanner::new(euclidean_params(1234));
    let output = planner.plan(input).unwrap();

    assert!(output.success, "goal not reached");
    let goal_node = output.goal_node.unwrap();
    let goal_pose = output.original_input.state_goal.pose;
    let reached = output.motion_tree.node(goal_node).state.pose;
    assert!(reached.position_distance(&goal_pose) <= 0.3);

    // The path is a root-to-goal edge chain.
    assert!(!output.path_to_goal.is_empty());
    assert_eq!(output.path_to_goal[0].parent, output.motion_tree.root());
    assert_eq!(output.path_to_goal.last().unwrap().child, goal_node);

    // At least one edge child inside the box.
    let inside = output.motion_tree.nodes().any(|(id, n)| {
        id != output.motion_tree.root()
            && n.state.pose.x.abs() < 10.0
            && n.state.pose.y.abs() < 10.0
    });
    assert!(inside);

    check_invariants(&output);
}

#[test]
fn blocked_straight_line_grows_around_obstacle() {
    let obstacle = Point2D::new(2.5, 0.0);
    let input = base_input(vec![obstacle]);
    let mut planner = RrtStarPlanner::new(euclidean_params(999));
    let output = planner.plan(input).unwrap();

    assert!(output.motion_tree.len() > 5, "tree failed to grow");

    // The tree expands past the obstacle.
    assert!(output
        .motion_tree
        .nodes()
        .any(|(_, n)| n.state.pose.x > 2.5));

    // No node sits inside the footprint around the obstacle (allowing for
    // the path-step quantization of reconstructed poses).
    for (_, node) in output.motion_tree.nodes() {
        let d = node.state.pose.position().distance(&obstacle);
        assert!(d > ROBOT_RADIUS - 0.02, "node too close to the obstacle");
    }

    check_invariants(&output);
}

#[test]
fn tp_space_sampling_mode_grows_tree() {
    let input = base_input(Vec::new());
    let params = PlannerParams::default()
        .with_max_iterations(150)
        .with_goal_bias(0.05)
        .with_draw_in_tps(true)
        .with_seed(2024);
    let mut planner = RrtStarPlanner::new(params);
    let output = planner.plan(input).unwrap();

    assert!(output.motion_tree.len() > 10, "TP-space sampling stalled");
    check_invariants(&output);
}

#[test]
fn full_goal_bias_extends_straight_to_goal() {
    let input = base_input(Vec::new());
    let params = PlannerParams::default()
        .with_max_iterations(1)
        .with_search_radius(10.0)
        .with_goal_bias(1.0)
        .with_seed(5);
    let mut planner = RrtStarPlanner::new(params);
    let output = planner.plan(input).unwrap();

    // The single sample was the goal pose; the tree extended right to it.
    assert_eq!(output.motion_tree.len(), 2);
    let (_, node) = output.motion_tree.nodes().last().unwrap();
    let goal = output.original_input.state_goal.pose;
    assert!(node.state.pose.position_distance(&goal) < 0.02);
}

#[test]
fn dense_obstacles_exhaust_the_sampler() {
    // Fill a small world with a 0.1 m grid: every pose has an obstacle well
    // inside the 0.25 m footprint.
    let mut points = Vec::new();
    let mut x = -1.0;
    while x <= 1.0 {
        let mut y = -1.0;
        while y <= 1.0 {
            points.push(Point2D::new(x, y));
            y += 0.1;
        }
        x += 0.1;
    }

    let input = PlannerInput {
        state_start: KinState::at_pose(Pose2D::new(0.05, 0.0, 0.0)),
        state_goal: KinState::at_pose(Pose2D::new(0.5, 0.0, 0.0)),
        world_bbox_min: Pose2D::new(-1.0, -1.0, -PI),
        world_bbox_max: Pose2D::new(1.0, 1.0, PI),
        ptgs: vec![holonomic_ptg()],
        obstacles: Arc::new(ObstaclePoints::from_points(points)),
    };
    let params = PlannerParams::default()
        .with_max_iterations(3)
        .with_goal_bias(0.0)
        .with_draw_in_tps(false)
        .with_seed(1);

    let mut planner = RrtStarPlanner::new(params);
    let err = planner.plan(input).unwrap_err();
    assert!(matches!(
        err,
        PlanError::SamplerExhausted {
            attempts: 1_000_000
        }
    ));
}

#[test]
fn degenerate_bounding_box_is_a_config_error() {
    let mut input = base_input(Vec::new());
    input.world_bbox_min = input.world_bbox_max;
    let mut planner = RrtStarPlanner::new(PlannerParams::default());
    assert!(matches!(
        planner.plan(input),
        Err(PlanError::Config(_))
    ));
}

#[test]
fn config_errors_at_plan_entry() {
    // Empty PTG set.
    let mut input = base_input(Vec::new());
    input.ptgs.clear();
    assert!(matches!(
        RrtStarPlanner::new(PlannerParams::default()).plan(input),
        Err(PlanError::Config(_))
    ));

    // Start outside the box.
    let mut input = base_input(Vec::new());
    input.state_start = KinState::at_pose(Pose2D::new(50.0, 0.0, 0.0));
    assert!(matches!(
        RrtStarPlanner::new(PlannerParams::default()).plan(input),
        Err(PlanError::Config(_))
    ));

    // Goal bias outside [0, 1].
    let input = base_input(Vec::new());
    let params = PlannerParams::default().with_goal_bias(1.5);
    assert!(matches!(
        RrtStarPlanner::new(params).plan(input),
        Err(PlanError::Config(_))
    ));
}

#[test]
fn lone_root_stays_lonely_without_neighbors() {
    // A vanishing search radius: no sample ever finds a neighbor, so no
    // iteration can extend the tree.
    let input = base_input(Vec::new());
    let params = PlannerParams::default()
        .with_max_iterations(50)
        .with_search_radius(1e-6)
        .with_goal_bias(0.0)
        .with_draw_in_tps(false)
        .with_seed(3);
    let mut planner = RrtStarPlanner::new(params);
    let output = planner.plan(input).unwrap();

    assert_eq!(output.motion_tree.len(), 1);
    assert!(output
        .motion_tree
        .edges_from(output.motion_tree.root())
        .is_empty());
    assert!(!output.success);
}

#[test]
fn identical_seeds_reproduce_the_tree_bit_for_bit() {
    let run = |seed: u64| {
        let input = base_input(vec![Point2D::new(3.0, 1.0), Point2D::new(-2.0, -2.0)]);
        let mut planner = RrtStarPlanner::new(euclidean_params(seed));
        planner.plan(input).unwrap()
    };

    let a = run(77);
    let b = run(77);
    let bytes_a = bincode::serialize(&a.motion_tree).unwrap();
    let bytes_b = bincode::serialize(&b.motion_tree).unwrap();
    assert_eq!(bytes_a, bytes_b);

    // A different seed grows a different tree.
    let c = run(78);
    let bytes_c = bincode::serialize(&c.motion_tree).unwrap();
    assert_ne!(bytes_a, bytes_c);
}

#[test]
fn rewiring_keeps_costs_consistent() {
    // Several obstacles force detours, which gives rewiring something to
    // improve; the invariants must survive it.
    let input = base_input(vec![
        Point2D::new(2.0, 0.5),
        Point2D::new(2.0, -0.5),
        Point2D::new(3.5, 1.5),
    ]);
    let mut planner = RrtStarPlanner::new(euclidean_params(31415));
    let output = planner.plan(input).unwrap();

    assert!(output.motion_tree.len() > 5);
    check_invariants(&output);

    // Costs are monotone along every root-to-leaf chain.
    for (id, node) in output.motion_tree.nodes() {
        if let Some(parent) = node.parent {
            assert!(node.cost > output.motion_tree.node(parent).cost);
        }
        let _ = id;
    }
}
