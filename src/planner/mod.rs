//! TP-space RRT* planner.
//!
//! The planner grows a [`MotionTree`] of kinematic states rooted at the
//! start state. Each iteration draws a free pose, finds tree nodes within a
//! TP-space metric ball of it, extends the tree with the cheapest
//! collision-free primitive among them, and then rewires: any node whose
//! cost improves by routing through the freshly inserted node is reparented
//! onto it, with states and costs of its subtree refreshed.
//!
//! ```text
//!   X <- {x_start};  E <- {}
//!   for i in 1..=N:
//!     q_i    <- SAMPLE(Q_free)
//!     best   <- argmin {x in X | d(x, q_i) < r, CollisionFree(x -> q_i)}
//!                      (cost[x] + d(x, q_i))
//!     X <- X + {q_i};  E <- E + {(best, q_i)}
//!     for x in X with d(q_i, x) < r,
//!              cost[q_i] + d(q_i, x) < cost[x],
//!              CollisionFree(q_i -> x):
//!         parent[x] <- q_i
//! ```
//!
//! The planner runs single-threaded and is deterministic for a fixed seed
//! and identical inputs.

pub mod local_obstacles;
pub mod neighborhood;
pub mod params;
pub mod sampler;

pub use local_obstacles::LocalObstacleCache;
pub use neighborhood::{find_nodes_within_ball, NeighborCandidate};
pub use params::PlannerParams;

use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::{KinState, Point2D, Pose2D};
use crate::error::{PlanError, Result};
use crate::io::scene;
use crate::obstacles::ObstaclePoints;
use crate::ptg::{DynamicState, PtgKind, TrajectoryGenerator};
use crate::tree::{MotionTree, MoveEdge, NodeId};

/// Everything a planning query needs.
#[derive(Clone, Debug)]
pub struct PlannerInput {
    /// Start state; its pose must lie strictly inside the bounding box.
    pub state_start: KinState,
    /// Goal state; its pose must lie strictly inside the bounding box.
    pub state_goal: KinState,
    /// Lower corner of the sampling region, (x, y, phi).
    pub world_bbox_min: Pose2D,
    /// Upper corner of the sampling region, (x, y, phi).
    pub world_bbox_max: Pose2D,
    /// Trajectory families available to the planner, in priority order.
    pub ptgs: Vec<PtgKind>,
    /// Obstacle cloud, borrowed read-only for the whole query.
    pub obstacles: Arc<ObstaclePoints>,
}

/// Result of a planning query.
#[derive(Clone, Debug)]
pub struct PlannerOutput {
    /// Copy of the input, for traceability.
    pub original_input: PlannerInput,
    /// The full motion tree grown from the start state.
    pub motion_tree: MotionTree,
    /// True when some tree node reached the goal tolerances.
    pub success: bool,
    /// Cheapest node within the goal tolerances, if any.
    pub goal_node: Option<NodeId>,
    /// Edge chain from the root to `goal_node` (empty on failure).
    pub path_to_goal: Vec<MoveEdge>,
}

/// Asymptotically optimal sampling-based planner over motion primitives.
#[derive(Debug, Default)]
pub struct RrtStarPlanner {
    params: PlannerParams,
    local_obstacles: LocalObstacleCache,
}

impl RrtStarPlanner {
    /// Planner with the given parameters.
    pub fn new(params: PlannerParams) -> Self {
        Self {
            params,
            local_obstacles: LocalObstacleCache::new(),
        }
    }

    /// Current parameters.
    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    /// Run the query to completion and return the grown tree.
    pub fn plan(&mut self, input: PlannerInput) -> Result<PlannerOutput> {
        validate_input(&input, &self.params)?;
        self.local_obstacles.clear();

        let mut ptgs = input.ptgs.clone();
        let obstacles = Arc::clone(&input.obstacles);
        let max_xy_dist = ptgs
            .iter()
            .map(|p| p.ref_distance())
            .fold(0.0f64, f64::max);

        let mut tree = MotionTree::new();
        let root = tree.next_free_node_id();
        tree.insert_root(root, input.state_start);

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let search_radius = self.params.initial_search_radius;
        let interp_segments = self.params.render_path_interpolated_segments;
        let decimation = self.params.save_debug_visualization_decimation;

        for rrt_iter in 0..self.params.max_iterations {
            let qi =
                sampler::draw_random_free_pose(&mut rng, &self.params, &input, &tree, &mut ptgs)?;

            let close_nodes = find_nodes_within_ball(&tree, &qi, search_radius, &mut ptgs)?;
            if close_nodes.is_empty() {
                continue;
            }
            debug!(
                "iter {}: {} candidate node(s) near ({:.2}, {:.2}, {:.2})",
                rrt_iter,
                close_nodes.len(),
                qi.x,
                qi.y,
                qi.phi
            );

            // Keep the collision-free candidate with the lowest total cost.
            let child_id = tree.next_free_node_id();
            let mut best: Option<(f64, MoveEdge, KinState)> = None;
            for cand in &close_nodes {
                let Some((edge, state)) = build_edge(
                    &tree,
                    cand.node,
                    cand.ptg_index,
                    cand.trajectory_index,
                    cand.distance,
                    &mut ptgs,
                    &mut self.local_obstacles,
                    &obstacles,
                    max_xy_dist,
                    interp_segments,
                    child_id,
                ) else {
                    continue;
                };

                let total = tree.node(cand.node).cost + edge.cost;
                if best.as_ref().map_or(true, |(c, _, _)| total < *c) {
                    best = Some((total, edge, state));
                }
            }

            let Some((_, best_edge, best_state)) = best else {
                debug!("iter {}: no valid edge found", rrt_iter);
                continue;
            };

            let parent = best_edge.parent;
            tree.insert_node_and_edge(parent, child_id, best_state, best_edge);

            rewire(
                &mut tree,
                child_id,
                search_radius,
                &mut ptgs,
                &mut self.local_obstacles,
                &obstacles,
                max_xy_dist,
                interp_segments,
            );

            if decimation > 0 && rrt_iter % decimation == 0 {
                let name = format!("debug_rrtstar_{:05}.3Dscene", rrt_iter);
                scene::save_scene_file(std::path::Path::new(&name), &tree, child_id)?;
            }
        }

        let goal_node = find_goal_node(
            &tree,
            &input.state_goal.pose,
            self.params.goal_tolerance_xy,
            self.params.goal_tolerance_phi,
        );
        let path_to_goal = goal_node
            .map(|g| path_from_root(&tree, g))
            .unwrap_or_default();

        info!(
            "planning finished: {} nodes, goal {}",
            tree.len(),
            match goal_node {
                Some(id) => format!("reached via node {:?}", id),
                None => "not reached".to_string(),
            }
        );

        Ok(PlannerOutput {
            original_input: input,
            motion_tree: tree,
            success: goal_node.is_some(),
            goal_node,
            path_to_goal,
        })
    }
}

fn validate_input(input: &PlannerInput, params: &PlannerParams) -> Result<()> {
    if input.ptgs.is_empty() {
        return Err(PlanError::Config(
            "at least one trajectory generator is required".into(),
        ));
    }
    for (i, ptg) in input.ptgs.iter().enumerate() {
        if ptg.ref_distance() <= 0.0 {
            return Err(PlanError::Config(format!(
                "trajectory generator #{} has a non-positive reference distance",
                i
            )));
        }
    }

    let min = &input.world_bbox_min;
    let max = &input.world_bbox_max;
    if !(min.x < max.x && min.y < max.y && min.phi < max.phi) {
        return Err(PlanError::Config(
            "world bounding box must satisfy min < max componentwise".into(),
        ));
    }
    for (name, pose) in [
        ("start", &input.state_start.pose),
        ("goal", &input.state_goal.pose),
    ] {
        let inside = pose.x > min.x
            && pose.y > min.y
            && pose.phi > min.phi
            && pose.x < max.x
            && pose.y < max.y
            && pose.phi < max.phi;
        if !inside {
            return Err(PlanError::Config(format!(
                "{} pose ({:.3}, {:.3}, {:.3}) lies outside the bounding box",
                name, pose.x, pose.y, pose.phi
            )));
        }
    }

    if !(0.0..=1.0).contains(&params.goal_bias) {
        return Err(PlanError::Config("goal_bias must be within [0, 1]".into()));
    }
    if !(params.min_step_length > 0.0 && params.min_step_length < params.max_step_length) {
        return Err(PlanError::Config(
            "step lengths must satisfy 0 < min_step_length < max_step_length".into(),
        ));
    }
    Ok(())
}

/// Build the edge for one (source node, generator, trajectory, distance)
/// candidate: collision check against the node-local obstacle view, step
/// solve, and reconstruction of the reached state.
#[allow(clippy::too_many_arguments)]
fn build_edge(
    tree: &MotionTree,
    source: NodeId,
    ptg_index: usize,
    trajectory_index: usize,
    trajectory_dist: f64,
    ptgs: &mut [PtgKind],
    cache: &mut LocalObstacleCache,
    obstacles: &ObstaclePoints,
    max_xy_dist: f64,
    interp_segments: usize,
    child: NodeId,
) -> Option<(MoveEdge, KinState)> {
    let src = tree.node(source).state;
    let local_obs = cache.local_view(source, src.pose, obstacles, max_xy_dist);

    let ds = DynamicState::from_state(&src);
    let ptg = &mut ptgs[ptg_index];
    ptg.update_dynamic_state(ds);

    let mut free_dist = ptg.init_tp_obstacle_single(trajectory_index);
    for p in local_obs {
        ptg.update_tp_obstacle_single(p.x, p.y, trajectory_index, &mut free_dist);
    }
    if trajectory_dist >= free_dist {
        // Moving that far along this trajectory would collide.
        return None;
    }

    let step = ptg.path_step_for_dist(trajectory_index, trajectory_dist)?;
    if step == 0 {
        // The motion would not leave the source pose.
        return None;
    }
    let rel_pose = ptg.path_pose(trajectory_index, step);
    let rel_twist = ptg.path_twist(trajectory_index, step);

    let state = KinState {
        pose: src.pose.compose(&rel_pose),
        vel: rel_twist.rotated(src.pose.phi),
    };

    let interpolated_path = (interp_segments > 0).then(|| {
        let mut path = Vec::with_capacity(interp_segments + 2);
        path.push(Pose2D::identity());
        for i in 0..interp_segments {
            let istep = ((i as u32 + 1) * step) / (interp_segments as u32 + 2);
            path.push(ptg.path_pose(trajectory_index, istep));
        }
        path.push(rel_pose);
        path
    });

    let edge = MoveEdge {
        parent: source,
        child,
        ptg_index,
        trajectory_index,
        ptg_dist: trajectory_dist,
        ptg_step: step,
        speed_scale: ds.target_rel_speed,
        cost: trajectory_dist,
        interpolated_path,
    };
    Some((edge, state))
}

/// Refreshed state for one node of a rewired subtree.
struct SubtreeUpdate {
    node: NodeId,
    state: KinState,
    cost: f64,
    step: u32,
}

/// RRT* rewiring: reparent any node whose cost strictly improves by routing
/// through the newly inserted node, then refresh its subtree.
#[allow(clippy::too_many_arguments)]
fn rewire(
    tree: &mut MotionTree,
    new_id: NodeId,
    search_radius: f64,
    ptgs: &mut [PtgKind],
    cache: &mut LocalObstacleCache,
    obstacles: &ObstaclePoints,
    max_xy_dist: f64,
    interp_segments: usize,
) {
    let new_state = tree.node(new_id).state;
    let new_cost = tree.node(new_id).cost;

    for ptg in ptgs.iter_mut() {
        ptg.update_dynamic_state(DynamicState::from_state(&new_state));
    }

    for idx in 0..tree.len() {
        let x_id = NodeId::from_index(idx);
        if x_id == new_id || x_id == tree.root() {
            continue;
        }
        let x_pose = tree.node(x_id).state.pose;

        // Cheapest primitive new -> x over the generator set.
        let mut best: Option<(f64, usize, usize)> = None;
        for (ptg_index, ptg) in ptgs.iter().enumerate() {
            if ptg.cannot_be_nearer_than(&new_state, &x_pose, search_radius) {
                continue;
            }
            let Some((dist, traj)) = ptg.distance_to(&new_state, &x_pose) else {
                continue;
            };
            if dist <= 0.0 || dist > search_radius {
                continue;
            }
            if best.map_or(true, |(d, _, _)| dist < d) {
                best = Some((dist, ptg_index, traj));
            }
        }
        let Some((dist, ptg_index, trajectory_index)) = best else {
            continue;
        };

        if new_cost + dist + 1e-12 >= tree.node(x_id).cost {
            continue;
        }

        let Some((edge, state)) = build_edge(
            tree,
            new_id,
            ptg_index,
            trajectory_index,
            dist,
            ptgs,
            cache,
            obstacles,
            max_xy_dist,
            interp_segments,
            x_id,
        ) else {
            continue;
        };

        // The node's state shifts to the reconstructed primitive endpoint;
        // accept the rewire only if the whole subtree stays consistent and
        // collision-free under the shifted states.
        let Some(updates) = plan_subtree_refresh(
            tree,
            x_id,
            state,
            new_cost + edge.cost,
            ptgs,
            obstacles,
            max_xy_dist,
        ) else {
            continue;
        };

        debug!(
            "rewire: node {:?} reparented under {:?} (cost {:.3} -> {:.3})",
            x_id,
            new_id,
            tree.node(x_id).cost,
            new_cost + edge.cost
        );
        tree.reparent(x_id, state, edge);
        for u in updates {
            if let Some(e) = tree.incoming_edge_mut(u.node) {
                e.ptg_step = u.step;
            }
            tree.update_node(u.node, u.state, u.cost);
        }

        // Dynamic states were clobbered during validation.
        for ptg in ptgs.iter_mut() {
            ptg.update_dynamic_state(DynamicState::from_state(&new_state));
        }
    }
}

/// Recompute states, costs, and steps for every descendant of a node whose
/// state is about to change. Returns `None` when any descendant edge stops
/// being solvable or collision-free, in which case the caller must abandon
/// the rewire.
fn plan_subtree_refresh(
    tree: &MotionTree,
    root_id: NodeId,
    root_state: KinState,
    root_cost: f64,
    ptgs: &mut [PtgKind],
    obstacles: &ObstaclePoints,
    max_xy_dist: f64,
) -> Option<Vec<SubtreeUpdate>> {
    let mut updates = Vec::new();
    let mut stack = vec![(root_id, root_state, root_cost)];

    while let Some((id, state, cost)) = stack.pop() {
        let child_edges: Vec<_> = tree
            .edges_from(id)
            .iter()
            .map(|e| (e.child, e.ptg_index, e.trajectory_index, e.ptg_dist, e.cost))
            .collect();

        if child_edges.is_empty() {
            continue;
        }

        let local_obs = clipped_local_view(state.pose, obstacles, max_xy_dist);
        for (child, ptg_index, trajectory_index, ptg_dist, edge_cost) in child_edges {
            let ptg = &mut ptgs[ptg_index];
            ptg.update_dynamic_state(DynamicState::from_state(&state));

            let mut free_dist = ptg.init_tp_obstacle_single(trajectory_index);
            for p in &local_obs {
                ptg.update_tp_obstacle_single(p.x, p.y, trajectory_index, &mut free_dist);
            }
            if ptg_dist >= free_dist {
                return None;
            }

            let step = ptg.path_step_for_dist(trajectory_index, ptg_dist)?;
            if step == 0 {
                return None;
            }
            let rel_pose = ptg.path_pose(trajectory_index, step);
            let rel_twist = ptg.path_twist(trajectory_index, step);

            let child_state = KinState {
                pose: state.pose.compose(&rel_pose),
                vel: rel_twist.rotated(state.pose.phi),
            };
            let child_cost = cost + edge_cost;

            updates.push(SubtreeUpdate {
                node: child,
                state: child_state,
                cost: child_cost,
                step,
            });
            stack.push((child, child_state, child_cost));
        }
    }
    Some(updates)
}

/// Obstacles within the clipping square of a pose, in that pose's frame.
fn clipped_local_view(pose: Pose2D, obstacles: &ObstaclePoints, half_side: f64) -> Vec<Point2D> {
    obstacles
        .points()
        .iter()
        .filter(|p| (p.x - pose.x).abs() <= half_side && (p.y - pose.y).abs() <= half_side)
        .map(|p| pose.inverse_transform_point(*p))
        .collect()
}

/// Cheapest node within the goal tolerances, if any.
fn find_goal_node(
    tree: &MotionTree,
    goal: &Pose2D,
    tolerance_xy: f64,
    tolerance_phi: f64,
) -> Option<NodeId> {
    let mut best: Option<NodeId> = None;
    for (id, node) in tree.nodes() {
        if node.state.pose.position_distance(goal) > tolerance_xy {
            continue;
        }
        if node.state.pose.heading_error(goal).abs() > tolerance_phi {
            continue;
        }
        if best.map_or(true, |b| node.cost < tree.node(b).cost) {
            best = Some(id);
        }
    }
    best
}

/// Edge chain from the root down to a node.
fn path_from_root(tree: &MotionTree, id: NodeId) -> Vec<MoveEdge> {
    let mut path = Vec::new();
    let mut cursor = id;
    while let Some(edge) = tree.incoming_edge(cursor) {
        path.push(edge.clone());
        cursor = edge.parent;
    }
    path.reverse();
    path
}
