//! Planner parameter set.

use serde::{Deserialize, Serialize};

/// Tuning parameters for [`RrtStarPlanner`](super::RrtStarPlanner).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerParams {
    /// Number of extend/rewire iterations to run.
    #[serde(default = "defaults::max_iterations")]
    pub max_iterations: usize,

    /// Radius of the neighborhood ball, in TP-space (pseudo-)meters.
    #[serde(default = "defaults::initial_search_radius")]
    pub initial_search_radius: f64,

    /// Probability of sampling the goal pose directly, in [0, 1].
    #[serde(default = "defaults::goal_bias")]
    pub goal_bias: f64,

    /// Sample in trajectory-parameter space instead of the workspace.
    #[serde(default = "defaults::enabled")]
    pub draw_in_tps: bool,

    /// Shortest trajectory distance a TP-space sample may request, meters.
    #[serde(default = "defaults::min_step_length")]
    pub min_step_length: f64,

    /// Longest trajectory distance a TP-space sample may request, meters.
    #[serde(default = "defaults::max_step_length")]
    pub max_step_length: f64,

    /// Intermediate poses stored per edge for visualization (0 = none).
    #[serde(default = "defaults::render_segments")]
    pub render_path_interpolated_segments: usize,

    /// Write a tree snapshot every this many iterations (0 = never).
    #[serde(default)]
    pub save_debug_visualization_decimation: usize,

    /// Position tolerance for considering the goal reached, meters.
    #[serde(default = "defaults::goal_tolerance_xy")]
    pub goal_tolerance_xy: f64,

    /// Heading tolerance for considering the goal reached, radians.
    #[serde(default = "defaults::goal_tolerance_phi")]
    pub goal_tolerance_phi: f64,

    /// Seed for the planner's private random generator.
    #[serde(default)]
    pub seed: u64,
}

mod defaults {
    pub fn max_iterations() -> usize {
        10_000
    }
    pub fn initial_search_radius() -> f64 {
        4.0
    }
    pub fn goal_bias() -> f64 {
        0.05
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn min_step_length() -> f64 {
        0.2
    }
    pub fn max_step_length() -> f64 {
        1.0
    }
    pub fn render_segments() -> usize {
        10
    }
    pub fn goal_tolerance_xy() -> f64 {
        0.3
    }
    pub fn goal_tolerance_phi() -> f64 {
        std::f64::consts::PI
    }
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            max_iterations: defaults::max_iterations(),
            initial_search_radius: defaults::initial_search_radius(),
            goal_bias: defaults::goal_bias(),
            draw_in_tps: defaults::enabled(),
            min_step_length: defaults::min_step_length(),
            max_step_length: defaults::max_step_length(),
            render_path_interpolated_segments: defaults::render_segments(),
            save_debug_visualization_decimation: 0,
            goal_tolerance_xy: defaults::goal_tolerance_xy(),
            goal_tolerance_phi: defaults::goal_tolerance_phi(),
            seed: 0,
        }
    }
}

impl PlannerParams {
    /// Builder-style setter for the iteration count.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Builder-style setter for the neighborhood radius.
    pub fn with_search_radius(mut self, radius: f64) -> Self {
        self.initial_search_radius = radius;
        self
    }

    /// Builder-style setter for the goal bias.
    pub fn with_goal_bias(mut self, bias: f64) -> Self {
        self.goal_bias = bias;
        self
    }

    /// Builder-style setter for the sampling mode.
    pub fn with_draw_in_tps(mut self, enabled: bool) -> Self {
        self.draw_in_tps = enabled;
        self
    }

    /// Builder-style setter for the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder-style setter for the goal position tolerance.
    pub fn with_goal_tolerance_xy(mut self, meters: f64) -> Self {
        self.goal_tolerance_xy = meters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PlannerParams::default();
        assert_eq!(p.max_iterations, 10_000);
        assert!(p.draw_in_tps);
        assert_eq!(p.save_debug_visualization_decimation, 0);
        assert!(p.min_step_length < p.max_step_length);
    }

    #[test]
    fn test_builders() {
        let p = PlannerParams::default()
            .with_max_iterations(50)
            .with_goal_bias(0.2)
            .with_seed(7);
        assert_eq!(p.max_iterations, 50);
        assert_eq!(p.goal_bias, 0.2);
        assert_eq!(p.seed, 7);
    }
}
