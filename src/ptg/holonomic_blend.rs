//! Holonomic velocity-ramp trajectory family.
//!
//! Each trajectory blends the current velocity vector into a target velocity
//! `(vxf, vyf) = |V|(alpha) * (cos alpha, sin alpha)` over a ramp time
//! `T_ramp`, then cruises at the target velocity. Heading simultaneously
//! ramps from the current angular rate to `|omega|(alpha)` until it aligns
//! with alpha. All queries are closed-form; only the workspace inversion and
//! the below-ramp step solve iterate.
//!
//! The magnitude laws `|V|`, `|omega|` and the ramp time are user-tunable
//! expressions of the trajectory direction and the dynamic state (see
//! [`crate::ptg::expr`]).

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::core::math::{
    sign_with_zero, solve_cubic_monic, solve_linear_system_4, solve_quadratic,
    solve_quartic_monic,
};
use crate::core::{Pose2D, RobotShape, Twist2D};
use crate::error::{PlanError, Result};

use super::expr::{Binding, Expression};
use super::{DynamicState, TpPoint, TrajectoryGenerator};

/// Duration of one path step, seconds.
pub const PATH_TIME_STEP: f64 = 10e-3;

/// Epsilon for detecting degenerate (division-by-zero) regimes.
const EPS: f64 = 1e-4;

/// Speed-law values below this fraction of `V_MAX` switch the workspace
/// inversion to its stop-at-target form (10% plus margin).
const REL_SPEED_REACH_AND_STOP: f64 = 0.10 * 1.05;

/// Variables visible to the `expr_v` / `expr_w` / `expr_t_ramp` laws.
const EXPR_VARS: &[&str] = &[
    "dir",
    "target_dir",
    "target_dist",
    "V_MAX",
    "W_MAX",
    "T_ramp_max",
    "target_x",
    "target_y",
    "target_phi",
    "vxi",
    "vyi",
    "wi",
    "target_rel_speed",
    "trimmable_speed",
];

const ARCHIVE_VERSION: u8 = 0;

/// Configuration for [`HolonomicBlend`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HolonomicBlendConfig {
    /// Maximum duration of the velocity blend, seconds.
    pub t_ramp_max: f64,

    /// Maximum linear speed, m/s.
    pub v_max_mps: f64,

    /// Maximum angular speed, deg/s (stored internally in rad/s).
    pub w_max_dps: f64,

    /// Approximate robot dimension used by distance metrics, meters.
    pub turning_radius_reference: f64,

    /// Circular footprint radius, meters.
    pub robot_radius: f64,

    /// Number of discrete trajectory directions.
    pub alpha_count: usize,

    /// Maximum look-ahead distance of any trajectory, meters.
    pub ref_distance: f64,

    /// Expression for `|V|` as a function of `dir` and the dynamic state.
    pub expr_v: String,

    /// Expression for `|omega|` (magnitude only; the sign follows `dir`).
    pub expr_w: String,

    /// Expression for the ramp duration.
    pub expr_t_ramp: String,
}

impl Default for HolonomicBlendConfig {
    fn default() -> Self {
        Self {
            t_ramp_max: 0.9,
            v_max_mps: 1.0,
            w_max_dps: 40.0,
            turning_radius_reference: 0.3,
            robot_radius: 0.25,
            alpha_count: 31,
            ref_distance: 10.0,
            expr_v: "V_MAX".to_string(),
            expr_w: "W_MAX".to_string(),
            expr_t_ramp: "T_ramp_max".to_string(),
        }
    }
}

impl HolonomicBlendConfig {
    /// Builder-style setter for the maximum linear speed.
    pub fn with_v_max(mut self, v_max_mps: f64) -> Self {
        self.v_max_mps = v_max_mps;
        self
    }

    /// Builder-style setter for the maximum angular speed (deg/s).
    pub fn with_w_max_dps(mut self, w_max_dps: f64) -> Self {
        self.w_max_dps = w_max_dps;
        self
    }

    /// Builder-style setter for the footprint radius.
    pub fn with_robot_radius(mut self, radius: f64) -> Self {
        self.robot_radius = radius;
        self
    }

    /// Builder-style setter for the reference distance.
    pub fn with_ref_distance(mut self, ref_distance: f64) -> Self {
        self.ref_distance = ref_distance;
        self
    }

    /// Builder-style setter for the `|V|` law.
    pub fn with_expr_v(mut self, expr: impl Into<String>) -> Self {
        self.expr_v = expr.into();
        self
    }
}

/// Per-direction trajectory parameters derived from the tuning laws and the
/// current dynamic state.
#[derive(Clone, Copy, Debug)]
struct DirParams {
    t_ramp: f64,
    vf: f64,
    wf: f64,
    vxi: f64,
    vyi: f64,
    vxf: f64,
    vyf: f64,
}

/// Holonomic velocity-ramp trajectory generator.
#[derive(Clone, Debug)]
pub struct HolonomicBlend {
    config: HolonomicBlendConfig,
    /// Maximum angular speed in rad/s (converted from `w_max_dps`).
    w_max: f64,
    shape: RobotShape,
    expr_v: Expression,
    expr_w: Expression,
    expr_t_ramp: Expression,
    trimmable_speed: f64,
    dyn_state: DynamicState,
    /// Per-trajectory step counts for the current dynamic state.
    step_count_cache: RefCell<Vec<Option<u32>>>,
}

impl HolonomicBlend {
    /// Build and validate a generator from its configuration.
    pub fn new(config: HolonomicBlendConfig) -> Result<Self> {
        if config.t_ramp_max <= 0.0 {
            return Err(PlanError::Config("T_ramp_max must be positive".into()));
        }
        if config.v_max_mps <= 0.0 {
            return Err(PlanError::Config("v_max_mps must be positive".into()));
        }
        if config.w_max_dps <= 0.0 {
            return Err(PlanError::Config("w_max_dps must be positive".into()));
        }
        if config.robot_radius <= 0.0 {
            return Err(PlanError::Config("robot_radius must be positive".into()));
        }
        if config.ref_distance <= 0.0 {
            return Err(PlanError::Config("ref_distance must be positive".into()));
        }
        if config.alpha_count == 0 {
            return Err(PlanError::Config("alpha_count must be positive".into()));
        }

        let expr_v = Expression::parse(&config.expr_v, EXPR_VARS)?;
        let expr_w = Expression::parse(&config.expr_w, EXPR_VARS)?;
        let expr_t_ramp = Expression::parse(&config.expr_t_ramp, EXPR_VARS)?;

        let cache = RefCell::new(vec![None; config.alpha_count]);
        Ok(Self {
            w_max: config.w_max_dps.to_radians(),
            shape: RobotShape::circle(config.robot_radius),
            expr_v,
            expr_w,
            expr_t_ramp,
            trimmable_speed: 1.0,
            dyn_state: DynamicState::default(),
            step_count_cache: cache,
            config,
        })
    }

    /// Generator configuration.
    pub fn config(&self) -> &HolonomicBlendConfig {
        &self.config
    }

    /// Speed trim factor exposed to the tuning laws as `trimmable_speed`.
    pub fn set_trimmable_speed(&mut self, factor: f64) {
        self.trimmable_speed = factor;
        self.step_count_cache.borrow_mut().fill(None);
    }

    /// Serialize configuration behind a version byte.
    pub fn to_archive_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![ARCHIVE_VERSION];
        out.extend_from_slice(&bincode::serialize(&self.config)?);
        Ok(out)
    }

    /// Rebuild a generator from [`to_archive_bytes`](Self::to_archive_bytes)
    /// output. Fails on an unknown version byte.
    pub fn from_archive_bytes(bytes: &[u8]) -> Result<Self> {
        let (version, payload) = bytes
            .split_first()
            .ok_or_else(|| PlanError::Serialization("empty archive".into()))?;
        if *version != ARCHIVE_VERSION {
            return Err(PlanError::SerializationVersion {
                found: *version,
                expected: ARCHIVE_VERSION,
            });
        }
        let config: HolonomicBlendConfig = bincode::deserialize(payload)?;
        Self::new(config)
    }

    fn expr_env(&self, dir: f64) -> [Binding<'static>; 14] {
        let nds = &self.dyn_state;
        let target_dist = nds.rel_target.position().norm();
        let target_dir = if target_dist > 0.0 {
            nds.rel_target.y.atan2(nds.rel_target.x)
        } else {
            0.0
        };
        [
            ("dir", dir),
            ("target_dir", target_dir),
            ("target_dist", target_dist),
            ("V_MAX", self.config.v_max_mps),
            ("W_MAX", self.w_max),
            ("T_ramp_max", self.config.t_ramp_max),
            ("target_x", nds.rel_target.x),
            ("target_y", nds.rel_target.y),
            ("target_phi", nds.rel_target.phi),
            ("vxi", nds.cur_vel_local.vx),
            ("vyi", nds.cur_vel_local.vy),
            ("wi", nds.cur_vel_local.omega),
            ("target_rel_speed", nds.target_rel_speed),
            ("trimmable_speed", self.trimmable_speed),
        ]
    }

    /// `|V|` law evaluated at a continuous direction.
    fn speed_law(&self, dir: f64) -> f64 {
        self.expr_v.eval(&self.expr_env(dir)).abs()
    }

    fn dir_params(&self, dir: f64) -> DirParams {
        let env = self.expr_env(dir);
        let vf = self.expr_v.eval(&env).abs();
        let wf = sign_with_zero(dir) * self.expr_w.eval(&env).abs();
        let t_ramp_raw = self.expr_t_ramp.eval(&env).abs();
        let t_ramp = if t_ramp_raw > EPS {
            t_ramp_raw
        } else {
            self.config.t_ramp_max
        };
        let (sin_d, cos_d) = dir.sin_cos();
        DirParams {
            t_ramp,
            vf,
            wf,
            vxi: self.dyn_state.cur_vel_local.vx,
            vyi: self.dyn_state.cur_vel_local.vy,
            vxf: vf * cos_d,
            vyf: vf * sin_d,
        }
    }

    /// Distance traversed up to `step` for explicit ramp parameters.
    fn path_dist_for(&self, step: u32, t_ramp: f64, vxf: f64, vyf: f64) -> f64 {
        let t = PATH_TIME_STEP * step as f64;
        let tr2 = 1.0 / (2.0 * t_ramp);
        let vxi = self.dyn_state.cur_vel_local.vx;
        let vyi = self.dyn_state.cur_vel_local.vy;
        let k2 = (vxf - vxi) * tr2;
        let k4 = (vyf - vyi) * tr2;

        if t < t_ramp {
            trans_distance_below_ramp(k2, k4, vxi, vyi, t)
        } else {
            (t - t_ramp) * self.config.v_max_mps
                + trans_distance_below_ramp(k2, k4, vxi, vyi, t_ramp)
        }
    }
}

// Numeric integration of sqrt(a*t^2 + b*t + c) over [0, t_total] by a
// 20-step trapezoidal rule. Faster and better conditioned than the analytic
// antiderivative, which degenerates in several sub-cases.
fn trans_distance_integral(t_total: f64, a: f64, b: f64, c: f64) -> f64 {
    const NUM_STEPS: u32 = 20;
    debug_assert!(a >= 0.0 && c >= 0.0);

    let dt = t_total / NUM_STEPS as f64;
    let mut f_prev = c.max(0.0).sqrt();
    let mut dist = 0.0;
    let mut t = 0.0;
    for _ in 0..NUM_STEPS {
        t += dt;
        let f = (a * t * t + b * t + c).max(0.0).sqrt();
        dist += dt * (f_prev + f) * 0.5;
        f_prev = f;
    }
    dist
}

/// Line-integral distance along the blend below the ramp time, with the two
/// degenerate regimes solved in closed form.
fn trans_distance_below_ramp(k2: f64, k4: f64, vxi: f64, vyi: f64, t: f64) -> f64 {
    let c = vxi * vxi + vyi * vyi;
    if k2.abs() > EPS || k4.abs() > EPS {
        let a = 4.0 * (k2 * k2 + k4 * k4);
        let b = 4.0 * (k2 * vxi + k4 * vyi);
        if b.abs() < EPS && c.abs() < EPS {
            // Zero initial velocity: integrand reduces to sqrt(a)*t.
            a.sqrt() * t * t * 0.5
        } else {
            trans_distance_integral(t, a, b, c)
        }
    } else {
        // Constant velocity.
        c.sqrt() * t
    }
}

impl TrajectoryGenerator for HolonomicBlend {
    fn alpha_count(&self) -> usize {
        self.config.alpha_count
    }

    fn ref_distance(&self) -> f64 {
        self.config.ref_distance
    }

    fn update_dynamic_state(&mut self, state: DynamicState) {
        self.dyn_state = state;
        self.step_count_cache.borrow_mut().fill(None);
    }

    fn dynamic_state(&self) -> &DynamicState {
        &self.dyn_state
    }

    fn robot_shape(&self) -> &RobotShape {
        &self.shape
    }

    fn path_pose(&self, k: usize, step: u32) -> Pose2D {
        let t = PATH_TIME_STEP * step as f64;
        let dir = self.index_to_alpha(k);
        let p = self.dir_params(dir);
        let tr2 = 1.0 / (2.0 * p.t_ramp);
        let wi = self.dyn_state.cur_vel_local.omega;

        let (x, y) = if t < p.t_ramp {
            (
                p.vxi * t + t * t * tr2 * (p.vxf - p.vxi),
                p.vyi * t + t * t * tr2 * (p.vyf - p.vyi),
            )
        } else {
            (
                p.t_ramp * 0.5 * (p.vxi + p.vxf) + (t - p.t_ramp) * p.vxf,
                p.t_ramp * 0.5 * (p.vyi + p.vyf) + (t - p.t_ramp) * p.vyf,
            )
        };

        let phi = if t < p.t_ramp {
            // Heading ramps until it aligns with `dir`; find the align time.
            match solve_quadratic(tr2 * (p.wf - wi), wi, -dir) {
                None => 0.0,
                Some((r1, r2)) => {
                    if t > r1.max(r2) {
                        dir
                    } else {
                        wi * t + t * t * tr2 * (p.wf - wi)
                    }
                }
            }
        } else {
            let t_align = (dir - p.t_ramp * 0.5 * (wi + p.wf)) / p.wf + p.t_ramp;
            if t > t_align {
                dir
            } else {
                p.t_ramp * 0.5 * (wi + p.wf) + (t - p.t_ramp) * p.wf
            }
        };

        Pose2D::new(x, y, phi)
    }

    fn path_twist(&self, k: usize, step: u32) -> Twist2D {
        let t = PATH_TIME_STEP * step as f64;
        let dir = self.index_to_alpha(k);
        let p = self.dir_params(dir);
        let tr2 = 1.0 / (2.0 * p.t_ramp);
        let wi = self.dyn_state.cur_vel_local.omega;

        let ramp_frac = (t / p.t_ramp).min(1.0);
        let vx = p.vxi + ramp_frac * (p.vxf - p.vxi);
        let vy = p.vyi + ramp_frac * (p.vyf - p.vyi);

        let omega = if t < p.t_ramp {
            match solve_quadratic(tr2 * (p.wf - wi), wi, -dir) {
                None => 0.0,
                Some((r1, r2)) => {
                    if t > r1.max(r2) {
                        0.0
                    } else {
                        wi + ramp_frac * (p.wf - wi)
                    }
                }
            }
        } else {
            let t_align = (dir - p.t_ramp * 0.5 * (wi + p.wf)) / p.wf + p.t_ramp;
            if t > t_align {
                0.0
            } else {
                p.wf
            }
        };

        Twist2D::new(vx, vy, omega)
    }

    fn path_dist(&self, k: usize, step: u32) -> f64 {
        let p = self.dir_params(self.index_to_alpha(k));
        self.path_dist_for(step, p.t_ramp, p.vxf, p.vyf)
    }

    fn path_step_for_dist(&self, k: usize, dist: f64) -> Option<u32> {
        let dir = self.index_to_alpha(k);
        let p = self.dir_params(dir);
        let tr2 = 1.0 / (2.0 * p.t_ramp);
        let k2 = (p.vxf - p.vxi) * tr2;
        let k4 = (p.vyf - p.vyi) * tr2;
        let v_max = self.config.v_max_mps;

        let dist_at_ramp = trans_distance_below_ramp(k2, k4, p.vxi, p.vyi, p.t_ramp);

        let t_solved = if dist >= dist_at_ramp {
            // Cruise regime is linear in t.
            p.t_ramp + (dist - dist_at_ramp) / v_max
        } else if k2.abs() < EPS && k4.abs() < EPS {
            // Constant velocity below the ramp.
            dist / v_max
        } else {
            let a = 4.0 * (k2 * k2 + k4 * k4);
            let b = 4.0 * (k2 * p.vxi + k4 * p.vyi);
            let c = p.vxi * p.vxi + p.vyi * p.vyi;

            if b.abs() < EPS && c.abs() < EPS {
                // Zero initial velocity: dist = sqrt(a)*t^2/2.
                std::f64::consts::SQRT_2 * dist.sqrt() / a.powf(0.25)
            } else {
                // General regime: Newton on f(t) = s(t) - dist with
                // f'(t) = sqrt(a*t^2 + b*t + c).
                let mut t = p.t_ramp * 0.6;
                let mut converged = false;
                for _ in 0..10 {
                    let err = trans_distance_integral(t, a, b, c) - dist;
                    let diff = (a * t * t + b * t + c).max(0.0).sqrt();
                    if diff.abs() < 1e-40 {
                        return None;
                    }
                    t -= err / diff;
                    if t < 0.0 {
                        t = 0.0;
                    }
                    if err.abs() < 1e-3 {
                        converged = true;
                        break;
                    }
                }
                if !converged {
                    // Accept the last iterate only if it still makes sense.
                    let err = trans_distance_integral(t, a, b, c) - dist;
                    if err.abs() > 1e-2 {
                        return None;
                    }
                }
                t
            }
        };

        if t_solved >= 0.0 && t_solved.is_finite() {
            Some((t_solved / PATH_TIME_STEP).round() as u32)
        } else {
            None
        }
    }

    fn path_step_count(&self, k: usize) -> u32 {
        if let Some(Some(cached)) = self.step_count_cache.borrow().get(k) {
            return *cached;
        }
        let fallback =
            (self.config.ref_distance / (self.config.v_max_mps * PATH_TIME_STEP)).ceil() as u32;
        let steps = self
            .path_step_for_dist(k, self.config.ref_distance)
            .unwrap_or(fallback)
            .max(1);
        self.step_count_cache.borrow_mut()[k] = Some(steps);
        steps
    }

    fn inverse_map_ws2tp(&self, x: f64, y: f64) -> Option<TpPoint> {
        if x == 0.0 && y == 0.0 {
            return None;
        }

        let err_threshold = 1e-3;
        let t_ramp_max = self.config.t_ramp_max;
        let v_max = self.config.v_max_mps;
        let vxi = self.dyn_state.cur_vel_local.vx;
        let vyi = self.dyn_state.cur_vel_local.vy;
        let stop_speed_sq = (REL_SPEED_REACH_AND_STOP * v_max).powi(2);

        // Newton iteration on q = [t, vxf, vyf, T_ramp], switching residual
        // forms across the t = T_ramp boundary.
        let norm = (x * x + y * y).sqrt();
        let mut q = [t_ramp_max * 1.1, v_max * x / norm, v_max * y / norm, t_ramp_max];
        let mut sol_found = false;

        for _ in 0..25 {
            if sol_found {
                break;
            }
            let t = q[0];
            let (vxf, vyf) = (q[1], q[2]);
            let alpha = vyf.atan2(vxf);

            let v_alpha_sq = self.speed_law(alpha).powi(2);
            let stop_at_target = v_alpha_sq < stop_speed_sq;

            let t_ramp = q[3];
            let tr = 1.0 / t_ramp;
            let tr2 = 1.0 / (2.0 * t_ramp);

            let mut r = [0.0f64; 4];
            let mut jac = [[0.0f64; 4]; 4];

            if t >= t_ramp {
                r[0] = 0.5 * t_ramp * (vxi + vxf) + (t - t_ramp) * vxf - x;
                r[1] = 0.5 * t_ramp * (vyi + vyf) + (t - t_ramp) * vyf - y;

                jac[0][0] = vxf;
                jac[0][1] = t - 0.5 * t_ramp;
                jac[1][0] = vyf;
                jac[1][2] = t - 0.5 * t_ramp;
                if stop_at_target {
                    jac[0][3] = 0.5 * (vxi - vxf);
                    jac[1][3] = 0.5 * (vyi - vyf);
                } else {
                    // T_ramp is not an unknown; pin it to the prescribed value.
                    q[3] = t_ramp_max;
                    jac[3][3] = 1.0;
                }
            } else {
                r[0] = vxi * t + t * t * tr2 * (vxf - vxi) - x;
                r[1] = vyi * t + t * t * tr2 * (vyf - vyi) - y;

                jac[0][0] = vxi + t * tr * (vxf - vxi);
                jac[0][1] = tr2 * t * t;
                jac[1][0] = vyi + t * tr * (vyf - vyi);
                jac[1][2] = tr2 * t * t;
                if stop_at_target {
                    jac[0][3] = -t * t * tr2 * tr * (vxf - vxi);
                    jac[1][3] = -t * t * tr2 * tr * (vyf - vyi);
                } else {
                    q[3] = t_ramp_max;
                    jac[3][3] = 1.0;
                }
            }

            r[2] = vxf * vxf + vyf * vyf - v_alpha_sq;
            jac[2][1] = 2.0 * vxf;
            jac[2][2] = 2.0 * vyf;

            if stop_at_target {
                // Impose t = T_ramp.
                r[3] = t_ramp - t;
                jac[3][0] = -1.0;
                jac[3][3] = 1.0;
            }

            let delta = solve_linear_system_4(&jac, &r)?;
            for i in 0..4 {
                q[i] -= delta[i];
            }

            let err = (r[0] * r[0] + r[1] * r[1] + r[2] * r[2] + r[3] * r[3]).sqrt();
            sol_found = err < err_threshold;
        }

        if !sol_found || q[0] < 0.0 || !q[0].is_finite() {
            return None;
        }

        let alpha = q[2].atan2(q[1]);
        let k = self.alpha_to_index(alpha);
        let step = (q[0] / PATH_TIME_STEP).round() as u32;
        let found_dist = self.path_dist_for(step, q[3], q[1], q[2]);

        Some(TpPoint {
            trajectory: k,
            normalized_dist: found_dist / self.config.ref_distance,
            exact: true,
        })
    }

    fn update_tp_obstacle_single(&self, ox: f64, oy: f64, k: usize, dist: &mut f64) {
        let radius = self.shape.radius;
        let dir = self.index_to_alpha(k);
        let p = self.dir_params(dir);
        let tr2 = 1.0 / (2.0 * p.t_ramp);
        let half_ramp = p.t_ramp * 0.5;
        let ramp_thres_low = p.t_ramp * 0.99;
        let ramp_thres_high = p.t_ramp * 1.01;

        // The below-ramp and cruise regimes can both contain valid collision
        // times; the below-ramp roots are checked first because the shortest
        // collision wins.
        let k2 = (p.vxf - p.vxi) * tr2;
        let k4 = (p.vyf - p.vyi) * tr2;

        // |obstacle - robot(t)|^2 = radius^2 expands to a quartic in t.
        let a = k2 * k2 + k4 * k4;
        let b = 2.0 * (k2 * p.vxi + k4 * p.vyi);
        let c = p.vxi * p.vxi + p.vyi * p.vyi - 2.0 * (k2 * ox + k4 * oy);
        let d = -2.0 * (ox * p.vxi + oy * p.vyi);
        let e = ox * ox + oy * oy - radius * radius;

        let roots = if a.abs() > EPS {
            solve_quartic_monic(b / a, c / a, d / a, e / a)
        } else if b.abs() > EPS {
            // Straight path without blend: cubic.
            solve_cubic_monic(c / b, d / b, e / b)
        } else {
            // a = b = 0: plain quadratic c*t^2 + d*t + e = 0.
            let discr = d * d - 4.0 * c * e;
            if discr >= 0.0 && c.abs() > 1e-300 {
                let sq = discr.sqrt();
                vec![(-d + sq) / (2.0 * c), (-d - sq) / (2.0 * c)]
            } else {
                Vec::new()
            }
        };

        let mut sol_t = -1.0f64;
        for root in roots {
            if root.is_finite() && root >= 0.0 && root <= ramp_thres_high {
                sol_t = if sol_t < 0.0 { root } else { sol_t.min(root) };
            }
        }

        if sol_t < 0.0 || sol_t > ramp_thres_high {
            // Cruise regime, t > T_ramp: constant velocity, quadratic.
            sol_t = -1.0;

            let c1 = half_ramp * (p.vxi - p.vxf) - ox;
            let c2 = half_ramp * (p.vyi - p.vyf) - oy;

            let xa = p.vf * p.vf;
            let xb = 2.0 * (c1 * p.vxf + c2 * p.vyf);
            let xc = c1 * c1 + c2 * c2 - radius * radius;

            let discr = xb * xb - 4.0 * xa * xc;
            if discr >= 0.0 && xa > 1e-300 {
                let sq = discr.sqrt();
                let t0 = (-xb + sq) / (2.0 * xa);
                let t1 = (-xb - sq) / (2.0 * xa);

                if t0 < p.t_ramp && t1 >= ramp_thres_low {
                    sol_t = t1;
                } else if t1 < p.t_ramp && t0 >= ramp_thres_low {
                    sol_t = t0;
                } else if t0 >= ramp_thres_low && t1 >= ramp_thres_low {
                    sol_t = t0.min(t1);
                }
            }
        }

        if sol_t < 0.0 {
            return;
        }

        let collision_dist = if sol_t < p.t_ramp {
            trans_distance_below_ramp(k2, k4, p.vxi, p.vyi, sol_t)
        } else {
            (sol_t - p.t_ramp) * self.config.v_max_mps
                + trans_distance_below_ramp(k2, k4, p.vxi, p.vyi, p.t_ramp)
        };

        self.clip_tp_obstacle(ox, oy, collision_dist, dist);
    }

    fn description(&self) -> String {
        format!(
            "HolonomicBlend:Tramp={:.3}s,Vmax={:.3}m/s,Wmax={:.3}rad/s",
            self.config.t_ramp_max, self.config.v_max_mps, self.w_max
        )
    }
}
