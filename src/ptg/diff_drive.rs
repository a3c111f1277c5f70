//! Constant-curvature trajectory family for differential-drive platforms.
//!
//! Trajectory `k` with direction alpha drives at `v = V_MAX * sign(K)` and
//! `omega = (alpha / pi) * W_MAX * sign(K)`, so every trajectory is a
//! circular arc of constant radius `R = v / omega` (a straight line for
//! alpha = 0). `K = +1` generates forward arcs, `K = -1` backward arcs.
//!
//! Distances along a trajectory use the inflated arc metric
//! `theta * (|R| + Rref)`: arc angle times the turning radius plus a
//! reference robot dimension. This makes turning in place near the minimum
//! radius cost more than its wheel travel alone and is the exact inverse of
//! the analytic workspace-to-TP map below. Straight trajectories reduce to
//! plain arc length.

use serde::{Deserialize, Serialize};

use crate::core::math::{normalize_angle, sign_with_zero, wrap_to_2pi};
use crate::core::{Pose2D, RobotShape, Twist2D};
use crate::error::{PlanError, Result};

use super::{alpha2index, DynamicState, TpPoint, TrajectoryGenerator};

/// Distance covered by one path step, in (pseudo-)meters.
pub const PATH_DIST_STEP: f64 = 0.05;

/// Curvatures below this are treated as straight lines.
const KAPPA_EPS: f64 = 1e-9;

const ARCHIVE_VERSION: u8 = 0;

/// Configuration for [`DiffDriveCircular`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffDriveConfig {
    /// Maximum linear speed, m/s.
    pub v_max_mps: f64,

    /// Maximum angular speed, deg/s (stored internally in rad/s).
    pub w_max_dps: f64,

    /// +1 for forward arcs, -1 for backward arcs.
    pub k_sign: i8,

    /// Approximate robot dimension inflating the arc metric, meters.
    pub turning_radius_reference: f64,

    /// Circular footprint radius, meters.
    pub robot_radius: f64,

    /// Number of discrete trajectory directions.
    pub alpha_count: usize,

    /// Maximum look-ahead distance of any trajectory, pseudo-meters.
    pub ref_distance: f64,
}

impl Default for DiffDriveConfig {
    fn default() -> Self {
        Self {
            v_max_mps: 1.0,
            w_max_dps: 60.0,
            k_sign: 1,
            turning_radius_reference: 0.3,
            robot_radius: 0.25,
            alpha_count: 31,
            ref_distance: 10.0,
        }
    }
}

impl DiffDriveConfig {
    /// Builder-style setter for the arc direction sign.
    pub fn with_k_sign(mut self, k_sign: i8) -> Self {
        self.k_sign = k_sign;
        self
    }

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

    /// Builder-style setter for the reference distance.
    pub fn with_ref_distance(mut self, ref_distance: f64) -> Self {
        self.ref_distance = ref_distance;
        self
    }
}

/// Per-trajectory arc parameters.
#[derive(Clone, Copy, Debug)]
struct ArcParams {
    /// Signed linear speed, m/s.
    v: f64,
    /// Signed angular speed, rad/s.
    w: f64,
    /// Curvature w/v, 1/m (independent of the direction sign).
    kappa: f64,
    /// Pseudo-distance per meter of arc: `1 + Rref * |kappa|`.
    scale: f64,
}

/// Constant-curvature differential-drive trajectory generator.
#[derive(Clone, Debug)]
pub struct DiffDriveCircular {
    config: DiffDriveConfig,
    /// Maximum angular speed in rad/s (converted from `w_max_dps`).
    w_max: f64,
    shape: RobotShape,
    dyn_state: DynamicState,
}

impl DiffDriveCircular {
    /// Build and validate a generator from its configuration.
    pub fn new(config: DiffDriveConfig) -> Result<Self> {
        if config.v_max_mps <= 0.0 {
            return Err(PlanError::Config("v_max_mps must be positive".into()));
        }
        if config.w_max_dps <= 0.0 {
            return Err(PlanError::Config("w_max_dps must be positive".into()));
        }
        if config.k_sign != 1 && config.k_sign != -1 {
            return Err(PlanError::Config("k_sign must be +1 or -1".into()));
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
        Ok(Self {
            w_max: config.w_max_dps.to_radians(),
            shape: RobotShape::circle(config.robot_radius),
            dyn_state: DynamicState::default(),
            config,
        })
    }

    /// Generator configuration.
    pub fn config(&self) -> &DiffDriveConfig {
        &self.config
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
        let config: DiffDriveConfig = bincode::deserialize(payload)?;
        Self::new(config)
    }

    fn arc_params(&self, k: usize) -> ArcParams {
        let alpha = self.index_to_alpha(k);
        let sk = f64::from(self.config.k_sign);
        let v = self.config.v_max_mps * sk;
        let w = (alpha / std::f64::consts::PI) * self.w_max * sk;
        let kappa = w / v;
        ArcParams {
            v,
            w,
            kappa,
            scale: 1.0 + self.config.turning_radius_reference * kappa.abs(),
        }
    }

    /// Heading after `arc_len` meters of wheel travel along trajectory `k`.
    fn heading_at(&self, p: &ArcParams, arc_len: f64) -> f64 {
        let u = arc_len * sign_with_zero(p.v);
        normalize_angle(p.kappa * u)
    }

    /// Position after `arc_len` meters of wheel travel along trajectory `k`.
    fn position_at(&self, p: &ArcParams, arc_len: f64) -> (f64, f64) {
        let u = arc_len * sign_with_zero(p.v);
        if p.kappa.abs() < KAPPA_EPS {
            (u, 0.0)
        } else {
            let phi = p.kappa * u;
            (phi.sin() / p.kappa, (1.0 - phi.cos()) / p.kappa)
        }
    }

    /// Arc length of the first collision with a disc obstacle, if any.
    ///
    /// The robot center moves on a circle of radius `|R|` around `(0, R)`
    /// (a half-line for straight trajectories); the obstacle is a point and
    /// the robot a disc of the footprint radius, so the collision set is an
    /// angular interval around the obstacle bearing.
    fn collision_arc_length(&self, p: &ArcParams, ox: f64, oy: f64) -> Option<f64> {
        let r = self.shape.radius;

        if p.kappa.abs() < KAPPA_EPS {
            // Straight trajectory along u = x * sign(v).
            let lateral_sq = r * r - oy * oy;
            if lateral_sq < 0.0 {
                return None;
            }
            let half_chord = lateral_sq.sqrt();
            let (u1, u2) = (ox - half_chord, ox + half_chord);
            let sv = sign_with_zero(p.v);
            // First contact in the direction of travel.
            let (first, last) = (u1 * sv, u2 * sv);
            let (first, last) = (first.min(last), first.max(last));
            if first >= 0.0 {
                return Some(first);
            }
            if last >= 0.0 {
                return Some(0.0);
            }
            return None;
        }

        let radius = 1.0 / p.kappa; // signed
        let center_y = radius;
        let rho_sq = ox * ox + (oy - center_y) * (oy - center_y);
        let rho = rho_sq.sqrt();
        let r_abs = radius.abs();

        // Law of cosines on (motion circle radius, obstacle range, footprint).
        let cos_gamma = (r_abs * r_abs + rho_sq - r * r) / (2.0 * r_abs * rho);
        if !cos_gamma.is_finite() || cos_gamma.abs() > 1.0 {
            return None;
        }
        let gamma = cos_gamma.acos();

        // Angle of the start position and of the obstacle around the center.
        let beta0 = (-radius).atan2(0.0);
        let beta_obs = (oy - center_y).atan2(ox);
        let delta = normalize_angle(beta_obs - beta0);

        // Angular speed of the center position per meter of arc, signed.
        let omega_s = p.kappa * sign_with_zero(p.v);

        if delta.abs() <= gamma {
            return Some(0.0);
        }
        let entry_angle = if omega_s > 0.0 {
            wrap_to_2pi(delta - gamma)
        } else {
            wrap_to_2pi(-(delta + gamma))
        };
        Some(entry_angle / omega_s.abs())
    }
}

impl TrajectoryGenerator for DiffDriveCircular {
    fn alpha_count(&self) -> usize {
        self.config.alpha_count
    }

    fn ref_distance(&self) -> f64 {
        self.config.ref_distance
    }

    fn update_dynamic_state(&mut self, state: DynamicState) {
        self.dyn_state = state;
    }

    fn dynamic_state(&self) -> &DynamicState {
        &self.dyn_state
    }

    fn robot_shape(&self) -> &RobotShape {
        &self.shape
    }

    fn path_pose(&self, k: usize, step: u32) -> Pose2D {
        let p = self.arc_params(k);
        let arc_len = self.path_dist(k, step) / p.scale;
        let (x, y) = self.position_at(&p, arc_len);
        Pose2D::new(x, y, self.heading_at(&p, arc_len))
    }

    fn path_twist(&self, k: usize, step: u32) -> Twist2D {
        let p = self.arc_params(k);
        let arc_len = self.path_dist(k, step) / p.scale;
        let phi = self.heading_at(&p, arc_len);
        let (sin_p, cos_p) = phi.sin_cos();
        Twist2D::new(p.v * cos_p, p.v * sin_p, p.w)
    }

    fn path_dist(&self, _k: usize, step: u32) -> f64 {
        step as f64 * PATH_DIST_STEP
    }

    fn path_step_for_dist(&self, _k: usize, dist: f64) -> Option<u32> {
        if !dist.is_finite() || dist < 0.0 {
            return None;
        }
        Some((dist / PATH_DIST_STEP).round() as u32)
    }

    fn path_step_count(&self, _k: usize) -> u32 {
        ((self.config.ref_distance / PATH_DIST_STEP).round() as u32).max(1)
    }

    fn inverse_map_ws2tp(&self, x: f64, y: f64) -> Option<TpPoint> {
        let v_max = self.config.v_max_mps;
        let w_max = self.w_max;
        let rref = self.config.turning_radius_reference;
        let count = self.config.alpha_count;
        let forward = self.config.k_sign > 0;

        let mut exact = true;
        let (k, dist) = if y != 0.0 {
            let mut radius = (x * x + y * y) / (2.0 * y);
            let radius_min = (v_max / w_max).abs();

            let theta = match (forward, y > 0.0) {
                (true, true) => x.atan2(radius.abs() - y),
                (true, false) => x.atan2(y + radius.abs()),
                (false, true) => (-x).atan2(radius.abs() - y),
                (false, false) => (-x).atan2(y + radius.abs()),
            };
            // Arc angle must be positive, in [0, 2*pi).
            let theta = wrap_to_2pi(theta);

            let dist = theta * (radius.abs() + rref);

            if radius.abs() < radius_min {
                exact = false;
                radius = radius_min * sign_with_zero(radius);
            }

            let alpha = std::f64::consts::PI * v_max / (w_max * radius);
            (alpha2index(alpha, count), dist)
        } else if sign_with_zero(x) == f64::from(self.config.k_sign) {
            (alpha2index(0.0, count), x.abs())
        } else {
            // The straight line opposite the drive direction is unreachable.
            exact = false;
            (count - 1, 1e3)
        };

        Some(TpPoint {
            trajectory: k,
            normalized_dist: dist / self.config.ref_distance,
            exact,
        })
    }

    fn update_tp_obstacle_single(&self, ox: f64, oy: f64, k: usize, dist: &mut f64) {
        let p = self.arc_params(k);
        if let Some(arc_len) = self.collision_arc_length(&p, ox, oy) {
            self.clip_tp_obstacle(ox, oy, arc_len * p.scale, dist);
        }
    }

    fn description(&self) -> String {
        format!("DiffDriveCircular:K={:+}", self.config.k_sign)
    }
}
