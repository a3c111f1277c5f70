//! Round-trip laws for the trajectory families, exercised through the
//! public API.

use marga_plan::ptg::{
    DiffDriveCircular, DiffDriveConfig, HolonomicBlend, HolonomicBlendConfig, PtgKind,
    TrajectoryGenerator,
};

/// Differential-drive config with V_MAX = 1 m/s and W_MAX = 1 rad/s.
fn diff_drive_unit() -> DiffDriveCircular {
    DiffDriveCircular::new(DiffDriveConfig {
        v_max_mps: 1.0,
        w_max_dps: 1.0f64.to_degrees(),
        k_sign: 1,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn diff_drive_inverse_map_recovers_trajectory_and_distance() {
    let ptg = diff_drive_unit();
    let rref = ptg.config().turning_radius_reference;
    let alpha_count = ptg.alpha_count() as f64;

    for k in [5usize, 15, 25] {
        let step = ptg.path_step_count(k) / 2;
        let pose = ptg.path_pose(k, step);
        let expected_dist = ptg.path_dist(k, step);

        let tp = ptg.inverse_map_ws2tp(pose.x, pose.y).unwrap();
        assert!(tp.exact, "k={}", k);
        assert_eq!(tp.trajectory, k, "k={}", k);

        let got_dist = tp.normalized_dist * ptg.ref_distance();
        let tol = (0.02 * expected_dist).max(2.0 * rref / alpha_count);
        assert!(
            (got_dist - expected_dist).abs() <= tol,
            "k={}: {} vs {} (tol {})",
            k,
            got_dist,
            expected_dist,
            tol
        );
    }
}

#[test]
fn diff_drive_round_trip_along_full_paths() {
    let ptg = diff_drive_unit();
    for k in 0..ptg.alpha_count() {
        // Stay below a full circle so the arc angle is recoverable.
        let step = ptg.path_step_count(k) / 4;
        if step == 0 {
            continue;
        }
        let pose = ptg.path_pose(k, step);
        let tp = ptg.inverse_map_ws2tp(pose.x, pose.y).unwrap();
        if !tp.exact {
            continue;
        }
        assert_eq!(tp.trajectory, k, "k={}", k);
    }
}

#[test]
fn holonomic_inverse_then_forward_reproduces_workspace_points() {
    let ptg = HolonomicBlend::new(HolonomicBlendConfig::default()).unwrap();

    // Points generated on trajectories, mixing ramp and cruise regimes.
    for k in [2usize, 9, 15, 21, 28] {
        let count = ptg.path_step_count(k);
        for step in [count / 10, count / 3, count / 2, (count * 4) / 5] {
            if step == 0 {
                continue;
            }
            let target = ptg.path_pose(k, step);

            let tp = ptg
                .inverse_map_ws2tp(target.x, target.y)
                .unwrap_or_else(|| panic!("no inverse for k={} step={}", k, step));
            let back_step = ptg
                .path_step_for_dist(tp.trajectory, tp.normalized_dist * ptg.ref_distance())
                .unwrap();
            let back = ptg.path_pose(tp.trajectory, back_step);

            let err = ((back.x - target.x).powi(2) + (back.y - target.y).powi(2)).sqrt();
            assert!(err < 1e-3, "k={} step={}: err={}", k, step, err);
        }
    }
}

#[test]
fn ptg_kind_archive_round_trip() {
    let holo = PtgKind::HolonomicBlend(
        HolonomicBlend::new(HolonomicBlendConfig::default().with_v_max(1.5)).unwrap(),
    );
    let bytes = holo.to_archive_bytes().unwrap();
    let back = PtgKind::from_archive_bytes(&bytes).unwrap();
    match back {
        PtgKind::HolonomicBlend(p) => assert_eq!(p.config().v_max_mps, 1.5),
        _ => panic!("wrong variant"),
    }

    let diff = PtgKind::DiffDriveCircular(
        DiffDriveCircular::new(DiffDriveConfig::default().with_k_sign(-1)).unwrap(),
    );
    let bytes = diff.to_archive_bytes().unwrap();
    let back = PtgKind::from_archive_bytes(&bytes).unwrap();
    match back {
        PtgKind::DiffDriveCircular(p) => assert_eq!(p.config().k_sign, -1),
        _ => panic!("wrong variant"),
    }

    // Unknown variant tag fails loudly.
    assert!(PtgKind::from_archive_bytes(&[200, 0, 0]).is_err());
}

#[test]
fn tp_distance_metric_matches_inverse_map() {
    use marga_plan::core::{KinState, Pose2D};

    let ptg = diff_drive_unit();
    let from = KinState::at_pose(Pose2D::new(1.0, 2.0, 0.5));

    // A pose straight ahead of `from` at 3 m.
    let query = from.pose.compose(&Pose2D::new(3.0, 0.0, 0.0));
    let (dist, k) = ptg.distance_to(&from, &query).unwrap();
    assert!((dist - 3.0).abs() < 1e-9);
    assert_eq!(k, 15);

    // The lower bound never rejects a reachable pose.
    assert!(!ptg.cannot_be_nearer_than(&from, &query, 3.5));
}
