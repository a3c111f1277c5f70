//! Scalar math helpers: angle wrapping, polynomial roots, small linear solves.

use std::f64::consts::{PI, TAU};

/// Wrap an angle into (-pi, pi].
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Wrap an angle into [0, 2*pi).
#[inline]
pub fn wrap_to_2pi(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a < 0.0 {
        a += TAU;
    }
    a
}

/// Sign of `x`, with `sign(0) = 0`.
#[inline]
pub fn sign_with_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Real roots of `a*x^2 + b*x + c = 0`, requiring two distinct solutions.
///
/// Returns `None` for the degenerate (linear, double-root, or complex) cases.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a.abs() < 1e-300 {
        return None;
    }
    let discr = b * b - 4.0 * a * c;
    if discr <= 0.0 {
        return None;
    }
    let sq = discr.sqrt();
    Some(((-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a)))
}

/// Real roots of the monic cubic `x^3 + b*x^2 + c*x + d = 0`.
pub fn solve_cubic_monic(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed form t^3 + p*t + q with x = t - b/3.
    let shift = b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    let mut roots = Vec::with_capacity(3);
    let discr = (q / 2.0) * (q / 2.0) + (p / 3.0) * (p / 3.0) * (p / 3.0);

    if discr > 1e-14 {
        let sq = discr.sqrt();
        let t = (-q / 2.0 + sq).cbrt() + (-q / 2.0 - sq).cbrt();
        roots.push(t - shift);
    } else if discr < -1e-14 {
        // Three real roots, trigonometric form.
        let m = 2.0 * (-p / 3.0).sqrt();
        let theta = (3.0 * q / (p * m)).clamp(-1.0, 1.0).acos() / 3.0;
        for k in 0..3 {
            roots.push(m * (theta - TAU * k as f64 / 3.0).cos() - shift);
        }
    } else if p.abs() < 1e-12 {
        // Triple root.
        roots.push(-shift);
    } else {
        // One single and one double root.
        roots.push(3.0 * q / p - shift);
        roots.push(-3.0 * q / (2.0 * p) - shift);
    }
    roots
}

/// Real roots of the monic quartic `x^4 + b*x^3 + c*x^2 + d*x + e = 0`.
///
/// Ferrari's method: depress, split through the resolvent cubic, solve the
/// two quadratic factors.
pub fn solve_quartic_monic(b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    // Depressed form y^4 + p*y^2 + q*y + r with x = y - b/4.
    let shift = b / 4.0;
    let b2 = b * b;
    let p = c - 3.0 * b2 / 8.0;
    let q = d - b * c / 2.0 + b2 * b / 8.0;
    let r = e - b * d / 4.0 + b2 * c / 16.0 - 3.0 * b2 * b2 / 256.0;

    let mut roots = Vec::with_capacity(4);

    if q.abs() < 1e-12 {
        // Biquadratic: z^2 + p*z + r = 0 with z = y^2.
        let discr = p * p - 4.0 * r;
        if discr >= 0.0 {
            let sq = discr.sqrt();
            for z in [(-p + sq) / 2.0, (-p - sq) / 2.0] {
                if z >= 0.0 {
                    let y = z.sqrt();
                    roots.push(y - shift);
                    roots.push(-y - shift);
                }
            }
        }
        return roots;
    }

    // Resolvent cubic u^3 + 2p*u^2 + (p^2 - 4r)*u - q^2 = 0. Because its
    // value at u=0 is -q^2 < 0, a positive real root always exists; take the
    // largest for stability.
    let u = solve_cubic_monic(2.0 * p, p * p - 4.0 * r, -q * q)
        .into_iter()
        .filter(|u| *u > 0.0)
        .fold(f64::NAN, f64::max);
    if !u.is_finite() {
        return roots;
    }

    let alpha = u.sqrt();
    let beta = (p + u - q / alpha) / 2.0;
    let gamma = (p + u + q / alpha) / 2.0;

    // y^2 + alpha*y + beta = 0
    let d1 = alpha * alpha - 4.0 * beta;
    if d1 >= 0.0 {
        let sq = d1.sqrt();
        roots.push((-alpha + sq) / 2.0 - shift);
        roots.push((-alpha - sq) / 2.0 - shift);
    }
    // y^2 - alpha*y + gamma = 0
    let d2 = alpha * alpha - 4.0 * gamma;
    if d2 >= 0.0 {
        let sq = d2.sqrt();
        roots.push((alpha + sq) / 2.0 - shift);
        roots.push((alpha - sq) / 2.0 - shift);
    }
    roots
}

/// Solve the dense 4x4 system `a * x = b` by Gaussian elimination with
/// partial pivoting. Returns `None` for a (numerically) singular matrix.
pub fn solve_linear_system_4(a: &[[f64; 4]; 4], b: &[f64; 4]) -> Option<[f64; 4]> {
    let mut m = *a;
    let mut rhs = *b;

    for col in 0..4 {
        // Pivot
        let mut pivot_row = col;
        let mut pivot_val = m[col][col].abs();
        for row in (col + 1)..4 {
            if m[row][col].abs() > pivot_val {
                pivot_val = m[row][col].abs();
                pivot_row = row;
            }
        }
        if pivot_val < 1e-12 {
            return None;
        }
        if pivot_row != col {
            m.swap(col, pivot_row);
            rhs.swap(col, pivot_row);
        }

        // Eliminate below
        for row in (col + 1)..4 {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..4 {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{} vs {}", a, b);
    }

    #[test]
    fn test_normalize_angle() {
        assert_close(normalize_angle(0.0), 0.0, 1e-12);
        assert_close(normalize_angle(TAU), 0.0, 1e-12);
        assert_close(normalize_angle(-TAU), 0.0, 1e-12);
        assert_close(normalize_angle(3.0 * PI), PI, 1e-12);
        assert_close(normalize_angle(-PI), PI, 1e-12);
    }

    #[test]
    fn test_wrap_to_2pi() {
        assert_close(wrap_to_2pi(-0.1), TAU - 0.1, 1e-12);
        assert_close(wrap_to_2pi(TAU + 0.2), 0.2, 1e-12);
    }

    #[test]
    fn test_quadratic() {
        // (x-1)(x-3) = x^2 - 4x + 3
        let (r1, r2) = solve_quadratic(1.0, -4.0, 3.0).unwrap();
        assert_close(r1.max(r2), 3.0, 1e-12);
        assert_close(r1.min(r2), 1.0, 1e-12);
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_none());
        assert!(solve_quadratic(0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x-1)(x-2)(x-4) = x^3 - 7x^2 + 14x - 8
        let mut roots = solve_cubic_monic(-7.0, 14.0, -8.0);
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 3);
        assert_close(roots[0], 1.0, 1e-9);
        assert_close(roots[1], 2.0, 1e-9);
        assert_close(roots[2], 4.0, 1e-9);
    }

    #[test]
    fn test_cubic_one_root() {
        // x^3 - 1 = 0
        let roots = solve_cubic_monic(0.0, 0.0, -1.0);
        assert_eq!(roots.len(), 1);
        assert_close(roots[0], 1.0, 1e-9);
    }

    #[test]
    fn test_quartic_four_roots() {
        // (x-1)(x+1)(x-2)(x+3) = x^4 + x^3 - 7x^2 - x + 6
        let mut roots = solve_quartic_monic(1.0, -7.0, -1.0, 6.0);
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 4);
        assert_close(roots[0], -3.0, 1e-7);
        assert_close(roots[1], -1.0, 1e-7);
        assert_close(roots[2], 1.0, 1e-7);
        assert_close(roots[3], 2.0, 1e-7);
    }

    #[test]
    fn test_quartic_biquadratic() {
        // x^4 - 5x^2 + 4 = (x^2-1)(x^2-4)
        let mut roots = solve_quartic_monic(0.0, -5.0, 0.0, 4.0);
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(roots.len(), 4);
        assert_close(roots[0], -2.0, 1e-9);
        assert_close(roots[3], 2.0, 1e-9);
    }

    #[test]
    fn test_quartic_no_real_roots() {
        // x^4 + 1 = 0
        let roots = solve_quartic_monic(0.0, 0.0, 0.0, 1.0);
        assert!(roots.is_empty());
    }

    #[test]
    fn test_linear_system_4() {
        let a = [
            [2.0, 1.0, 0.0, 0.0],
            [1.0, 3.0, 1.0, 0.0],
            [0.0, 1.0, 4.0, 1.0],
            [0.0, 0.0, 1.0, 5.0],
        ];
        let x_true = [1.0, -2.0, 3.0, -4.0];
        let mut b = [0.0; 4];
        for (i, row) in a.iter().enumerate() {
            b[i] = row.iter().zip(&x_true).map(|(m, x)| m * x).sum();
        }
        let x = solve_linear_system_4(&a, &b).unwrap();
        for i in 0..4 {
            assert_close(x[i], x_true[i], 1e-9);
        }
    }

    #[test]
    fn test_linear_system_singular() {
        let a = [[1.0, 2.0, 3.0, 4.0]; 4];
        assert!(solve_linear_system_4(&a, &[1.0, 2.0, 3.0, 4.0]).is_none());
    }
}
