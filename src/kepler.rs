//! # Kepler equation and anomaly conversions
//!
//! The mean anomaly `M`, eccentric anomaly `E` and true anomaly `ν` of an
//! elliptic orbit are related by
//!
//! ```text
//! M = E − e·sin(E)                                   (Kepler's equation)
//! tan(ν/2) = sqrt((1 + e) / (1 − e)) · tan(E/2)
//! ```
//!
//! `E → M` and `ν ↔ E` are closed form. `M → E` is solved by Newton–Raphson
//! iteration through [`roots::find_root_newton_raphson`], with an absolute
//! convergence threshold of [`KEPLER_TOLERANCE`] radians and at most
//! [`KEPLER_MAX_ITERATIONS`] iterations.
//!
//! All returned angles are normalized to `[0, 2π)` with [`principal_angle`].
use std::f64::consts::PI;

use roots::{find_root_newton_raphson, SimpleConvergency};

use crate::{
    constants::{Radian, DPI},
    orbitprop_errors::OrbitPropError,
};

/// Absolute convergence threshold on the eccentric anomaly, radians.
pub const KEPLER_TOLERANCE: f64 = 1e-13;

/// Maximum number of Newton iterations before giving up.
pub const KEPLER_MAX_ITERATIONS: usize = 50;

/// Return the principal value of an angle in `[0, 2π)`.
pub fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Return the principal difference `a − b` in `[-π, π]`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let a = principal_angle(a);
    let b = principal_angle(b);

    let mut diff = a - b;
    if diff > PI {
        diff -= DPI;
    } else if diff < -PI {
        diff += DPI;
    }
    diff
}

fn check_elliptic(eccentricity: f64) -> Result<(), OrbitPropError> {
    if eccentricity.is_finite() && (0.0..1.0).contains(&eccentricity) {
        Ok(())
    } else {
        Err(OrbitPropError::SingularElements(format!(
            "anomaly conversion requires 0 <= e < 1, got e = {eccentricity}"
        )))
    }
}

/// Solve Kepler's equation `M = E − e·sin(E)` for the eccentric anomaly.
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly `M` in radians (any finite value).
/// * `eccentricity`: orbital eccentricity, `0 ≤ e < 1`.
///
/// Return
/// ------
/// * The eccentric anomaly `E` in `[0, 2π)`.
/// * [`OrbitPropError::KeplerSolverDidNotConverge`] if Newton's method fails to reach
///   [`KEPLER_TOLERANCE`] within [`KEPLER_MAX_ITERATIONS`] iterations.
///
/// See also
/// --------
/// * [`eccentric_to_true_anomaly`] – next step of the `M → ν` chain.
pub fn solve_kepler_equation(
    mean_anomaly: Radian,
    eccentricity: f64,
) -> Result<Radian, OrbitPropError> {
    check_elliptic(eccentricity)?;
    let not_converged = || OrbitPropError::KeplerSolverDidNotConverge {
        mean_anomaly,
        eccentricity,
    };
    if !mean_anomaly.is_finite() {
        return Err(not_converged());
    }

    let m = principal_angle(mean_anomaly);
    if eccentricity == 0.0 {
        return Ok(m);
    }

    let f = |ecc_anom: f64| ecc_anom - eccentricity * ecc_anom.sin() - m;
    let df = |ecc_anom: f64| 1.0 - eccentricity * ecc_anom.cos();

    // Highly eccentric orbits start from apoapsis to avoid overshooting near M = 0
    let start = if eccentricity > 0.8 {
        PI
    } else {
        m + eccentricity * m.sin()
    };

    let mut convergency = SimpleConvergency {
        eps: KEPLER_TOLERANCE,
        max_iter: KEPLER_MAX_ITERATIONS,
    };

    let ecc_anom =
        find_root_newton_raphson(start, &f, &df, &mut convergency).map_err(|_| not_converged())?;

    if !ecc_anom.is_finite() {
        return Err(not_converged());
    }
    Ok(principal_angle(ecc_anom))
}

/// Mean anomaly from eccentric anomaly (closed form).
pub fn eccentric_to_mean_anomaly(eccentric_anomaly: Radian, eccentricity: f64) -> Radian {
    principal_angle(eccentric_anomaly - eccentricity * eccentric_anomaly.sin())
}

/// True anomaly from eccentric anomaly.
pub fn eccentric_to_true_anomaly(eccentric_anomaly: Radian, eccentricity: f64) -> Radian {
    let half = 0.5 * eccentric_anomaly;
    principal_angle(
        2.0 * ((1.0 + eccentricity).sqrt() * half.sin())
            .atan2((1.0 - eccentricity).sqrt() * half.cos()),
    )
}

/// Eccentric anomaly from true anomaly.
pub fn true_to_eccentric_anomaly(true_anomaly: Radian, eccentricity: f64) -> Radian {
    let half = 0.5 * true_anomaly;
    principal_angle(
        2.0 * ((1.0 - eccentricity).sqrt() * half.sin())
            .atan2((1.0 + eccentricity).sqrt() * half.cos()),
    )
}

/// True anomaly from mean anomaly, through the eccentric anomaly.
pub fn mean_to_true_anomaly(mean_anomaly: Radian, eccentricity: f64) -> Result<Radian, OrbitPropError> {
    let ecc_anom = solve_kepler_equation(mean_anomaly, eccentricity)?;
    Ok(eccentric_to_true_anomaly(ecc_anom, eccentricity))
}

/// Mean anomaly from true anomaly, through the eccentric anomaly.
pub fn true_to_mean_anomaly(true_anomaly: Radian, eccentricity: f64) -> Radian {
    eccentric_to_mean_anomaly(true_to_eccentric_anomaly(true_anomaly, eccentricity), eccentricity)
}
