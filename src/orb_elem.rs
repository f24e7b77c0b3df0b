//! # Cartesian → osculating element conversion
//!
//! Inertial position/velocity is turned into the classical element set
//! `(a, e, i, Ω, ω, ν)` by rotating the state into the "node frame", whose X axis
//! points along the ascending node and whose XY plane is the orbital plane.
//!
//! Degenerate geometries follow a fixed convention:
//! * `sin i < SINGULAR_EPS` (equatorial): Ω = 0, the node frame X axis is the inertial X axis.
//! * `e < SINGULAR_EPS` (circular): ω = 0, the anomaly is measured from the node.
//!
//! Non-elliptic states (`e ≥ 1`, non-negative energy) and rectilinear states
//! (zero angular momentum) are rejected with [`OrbitPropError::SingularElements`].
use log::debug;
use nalgebra::Vector3;

use crate::{
    kepler::principal_angle,
    orbitprop_errors::OrbitPropError,
    ref_system::{rotmt, Axis},
};

/// Threshold below which `e` or `sin i` is treated as exactly zero.
pub const SINGULAR_EPS: f64 = 1e-11;

/// Osculating classical elements with the true anomaly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OsculatingElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub true_anomaly: f64,
}

/// Convert an inertial state to osculating elliptic elements.
///
/// Arguments
/// ---------
/// * `position`: position vector (m).
/// * `velocity`: velocity vector (m/s).
/// * `mu`: gravitational parameter of the central body (m³/s²).
///
/// Return
/// ------
/// * [`OsculatingElements`] with all angles in `[0, 2π)`.
/// * [`OrbitPropError::SingularElements`] for non-elliptic or rectilinear states.
pub fn cartesian_to_elements(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    mu: f64,
) -> Result<OsculatingElements, OrbitPropError> {
    let r = position.norm();
    let v2 = velocity.norm_squared();

    if !(r.is_finite() && v2.is_finite()) || r == 0.0 {
        return Err(OrbitPropError::SingularElements(format!(
            "state is not usable: r = {position:?}, v = {velocity:?}"
        )));
    }

    // Angular momentum
    let angular_momentum = position.cross(velocity);
    let h = angular_momentum.norm();
    if h <= f64::EPSILON * r * v2.sqrt() {
        return Err(OrbitPropError::SingularElements(
            "zero angular momentum (rectilinear motion)".into(),
        ));
    }

    let energy = 0.5 * v2 - mu / r;
    if energy >= 0.0 {
        return Err(OrbitPropError::SingularElements(format!(
            "orbit is not elliptic (specific energy {energy} J/kg)"
        )));
    }
    let semi_major_axis = -mu / (2.0 * energy);

    let ecc_vector = ((v2 - mu / r) * position - position.dot(velocity) * velocity) / mu;
    let eccentricity = ecc_vector.norm();
    if eccentricity >= 1.0 {
        return Err(OrbitPropError::SingularElements(format!(
            "orbit is not elliptic (e = {eccentricity})"
        )));
    }

    // Inclination and longitude of the node
    let hv = angular_momentum / h;
    let sini = (hv.x * hv.x + hv.y * hv.y).sqrt();
    let inclination = sini.atan2(hv.z);
    let ascending_node_longitude = if sini < SINGULAR_EPS {
        debug!("Equatorial orbit (sin i = {sini:e}): node longitude set to 0");
        0.0
    } else {
        principal_angle(hv.x.atan2(-hv.y))
    };

    // Node frame: X axis along the line of nodes, Z along the angular momentum
    let to_node = rotmt(-inclination, Axis::X) * rotmt(-ascending_node_longitude, Axis::Z);
    let r_node = to_node * position;
    let argument_of_latitude = r_node.y.atan2(r_node.x);

    let periapsis_argument = if eccentricity < SINGULAR_EPS {
        debug!("Circular orbit (e = {eccentricity:e}): periapsis argument set to 0");
        0.0
    } else {
        let e_node = to_node * ecc_vector;
        principal_angle(e_node.y.atan2(e_node.x))
    };

    Ok(OsculatingElements {
        semi_major_axis,
        eccentricity,
        inclination,
        ascending_node_longitude,
        periapsis_argument,
        true_anomaly: principal_angle(argument_of_latitude - periapsis_argument),
    })
}

#[cfg(test)]
mod orb_elem_test {
    use super::*;
    use crate::constants::MU_EARTH;
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_equatorial() {
        let r = 7.0e6;
        let v = (MU_EARTH / r).sqrt();
        let elem = cartesian_to_elements(
            &Vector3::new(0.0, r, 0.0),
            &Vector3::new(-v, 0.0, 0.0),
            MU_EARTH,
        )
        .unwrap();

        assert_relative_eq!(elem.semi_major_axis, r, max_relative = 1e-12);
        assert!(elem.eccentricity < 1e-12);
        assert_eq!(elem.inclination, 0.0);
        assert_eq!(elem.ascending_node_longitude, 0.0);
        assert_eq!(elem.periapsis_argument, 0.0);
        assert_relative_eq!(elem.true_anomaly, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_polar_orbit_node() {
        // Ascending through the +Y axis: node at 90°
        let r = 7.0e6;
        let v = (MU_EARTH / r).sqrt();
        let elem = cartesian_to_elements(
            &Vector3::new(0.0, r, 0.0),
            &Vector3::new(0.0, 0.0, v),
            MU_EARTH,
        )
        .unwrap();

        assert_relative_eq!(elem.inclination, std::f64::consts::FRAC_PI_2, epsilon = 1e-14);
        assert_relative_eq!(
            elem.ascending_node_longitude,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-14
        );
        assert!(elem.true_anomaly < 1e-12 || (elem.true_anomaly - crate::constants::DPI).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_hyperbolic_and_rectilinear() {
        let r = Vector3::new(7.0e6, 0.0, 0.0);
        let escape = (2.0 * MU_EARTH / 7.0e6).sqrt();

        assert!(matches!(
            cartesian_to_elements(&r, &Vector3::new(0.0, 1.1 * escape, 0.0), MU_EARTH),
            Err(OrbitPropError::SingularElements(_))
        ));
        assert!(matches!(
            cartesian_to_elements(&r, &Vector3::new(1000.0, 0.0, 0.0), MU_EARTH),
            Err(OrbitPropError::SingularElements(_))
        ));
        assert!(matches!(
            cartesian_to_elements(&Vector3::zeros(), &Vector3::new(0.0, 1.0, 0.0), MU_EARTH),
            Err(OrbitPropError::SingularElements(_))
        ));
    }
}
