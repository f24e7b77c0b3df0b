//! # Reference frame rotations
//!
//! Only the rotations the propagation core needs are provided:
//!
//! * the elementary rotation [`rotmt`] about an [`Axis`],
//! * the inertial (GCRF-like, mean equator of J2000) ↔ Earth-fixed rotation about
//!   the Z axis by the Greenwich mean sidereal angle,
//! * the ecliptic → equatorial rotation by the mean obliquity.
//!
//! Precession, nutation and polar motion are not modelled: the Earth-fixed frame
//! is used for the gravity field evaluation only.
use hifitime::Epoch;
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use crate::{constants::OBLIQUITY_J2000, time::earth_rotation_angle};

/// Principal axis of an elementary rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

/// Build an elementary rotation matrix about a principal axis.
///
/// The rotation is active: `rotmt(α, Axis::Z) * x̂ = (cos α, sin α, 0)`.
///
/// Arguments
/// ---------
/// * `alpha`: rotation angle in radians.
/// * `axis`: the principal axis to rotate about.
///
/// Return
/// ------
/// * The 3×3 rotation matrix.
pub fn rotmt(alpha: f64, axis: Axis) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&axis.unit(), alpha).into()
}

/// Rotation matrix from the inertial frame to the Earth-fixed frame at `epoch`.
pub fn inertial_to_earth_fixed(epoch: &Epoch) -> Matrix3<f64> {
    rotmt(-earth_rotation_angle(epoch), Axis::Z)
}

/// Rotation matrix from the Earth-fixed frame to the inertial frame at `epoch`.
pub fn earth_fixed_to_inertial(epoch: &Epoch) -> Matrix3<f64> {
    rotmt(earth_rotation_angle(epoch), Axis::Z)
}

/// Rotate a vector given in mean ecliptic coordinates into the mean equatorial frame.
pub fn ecliptic_to_equatorial(v: &Vector3<f64>) -> Vector3<f64> {
    rotmt(OBLIQUITY_J2000, Axis::X) * v
}

#[cfg(test)]
mod ref_system_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotmt_is_active() {
        let x = Vector3::x();
        let r = rotmt(std::f64::consts::FRAC_PI_2, Axis::Z) * x;
        assert_relative_eq!(r, Vector3::y(), epsilon = 1e-15);

        let y = Vector3::y();
        let r = rotmt(std::f64::consts::FRAC_PI_2, Axis::X) * y;
        assert_relative_eq!(r, Vector3::z(), epsilon = 1e-15);

        let z = Vector3::z();
        let r = rotmt(std::f64::consts::FRAC_PI_2, Axis::Y) * z;
        assert_relative_eq!(r, Vector3::x(), epsilon = 1e-15);
    }

    #[test]
    fn test_rotmt_each_axis_is_orthonormal() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let m = rotmt(0.7, axis);
            assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-15);
            assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-15);
            // The rotation axis is a fixed point
            let u = axis.unit().into_inner();
            assert_relative_eq!(m * u, u, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_earth_fixed_round_trip() {
        let epoch = Epoch::from_gregorian_utc_hms(2004, 1, 1, 23, 30, 0);
        let r = Vector3::new(7.0e6, -1.2e6, 3.3e5);
        let back = earth_fixed_to_inertial(&epoch) * (inertial_to_earth_fixed(&epoch) * r);
        assert_relative_eq!(back, r, epsilon = 1e-6);
        // The Z component is untouched
        assert_relative_eq!((inertial_to_earth_fixed(&epoch) * r).z, r.z);
    }

    #[test]
    fn test_ecliptic_pole() {
        let pole = ecliptic_to_equatorial(&Vector3::z());
        assert_relative_eq!(pole.z, OBLIQUITY_J2000.cos(), epsilon = 1e-15);
        assert_relative_eq!(pole.y, -OBLIQUITY_J2000.sin(), epsilon = 1e-15);
    }
}
