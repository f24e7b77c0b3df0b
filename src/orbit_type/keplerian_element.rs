//! # Keplerian orbital elements
//!
//! This module defines the [`KeplerianElements`] struct and its conversions to and
//! from an inertial [`CartesianState`].
//!
//! ## What are Keplerian elements?
//!
//! 1. **a** – Semi-major axis (m)
//! 2. **e** – Eccentricity (unitless, `0 ≤ e < 1`)
//! 3. **i** – Inclination (radians)
//! 4. **Ω** – Right ascension of the ascending node (radians)
//! 5. **ω** – Argument of perigee (radians)
//! 6. **anomaly** – Mean, true or eccentric anomaly (radians), tagged by [`AnomalyKind`]
//!
//! Together with the reference epoch these parameters describe the osculating
//! two-body orbit.
//!
//! ## Degeneracies
//!
//! - **Circular orbits (`e → 0`)**: ω is undefined and set to `0.0`; the anomaly is
//!   then measured from the ascending node.
//! - **Equatorial orbits (`i → 0`)**: Ω is undefined and set to `0.0`.
//!
//! See [`crate::orb_elem`] for the exact thresholds.
//!
//! ## See also
//!
//! - [`EquinoctialElements`](crate::orbit_type::equinoctial_element::EquinoctialElements) – non-singular form used by reports.
//! - [`principal_angle`] – helper to normalize angular elements.
use std::fmt;

use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::RADEG,
    kepler::{
        eccentric_to_mean_anomaly, eccentric_to_true_anomaly, mean_to_true_anomaly,
        principal_angle, solve_kepler_equation, true_to_eccentric_anomaly, true_to_mean_anomaly,
    },
    orb_elem::cartesian_to_elements,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    ref_system::{rotmt, Axis},
};

/// Which angle the `anomaly` field of [`KeplerianElements`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnomalyKind {
    #[default]
    Mean,
    True,
    Eccentric,
}

/// Keplerian orbital elements (osculating, two-body).
///
/// Units
/// -----
/// * `reference_epoch`: absolute epoch.
/// * `semi_major_axis`: meters.
/// * `eccentricity`: unitless.
/// * `inclination`, `ascending_node_longitude`, `periapsis_argument`, `anomaly`: radians.
///
/// See also
/// --------
/// * [`KeplerianElements::to_cartesian`] – position/velocity for a given μ.
/// * [`KeplerianElements::from_cartesian`] – inverse conversion.
#[derive(Debug, PartialEq, Clone)]
pub struct KeplerianElements {
    pub reference_epoch: Epoch,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub anomaly: f64,
    pub anomaly_kind: AnomalyKind,
}

impl KeplerianElements {
    /// Build and validate an element set.
    ///
    /// Return
    /// ------
    /// * The elements, or [`OrbitPropError::InvalidParameter`] naming the first invalid
    ///   element (`a ≤ 0`, `e ∉ [0, 1)`, or a non-finite angle).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference_epoch: Epoch,
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        ascending_node_longitude: f64,
        periapsis_argument: f64,
        anomaly: f64,
        anomaly_kind: AnomalyKind,
    ) -> Result<Self, OrbitPropError> {
        let elements = KeplerianElements {
            reference_epoch,
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
            anomaly,
            anomaly_kind,
        };
        elements.validate()?;
        Ok(elements)
    }

    /// Check the domain of every element.
    pub fn validate(&self) -> Result<(), OrbitPropError> {
        if !(self.semi_major_axis.is_finite() && self.semi_major_axis > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "a",
                self.semi_major_axis,
                "semi-major axis must be finite and > 0",
            ));
        }
        if !(self.eccentricity.is_finite() && (0.0..1.0).contains(&self.eccentricity)) {
            return Err(OrbitPropError::invalid_parameter(
                "e",
                self.eccentricity,
                "eccentricity must be in [0, 1)",
            ));
        }
        for (name, value) in [
            ("i", self.inclination),
            ("raan", self.ascending_node_longitude),
            ("omega", self.periapsis_argument),
            ("anomaly", self.anomaly),
        ] {
            if !value.is_finite() {
                return Err(OrbitPropError::invalid_parameter(
                    name,
                    value,
                    "angle must be finite",
                ));
            }
        }
        Ok(())
    }

    /// Mean motion `n = sqrt(μ / a³)` in rad/s.
    pub fn mean_motion(&self, mu: f64) -> f64 {
        (mu / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Keplerian period `2π / n` in seconds.
    pub fn period(&self, mu: f64) -> f64 {
        crate::constants::DPI / self.mean_motion(mu)
    }

    /// Mean anomaly in `[0, 2π)` (closed form from any anomaly kind).
    pub fn mean_anomaly(&self) -> f64 {
        match self.anomaly_kind {
            AnomalyKind::Mean => principal_angle(self.anomaly),
            AnomalyKind::True => true_to_mean_anomaly(self.anomaly, self.eccentricity),
            AnomalyKind::Eccentric => eccentric_to_mean_anomaly(self.anomaly, self.eccentricity),
        }
    }

    /// True anomaly in `[0, 2π)`; solves Kepler's equation when the stored anomaly is mean.
    pub fn true_anomaly(&self) -> Result<f64, OrbitPropError> {
        match self.anomaly_kind {
            AnomalyKind::Mean => mean_to_true_anomaly(self.anomaly, self.eccentricity),
            AnomalyKind::True => Ok(principal_angle(self.anomaly)),
            AnomalyKind::Eccentric => {
                Ok(eccentric_to_true_anomaly(self.anomaly, self.eccentricity))
            }
        }
    }

    /// Eccentric anomaly in `[0, 2π)`.
    pub fn eccentric_anomaly(&self) -> Result<f64, OrbitPropError> {
        match self.anomaly_kind {
            AnomalyKind::Mean => solve_kepler_equation(self.anomaly, self.eccentricity),
            AnomalyKind::True => Ok(true_to_eccentric_anomaly(self.anomaly, self.eccentricity)),
            AnomalyKind::Eccentric => Ok(principal_angle(self.anomaly)),
        }
    }

    /// Return the same orbit with the anomaly expressed as `kind`.
    pub fn with_anomaly_kind(&self, kind: AnomalyKind) -> Result<Self, OrbitPropError> {
        let anomaly = match kind {
            AnomalyKind::Mean => self.mean_anomaly(),
            AnomalyKind::True => self.true_anomaly()?,
            AnomalyKind::Eccentric => self.eccentric_anomaly()?,
        };
        Ok(KeplerianElements {
            anomaly,
            anomaly_kind: kind,
            ..self.clone()
        })
    }

    /// Convert to an inertial Cartesian state.
    ///
    /// The state is built in the perifocal frame and rotated by
    /// `Rz(Ω) · Rx(i) · Rz(ω)`.
    ///
    /// Arguments
    /// ---------
    /// * `mu`: gravitational parameter of the central body (m³/s²).
    ///
    /// Return
    /// ------
    /// * The [`CartesianState`] at `reference_epoch`.
    /// * [`OrbitPropError::InvalidParameter`] for an invalid element set, or
    ///   [`OrbitPropError::KeplerSolverDidNotConverge`] from the anomaly conversion.
    pub fn to_cartesian(&self, mu: f64) -> Result<CartesianState, OrbitPropError> {
        self.validate()?;
        if !(mu.is_finite() && mu > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "mu",
                mu,
                "gravitational parameter must be > 0",
            ));
        }

        let e = self.eccentricity;
        let nu = self.true_anomaly()?;
        let (sin_nu, cos_nu) = nu.sin_cos();

        let p = self.semi_major_axis * (1.0 - e * e);
        let radius = p / (1.0 + e * cos_nu);
        let speed_factor = (mu / p).sqrt();

        let r_pf = Vector3::new(radius * cos_nu, radius * sin_nu, 0.0);
        let v_pf = Vector3::new(-speed_factor * sin_nu, speed_factor * (e + cos_nu), 0.0);

        let rot = rotmt(self.ascending_node_longitude, Axis::Z)
            * rotmt(self.inclination, Axis::X)
            * rotmt(self.periapsis_argument, Axis::Z);

        Ok(CartesianState::new(
            self.reference_epoch,
            rot * r_pf,
            rot * v_pf,
            mu,
        ))
    }

    /// Osculating elements of a Cartesian state, with the anomaly expressed as `kind`.
    pub fn from_cartesian(
        state: &CartesianState,
        kind: AnomalyKind,
    ) -> Result<Self, OrbitPropError> {
        let osc = cartesian_to_elements(&state.position, &state.velocity, state.mu)?;
        let true_elements = KeplerianElements {
            reference_epoch: state.epoch,
            semi_major_axis: osc.semi_major_axis,
            eccentricity: osc.eccentricity,
            inclination: osc.inclination,
            ascending_node_longitude: osc.ascending_node_longitude,
            periapsis_argument: osc.periapsis_argument,
            anomaly: osc.true_anomaly,
            anomaly_kind: AnomalyKind::True,
        };
        true_elements.with_anomaly_kind(kind)
    }
}

impl fmt::Display for KeplerianElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keplerian Elements @ epoch: {}", self.reference_epoch)?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(
            f,
            "  a   (semi-major axis)       = {:.3} m",
            self.semi_major_axis
        )?;
        writeln!(
            f,
            "  e   (eccentricity)          = {:.8}",
            self.eccentricity
        )?;
        writeln!(
            f,
            "  i   (inclination)           = {:.6} rad ({:.6}°)",
            self.inclination,
            self.inclination / RADEG
        )?;
        writeln!(
            f,
            "  Ω   (ascending node)        = {:.6} rad ({:.6}°)",
            self.ascending_node_longitude,
            self.ascending_node_longitude / RADEG
        )?;
        writeln!(
            f,
            "  ω   (argument of perigee)   = {:.6} rad ({:.6}°)",
            self.periapsis_argument,
            self.periapsis_argument / RADEG
        )?;
        let symbol = match self.anomaly_kind {
            AnomalyKind::Mean => "M   (mean anomaly)         ",
            AnomalyKind::True => "ν   (true anomaly)         ",
            AnomalyKind::Eccentric => "E   (eccentric anomaly)    ",
        };
        writeln!(
            f,
            "  {symbol} = {:.6} rad ({:.6}°)",
            self.anomaly,
            self.anomaly / RADEG
        )
    }
}

#[cfg(test)]
pub(crate) mod keplerian_element_test {
    use super::*;
    use crate::{constants::MU_EARTH, kepler::angle_diff};
    use approx::assert_relative_eq;

    pub(crate) fn scenario_elements() -> KeplerianElements {
        KeplerianElements::new(
            Epoch::from_gregorian_utc_hms(2004, 1, 1, 23, 30, 0),
            24_396_159.0,
            0.72831215,
            7.0 * RADEG,
            261.0 * RADEG,
            180.0 * RADEG,
            0.0,
            AnomalyKind::Mean,
        )
        .unwrap()
    }

    #[test]
    fn test_perigee_state() {
        let kep = scenario_elements();
        let state = kep.to_cartesian(MU_EARTH).unwrap();

        let rp = kep.semi_major_axis * (1.0 - kep.eccentricity);
        assert_relative_eq!(state.position.norm(), rp, max_relative = 1e-12);
        // At perigee the velocity is perpendicular to the radius
        assert!(state.position.dot(&state.velocity).abs() / (rp * state.velocity.norm()) < 1e-12);

        let vp = (MU_EARTH * (1.0 + kep.eccentricity) / rp).sqrt();
        assert_relative_eq!(state.velocity.norm(), vp, max_relative = 1e-12);
    }

    #[test]
    fn test_cartesian_round_trip() {
        let kep = KeplerianElements::new(
            Epoch::from_gregorian_utc_hms(2010, 6, 1, 0, 0, 0),
            7_200_000.0,
            0.05,
            0.9,
            2.1,
            0.3,
            1.7,
            AnomalyKind::True,
        )
        .unwrap();

        let back = KeplerianElements::from_cartesian(&kep.to_cartesian(MU_EARTH).unwrap(), AnomalyKind::True)
            .unwrap();

        assert_relative_eq!(back.semi_major_axis, kep.semi_major_axis, max_relative = 1e-12);
        assert_relative_eq!(back.eccentricity, kep.eccentricity, max_relative = 1e-10);
        assert_relative_eq!(back.inclination, kep.inclination, epsilon = 1e-12);
        assert!(angle_diff(back.ascending_node_longitude, kep.ascending_node_longitude).abs() < 1e-12);
        assert!(angle_diff(back.periapsis_argument, kep.periapsis_argument).abs() < 1e-10);
        assert!(angle_diff(back.anomaly, kep.anomaly).abs() < 1e-10);
        assert_eq!(back.anomaly_kind, AnomalyKind::True);
    }

    #[test]
    fn test_anomaly_kind_switch() {
        let kep = scenario_elements();
        let as_true = kep.with_anomaly_kind(AnomalyKind::True).unwrap();
        let as_ecc = kep.with_anomaly_kind(AnomalyKind::Eccentric).unwrap();
        assert_eq!(as_true.anomaly, 0.0);
        assert_eq!(as_ecc.anomaly, 0.0);

        let moved = KeplerianElements {
            anomaly: 1.0,
            ..kep
        };
        let back = moved
            .with_anomaly_kind(AnomalyKind::True)
            .unwrap()
            .with_anomaly_kind(AnomalyKind::Mean)
            .unwrap();
        assert_relative_eq!(back.anomaly, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_elements() {
        let epoch = Epoch::from_gregorian_utc_hms(2004, 1, 1, 0, 0, 0);
        let err = KeplerianElements::new(epoch, -1.0, 0.1, 0.0, 0.0, 0.0, 0.0, AnomalyKind::Mean)
            .unwrap_err();
        assert!(matches!(err, OrbitPropError::InvalidParameter { ref name, .. } if name == "a"));

        let err = KeplerianElements::new(epoch, 7e6, 1.0, 0.0, 0.0, 0.0, 0.0, AnomalyKind::Mean)
            .unwrap_err();
        assert!(matches!(err, OrbitPropError::InvalidParameter { ref name, .. } if name == "e"));

        let err =
            KeplerianElements::new(epoch, 7e6, 0.1, f64::NAN, 0.0, 0.0, 0.0, AnomalyKind::Mean)
                .unwrap_err();
        assert!(matches!(err, OrbitPropError::InvalidParameter { ref name, .. } if name == "i"));
    }
}
