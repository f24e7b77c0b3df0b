//! Third-body point-mass attraction.
//!
//! The geocentric frame is not inertial with respect to the perturbing body, so
//! the indirect term (attraction of the body on the Earth) is subtracted:
//!
//! ```text
//! a = μ_b · [(r_b − r) / |r_b − r|³ − r_b / |r_b|³]
//! ```
use std::sync::Arc;

use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    constants::{MU_MOON, MU_SUN},
    ephemeris::Ephemeris,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties,
};

/// Gravitational perturbation of a single body.
#[derive(Clone)]
pub struct ThirdBodyAttraction {
    name: &'static str,
    mu: f64,
    ephemeris: Arc<dyn Ephemeris>,
}

impl ThirdBodyAttraction {
    pub fn new(name: &'static str, mu: f64, ephemeris: Arc<dyn Ephemeris>) -> Self {
        ThirdBodyAttraction {
            name,
            mu,
            ephemeris,
        }
    }

    pub fn sun(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self::new("Sun attraction", MU_SUN, ephemeris)
    }

    pub fn moon(ephemeris: Arc<dyn Ephemeris>) -> Self {
        Self::new("Moon attraction", MU_MOON, ephemeris)
    }
}

/// Direct minus indirect third-body term.
pub(crate) fn third_body_term(mu: f64, body: &Vector3<f64>, position: &Vector3<f64>) -> Vector3<f64> {
    let relative = body - position;
    let d = relative.norm();
    let rb = body.norm();
    mu * (relative / (d * d * d) - body / (rb * rb * rb))
}

impl ForceModel for ThirdBodyAttraction {
    fn acceleration(
        &self,
        state: &CartesianState,
        _spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let body = self.ephemeris.position(&state.epoch)?;
        Ok(third_body_term(self.mu, &body, &state.position))
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod third_body_test {
    use super::*;
    use crate::{
        constants::AU,
        ephemeris::{AnalyticalMoon, AnalyticalSun},
        force_models::force_models_test::{leo_state, spacecraft},
    };
    use approx::assert_relative_eq;
    use hifitime::Epoch;

    #[test]
    fn test_tidal_approximation_along_axis() {
        // Body on the +X axis, satellite on the +X axis: a ≈ 2 μ r / d³
        let body = move |_: &Epoch| -> Result<Vector3<f64>, OrbitPropError> {
            Ok(Vector3::new(AU, 0.0, 0.0))
        };
        let force = ThirdBodyAttraction::new("test body", MU_SUN, Arc::new(body));
        let state = leo_state();

        let acc = force.acceleration(&state, &spacecraft()).unwrap();
        let expected = 2.0 * MU_SUN * state.position.x / AU.powi(3);
        assert_relative_eq!(acc.x, expected, max_relative = 1e-4);
        assert!(acc.y.abs() < 1e-12 && acc.z.abs() < 1e-12);
    }

    #[test]
    fn test_sun_and_moon_magnitudes() {
        let state = leo_state();
        let sun = ThirdBodyAttraction::sun(Arc::new(AnalyticalSun));
        let moon = ThirdBodyAttraction::moon(Arc::new(AnalyticalMoon));

        let a_sun = sun.acceleration(&state, &spacecraft()).unwrap().norm();
        let a_moon = moon.acceleration(&state, &spacecraft()).unwrap().norm();

        // Typical LEO values: Sun ~5e-7, Moon ~1e-6 m/s²
        assert!(a_sun > 1e-8 && a_sun < 2e-6, "{a_sun}");
        assert!(a_moon > 1e-8 && a_moon < 4e-6, "{a_moon}");
        assert_eq!(sun.name(), "Sun attraction");
    }

    #[test]
    fn test_ephemeris_error_propagates() {
        let failing = |epoch: &Epoch| -> Result<Vector3<f64>, OrbitPropError> {
            Err(OrbitPropError::EphemerisOutOfRange {
                body: "test body",
                epoch: epoch.to_string(),
            })
        };
        let force = ThirdBodyAttraction::new("test body", MU_SUN, Arc::new(failing));
        assert!(matches!(
            force.acceleration(&leo_state(), &spacecraft()),
            Err(OrbitPropError::EphemerisOutOfRange { .. })
        ));
    }
}
