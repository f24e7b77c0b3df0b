//! Ocean tides.
//!
//! The ocean response to the Sun and Moon is represented by its degree-2
//! equilibrium part: the tide-raising potential of each body scaled by an
//! effective ocean Love number. The potential of the deformed ocean at the
//! spacecraft position `r` is
//!
//! ```text
//! U = k · μ_b · R⁵ / (2 · r_b³ · r³) · (3·cos²ψ − 1),    cos ψ = r̂ · r̂_b
//! ```
//!
//! and its gradient gives
//!
//! ```text
//! a = k · μ_b · R⁵ / (2 · r_b³ · r⁴) · [(3 − 15·cos²ψ) · r̂ + 6·cos ψ · r̂_b]
//! ```
use std::sync::Arc;

use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    constants::{EARTH_GRAVITY_RADIUS, MU_MOON, MU_SUN},
    ephemeris::Ephemeris,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties,
};

/// Effective degree-2 Love number of the ocean tide (about a tenth of the solid-Earth k2).
pub const OCEAN_LOVE_NUMBER: f64 = 0.03;

#[derive(Clone)]
pub struct OceanTides {
    sun: Arc<dyn Ephemeris>,
    moon: Arc<dyn Ephemeris>,
    love_number: f64,
    radius: f64,
}

impl OceanTides {
    pub fn new(sun: Arc<dyn Ephemeris>, moon: Arc<dyn Ephemeris>) -> Self {
        OceanTides {
            sun,
            moon,
            love_number: OCEAN_LOVE_NUMBER,
            radius: EARTH_GRAVITY_RADIUS,
        }
    }

    /// Override the effective Love number.
    pub fn with_love_number(mut self, love_number: f64) -> Self {
        self.love_number = love_number;
        self
    }

    fn tide_of(&self, mu_body: f64, body: &Vector3<f64>, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        let rb = body.norm();
        let r_hat = position / r;
        let rb_hat = body / rb;
        let cos_psi = r_hat.dot(&rb_hat);

        let k = self.love_number * mu_body * self.radius.powi(5) / (2.0 * rb.powi(3) * r.powi(4));
        k * ((3.0 - 15.0 * cos_psi * cos_psi) * r_hat + 6.0 * cos_psi * rb_hat)
    }
}

impl ForceModel for OceanTides {
    fn acceleration(
        &self,
        state: &CartesianState,
        _spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let sun = self.sun.position(&state.epoch)?;
        let moon = self.moon.position(&state.epoch)?;
        Ok(self.tide_of(MU_SUN, &sun, &state.position) + self.tide_of(MU_MOON, &moon, &state.position))
    }

    fn name(&self) -> &'static str {
        "ocean tides"
    }
}
