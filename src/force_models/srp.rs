//! Solar radiation pressure.
//!
//! Cannonball model with the Sun–spacecraft direction `û`:
//!
//! ```text
//! a = ν · Cr · (A/m) · P_ref · (d_ref / d)² · û
//! ```
//!
//! where `ν ∈ [0, 1]` is the fraction of the solar disk visible from the
//! spacecraft ([`ShadowModel`]), `P_ref` the pressure at `d_ref = 1 AU` and `d`
//! the Sun–spacecraft distance.
use std::{f64::consts::PI, sync::Arc};

use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    constants::{AU, EARTH_MAJOR_AXIS, SOLAR_PRESSURE_1AU, SUN_RADIUS},
    ephemeris::Ephemeris,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties,
};

/// Shadow/eclipse model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowModel {
    /// No shadow consideration (always in sunlight)
    None,
    /// Earth shadow as a cylinder of radius R⊕ behind the Earth
    Cylindrical,
    /// Conical umbra and penumbra with partial occultation of the solar disk
    #[default]
    Conical,
}

#[derive(Clone)]
pub struct SolarRadiationPressure {
    sun: Arc<dyn Ephemeris>,
    shadow: ShadowModel,
    occulting_radius: f64,
}

impl SolarRadiationPressure {
    pub fn new(sun: Arc<dyn Ephemeris>, shadow: ShadowModel) -> Self {
        SolarRadiationPressure {
            sun,
            shadow,
            occulting_radius: EARTH_MAJOR_AXIS,
        }
    }

    /// Visible fraction of the solar disk (0 = umbra, 1 = full sunlight).
    pub fn illumination(&self, position: &Vector3<f64>, sun: &Vector3<f64>) -> f64 {
        match self.shadow {
            ShadowModel::None => 1.0,
            ShadowModel::Cylindrical => {
                let sun_dir = sun.normalize();
                let along = position.dot(&sun_dir);
                let across = (position - along * sun_dir).norm();
                if along < 0.0 && across < self.occulting_radius {
                    0.0
                } else {
                    1.0
                }
            }
            ShadowModel::Conical => self.conical_illumination(position, sun),
        }
    }

    fn conical_illumination(&self, position: &Vector3<f64>, sun: &Vector3<f64>) -> f64 {
        let to_sun = sun - position;
        let r = position.norm();
        let d = to_sun.norm();

        // Apparent radii of the Sun and the occulting body, and their separation
        let a = (SUN_RADIUS / d).asin();
        let b = (self.occulting_radius / r).min(1.0).asin();
        let c = (-position.dot(&to_sun) / (r * d)).clamp(-1.0, 1.0).acos();

        if c >= a + b {
            1.0
        } else if c <= b - a {
            0.0
        } else if c <= a - b {
            // Occulting disk entirely inside the solar disk
            1.0 - (b * b) / (a * a)
        } else {
            let x = (c * c + a * a - b * b) / (2.0 * c);
            let y = (a * a - x * x).max(0.0).sqrt();
            let area = a * a * (x / a).clamp(-1.0, 1.0).acos()
                + b * b * ((c - x) / b).clamp(-1.0, 1.0).acos()
                - c * y;
            (1.0 - area / (PI * a * a)).clamp(0.0, 1.0)
        }
    }
}

impl ForceModel for SolarRadiationPressure {
    fn acceleration(
        &self,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let sun = self.sun.position(&state.epoch)?;
        let nu = self.illumination(&state.position, &sun);
        if nu == 0.0 {
            return Ok(Vector3::zeros());
        }

        let from_sun = state.position - sun;
        let d = from_sun.norm();
        let pressure = SOLAR_PRESSURE_1AU * (AU / d).powi(2);
        Ok(nu
            * spacecraft.radiation_pressure_coefficient
            * spacecraft.area_to_mass()
            * pressure
            * from_sun
            / d)
    }

    fn name(&self) -> &'static str {
        "solar radiation pressure"
    }
}
