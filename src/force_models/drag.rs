//! Atmospheric drag.
//!
//! ```text
//! a = −½ · Cd · (A/m) · ρ(h) · |v_rel| · v_rel,     v_rel = v − ω⊕ × r
//! ```
//!
//! The atmosphere co-rotates with the Earth about the inertial Z axis.
use std::sync::Arc;

use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    atmosphere::AtmosphereModel, constants::OMEGA_EARTH,
    orbit_type::cartesian_state::CartesianState, orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties,
};

#[derive(Clone)]
pub struct AtmosphericDrag {
    atmosphere: Arc<dyn AtmosphereModel>,
    earth_rotation: Vector3<f64>,
}

impl AtmosphericDrag {
    pub fn new(atmosphere: Arc<dyn AtmosphereModel>) -> Self {
        AtmosphericDrag {
            atmosphere,
            earth_rotation: Vector3::new(0.0, 0.0, OMEGA_EARTH),
        }
    }

    /// Velocity relative to the rotating atmosphere.
    pub fn relative_velocity(&self, state: &CartesianState) -> Vector3<f64> {
        state.velocity - self.earth_rotation.cross(&state.position)
    }
}

impl ForceModel for AtmosphericDrag {
    fn acceleration(
        &self,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let altitude = self.atmosphere.altitude_of(state.position.norm());
        let density = self.atmosphere.density(altitude)?;

        let v_rel = self.relative_velocity(state);
        let ballistic = 0.5 * spacecraft.drag_coefficient * spacecraft.area_to_mass();
        Ok(-ballistic * density * v_rel.norm() * v_rel)
    }

    fn name(&self) -> &'static str {
        "atmospheric drag"
    }
}
