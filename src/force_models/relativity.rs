//! Post-Newtonian (Schwarzschild) correction of the central body.
//!
//! ```text
//! a = μ / (c² r³) · [(4μ/r − v²) · r + 4 (r · v) · v]
//! ```
use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    constants::VLIGHT, orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError, spacecraft::SpacecraftProperties,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relativity {
    mu: f64,
}

impl Relativity {
    pub fn new(mu: f64) -> Self {
        Relativity { mu }
    }
}

impl ForceModel for Relativity {
    fn acceleration(
        &self,
        state: &CartesianState,
        _spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let r = &state.position;
        let v = &state.velocity;
        let rn = r.norm();
        let factor = self.mu / (VLIGHT * VLIGHT * rn.powi(3));
        Ok(factor * ((4.0 * self.mu / rn - v.norm_squared()) * r + 4.0 * r.dot(v) * v))
    }

    fn name(&self) -> &'static str {
        "relativistic correction"
    }
}

#[cfg(test)]
mod relativity_test {
    use super::*;
    use crate::{
        constants::MU_EARTH,
        force_models::force_models_test::{leo_state, spacecraft},
    };
    use approx::assert_relative_eq;

    #[test]
    fn test_circular_orbit_is_radial_outward() {
        let state = leo_state();
        let acc = Relativity::new(MU_EARTH)
            .acceleration(&state, &spacecraft())
            .unwrap();

        // r · v = 0 and v² = μ/r: a = 3 μ² / (c² r³) r̂
        let r = state.position.norm();
        let expected = 3.0 * MU_EARTH * MU_EARTH / (VLIGHT * VLIGHT * r.powi(3));
        assert_relative_eq!(acc.norm(), expected, max_relative = 1e-10);
        assert!(acc.dot(&state.position) > 0.0);
        // ~1e-8 m/s² in LEO
        assert!(acc.norm() < 1e-7);
    }
}
