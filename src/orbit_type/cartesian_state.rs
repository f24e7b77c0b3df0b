//! # Cartesian state
//!
//! Inertial position (m) and velocity (m/s) at an absolute epoch, together with the
//! gravitational parameter used to convert it to orbital elements.
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::StateVector,
    orbit_type::keplerian_element::{AnomalyKind, KeplerianElements},
    orbitprop_errors::OrbitPropError,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianState {
    pub epoch: Epoch,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub mu: f64,
}

impl CartesianState {
    pub fn new(epoch: Epoch, position: Vector3<f64>, velocity: Vector3<f64>, mu: f64) -> Self {
        CartesianState {
            epoch,
            position,
            velocity,
            mu,
        }
    }

    /// Build a state from the flat `[x, y, z, vx, vy, vz]` vector used by the integrator.
    pub fn from_state_vector(epoch: Epoch, y: &StateVector, mu: f64) -> Self {
        CartesianState {
            epoch,
            position: Vector3::new(y[0], y[1], y[2]),
            velocity: Vector3::new(y[3], y[4], y[5]),
            mu,
        }
    }

    /// Flatten position and velocity into `[x, y, z, vx, vy, vz]`.
    pub fn to_state_vector(&self) -> StateVector {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        ]
    }

    /// Index and value of the first non-finite component, if any.
    pub fn first_non_finite(&self) -> Option<(usize, f64)> {
        self.to_state_vector()
            .into_iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
    }

    /// Distance to the central body, m.
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Specific orbital energy `v²/2 − μ/r`, J/kg.
    pub fn specific_energy(&self) -> f64 {
        0.5 * self.velocity.norm_squared() - self.mu / self.radius()
    }

    /// Osculating Keplerian elements of this state.
    pub fn to_keplerian(&self, kind: AnomalyKind) -> Result<KeplerianElements, OrbitPropError> {
        KeplerianElements::from_cartesian(self, kind)
    }
}
