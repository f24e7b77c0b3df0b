//! # Orbital state representations
//!
//! - [`keplerian_element`]: classical elements `(a, e, i, Ω, ω, anomaly)` with an
//!   explicit [`AnomalyKind`](keplerian_element::AnomalyKind) tag.
//! - [`equinoctial_element`]: non-singular elements `(a, h, k, p, q, λ)`.
//! - [`cartesian_state`]: inertial position/velocity paired with an epoch and μ.
//!
//! The [`OrbitalState`] enum holds either form and converts on demand.
use hifitime::Epoch;

use crate::{
    orbit_type::{
        cartesian_state::CartesianState,
        keplerian_element::{AnomalyKind, KeplerianElements},
    },
    orbitprop_errors::OrbitPropError,
};

/// Inertial position/velocity state.
pub mod cartesian_state;

/// Equinoctial orbital elements and related conversions.
pub mod equinoctial_element;

/// Classical Keplerian elements structure and utilities.
pub mod keplerian_element;

/// Spacecraft state in one of the supported representations.
///
/// Variants
/// --------
/// * `Keplerian`: elements as read from the configuration.
/// * `Cartesian`: position/velocity as integrated.
#[derive(Debug, Clone, PartialEq)]
pub enum OrbitalState {
    Keplerian { elements: KeplerianElements, mu: f64 },
    Cartesian(CartesianState),
}

impl OrbitalState {
    pub fn epoch(&self) -> Epoch {
        match self {
            OrbitalState::Keplerian { elements, .. } => elements.reference_epoch,
            OrbitalState::Cartesian(state) => state.epoch,
        }
    }

    /// Cartesian form of the state.
    pub fn to_cartesian(&self) -> Result<CartesianState, OrbitPropError> {
        match self {
            OrbitalState::Keplerian { elements, mu } => elements.to_cartesian(*mu),
            OrbitalState::Cartesian(state) => Ok(*state),
        }
    }

    /// Keplerian form of the state, with the anomaly expressed as `kind`.
    pub fn to_keplerian(&self, kind: AnomalyKind) -> Result<KeplerianElements, OrbitPropError> {
        match self {
            OrbitalState::Keplerian { elements, .. } => elements.with_anomaly_kind(kind),
            OrbitalState::Cartesian(state) => state.to_keplerian(kind),
        }
    }
}
