//! # Force models
//!
//! Each perturbing effect implements [`ForceModel`]: a pure function of the
//! spacecraft state (position, velocity, epoch) and its physical properties that
//! returns an acceleration in the inertial frame, m/s². Models hold only
//! immutable data, so the integrator may evaluate them any number of times with
//! trial states.
//!
//! A [`ForceStack`] is the ordered set of enabled models for one propagation run;
//! its [`ForceStack::combined_acceleration`] is the sum of all contributions.
//!
//! # Available models
//!
//! - [`CentralBodyGravity`]: spherical harmonics truncated at (degree, order), point mass at degree 0
//! - [`ThirdBodyAttraction`]: Sun or Moon point-mass perturbation
//! - [`AtmosphericDrag`]: drag through a co-rotating atmosphere
//! - [`SolarRadiationPressure`]: cannonball SRP with shadow function
//! - [`OceanTides`]: degree-2 equilibrium ocean tide
//! - [`Relativity`]: Schwarzschild post-Newtonian correction
use log::{debug, warn};
use nalgebra::Vector3;

use crate::{
    orbit_type::cartesian_state::CartesianState, orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties, time::format_epoch,
};

pub mod drag;
pub mod gravity;
pub mod ocean_tides;
pub mod relativity;
pub mod srp;
pub mod third_body;

pub use drag::AtmosphericDrag;
pub use gravity::CentralBodyGravity;
pub use ocean_tides::OceanTides;
pub use relativity::Relativity;
pub use srp::{ShadowModel, SolarRadiationPressure};
pub use third_body::ThirdBodyAttraction;

/// One physical contributor to the spacecraft acceleration.
pub trait ForceModel: Send + Sync {
    /// Acceleration contribution at `state`, in the frame of `state.position` (m/s²).
    ///
    /// # Arguments
    ///
    /// * `state` - Current inertial state; `state.epoch` drives epoch-dependent terms
    /// * `spacecraft` - Mass and surface properties
    fn acceleration(
        &self,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError>;

    /// Force model name for debugging and logging
    fn name(&self) -> &'static str;
}

/// Ordered, immutable collection of enabled force models.
#[derive(Default)]
pub struct ForceStack {
    models: Vec<Box<dyn ForceModel>>,
}

impl ForceStack {
    pub fn new() -> Self {
        ForceStack { models: Vec::new() }
    }

    /// Append a model; evaluation order follows insertion order.
    pub fn push(&mut self, model: Box<dyn ForceModel>) {
        debug!("Adding force model: {}", model.name());
        if self.models.iter().any(|m| m.name() == model.name()) {
            warn!("Force model '{}' is added more than once", model.name());
        }
        self.models.push(model);
    }

    /// Builder-style [`ForceStack::push`].
    pub fn with(mut self, model: impl ForceModel + 'static) -> Self {
        self.push(Box::new(model));
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Names of the models, in evaluation order.
    pub fn model_names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    fn checked(
        model: &dyn ForceModel,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        let acc = model.acceleration(state, spacecraft)?;
        if acc.iter().all(|v| v.is_finite()) {
            Ok(acc)
        } else {
            Err(OrbitPropError::NonFiniteAcceleration {
                model: model.name(),
                epoch: format_epoch(&state.epoch),
                position: state.position.into(),
                acceleration: acc.into(),
            })
        }
    }

    /// Sum of all model contributions.
    ///
    /// Fails with [`OrbitPropError::NonFiniteAcceleration`] naming the first model whose
    /// contribution is not finite, or with the model's own error.
    pub fn combined_acceleration(
        &self,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        self.models
            .iter()
            .try_fold(Vector3::zeros(), |total, model| {
                Ok(total + Self::checked(model.as_ref(), state, spacecraft)?)
            })
    }

    /// Individual contributions, for debugging.
    pub fn acceleration_breakdown(
        &self,
        state: &CartesianState,
        spacecraft: &SpacecraftProperties,
    ) -> Result<Vec<(&'static str, Vector3<f64>)>, OrbitPropError> {
        self.models
            .iter()
            .map(|model| Ok((model.name(), Self::checked(model.as_ref(), state, spacecraft)?)))
            .collect()
    }
}

impl std::fmt::Debug for ForceStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForceStack")
            .field("models", &self.model_names())
            .finish()
    }
}
