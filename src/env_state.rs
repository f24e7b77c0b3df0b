//! # Propagation environment
//!
//! [`PropagationEnv`] is the **shared, immutable environment** of a propagation:
//! the data providers that force models read but never modify.
//!
//! ```text
//! PropagationEnv
//! ├── gravity_field (Arc<GravityField>)       spherical harmonic coefficients
//! ├── sun, moon     (Arc<dyn Ephemeris>)      geocentric body positions
//! ├── atmosphere    (Option<Arc<dyn AtmosphereModel>>)  overrides ATMmodel
//! └── shadow_model  (ShadowModel)             SRP eclipse function
//! ```
//!
//! The environment is cheap to clone (reference-counted providers) and can be
//! shared between threads running independent propagations.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orbitprop::env_state::PropagationEnv;
//!
//! let env = PropagationEnv::default();
//! let forces = env.build_force_stack(&force_config)?;
//! ```
use std::{fmt::Debug, sync::Arc};

use log::debug;

use crate::{
    atmosphere::{
        AtmosphereModel, AtmosphereModelKind, ExponentialAtmosphere,
        PiecewiseExponentialAtmosphere,
    },
    config::ForceConfig,
    ephemeris::{AnalyticalMoon, AnalyticalSun, Ephemeris},
    force_models::{
        AtmosphericDrag, CentralBodyGravity, ForceStack, OceanTides, Relativity, ShadowModel,
        SolarRadiationPressure, ThirdBodyAttraction,
    },
    gravity_field::GravityField,
    orbitprop_errors::OrbitPropError,
};

/// Data providers of a propagation run.
#[derive(Clone)]
pub struct PropagationEnv {
    pub gravity_field: Arc<GravityField>,
    pub sun: Arc<dyn Ephemeris>,
    pub moon: Arc<dyn Ephemeris>,
    /// When set, used instead of the model selected by `ATMmodel`
    pub atmosphere: Option<Arc<dyn AtmosphereModel>>,
    pub shadow_model: ShadowModel,
}

impl Default for PropagationEnv {
    /// EGM96 (degree 6), analytical Sun and Moon, conical shadow.
    fn default() -> Self {
        PropagationEnv {
            gravity_field: Arc::new(GravityField::egm96()),
            sun: Arc::new(AnalyticalSun),
            moon: Arc::new(AnalyticalMoon),
            atmosphere: None,
            shadow_model: ShadowModel::default(),
        }
    }
}

impl PropagationEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity_field(mut self, field: GravityField) -> Self {
        self.gravity_field = Arc::new(field);
        self
    }

    pub fn with_sun(mut self, sun: impl Ephemeris + 'static) -> Self {
        self.sun = Arc::new(sun);
        self
    }

    pub fn with_moon(mut self, moon: impl Ephemeris + 'static) -> Self {
        self.moon = Arc::new(moon);
        self
    }

    pub fn with_atmosphere(mut self, atmosphere: impl AtmosphereModel + 'static) -> Self {
        self.atmosphere = Some(Arc::new(atmosphere));
        self
    }

    pub fn with_shadow_model(mut self, shadow_model: ShadowModel) -> Self {
        self.shadow_model = shadow_model;
        self
    }

    /// Gravitational parameter of the central body.
    pub fn mu(&self) -> f64 {
        self.gravity_field.mu()
    }

    fn atmosphere_for(&self, kind: AtmosphereModelKind) -> Arc<dyn AtmosphereModel> {
        match (&self.atmosphere, kind) {
            (Some(custom), _) => Arc::clone(custom),
            (None, AtmosphereModelKind::Exponential) => Arc::new(ExponentialAtmosphere::default()),
            (None, AtmosphereModelKind::PiecewiseExponential) => {
                Arc::new(PiecewiseExponentialAtmosphere)
            }
        }
    }

    /// Assemble the force stack described by `config`.
    ///
    /// The central body is always the first model; the others follow in the order
    /// Sun, Moon, drag, SRP, ocean tides, relativity.
    ///
    /// Return
    /// ------
    /// * The stack, or [`OrbitPropError::GravityFieldTooSmall`] when the gravity field
    ///   does not reach `(GMdegree, GMorder)`.
    pub fn build_force_stack(&self, config: &ForceConfig) -> Result<ForceStack, OrbitPropError> {
        let mut stack = ForceStack::new();

        let gravity = if config.gravity {
            CentralBodyGravity::new(Arc::clone(&self.gravity_field), config.degree, config.order)?
        } else {
            CentralBodyGravity::point_mass(Arc::clone(&self.gravity_field))
        };
        stack.push(Box::new(gravity));

        if config.sun {
            stack.push(Box::new(ThirdBodyAttraction::sun(Arc::clone(&self.sun))));
        }
        if config.moon {
            stack.push(Box::new(ThirdBodyAttraction::moon(Arc::clone(&self.moon))));
        }
        if config.atmosphere {
            let atmosphere = self.atmosphere_for(config.atmosphere_model);
            debug!("Using atmosphere model: {}", atmosphere.name());
            stack.push(Box::new(AtmosphericDrag::new(atmosphere)));
        }
        if config.solar_radiation_pressure {
            stack.push(Box::new(SolarRadiationPressure::new(
                Arc::clone(&self.sun),
                self.shadow_model,
            )));
        }
        if config.ocean_tides {
            stack.push(Box::new(OceanTides::new(
                Arc::clone(&self.sun),
                Arc::clone(&self.moon),
            )));
        }
        if config.relativity {
            stack.push(Box::new(Relativity::new(self.mu())));
        }

        Ok(stack)
    }
}

impl Debug for PropagationEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationEnv")
            .field("mu", &self.gravity_field.mu())
            .field("max_degree", &self.gravity_field.max_degree())
            .field(
                "atmosphere",
                &self.atmosphere.as_ref().map(|atm| atm.name()),
            )
            .field("shadow_model", &self.shadow_model)
            .finish()
    }
}
