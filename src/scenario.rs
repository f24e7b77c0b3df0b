//! # Scenario
//!
//! One complete propagation run: the three configuration sets plus the data
//! providers, wired into an initial Cartesian state, a force stack and a
//! [`Propagator`].
//!
//! ```text
//! ScenarioConfig ──┬── ElementsConfig ──▶ initial CartesianState (TT epoch)
//!                  ├── ForceConfig ─────▶ ForceStack ◀── PropagationEnv
//!                  └── IntegratorConfig ▶ step bounds, tolerance, window, sampling
//!                                              │
//!                                              ▼
//!                                         Propagator ──▶ Trajectory + final state
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use orbitprop::{sampler::SampleBounds, scenario::Scenario};
//!
//! let scenario = Scenario::from_texts(forces_txt, elements_txt, integrator_txt)?;
//! let outcome = scenario.run(SampleBounds::Both)?;
//! for sample in &outcome.trajectory {
//!     println!("{} {:.3}", sample.elapsed, sample.elements.semi_major_axis);
//! }
//! ```
use hifitime::Epoch;
use log::debug;

use crate::{
    config::ScenarioConfig,
    env_state::PropagationEnv,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    propagator::{PropagationReport, Propagator},
    sampler::{SampleBounds, Sampler, Trajectory},
    time::{shift, to_integration_scale},
};

/// Result of [`Scenario::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub trajectory: Trajectory,
    pub report: PropagationReport,
}

impl ScenarioOutcome {
    pub fn final_state(&self) -> &CartesianState {
        &self.report.final_state
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
    env: PropagationEnv,
}

impl Scenario {
    pub fn new(config: ScenarioConfig, env: PropagationEnv) -> Self {
        Scenario { config, env }
    }

    /// Scenario from the text of the three `key: value` files, with the default environment.
    pub fn from_texts(
        forces: &str,
        elements: &str,
        integrator: &str,
    ) -> Result<Self, OrbitPropError> {
        Ok(Scenario::new(
            ScenarioConfig::from_texts(forces, elements, integrator)?,
            PropagationEnv::default(),
        ))
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn env(&self) -> &PropagationEnv {
        &self.env
    }

    /// Initial inertial state, with its epoch expressed in TT.
    pub fn initial_state(&self) -> Result<CartesianState, OrbitPropError> {
        let mut state = self.config.elements.elements.to_cartesian(self.env.mu())?;
        state.epoch = to_integration_scale(&state.epoch);
        Ok(state)
    }

    /// End of the propagation window.
    pub fn target_epoch(&self) -> Epoch {
        let start = to_integration_scale(&self.config.elements.elements.reference_epoch);
        shift(&start, self.config.integrator.propagation_time)
    }

    /// Propagator with the configured forces, spacecraft and integrator bounds.
    pub fn propagator(&self) -> Result<Propagator, OrbitPropError> {
        let integrator = &self.config.integrator;
        Propagator::new(
            self.env.build_force_stack(&self.config.forces)?,
            self.config.elements.spacecraft,
            integrator.step_control()?,
            integrator.position_tolerance,
        )
    }

    /// Run the scenario, recording every sample.
    pub fn run(&self, bounds: SampleBounds) -> Result<ScenarioOutcome, OrbitPropError> {
        let mut trajectory = Trajectory::new();
        let report = self.run_with(bounds, &mut trajectory)?;
        debug!(
            "Scenario produced {} samples, final radius {:.3} m",
            trajectory.len(),
            report.final_state.radius()
        );
        Ok(ScenarioOutcome { trajectory, report })
    }

    /// Run the scenario with a caller-supplied sampler.
    pub fn run_with<S: Sampler + ?Sized>(
        &self,
        bounds: SampleBounds,
        sampler: &mut S,
    ) -> Result<PropagationReport, OrbitPropError> {
        let initial = self.initial_state()?;
        let propagator = self.propagator()?;
        debug!(
            "Initial orbit:\n{}",
            self.config.elements.elements
        );
        propagator.propagate(
            &initial,
            self.target_epoch(),
            self.config.integrator.sample_interval,
            bounds,
            sampler,
        )
    }
}
