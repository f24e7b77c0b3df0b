pub mod atmosphere;
pub mod config;
pub mod constants;
pub mod env_state;
pub mod ephemeris;
pub mod force_models;
pub mod gravity_field;
pub mod integrator;
pub mod kepler;
mod orb_elem;
pub mod orbit_type;
pub mod orbitprop_errors;
pub mod propagator;
pub mod ref_system;
pub mod report;
pub mod sampler;
pub mod scenario;
pub mod spacecraft;
pub mod time;

pub use orbitprop_errors::OrbitPropError;
pub use propagator::{PropagationReport, Propagator};
pub use scenario::{Scenario, ScenarioOutcome};
