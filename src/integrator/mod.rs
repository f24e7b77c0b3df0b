//! # Adaptive Runge–Kutta integration
//!
//! The propagator hands the integrator a flat state `[x, y, z, vx, vy, vz]` and
//! a derivative function ([`OdeSystem`]). The integrator advances it with an
//! embedded Runge–Kutta pair ([`rkf78::Rkf78`]), choosing each step so that the
//! local error estimate satisfies the per-component tolerance
//! `atol_i + rtol_i · |y_i|` ([`Tolerances`]), and keeps every accepted step in
//! `[min_step, max_step]` ([`StepSizeControl`]).
//!
//! A run goes through the states of [`IntegratorStatus`]:
//!
//! ```text
//! Initialized ──step──▶ Stepping ──finish──▶ Converged
//!                           │
//!                           └──error──▶ Diverged
//! ```
use crate::{
    constants::StateVector, orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
};

pub mod rkf78;

pub use rkf78::Rkf78;

/// First-order ODE `dy/dt = f(t, y)` on the 6-dimensional orbital state.
///
/// `t` is the elapsed time in seconds since the initial epoch of the run.
pub trait OdeSystem {
    fn derivatives(&self, t: f64, y: &StateVector) -> Result<StateVector, OrbitPropError>;
}

impl<F> OdeSystem for F
where
    F: Fn(f64, &StateVector) -> Result<StateVector, OrbitPropError>,
{
    fn derivatives(&self, t: f64, y: &StateVector) -> Result<StateVector, OrbitPropError> {
        self(t, y)
    }
}

/// Per-component absolute and relative error tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub absolute: StateVector,
    pub relative: StateVector,
}

impl Tolerances {
    /// Same tolerance on every component.
    pub fn uniform(absolute: f64, relative: f64) -> Self {
        Tolerances {
            absolute: [absolute; 6],
            relative: [relative; 6],
        }
    }

    /// Tolerances derived from a position tolerance `ΔP` (m) at an orbital state.
    ///
    /// ```text
    /// atol = [ΔP, ΔP, ΔP, ΔV, ΔV, ΔV],   ΔV = μ · ΔP / (|v| · |r|²)
    /// rtol = ΔP / |r|
    /// ```
    ///
    /// Fails with [`OrbitPropError::InvalidParameter`] for a non-positive tolerance or a
    /// state with zero position or velocity.
    pub fn from_position_tolerance(
        position_tolerance: f64,
        state: &CartesianState,
    ) -> Result<Self, OrbitPropError> {
        if !(position_tolerance.is_finite() && position_tolerance > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "positionTolerance",
                position_tolerance,
                "must be finite and > 0",
            ));
        }
        let r2 = state.position.norm_squared();
        let v = state.velocity.norm();
        if r2 == 0.0 || v == 0.0 {
            return Err(OrbitPropError::SingularElements(
                "tolerances need a non-zero position and velocity".into(),
            ));
        }

        let dp = position_tolerance;
        let dv = state.mu * dp / (v * r2);
        let rel = dp / r2.sqrt();
        Ok(Tolerances {
            absolute: [dp, dp, dp, dv, dv, dv],
            relative: [rel; 6],
        })
    }

    /// Error scale of component `i` for states `y` and `y_new`.
    pub(crate) fn scale(&self, i: usize, y: f64, y_new: f64) -> f64 {
        self.absolute[i] + self.relative[i] * y.abs().max(y_new.abs())
    }

    fn validate(&self) -> Result<(), OrbitPropError> {
        let all_positive = self
            .absolute
            .iter()
            .chain(self.relative.iter())
            .all(|v| v.is_finite() && *v >= 0.0);
        let usable = (0..6).all(|i| self.absolute[i] > 0.0 || self.relative[i] > 0.0);
        if all_positive && usable {
            Ok(())
        } else {
            Err(OrbitPropError::invalid_parameter(
                "tolerances",
                format!("{self:?}"),
                "tolerances must be finite, >= 0 and not both zero",
            ))
        }
    }
}

/// Step-size bounds and controller constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizeControl {
    /// Smallest admissible step, s (> 0)
    pub min_step: f64,
    /// Largest admissible step, s (≥ `min_step`)
    pub max_step: f64,
    /// First trial step; estimated from the dynamics when `None`
    pub initial_step: Option<f64>,
    /// Consecutive rejections allowed before giving up
    pub max_rejections: usize,
    /// Safety factor applied to the optimal step
    pub safety: f64,
    /// Lower bound of the step scaling factor
    pub min_scale: f64,
    /// Upper bound of the step scaling factor
    pub max_scale: f64,
}

impl StepSizeControl {
    pub fn new(min_step: f64, max_step: f64) -> Result<Self, OrbitPropError> {
        let control = StepSizeControl {
            min_step,
            max_step,
            ..Default::default()
        };
        control.validate()?;
        Ok(control)
    }

    pub(crate) fn validate(&self) -> Result<(), OrbitPropError> {
        if !(self.min_step.is_finite() && self.min_step > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "minStep",
                self.min_step,
                "must be finite and > 0",
            ));
        }
        if !(self.max_step.is_finite() && self.max_step >= self.min_step) {
            return Err(OrbitPropError::invalid_parameter(
                "maxStep",
                self.max_step,
                "must be finite and >= minStep",
            ));
        }
        if let Some(h) = self.initial_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(OrbitPropError::invalid_parameter(
                    "initialStep",
                    h,
                    "must be finite and > 0",
                ));
            }
        }
        if self.max_rejections == 0 {
            return Err(OrbitPropError::invalid_parameter(
                "maxRejections",
                self.max_rejections,
                "must be >= 1",
            ));
        }
        Ok(())
    }

    /// Clamp a step magnitude into `[min_step, max_step]`.
    pub fn clamp(&self, h: f64) -> f64 {
        h.clamp(self.min_step, self.max_step)
    }

    /// Fit a trial step magnitude `h` to the `remaining` part of the window.
    ///
    /// A step that would pass the end of the window is cut to `remaining`. A step
    /// that would leave a remainder shorter than `min_step` is replaced by half of
    /// the window, or by all of it when the window is shorter than two `min_step`.
    ///
    /// Return
    /// ------
    /// * A magnitude `≤ remaining`, equal to `remaining` when the step ends the window.
    pub fn fit_to_remaining(&self, h: f64, remaining: f64) -> f64 {
        if h >= remaining {
            remaining
        } else if remaining - h >= self.min_step {
            h
        } else if remaining >= 2.0 * self.min_step {
            0.5 * remaining
        } else {
            remaining.min(self.max_step)
        }
    }
}

impl Default for StepSizeControl {
    fn default() -> Self {
        StepSizeControl {
            min_step: 1e-3,
            max_step: 1e3,
            initial_step: None,
            max_rejections: 100,
            safety: 0.9,
            min_scale: 0.2,
            max_scale: 10.0,
        }
    }
}

/// Lifecycle of one integration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorStatus {
    #[default]
    Initialized,
    Stepping,
    Converged,
    Diverged,
}

/// Counters of one integration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
    /// Smallest accepted step magnitude (`+∞` before the first step)
    pub min_accepted_step: f64,
    /// Largest accepted step magnitude (`0` before the first step)
    pub max_accepted_step: f64,
}

impl Default for IntegratorStats {
    fn default() -> Self {
        IntegratorStats {
            accepted_steps: 0,
            rejected_steps: 0,
            evaluations: 0,
            min_accepted_step: f64::INFINITY,
            max_accepted_step: 0.0,
        }
    }
}

/// One accepted integration step, from `t_start` to `t_start + h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedStep {
    pub t_start: f64,
    pub y_start: StateVector,
    /// Signed step size
    pub h: f64,
    pub y_end: StateVector,
    /// Normalized error estimate (≤ 1)
    pub error: f64,
    /// The step was cut to end exactly on the limit given to [`Rkf78::step_to`]
    pub reached_limit: bool,
}

impl AcceptedStep {
    pub fn t_end(&self) -> f64 {
        self.t_start + self.h
    }
}
