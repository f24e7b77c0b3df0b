//! # Numerical propagator
//!
//! [`Propagator`] drives the adaptive integrator over the equations of motion
//!
//! ```text
//! dr/dt = v
//! dv/dt = Σ aᵢ(t, r, v)      (ForceStack::combined_acceleration)
//! ```
//!
//! from the epoch of an initial [`CartesianState`] to a target epoch, forward or
//! backward, and reports the state on a fixed sampling grid.
//!
//! ## Sampling
//!
//! The integrator chooses its own steps. When an accepted step `[t, t + h]`
//! crosses one or more grid points `k · Δ`, each of them is reached by a single
//! exact sub-step from `t`, so the grid does not influence the accepted step
//! sequence: the final state is the same whatever the sampling interval.
//! The last accepted step is cut to end on the target epoch, so the force
//! models are never evaluated outside the propagation window.
//!
//! ```text
//! accepted:  |-------h0-------|-----------h1-----------|----h2----|
//! grid:      0        Δ              2Δ          3Δ       target
//!            └─sample └─sub-step      └─sub-step  └─...    └─final
//! ```
//!
//! ## Termination
//!
//! * the target epoch is reached (the last sample is flagged `is_final`),
//! * the sampler returns [`ControlFlow::Break`] (the run stops after that sample;
//!   a break on the target sample itself still counts as reaching the target),
//! * or an error is returned (integration failure, force model domain error…).
//!
//! A zero-length window (`target == initial.epoch`) is a trivial success: one
//! final sample is emitted and the initial state is returned unchanged.
use std::ops::ControlFlow;

use hifitime::Epoch;
use log::{debug, trace, warn};

use crate::{
    constants::{Second, StateVector},
    force_models::ForceStack,
    integrator::{IntegratorStats, OdeSystem, Rkf78, StepSizeControl, Tolerances},
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    sampler::{Sample, SampleBounds, Sampler},
    spacecraft::SpacecraftProperties,
    time::{duration_between, format_epoch, shift},
};

/// Relative slack used to decide that the target lies on the sampling grid.
const GRID_EPSILON: f64 = 1e-9;

/// Outcome of a propagation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagationReport {
    /// State at the target epoch, or at the sample where the sampler stopped the run
    pub final_state: CartesianState,
    pub stats: IntegratorStats,
    /// `true` when the sampler stopped the run before the target epoch
    pub stopped_early: bool,
}

/// Equations of motion seen by the integrator.
struct Dynamics<'a> {
    forces: &'a ForceStack,
    spacecraft: &'a SpacecraftProperties,
    start: Epoch,
    mu: f64,
}

impl OdeSystem for Dynamics<'_> {
    fn derivatives(&self, t: f64, y: &StateVector) -> Result<StateVector, OrbitPropError> {
        let state = CartesianState::from_state_vector(shift(&self.start, t), y, self.mu);
        let acc = self.forces.combined_acceleration(&state, self.spacecraft)?;
        Ok([y[3], y[4], y[5], acc.x, acc.y, acc.z])
    }
}

/// Numerical orbit propagator.
///
/// Owns the force stack and the spacecraft properties of a run; both are
/// immutable once the propagator is built, so a propagator can be reused for
/// several runs and independent propagators can run on separate threads.
pub struct Propagator {
    forces: ForceStack,
    spacecraft: SpacecraftProperties,
    control: StepSizeControl,
    position_tolerance: f64,
}

impl Propagator {
    /// Build a propagator.
    ///
    /// Arguments
    /// ---------
    /// * `forces`: enabled force models, including the central-body gravity.
    /// * `spacecraft`: mass and surface properties.
    /// * `control`: step bounds and step controller constants.
    /// * `position_tolerance`: local position error tolerance `ΔP` (m), from which the
    ///   per-component tolerances are derived at the initial state of each run.
    ///
    /// Return
    /// ------
    /// * The propagator, or [`OrbitPropError::InvalidParameter`] for invalid step bounds or tolerance.
    pub fn new(
        forces: ForceStack,
        spacecraft: SpacecraftProperties,
        control: StepSizeControl,
        position_tolerance: f64,
    ) -> Result<Self, OrbitPropError> {
        control.validate()?;
        if !(position_tolerance.is_finite() && position_tolerance > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "positionTolerance",
                position_tolerance,
                "must be finite and > 0",
            ));
        }
        if forces.is_empty() {
            warn!("Propagator built without any force model: the spacecraft moves in a straight line");
        }
        Ok(Propagator {
            forces,
            spacecraft,
            control,
            position_tolerance,
        })
    }

    pub fn forces(&self) -> &ForceStack {
        &self.forces
    }

    pub fn spacecraft(&self) -> &SpacecraftProperties {
        &self.spacecraft
    }

    pub fn step_control(&self) -> &StepSizeControl {
        &self.control
    }

    pub fn position_tolerance(&self) -> f64 {
        self.position_tolerance
    }

    /// Propagate `initial` to `target`, reporting samples every `sample_interval` seconds.
    ///
    /// Arguments
    /// ---------
    /// * `initial`: initial inertial state; its epoch is the start of the window.
    /// * `target`: end of the window, before `initial.epoch` for a backward run.
    /// * `sample_interval`: grid spacing in seconds (> 0), counted from the initial epoch
    ///   in the direction of propagation.
    /// * `bounds`: whether the target is sampled when it is off the grid.
    /// * `sampler`: receives the samples in propagation order.
    ///
    /// Return
    /// ------
    /// * A [`PropagationReport`] with the state at the target (or at the stopping sample).
    /// * [`OrbitPropError::InvalidPropagationWindow`] for a non-positive interval, a non-finite
    ///   window, or more samples than can be counted.
    /// * [`OrbitPropError::IntegrationDiverged`], [`OrbitPropError::ToleranceNotAchievable`],
    ///   [`OrbitPropError::TooManyRejections`] from the integrator.
    /// * Any force model or element conversion error.
    ///
    /// See also
    /// --------
    /// * [`Propagator::propagate_to`] – same run without sampling.
    pub fn propagate<S: Sampler + ?Sized>(
        &self,
        initial: &CartesianState,
        target: Epoch,
        sample_interval: Second,
        bounds: SampleBounds,
        sampler: &mut S,
    ) -> Result<PropagationReport, OrbitPropError> {
        let span = duration_between(&initial.epoch, &target);
        if !span.is_finite() {
            return Err(OrbitPropError::InvalidPropagationWindow(format!(
                "non-finite span between {} and {}",
                format_epoch(&initial.epoch),
                format_epoch(&target)
            )));
        }
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return Err(OrbitPropError::InvalidPropagationWindow(format!(
                "sample interval must be finite and > 0, got {sample_interval}"
            )));
        }
        if let Some((component, value)) = initial.first_non_finite() {
            return Err(OrbitPropError::IntegrationDiverged {
                elapsed: 0.0,
                component,
                value,
            });
        }

        let grid = SampleGrid::new(span, sample_interval, bounds)?;

        debug!(
            "Propagating {span} s from {} ({} samples every {sample_interval} s, {:?}) with {:?}",
            format_epoch(&initial.epoch),
            grid.len(),
            bounds,
            self.forces.model_names()
        );

        let emit = |sampler: &mut S,
                    index: usize,
                    elapsed: f64,
                    y: &StateVector|
         -> Result<(CartesianState, ControlFlow<()>), OrbitPropError> {
            let epoch = if elapsed == span {
                target
            } else {
                shift(&initial.epoch, elapsed)
            };
            let state = CartesianState::from_state_vector(epoch, y, initial.mu);
            let sample = Sample::new(state, elapsed, index + 1 == grid.len())?;
            Ok((state, sampler.handle_sample(&sample)))
        };

        let y0 = initial.to_state_vector();

        // First grid point is the initial epoch
        let (state0, flow) = emit(sampler, 0, 0.0, &y0)?;
        let mut next_sample = 1;
        if span == 0.0 {
            debug!("Zero-length propagation window, returning the initial state");
            return Ok(PropagationReport {
                final_state: *initial,
                stats: IntegratorStats::default(),
                stopped_early: false,
            });
        }
        if flow.is_break() {
            debug!("Propagation stopped by the sampler at the initial epoch");
            return Ok(PropagationReport {
                final_state: state0,
                stats: IntegratorStats::default(),
                stopped_early: true,
            });
        }

        let system = Dynamics {
            forces: &self.forces,
            spacecraft: &self.spacecraft,
            start: initial.epoch,
            mu: initial.mu,
        };
        let tolerances = Tolerances::from_position_tolerance(self.position_tolerance, initial)?;
        let mut integrator = Rkf78::new(tolerances, self.control)?;

        let direction = span.signum();
        let mut t = 0.0;
        let mut y = y0;

        loop {
            let step = integrator.step_to(&system, t, &y, span)?;
            let t_end = if step.reached_limit { span } else { step.t_end() };
            trace!(
                "Accepted step t = {t:.6} s, h = {:.6} s, error = {:.3e}",
                step.h,
                step.error
            );

            let mut target_state = None;
            while let Some(tp) = grid
                .get(next_sample)
                .filter(|tp| (tp - t_end) * direction <= 0.0)
            {
                let yp = if tp == t_end {
                    step.y_end
                } else {
                    integrator.single_step(&system, t, &y, tp - t)?
                };
                let (state, flow) = emit(sampler, next_sample, tp, &yp)?;
                next_sample += 1;
                if tp == span {
                    target_state = Some(state);
                } else if flow.is_break() {
                    integrator.finish();
                    debug!(
                        "Propagation stopped by the sampler at {} ({tp} s)",
                        format_epoch(&state.epoch)
                    );
                    return Ok(PropagationReport {
                        final_state: state,
                        stats: *integrator.stats(),
                        stopped_early: true,
                    });
                }
            }

            if t_end == span {
                let final_state = target_state.unwrap_or_else(|| {
                    CartesianState::from_state_vector(target, &step.y_end, initial.mu)
                });
                integrator.finish();

                let stats = integrator.stats();
                debug!(
                    "Propagation reached {}: {} accepted / {} rejected steps, {} evaluations, step range [{:.3}, {:.3}] s",
                    format_epoch(&target),
                    stats.accepted_steps,
                    stats.rejected_steps,
                    stats.evaluations,
                    stats.min_accepted_step,
                    stats.max_accepted_step
                );
                return Ok(PropagationReport {
                    final_state,
                    stats: *stats,
                    stopped_early: false,
                });
            }

            t = t_end;
            y = step.y_end;
        }
    }

    /// Propagate `initial` to `target` without reporting intermediate samples.
    pub fn propagate_to(
        &self,
        initial: &CartesianState,
        target: Epoch,
    ) -> Result<CartesianState, OrbitPropError> {
        let span = duration_between(&initial.epoch, &target).abs();
        let interval = if span > 0.0 { span } else { 1.0 };
        let mut ignore = |_: &Sample| ControlFlow::Continue(());
        self.propagate(initial, target, interval, SampleBounds::Both, &mut ignore)
            .map(|report| report.final_state)
    }
}

impl std::fmt::Debug for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagator")
            .field("forces", &self.forces)
            .field("spacecraft", &self.spacecraft)
            .field("control", &self.control)
            .field("position_tolerance", &self.position_tolerance)
            .finish()
    }
}

/// Elapsed times of the samples of a window of `span` seconds.
///
/// Grid points are `k · interval` (signed like `span`), computed on demand. A
/// grid point within [`GRID_EPSILON`] of the target is snapped onto it. With
/// [`SampleBounds::Both`] an off-grid target is appended.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SampleGrid {
    span: f64,
    step: f64,
    /// Index of the last `k · interval` point
    last_on_grid: usize,
    target_on_grid: bool,
    len: usize,
}

impl SampleGrid {
    fn new(span: f64, interval: f64, bounds: SampleBounds) -> Result<Self, OrbitPropError> {
        let length = span.abs();
        let ratio = length / interval;
        let too_many = || {
            OrbitPropError::InvalidPropagationWindow(format!(
                "{length} s sampled every {interval} s gives too many samples"
            ))
        };
        if !(ratio < usize::MAX as f64) {
            return Err(too_many());
        }

        let nearest = ratio.round();
        let last_on_grid = if (ratio - nearest).abs() <= GRID_EPSILON * ratio.max(1.0) {
            nearest as usize
        } else {
            ratio.floor() as usize
        };
        let target_on_grid =
            (last_on_grid as f64 * interval - length).abs() <= GRID_EPSILON * length.max(1.0);
        let extra = usize::from(!target_on_grid && bounds == SampleBounds::Both);
        let len = last_on_grid
            .checked_add(1 + extra)
            .ok_or_else(too_many)?;

        Ok(SampleGrid {
            span,
            step: if span < 0.0 { -interval } else { interval },
            last_on_grid,
            target_on_grid,
            len,
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Elapsed time of the `index`-th sample, `None` past the end of the grid.
    fn get(&self, index: usize) -> Option<f64> {
        if index >= self.len {
            None
        } else if index > self.last_on_grid || (index == self.last_on_grid && self.target_on_grid)
        {
            Some(self.span)
        } else {
            Some(index as f64 * self.step)
        }
    }
}
