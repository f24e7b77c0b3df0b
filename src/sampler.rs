//! # Trajectory sampling
//!
//! The propagator reports the state at fixed intervals through the [`Sampler`]
//! trait. A sample carries both the raw Cartesian state and its osculating
//! Keplerian elements (mean anomaly), so callers never convert twice.
//!
//! The element view only exists for elliptic, non-rectilinear states. On a
//! hyperbolic or parabolic arc, or with zero angular momentum, `elements` is
//! `None` and the run goes on: the Cartesian state is always present.
//!
//! Any `FnMut(&Sample) -> ControlFlow<()>` closure is a sampler; returning
//! [`ControlFlow::Break`] stops the propagation right after that sample.
//! [`Trajectory`] records every sample into a `Vec`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::ops::ControlFlow;
//!
//! let mut count = 0;
//! propagator.propagate(&initial, target, 60.0, SampleBounds::Both, &mut |s: &Sample| {
//!     count += 1;
//!     if s.elements.is_some_and(|el| el.semi_major_axis < 6.6e6) {
//!         ControlFlow::Break(())
//!     } else {
//!         ControlFlow::Continue(())
//!     }
//! })?;
//! ```
use std::ops::ControlFlow;

use hifitime::Epoch;
use itertools::Itertools;

use log::trace;

use crate::{
    constants::Second,
    orbit_type::{
        cartesian_state::CartesianState,
        keplerian_element::{AnomalyKind, KeplerianElements},
    },
    orbitprop_errors::OrbitPropError,
    time::format_epoch,
};

/// Read-only snapshot handed to a [`Sampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub epoch: Epoch,
    /// Seconds since the initial epoch (negative for backward propagation)
    pub elapsed: Second,
    pub state: CartesianState,
    /// Osculating elements, mean anomaly; `None` when the state is not elliptic
    pub elements: Option<KeplerianElements>,
    /// `true` on the last sample of the run
    pub is_final: bool,
}

impl Sample {
    /// Build a sample, deriving the osculating elements from `state`.
    ///
    /// Return
    /// ------
    /// * The sample, with `elements: None` for a non-elliptic or rectilinear state.
    /// * Any other element conversion error.
    pub fn new(
        state: CartesianState,
        elapsed: Second,
        is_final: bool,
    ) -> Result<Self, OrbitPropError> {
        let elements = match state.to_keplerian(AnomalyKind::Mean) {
            Ok(elements) => Some(elements),
            Err(OrbitPropError::SingularElements(reason)) => {
                trace!(
                    "No Keplerian elements at {}: {reason}",
                    format_epoch(&state.epoch)
                );
                None
            }
            Err(err) => return Err(err),
        };
        Ok(Sample {
            epoch: state.epoch,
            elapsed,
            state,
            elements,
            is_final,
        })
    }
}

pub trait Sampler {
    fn handle_sample(&mut self, sample: &Sample) -> ControlFlow<()>;
}

impl<F> Sampler for F
where
    F: FnMut(&Sample) -> ControlFlow<()>,
{
    fn handle_sample(&mut self, sample: &Sample) -> ControlFlow<()> {
        self(sample)
    }
}

/// Which epochs produce a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleBounds {
    /// Every grid point `k · interval` plus the target epoch when it is off the grid
    #[default]
    Both,
    /// Grid points only; the last grid point reached is flagged as final
    IntervalOnly,
}

/// Samples of one propagation run, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Trajectory::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Drop the recorded samples before a new run.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// `true` when the sample epochs are strictly monotonic in the direction of propagation.
    pub fn is_monotonic(&self) -> bool {
        let forward = self.samples.iter().tuple_windows().all(|(a, b)| b.epoch > a.epoch);
        let backward = self.samples.iter().tuple_windows().all(|(a, b)| b.epoch < a.epoch);
        forward || backward
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl Sampler for Trajectory {
    fn handle_sample(&mut self, sample: &Sample) -> ControlFlow<()> {
        self.samples.push(sample.clone());
        ControlFlow::Continue(())
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
