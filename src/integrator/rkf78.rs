//! # Runge–Kutta–Fehlberg 7(8)
//!
//! Thirteen-stage embedded pair of Fehlberg (NASA TR R-287, 1968). The
//! eighth-order solution is propagated and the difference with the embedded
//! seventh-order one gives the local error estimate
//!
//! ```text
//! δ = h · 41/840 · (k₀ + k₁₀ − k₁₁ − k₁₂)
//! ```
//!
//! The error norm is the RMS over the components of `δ_i / sc_i`, with
//! `sc_i = atol_i + rtol_i · max(|y_i|, |y_new_i|)`. A step is accepted when the
//! norm is ≤ 1 and the next step is scaled by `safety · err^(−1/8)`, bounded by
//! the controller factors and by `[min_step, max_step]`.
use log::trace;

use crate::{
    constants::StateVector,
    integrator::{
        AcceptedStep, IntegratorStats, IntegratorStatus, OdeSystem, StepSizeControl, Tolerances,
    },
    orbitprop_errors::OrbitPropError,
};

const STAGES: usize = 13;

/// Nodes `c_i`
const C: [f64; STAGES] = [
    0.0,
    2.0 / 27.0,
    1.0 / 9.0,
    1.0 / 6.0,
    5.0 / 12.0,
    1.0 / 2.0,
    5.0 / 6.0,
    1.0 / 6.0,
    2.0 / 3.0,
    1.0 / 3.0,
    1.0,
    0.0,
    1.0,
];

/// Runge–Kutta matrix `a_ij`, row `i` uses stages `0..i`
const A: [[f64; STAGES - 1]; STAGES] = [
    [0.0; 12],
    [2.0 / 27.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 36.0, 1.0 / 12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 24.0, 0.0, 1.0 / 8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [
        -25.0 / 108.0,
        0.0,
        0.0,
        125.0 / 108.0,
        -65.0 / 27.0,
        125.0 / 54.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        31.0 / 300.0,
        0.0,
        0.0,
        0.0,
        61.0 / 225.0,
        -2.0 / 9.0,
        13.0 / 900.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        2.0,
        0.0,
        0.0,
        -53.0 / 6.0,
        704.0 / 45.0,
        -107.0 / 9.0,
        67.0 / 90.0,
        3.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -91.0 / 108.0,
        0.0,
        0.0,
        23.0 / 108.0,
        -976.0 / 135.0,
        311.0 / 54.0,
        -19.0 / 60.0,
        17.0 / 6.0,
        -1.0 / 12.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        2383.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -301.0 / 82.0,
        2133.0 / 4100.0,
        45.0 / 82.0,
        45.0 / 164.0,
        18.0 / 41.0,
        0.0,
        0.0,
    ],
    [
        3.0 / 205.0,
        0.0,
        0.0,
        0.0,
        0.0,
        -6.0 / 41.0,
        -3.0 / 205.0,
        -3.0 / 41.0,
        3.0 / 41.0,
        6.0 / 41.0,
        0.0,
        0.0,
    ],
    [
        -1777.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -289.0 / 82.0,
        2193.0 / 4100.0,
        51.0 / 82.0,
        33.0 / 164.0,
        12.0 / 41.0,
        0.0,
        1.0,
    ],
];

/// Eighth-order weights
const B8: [f64; STAGES] = [
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    34.0 / 105.0,
    9.0 / 35.0,
    9.0 / 35.0,
    9.0 / 280.0,
    9.0 / 280.0,
    0.0,
    41.0 / 840.0,
    41.0 / 840.0,
];

/// Weight of the error estimate `b7 − b8` on stages 0 and 10 (and its negative on 11 and 12)
const ERROR_WEIGHT: f64 = 41.0 / 840.0;

/// Order used in the step-size exponent
const ORDER: f64 = 8.0;

/// Adaptive RKF 7(8) integrator.
///
/// The integrator keeps its step-size memory between calls to [`Rkf78::step`]:
/// the step proposed after an accepted step is the first trial of the next one.
#[derive(Debug, Clone)]
pub struct Rkf78 {
    tolerances: Tolerances,
    control: StepSizeControl,
    status: IntegratorStatus,
    stats: IntegratorStats,
    next_step: Option<f64>,
}

impl Rkf78 {
    pub fn new(tolerances: Tolerances, control: StepSizeControl) -> Result<Self, OrbitPropError> {
        tolerances.validate()?;
        control.validate()?;
        Ok(Rkf78 {
            tolerances,
            control,
            status: IntegratorStatus::Initialized,
            stats: IntegratorStats::default(),
            next_step: None,
        })
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn control(&self) -> &StepSizeControl {
        &self.control
    }

    pub fn status(&self) -> IntegratorStatus {
        self.status
    }

    pub fn stats(&self) -> &IntegratorStats {
        &self.stats
    }

    /// Magnitude of the step that will be tried first by the next call to [`Rkf78::step`].
    pub fn next_step(&self) -> Option<f64> {
        self.next_step
    }

    /// Mark the run as completed.
    pub fn finish(&mut self) {
        if self.status != IntegratorStatus::Diverged {
            self.status = IntegratorStatus::Converged;
        }
    }

    /// Advance `y` from `t` by exactly `h` (signed), without error control.
    ///
    /// Used to land on a time inside an accepted step: `|h|` never exceeds the
    /// accepted step, so the local error stays within the tolerance.
    pub fn single_step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        h: f64,
    ) -> Result<StateVector, OrbitPropError> {
        let result = self
            .stages(system, t, y, h)
            .and_then(|(y_new, _)| check_finite(t + h, &y_new).map(|_| y_new));
        if result.is_err() {
            self.status = IntegratorStatus::Diverged;
        }
        result
    }

    /// Take one accepted step from `(t, y)` in the direction given by the sign of `direction`.
    ///
    /// Trial steps are shrunk until the error norm is ≤ 1.
    ///
    /// Return
    /// ------
    /// * The accepted step with `min_step ≤ |h| ≤ max_step`.
    /// * [`OrbitPropError::ToleranceNotAchievable`] when a step at `min_step` is still rejected,
    /// * [`OrbitPropError::TooManyRejections`] after `max_rejections` consecutive rejections,
    /// * [`OrbitPropError::IntegrationDiverged`] when the new state is not finite,
    /// * or the error of the derivative function.
    pub fn step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        direction: f64,
    ) -> Result<AcceptedStep, OrbitPropError> {
        let result = self.try_step(system, t, y, direction.signum(), f64::INFINITY);
        self.record(result)
    }

    /// Take one accepted step from `(t, y)` towards `t_limit`, never past it.
    ///
    /// Same as [`Rkf78::step`], except that trial steps are fitted to the rest of
    /// the window with [`StepSizeControl::fit_to_remaining`]: the derivatives are
    /// never evaluated beyond `t_limit`, and the step that ends the window has
    /// `reached_limit` set. That last step may be shorter than `min_step`.
    ///
    /// Return
    /// ------
    /// * The accepted step, or the errors of [`Rkf78::step`].
    /// * [`OrbitPropError::InvalidParameter`] when `t_limit` is not finite or equals `t`.
    pub fn step_to<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        t_limit: f64,
    ) -> Result<AcceptedStep, OrbitPropError> {
        let remaining = (t_limit - t).abs();
        if !(remaining.is_finite() && remaining > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "t_limit",
                t_limit,
                "must be finite and differ from the current time",
            ));
        }
        let result = self.try_step(system, t, y, (t_limit - t).signum(), remaining);
        self.record(result)
    }

    fn record(
        &mut self,
        result: Result<AcceptedStep, OrbitPropError>,
    ) -> Result<AcceptedStep, OrbitPropError> {
        match result {
            Ok(_) => self.status = IntegratorStatus::Stepping,
            Err(_) => self.status = IntegratorStatus::Diverged,
        }
        result
    }

    fn try_step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        direction: f64,
        remaining: f64,
    ) -> Result<AcceptedStep, OrbitPropError> {
        let proposed = match self.next_step {
            Some(h) => h,
            None => match self.control.initial_step {
                Some(h) => self.control.clamp(h),
                None => self.initial_step(system, t, y, direction, remaining)?,
            },
        };
        let mut h = self.control.fit_to_remaining(proposed, remaining);

        let mut rejections = 0;
        loop {
            let (y_new, delta) = self.stages(system, t, y, direction * h)?;
            let error = self.error_norm(y, &y_new, &delta);

            if !error.is_finite() {
                check_finite(t + direction * h, &y_new)?;
                check_finite(t + direction * h, &delta)?;
            }

            if error <= 1.0 {
                let factor = if error == 0.0 {
                    self.control.max_scale
                } else {
                    (self.control.safety * error.powf(-1.0 / ORDER))
                        .clamp(self.control.min_scale, self.control.max_scale)
                };
                self.next_step = Some(self.control.clamp(h * factor));

                self.stats.accepted_steps += 1;
                self.stats.min_accepted_step = self.stats.min_accepted_step.min(h);
                self.stats.max_accepted_step = self.stats.max_accepted_step.max(h);

                return Ok(AcceptedStep {
                    t_start: t,
                    y_start: *y,
                    h: direction * h,
                    y_end: y_new,
                    error,
                    reached_limit: h == remaining,
                });
            }

            rejections += 1;
            self.stats.rejected_steps += 1;
            trace!("Rejected step t = {t:.6} s, h = {h:.6} s, error = {error:.3e}");
            if rejections >= self.control.max_rejections {
                return Err(OrbitPropError::TooManyRejections {
                    elapsed: t,
                    step: h,
                    count: rejections,
                });
            }

            let factor = (self.control.safety * error.powf(-1.0 / ORDER))
                .clamp(self.control.min_scale, 1.0);
            let shrunk = h * factor;
            if shrunk < self.control.min_step {
                if h <= self.control.min_step {
                    return Err(OrbitPropError::ToleranceNotAchievable {
                        elapsed: t,
                        step: shrunk,
                        min_step: self.control.min_step,
                        error,
                    });
                }
                h = self.control.min_step;
            } else {
                h = shrunk;
            }
        }
    }

    /// Starting step estimate (Hairer, Nørsett & Wanner, *Solving ODE I*, II.4),
    /// clamped into `[min_step, max_step]`.
    ///
    /// The derivative is sampled at most `remaining` seconds away from `t`.
    pub fn initial_step<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        direction: f64,
        remaining: f64,
    ) -> Result<f64, OrbitPropError> {
        let scale: StateVector =
            std::array::from_fn(|i| self.tolerances.scale(i, y[i], y[i]));

        let f0 = self.evaluate(system, t, y)?;
        let d0 = rms(|i| y[i] / scale[i]);
        let d1 = rms(|i| f0[i] / scale[i]);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        }
        .min(remaining);

        let y1: StateVector = std::array::from_fn(|i| y[i] + direction * h0 * f0[i]);
        let f1 = self.evaluate(system, t + direction * h0, &y1)?;
        let d2 = rms(|i| (f1[i] - f0[i]) / scale[i]) / h0;

        let h1 = if d1.max(d2) <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / ORDER)
        };

        Ok(self.control.clamp((100.0 * h0).min(h1)))
    }

    /// Eighth-order solution and error estimate of a step of signed size `h`.
    fn stages<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
        h: f64,
    ) -> Result<(StateVector, StateVector), OrbitPropError> {
        let mut k = [[0.0; 6]; STAGES];
        k[0] = self.evaluate(system, t, y)?;

        for s in 1..STAGES {
            let mut ys = *y;
            for (j, a) in A[s].iter().enumerate().take(s) {
                if *a != 0.0 {
                    for i in 0..6 {
                        ys[i] += h * a * k[j][i];
                    }
                }
            }
            k[s] = self.evaluate(system, t + C[s] * h, &ys)?;
        }

        let y_new: StateVector = std::array::from_fn(|i| {
            y[i] + h * (0..STAGES).map(|s| B8[s] * k[s][i]).sum::<f64>()
        });
        let delta: StateVector = std::array::from_fn(|i| {
            h * ERROR_WEIGHT * (k[0][i] + k[10][i] - k[11][i] - k[12][i])
        });
        Ok((y_new, delta))
    }

    fn error_norm(&self, y: &StateVector, y_new: &StateVector, delta: &StateVector) -> f64 {
        rms(|i| delta[i] / self.tolerances.scale(i, y[i], y_new[i]))
    }

    fn evaluate<S: OdeSystem + ?Sized>(
        &mut self,
        system: &S,
        t: f64,
        y: &StateVector,
    ) -> Result<StateVector, OrbitPropError> {
        self.stats.evaluations += 1;
        system.derivatives(t, y)
    }
}

fn rms(component: impl Fn(usize) -> f64) -> f64 {
    ((0..6).map(|i| component(i).powi(2)).sum::<f64>() / 6.0).sqrt()
}

fn check_finite(t: f64, y: &StateVector) -> Result<(), OrbitPropError> {
    match y.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((component, value)) => Err(OrbitPropError::IntegrationDiverged {
            elapsed: t,
            component,
            value: *value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod rkf78_test {
    use std::cell::Cell;

    use super::*;
    use approx::assert_abs_diff_eq;

    /// Three uncoupled unit oscillators `x'' = −x`.
    fn oscillator(_t: f64, y: &StateVector) -> Result<StateVector, OrbitPropError> {
        Ok([y[3], y[4], y[5], -y[0], -y[1], -y[2]])
    }

    fn oscillator_start() -> StateVector {
        [1.0, 0.0, 0.5, 0.0, 1.0, 0.0]
    }

    fn exact(t: f64) -> StateVector {
        let (s, c) = t.sin_cos();
        [c, s, 0.5 * c, -s, c, -0.5 * s]
    }

    /// Integrate to `t_end`, the last step being cut onto it.
    fn integrate(rk: &mut Rkf78, t_end: f64) -> StateVector {
        let mut t = 0.0;
        let mut y = oscillator_start();
        loop {
            let step = rk.step_to(&oscillator, t, &y, t_end).unwrap();
            if step.reached_limit {
                rk.finish();
                return step.y_end;
            }
            t = step.t_end();
            y = step.y_end;
        }
    }

    #[test]
    fn test_coefficients_consistency() {
        for (s, row) in A.iter().enumerate() {
            let sum: f64 = row.iter().sum();
            assert_abs_diff_eq!(sum, C[s], epsilon = 1e-14);
            assert!(row.iter().skip(s).all(|a| *a == 0.0));
        }
        assert_abs_diff_eq!(B8.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_single_step_is_eighth_order() {
        let mut rk = Rkf78::new(Tolerances::uniform(1e-12, 1e-12), StepSizeControl::default())
            .unwrap();
        let y0 = oscillator_start();
        let err = |h: f64, rk: &mut Rkf78| {
            let y = rk.single_step(&oscillator, 0.0, &y0, h).unwrap();
            (y[0] - h.cos()).abs()
        };
        let e1 = err(0.8, &mut rk);
        let e2 = err(0.4, &mut rk);
        // local error O(h⁹): halving h gains ~2⁹
        assert!(e1 / e2 > 200.0, "{e1} / {e2}");
        assert_eq!(rk.stats().evaluations, 2 * STAGES);
    }

    #[test]
    fn test_oscillator_accuracy() {
        let mut rk = Rkf78::new(
            Tolerances::uniform(1e-12, 1e-12),
            StepSizeControl::new(1e-6, 10.0).unwrap(),
        )
        .unwrap();
        let t_end = 4.0 * std::f64::consts::PI;
        let y = integrate(&mut rk, t_end);
        let expected = exact(t_end);
        for i in 0..6 {
            assert_abs_diff_eq!(y[i], expected[i], epsilon = 1e-9);
        }
        assert_eq!(rk.status(), IntegratorStatus::Converged);
        assert!(rk.stats().accepted_steps > 0);
    }

    #[test]
    fn test_backward_integration() {
        let mut rk = Rkf78::new(
            Tolerances::uniform(1e-12, 1e-12),
            StepSizeControl::new(1e-6, 10.0).unwrap(),
        )
        .unwrap();
        let y = integrate(&mut rk, -3.0);
        let expected = exact(-3.0);
        for i in 0..6 {
            assert_abs_diff_eq!(y[i], expected[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_steps_stay_within_bounds() {
        let control = StepSizeControl::new(1e-3, 0.05).unwrap();
        let mut rk = Rkf78::new(Tolerances::uniform(1e-6, 1e-6), control).unwrap();
        let mut t = 0.0;
        let mut y = oscillator_start();
        for _ in 0..50 {
            let step = rk.step(&oscillator, t, &y, 1.0).unwrap();
            assert!(step.h >= 1e-3 && step.h <= 0.05, "{}", step.h);
            assert!(step.error <= 1.0);
            t = step.t_end();
            y = step.y_end;
        }
        assert!(rk.stats().max_accepted_step <= 0.05);
        assert_eq!(rk.status(), IntegratorStatus::Stepping);
    }

    #[test]
    fn test_tolerance_not_achievable() {
        let control = StepSizeControl {
            min_step: 1.0,
            max_step: 10.0,
            initial_step: Some(2.0),
            ..Default::default()
        };
        let mut rk = Rkf78::new(Tolerances::uniform(1e-15, 0.0), control).unwrap();
        let err = rk
            .step(&oscillator, 0.0, &oscillator_start(), 1.0)
            .unwrap_err();
        assert!(matches!(
            err,
            OrbitPropError::ToleranceNotAchievable { min_step, .. } if min_step == 1.0
        ));
        assert_eq!(rk.status(), IntegratorStatus::Diverged);
        assert!(rk.stats().rejected_steps >= 1);
    }

    #[test]
    fn test_too_many_rejections() {
        let control = StepSizeControl {
            min_step: 1e-9,
            max_step: 10.0,
            initial_step: Some(5.0),
            max_rejections: 1,
            ..Default::default()
        };
        let mut rk = Rkf78::new(Tolerances::uniform(1e-14, 0.0), control).unwrap();
        let err = rk
            .step(&oscillator, 0.0, &oscillator_start(), 1.0)
            .unwrap_err();
        assert!(matches!(err, OrbitPropError::TooManyRejections { count: 1, .. }));
    }

    #[test]
    fn test_non_finite_derivative_diverges() {
        let blow_up = |t: f64, y: &StateVector| -> Result<StateVector, OrbitPropError> {
            let mut dy = [y[3], y[4], y[5], 0.0, 0.0, 0.0];
            if t > 0.0 {
                dy[4] = f64::NAN;
            }
            Ok(dy)
        };
        let control = StepSizeControl {
            initial_step: Some(1.0),
            ..Default::default()
        };
        let mut rk = Rkf78::new(Tolerances::uniform(1e-6, 1e-6), control).unwrap();
        let err = rk.step(&blow_up, 0.0, &oscillator_start(), 1.0).unwrap_err();
        assert!(matches!(
            err,
            OrbitPropError::IntegrationDiverged { component: 1, .. }
                | OrbitPropError::IntegrationDiverged { component: 4, .. }
        ));
        assert_eq!(rk.status(), IntegratorStatus::Diverged);
    }

    #[test]
    fn test_deterministic_step_sequence() {
        let run = || {
            let mut rk = Rkf78::new(Tolerances::uniform(1e-10, 1e-10), StepSizeControl::default())
                .unwrap();
            let mut t = 0.0;
            let mut y = oscillator_start();
            let mut steps = Vec::new();
            for _ in 0..20 {
                let step = rk.step(&oscillator, t, &y, 1.0).unwrap();
                steps.push(step.h);
                t = step.t_end();
                y = step.y_end;
            }
            (steps, y)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_initial_step_estimate_is_clamped() {
        let control = StepSizeControl::new(0.5, 0.6).unwrap();
        let mut rk = Rkf78::new(Tolerances::uniform(1e-12, 1e-12), control).unwrap();
        let h = rk
            .initial_step(&oscillator, 0.0, &oscillator_start(), 1.0, f64::INFINITY)
            .unwrap();
        assert!((0.5..=0.6).contains(&h));
        assert_eq!(rk.stats().evaluations, 2);
    }

    #[test]
    fn test_step_to_never_evaluates_past_the_limit() {
        let latest = Cell::new(f64::NEG_INFINITY);
        let watched = |t: f64, y: &StateVector| {
            latest.set(latest.get().max(t));
            oscillator(t, y)
        };

        let t_limit = 2.345;
        let mut rk = Rkf78::new(
            Tolerances::uniform(1e-10, 1e-10),
            StepSizeControl::new(1e-3, 0.7).unwrap(),
        )
        .unwrap();
        let mut t = 0.0;
        let mut y = oscillator_start();
        let mut steps = 0;
        loop {
            let step = rk.step_to(&watched, t, &y, t_limit).unwrap();
            steps += 1;
            assert!(latest.get() <= t_limit, "evaluated at {}", latest.get());
            if step.reached_limit {
                assert_abs_diff_eq!(step.t_end(), t_limit, epsilon = 1e-14);
                y = step.y_end;
                break;
            }
            t = step.t_end();
            y = step.y_end;
        }
        assert!(steps > 3);
        for (got, expected) in y.iter().zip(exact(t_limit)) {
            assert_abs_diff_eq!(*got, expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_step_to_short_window() {
        // The starting step estimate would look well past a 0.01 s window
        let latest = Cell::new(f64::INFINITY);
        let watched = |t: f64, y: &StateVector| {
            latest.set(latest.get().min(t));
            oscillator(t, y)
        };
        let mut rk = Rkf78::new(Tolerances::uniform(1e-6, 1e-6), StepSizeControl::default())
            .unwrap();
        let step = rk
            .step_to(&watched, 0.0, &oscillator_start(), -0.01)
            .unwrap();
        assert!(step.reached_limit);
        assert_eq!(step.h, -0.01);
        assert!(latest.get() >= -0.01);

        assert!(rk.step_to(&oscillator, 1.0, &oscillator_start(), 1.0).is_err());
    }
}
