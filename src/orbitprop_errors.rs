use thiserror::Error;

/// Broad category of a failure, used by callers to decide whether a run can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, detected before any integration starts.
    Configuration,
    /// Kepler solver failure or singular element set.
    Mathematical,
    /// Step-size control failure or non-finite integrated state.
    Integration,
    /// External model queried outside of its valid domain.
    PhysicalModel,
    /// Failure while writing a report.
    Io,
}

#[derive(Error, Debug)]
pub enum OrbitPropError {
    // Configuration
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value '{value}' for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid propagation window: {0}")]
    InvalidPropagationWindow(String),

    #[error("Gravity field of degree {available} cannot provide degree {degree} / order {order}")]
    GravityFieldTooSmall {
        degree: usize,
        order: usize,
        available: usize,
    },

    // Mathematical
    #[error("Kepler equation did not converge (M = {mean_anomaly} rad, e = {eccentricity})")]
    KeplerSolverDidNotConverge {
        mean_anomaly: f64,
        eccentricity: f64,
    },

    #[error("Singular or non-elliptic element set: {0}")]
    SingularElements(String),

    // Integration
    #[error(
        "Tolerance not achievable at t = {elapsed} s: step {step} s would fall below the minimum step {min_step} s (normalized error {error})"
    )]
    ToleranceNotAchievable {
        elapsed: f64,
        step: f64,
        min_step: f64,
        error: f64,
    },

    #[error("Integration diverged at t = {elapsed} s: state component {component} = {value}")]
    IntegrationDiverged {
        elapsed: f64,
        component: usize,
        value: f64,
    },

    #[error("Force model '{model}' produced a non-finite acceleration {acceleration:?} at position {position:?} m (t = {epoch})")]
    NonFiniteAcceleration {
        model: &'static str,
        epoch: String,
        position: [f64; 3],
        acceleration: [f64; 3],
    },

    #[error("Step rejected {count} times in a row at t = {elapsed} s (last step {step} s)")]
    TooManyRejections {
        elapsed: f64,
        step: f64,
        count: usize,
    },

    // Physical models
    #[error("Ephemeris for {body} is not valid at {epoch}")]
    EphemerisOutOfRange { body: &'static str, epoch: String },

    #[error("Atmosphere model '{model}' is not valid at altitude {altitude} m")]
    AtmosphereOutOfRange { model: &'static str, altitude: f64 },

    // Reports
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unable to write report: {0}")]
    CsvError(#[from] csv::Error),
}

impl OrbitPropError {
    /// Category of the failure.
    pub fn kind(&self) -> ErrorKind {
        use OrbitPropError::*;
        match self {
            InvalidTimeFormat(_)
            | MissingParameter(_)
            | InvalidParameter { .. }
            | InvalidPropagationWindow(_)
            | GravityFieldTooSmall { .. } => ErrorKind::Configuration,

            KeplerSolverDidNotConverge { .. } | SingularElements(_) => ErrorKind::Mathematical,

            ToleranceNotAchievable { .. }
            | IntegrationDiverged { .. }
            | NonFiniteAcceleration { .. }
            | TooManyRejections { .. } => ErrorKind::Integration,

            EphemerisOutOfRange { .. } | AtmosphereOutOfRange { .. } => ErrorKind::PhysicalModel,

            IoError(_) | CsvError(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid_parameter(name: &str, value: impl ToString, reason: &str) -> Self {
        OrbitPropError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl PartialEq for OrbitPropError {
    fn eq(&self, other: &Self) -> bool {
        use OrbitPropError::*;
        match (self, other) {
            (InvalidTimeFormat(a), InvalidTimeFormat(b)) => a == b,
            (MissingParameter(a), MissingParameter(b)) => a == b,
            (
                InvalidParameter {
                    name: n1,
                    value: v1,
                    reason: r1,
                },
                InvalidParameter {
                    name: n2,
                    value: v2,
                    reason: r2,
                },
            ) => n1 == n2 && v1 == v2 && r1 == r2,
            (InvalidPropagationWindow(a), InvalidPropagationWindow(b)) => a == b,
            (
                GravityFieldTooSmall {
                    degree: d1,
                    order: o1,
                    available: a1,
                },
                GravityFieldTooSmall {
                    degree: d2,
                    order: o2,
                    available: a2,
                },
            ) => d1 == d2 && o1 == o2 && a1 == a2,
            (
                KeplerSolverDidNotConverge {
                    mean_anomaly: m1,
                    eccentricity: e1,
                },
                KeplerSolverDidNotConverge {
                    mean_anomaly: m2,
                    eccentricity: e2,
                },
            ) => m1 == m2 && e1 == e2,
            (SingularElements(a), SingularElements(b)) => a == b,
            (EphemerisOutOfRange { body: b1, .. }, EphemerisOutOfRange { body: b2, .. }) => {
                b1 == b2
            }
            (
                AtmosphereOutOfRange {
                    model: m1,
                    altitude: a1,
                },
                AtmosphereOutOfRange {
                    model: m2,
                    altitude: a2,
                },
            ) => m1 == m2 && a1 == a2,
            (NonFiniteAcceleration { model: m1, .. }, NonFiniteAcceleration { model: m2, .. }) => {
                m1 == m2
            }

            // Numerical failures compare by variant: the exact step values depend on the run
            (ToleranceNotAchievable { .. }, ToleranceNotAchievable { .. }) => true,
            (IntegrationDiverged { .. }, IntegrationDiverged { .. }) => true,
            (TooManyRejections { .. }, TooManyRejections { .. }) => true,

            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
