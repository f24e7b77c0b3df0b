//! # Atmosphere density models
//!
//! Density is a function of the geometric altitude above a spherical Earth of
//! radius [`EARTH_MAJOR_AXIS`]. Two models are available, selected by the
//! `ATMmodel` configuration key:
//!
//! | `ATMmodel` | model                                | validity      |
//! |-----------:|--------------------------------------|---------------|
//! | 0          | [`ExponentialAtmosphere`]            | `h ≥ 0`       |
//! | 1          | [`PiecewiseExponentialAtmosphere`]   | `h ≥ 0`       |
//!
//! The piecewise model is the static table of Vallado, *Fundamentals of
//! Astrodynamics and Applications*, table 8-4 (0–1000 km; the last band is
//! extrapolated above 1000 km).
use crate::{
    constants::{Meter, EARTH_MAJOR_AXIS},
    orbitprop_errors::OrbitPropError,
};

/// Density provider for the drag model.
pub trait AtmosphereModel: Send + Sync {
    /// Mass density in kg/m³ at `altitude` meters above the reference sphere.
    fn density(&self, altitude: Meter) -> Result<f64, OrbitPropError>;

    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Altitude of a position vector above the reference sphere.
    fn altitude_of(&self, radius: Meter) -> Meter {
        radius - EARTH_MAJOR_AXIS
    }
}

/// Atmosphere model selected by `ATMmodel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtmosphereModelKind {
    Exponential,
    #[default]
    PiecewiseExponential,
}

impl TryFrom<i64> for AtmosphereModelKind {
    type Error = OrbitPropError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AtmosphereModelKind::Exponential),
            1 => Ok(AtmosphereModelKind::PiecewiseExponential),
            other => Err(OrbitPropError::invalid_parameter(
                "ATMmodel",
                other,
                "expected 0 (exponential) or 1 (piecewise exponential)",
            )),
        }
    }
}

fn check_altitude(model: &'static str, altitude: Meter) -> Result<(), OrbitPropError> {
    if altitude.is_finite() && altitude >= 0.0 {
        Ok(())
    } else {
        Err(OrbitPropError::AtmosphereOutOfRange { model, altitude })
    }
}

/// Single-scale-height exponential atmosphere `ρ = ρ0 · exp(−(h − h0) / H)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialAtmosphere {
    pub reference_density: f64,
    pub reference_altitude: Meter,
    pub scale_height: Meter,
}

impl Default for ExponentialAtmosphere {
    /// Anchored at 400 km.
    fn default() -> Self {
        ExponentialAtmosphere {
            reference_density: 3.725e-12,
            reference_altitude: 400e3,
            scale_height: 58.515e3,
        }
    }
}

impl AtmosphereModel for ExponentialAtmosphere {
    fn density(&self, altitude: Meter) -> Result<f64, OrbitPropError> {
        check_altitude(self.name(), altitude)?;
        Ok(self.reference_density
            * (-(altitude - self.reference_altitude) / self.scale_height).exp())
    }

    fn name(&self) -> &'static str {
        "exponential"
    }
}

/// Base altitude (km), base density (kg/m³), scale height (km).
const VALLADO_TABLE: [(f64, f64, f64); 28] = [
    (0.0, 1.225, 7.249),
    (25.0, 3.899e-2, 6.349),
    (30.0, 1.774e-2, 6.682),
    (40.0, 3.972e-3, 7.554),
    (50.0, 1.057e-3, 8.382),
    (60.0, 3.206e-4, 7.714),
    (70.0, 8.770e-5, 6.549),
    (80.0, 1.905e-5, 5.799),
    (90.0, 3.396e-6, 5.382),
    (100.0, 5.297e-7, 5.877),
    (110.0, 9.661e-8, 7.263),
    (120.0, 2.438e-8, 9.473),
    (130.0, 8.484e-9, 12.636),
    (140.0, 3.845e-9, 16.149),
    (150.0, 2.070e-9, 22.523),
    (180.0, 5.464e-10, 29.740),
    (200.0, 2.789e-10, 37.105),
    (250.0, 7.248e-11, 45.546),
    (300.0, 2.418e-11, 53.628),
    (350.0, 9.518e-12, 53.298),
    (400.0, 3.725e-12, 58.515),
    (450.0, 1.585e-12, 60.828),
    (500.0, 6.967e-13, 63.822),
    (600.0, 1.454e-13, 71.835),
    (700.0, 3.614e-14, 88.667),
    (800.0, 1.170e-14, 124.64),
    (900.0, 5.245e-15, 181.05),
    (1000.0, 3.019e-15, 268.00),
];

/// Piecewise exponential static atmosphere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PiecewiseExponentialAtmosphere;

impl AtmosphereModel for PiecewiseExponentialAtmosphere {
    fn density(&self, altitude: Meter) -> Result<f64, OrbitPropError> {
        check_altitude(self.name(), altitude)?;
        let km = altitude / 1e3;

        // Last band whose base altitude is below the query
        let band = VALLADO_TABLE
            .iter()
            .rev()
            .find(|(base, ..)| *base <= km)
            .unwrap_or(&VALLADO_TABLE[0]);

        let (base, rho0, scale) = *band;
        Ok(rho0 * (-(km - base) / scale).exp())
    }

    fn name(&self) -> &'static str {
        "piecewise-exponential"
    }
}
