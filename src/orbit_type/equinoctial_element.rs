//! # Equinoctial orbital elements
//!
//! Non-singular element set `(a, h, k, p, q, λ)`:
//!
//! ```text
//! h = e·sin(ω + Ω)        k = e·cos(ω + Ω)
//! p = tan(i/2)·sin(Ω)     q = tan(i/2)·cos(Ω)
//! λ = Ω + ω + M
//! ```
//!
//! Used for the equinoctial trajectory report; it stays well defined for
//! circular and equatorial orbits where ω and Ω are not.
use std::f64::consts::PI;

use hifitime::Epoch;

use crate::{
    constants::DPI,
    kepler::principal_angle,
    orbit_type::keplerian_element::{AnomalyKind, KeplerianElements},
};

/// Equinoctial orbital elements.
/// Units:
/// - a: meters
/// - h, k: dimensionless (related to eccentricity)
/// - p, q: dimensionless (related to inclination)
/// - lambda: radians (mean longitude)
#[derive(Debug, Clone, PartialEq)]
pub struct EquinoctialElements {
    pub reference_epoch: Epoch,
    pub semi_major_axis: f64,
    pub eccentricity_sin_lon: f64,   // h = e * sin(Ω + ω)
    pub eccentricity_cos_lon: f64,   // k = e * cos(Ω + ω)
    pub tan_half_incl_sin_node: f64, // p = tan(i/2) * sin(Ω)
    pub tan_half_incl_cos_node: f64, // q = tan(i/2) * cos(Ω)
    pub mean_longitude: f64,         // λ = Ω + ω + M
}

impl EquinoctialElements {
    /// Mean longitude folded into `(-π, π]`, as printed in reports.
    pub fn signed_mean_longitude(&self) -> f64 {
        let lambda = principal_angle(self.mean_longitude);
        if lambda > PI {
            lambda - DPI
        } else {
            lambda
        }
    }

    /// Eccentricity `sqrt(h² + k²)`.
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_sin_lon.hypot(self.eccentricity_cos_lon)
    }
}

impl From<&KeplerianElements> for EquinoctialElements {
    /// Forward conversion; any anomaly kind is first turned into the mean anomaly.
    fn from(kep: &KeplerianElements) -> Self {
        let lon_periapsis = kep.ascending_node_longitude + kep.periapsis_argument;
        let tan_half_incl = (0.5 * kep.inclination).tan();

        EquinoctialElements {
            reference_epoch: kep.reference_epoch,
            semi_major_axis: kep.semi_major_axis,
            eccentricity_sin_lon: kep.eccentricity * lon_periapsis.sin(),
            eccentricity_cos_lon: kep.eccentricity * lon_periapsis.cos(),
            tan_half_incl_sin_node: tan_half_incl * kep.ascending_node_longitude.sin(),
            tan_half_incl_cos_node: tan_half_incl * kep.ascending_node_longitude.cos(),
            mean_longitude: principal_angle(lon_periapsis + kep.mean_anomaly()),
        }
    }
}

impl From<KeplerianElements> for EquinoctialElements {
    fn from(kep: KeplerianElements) -> Self {
        EquinoctialElements::from(&kep)
    }
}

impl From<&EquinoctialElements> for KeplerianElements {
    /// Inverse conversion, producing a mean anomaly.
    ///
    /// Degenerate cases:
    /// - `e ≈ 0`: the longitude of periapsis ϖ is set to 0.
    /// - `tan(i/2) ≈ 0`: Ω is set to 0.
    fn from(equ: &EquinoctialElements) -> Self {
        let eps = 1.0e-12;
        let ecc = equ.eccentricity();

        let dig = if ecc < eps {
            0.0
        } else {
            equ.eccentricity_sin_lon.atan2(equ.eccentricity_cos_lon)
        };

        let tgi2 = equ
            .tan_half_incl_sin_node
            .hypot(equ.tan_half_incl_cos_node);

        let omega_node = if tgi2 < eps {
            0.0
        } else {
            principal_angle(
                equ.tan_half_incl_sin_node
                    .atan2(equ.tan_half_incl_cos_node),
            )
        };

        KeplerianElements {
            reference_epoch: equ.reference_epoch,
            semi_major_axis: equ.semi_major_axis,
            eccentricity: ecc,
            inclination: 2.0 * tgi2.atan(),
            ascending_node_longitude: omega_node,
            periapsis_argument: principal_angle(dig - omega_node),
            anomaly: principal_angle(equ.mean_longitude - dig),
            anomaly_kind: AnomalyKind::Mean,
        }
    }
}
