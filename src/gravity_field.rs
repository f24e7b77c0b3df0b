//! # Gravity field coefficients
//!
//! Spherical-harmonic coefficient table of the central body. Coefficients are
//! supplied fully normalized (the convention of published models such as EGM96)
//! and stored unnormalized, which is the form consumed by the V/W recursion of
//! [`crate::force_models::gravity`].
//!
//! The normalization factor is
//!
//! ```text
//! N(n, m) = sqrt((2 − δ(m,0)) · (2n + 1) · (n − m)! / (n + m)!)
//! C(n, m) = N(n, m) · C̄(n, m)
//! ```
//!
//! A table is either the built-in EGM96 truncation ([`GravityField::egm96`], degree
//! and order 6) or loaded from CSV rows `degree,order,c,s`
//! ([`GravityField::from_csv_reader`]).
use std::io::Read;

use serde::Deserialize;

use crate::{
    constants::{EARTH_GRAVITY_RADIUS, MU_EARTH},
    orbitprop_errors::OrbitPropError,
};

/// EGM96 fully normalized coefficients up to degree and order 6: `(n, m, C̄, S̄)`.
const EGM96_NORMALIZED: [(usize, usize, f64, f64); 25] = [
    (2, 0, -0.484165371736e-3, 0.0),
    (2, 1, -0.186987635955e-9, 0.119528012031e-8),
    (2, 2, 0.243914352398e-5, -0.140016683654e-5),
    (3, 0, 0.957254173792e-6, 0.0),
    (3, 1, 0.202998882184e-5, 0.248513158716e-6),
    (3, 2, 0.904627768605e-6, -0.619025944205e-6),
    (3, 3, 0.721072657057e-6, 0.141435626958e-5),
    (4, 0, 0.539873863789e-6, 0.0),
    (4, 1, -0.536321616971e-6, -0.473440265853e-6),
    (4, 2, 0.350694105785e-6, 0.662671572540e-6),
    (4, 3, 0.990771803829e-6, -0.200928369177e-6),
    (4, 4, -0.188560802735e-6, 0.308853169333e-6),
    (5, 0, 0.685323475630e-7, 0.0),
    (5, 1, -0.621012128528e-7, -0.944226127525e-7),
    (5, 2, 0.652438297612e-6, -0.323349612668e-6),
    (5, 3, -0.451955406071e-6, -0.214847190624e-6),
    (5, 4, -0.295301647654e-6, 0.496658876769e-7),
    (5, 5, 0.174971983203e-6, -0.669384278219e-6),
    (6, 0, -0.149957994714e-6, 0.0),
    (6, 1, -0.760879384947e-7, 0.262890545501e-7),
    (6, 2, 0.481732442832e-7, -0.373728201347e-6),
    (6, 3, 0.571730990516e-8, 0.902694517163e-8),
    (6, 4, -0.862142660109e-7, -0.471408154267e-6),
    (6, 5, -0.267133325490e-6, -0.536488432483e-6),
    (6, 6, 0.967616121092e-8, -0.237192006935e-6),
];

/// One row of a coefficient CSV file.
#[derive(Debug, Deserialize)]
struct CoefficientRecord {
    degree: usize,
    order: usize,
    c: f64,
    s: f64,
}

/// Unnormalized spherical-harmonic coefficients of a central body.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityField {
    mu: f64,
    radius: f64,
    max_degree: usize,
    // c[n][m], s[n][m] for 0 <= m <= n <= max_degree
    c: Vec<Vec<f64>>,
    s: Vec<Vec<f64>>,
}

/// Normalization factor `N(n, m) = sqrt(δ (2n + 1) (n − m)! / (n + m)!)`, for `m ≤ n`.
///
/// The factorial ratio is applied one `1 / sqrt(k)` at a time, so the running
/// product never drops below `N(n, m)` itself. The result is zero or subnormal
/// only when the true factor is.
pub fn normalization_factor(n: usize, m: usize) -> f64 {
    let delta = if m == 0 { 1.0 } else { 2.0 };
    ((n - m + 1)..=(n + m)).fold((delta * (2 * n + 1) as f64).sqrt(), |acc, k| {
        acc / (k as f64).sqrt()
    })
}

impl GravityField {
    /// Build a field from fully normalized coefficients.
    ///
    /// Arguments
    /// ---------
    /// * `mu`: gravitational parameter of the model, m³/s².
    /// * `radius`: reference radius of the model, m.
    /// * `coefficients`: `(n, m, C̄, S̄)` entries; missing entries are zero and
    ///   `C̄00 = 1` is implied.
    ///
    /// Return
    /// ------
    /// * The field, with `max_degree` the largest degree present, or
    ///   [`OrbitPropError::InvalidParameter`] for `m > n`, a non-finite coefficient, or a
    ///   non-zero coefficient whose degree is too high to be stored unnormalized.
    pub fn from_normalized<I>(mu: f64, radius: f64, coefficients: I) -> Result<Self, OrbitPropError>
    where
        I: IntoIterator<Item = (usize, usize, f64, f64)>,
    {
        if !(mu.is_finite() && mu > 0.0) {
            return Err(OrbitPropError::invalid_parameter("mu", mu, "must be > 0"));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "radius",
                radius,
                "must be > 0",
            ));
        }

        let entries: Vec<_> = coefficients.into_iter().collect();
        let max_degree = entries.iter().map(|&(n, ..)| n).max().unwrap_or(0);

        let mut c: Vec<Vec<f64>> = (0..=max_degree).map(|n| vec![0.0; n + 1]).collect();
        let mut s = c.clone();
        c[0][0] = 1.0;

        for (n, m, cnm, snm) in entries {
            if m > n {
                return Err(OrbitPropError::invalid_parameter(
                    "gravity coefficient",
                    format!("({n}, {m})"),
                    "order must not exceed degree",
                ));
            }
            if !(cnm.is_finite() && snm.is_finite()) {
                return Err(OrbitPropError::invalid_parameter(
                    "gravity coefficient",
                    format!("({n}, {m}) = ({cnm}, {snm})"),
                    "coefficients must be finite",
                ));
            }
            let norm = normalization_factor(n, m);
            if !norm.is_normal() && (cnm != 0.0 || snm != 0.0) {
                return Err(OrbitPropError::invalid_parameter(
                    "gravity coefficient",
                    format!("({n}, {m})"),
                    "degree too high for unnormalized coefficients",
                ));
            }
            c[n][m] = norm * cnm;
            s[n][m] = norm * snm;
        }

        Ok(GravityField {
            mu,
            radius,
            max_degree,
            c,
            s,
        })
    }

    /// Built-in EGM96 field truncated at degree and order 6.
    pub fn egm96() -> Self {
        let mut c: Vec<Vec<f64>> = (0..=6).map(|n| vec![0.0; n + 1]).collect();
        let mut s = c.clone();
        c[0][0] = 1.0;
        for (n, m, cnm, snm) in EGM96_NORMALIZED {
            let norm = normalization_factor(n, m);
            c[n][m] = norm * cnm;
            s[n][m] = norm * snm;
        }
        GravityField {
            mu: MU_EARTH,
            radius: EARTH_GRAVITY_RADIUS,
            max_degree: 6,
            c,
            s,
        }
    }

    /// Point-mass field (degree 0).
    pub fn point_mass(mu: f64, radius: f64) -> Result<Self, OrbitPropError> {
        Self::from_normalized(mu, radius, std::iter::empty())
    }

    /// Load fully normalized coefficients from CSV with header `degree,order,c,s`.
    pub fn from_csv_reader<R: Read>(
        mu: f64,
        radius: f64,
        reader: R,
    ) -> Result<Self, OrbitPropError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<CoefficientRecord>()
            .map(|rec| rec.map(|r| (r.degree, r.order, r.c, r.s)))
            .collect::<Result<Vec<_>, csv::Error>>()?;

        Self::from_normalized(mu, radius, records)
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Unnormalized `(C, S)` of degree `n` and order `m` (zero outside the table).
    pub fn coefficients(&self, n: usize, m: usize) -> (f64, f64) {
        if n > self.max_degree || m > n {
            return (0.0, 0.0);
        }
        (self.c[n][m], self.s[n][m])
    }

    /// Second zonal harmonic `J2 = −C20` (unnormalized).
    pub fn j2(&self) -> f64 {
        -self.coefficients(2, 0).0
    }

    /// Check that a `(degree, order)` truncation can be served by this table.
    pub fn check_truncation(&self, degree: usize, order: usize) -> Result<(), OrbitPropError> {
        if order > degree {
            return Err(OrbitPropError::invalid_parameter(
                "GMorder",
                order,
                "order must not exceed GMdegree",
            ));
        }
        if degree > self.max_degree {
            return Err(OrbitPropError::GravityFieldTooSmall {
                degree,
                order,
                available: self.max_degree,
            });
        }
        Ok(())
    }
}
