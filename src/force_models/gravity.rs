//! Central-body gravity.
//!
//! The potential gradient is evaluated in the Earth-fixed frame with the
//! Cunningham V/W recursion (Montenbruck & Gill, *Satellite Orbits*, §3.2.4) on
//! unnormalized coefficients, then rotated back to the inertial frame. At degree 0
//! the model reduces to the point-mass term `−μ r / |r|³` and skips the rotation.
use std::sync::Arc;

use log::debug;
use nalgebra::Vector3;

use super::ForceModel;
use crate::{
    gravity_field::GravityField,
    orbit_type::cartesian_state::CartesianState,
    orbitprop_errors::OrbitPropError,
    ref_system::{earth_fixed_to_inertial, inertial_to_earth_fixed},
    spacecraft::SpacecraftProperties,
};

/// Spherical-harmonic gravity truncated at `(degree, order)`.
#[derive(Debug, Clone)]
pub struct CentralBodyGravity {
    field: Arc<GravityField>,
    degree: usize,
    order: usize,
}

impl CentralBodyGravity {
    /// Fails with [`OrbitPropError::GravityFieldTooSmall`] if the table does not reach `degree`.
    pub fn new(field: Arc<GravityField>, degree: usize, order: usize) -> Result<Self, OrbitPropError> {
        field.check_truncation(degree, order)?;
        debug!("Central body gravity truncated at degree {degree}, order {order}");
        Ok(CentralBodyGravity {
            field,
            degree,
            order,
        })
    }

    /// Point-mass gravity of the field's central body.
    pub fn point_mass(field: Arc<GravityField>) -> Self {
        CentralBodyGravity {
            field,
            degree: 0,
            order: 0,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Gradient of the truncated potential at an Earth-fixed position.
    fn harmonic_acceleration(&self, r_fixed: &Vector3<f64>) -> Vector3<f64> {
        let n_max = self.degree;
        let m_max = self.order;
        let radius = self.field.radius();

        let r2 = r_fixed.norm_squared();
        let rho = radius * radius / r2;
        let x0 = radius * r_fixed.x / r2;
        let y0 = radius * r_fixed.y / r2;
        let z0 = radius * r_fixed.z / r2;

        // V[n][m], W[n][m] up to degree n_max + 1
        let size = n_max + 2;
        let mut v = vec![vec![0.0; size]; size];
        let mut w = vec![vec![0.0; size]; size];

        // Zonal terms
        v[0][0] = radius / r2.sqrt();
        v[1][0] = z0 * v[0][0];
        for n in 2..size {
            let nf = n as f64;
            v[n][0] = ((2.0 * nf - 1.0) * z0 * v[n - 1][0] - (nf - 1.0) * rho * v[n - 2][0]) / nf;
        }

        // Tesseral and sectorial terms
        for m in 1..=(m_max + 1) {
            let mf = m as f64;
            v[m][m] = (2.0 * mf - 1.0) * (x0 * v[m - 1][m - 1] - y0 * w[m - 1][m - 1]);
            w[m][m] = (2.0 * mf - 1.0) * (x0 * w[m - 1][m - 1] + y0 * v[m - 1][m - 1]);

            if m < size - 1 {
                v[m + 1][m] = (2.0 * mf + 1.0) * z0 * v[m][m];
                w[m + 1][m] = (2.0 * mf + 1.0) * z0 * w[m][m];
            }
            for n in (m + 2)..size {
                let nf = n as f64;
                v[n][m] = ((2.0 * nf - 1.0) * z0 * v[n - 1][m]
                    - (nf + mf - 1.0) * rho * v[n - 2][m])
                    / (nf - mf);
                w[n][m] = ((2.0 * nf - 1.0) * z0 * w[n - 1][m]
                    - (nf + mf - 1.0) * rho * w[n - 2][m])
                    / (nf - mf);
            }
        }

        let (mut ax, mut ay, mut az) = (0.0, 0.0, 0.0);
        for m in 0..=m_max {
            for n in m..=n_max {
                let (c, s) = self.field.coefficients(n, m);
                if m == 0 {
                    ax -= c * v[n + 1][1];
                    ay -= c * w[n + 1][1];
                    az -= (n as f64 + 1.0) * c * v[n + 1][0];
                } else {
                    let fac = 0.5 * (n - m + 1) as f64 * (n - m + 2) as f64;
                    ax += 0.5 * (-c * v[n + 1][m + 1] - s * w[n + 1][m + 1])
                        + fac * (c * v[n + 1][m - 1] + s * w[n + 1][m - 1]);
                    ay += 0.5 * (-c * w[n + 1][m + 1] + s * v[n + 1][m + 1])
                        + fac * (-c * w[n + 1][m - 1] + s * v[n + 1][m - 1]);
                    az += (n - m + 1) as f64 * (-c * v[n + 1][m] - s * w[n + 1][m]);
                }
            }
        }

        Vector3::new(ax, ay, az) * (self.field.mu() / (radius * radius))
    }
}

impl ForceModel for CentralBodyGravity {
    fn acceleration(
        &self,
        state: &CartesianState,
        _spacecraft: &SpacecraftProperties,
    ) -> Result<Vector3<f64>, OrbitPropError> {
        if self.degree == 0 {
            let r = state.position.norm();
            return Ok(-self.field.mu() * state.position / (r * r * r));
        }

        let r_fixed = inertial_to_earth_fixed(&state.epoch) * state.position;
        let a_fixed = self.harmonic_acceleration(&r_fixed);
        Ok(earth_fixed_to_inertial(&state.epoch) * a_fixed)
    }

    fn name(&self) -> &'static str {
        if self.degree == 0 {
            "point-mass gravity"
        } else {
            "spherical harmonics gravity"
        }
    }
}
