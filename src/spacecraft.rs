//! # Spacecraft physical properties
//!
//! Mass and surface properties used by the non-gravitational force models. The
//! struct is immutable for the duration of one propagation.
use crate::orbitprop_errors::OrbitPropError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpacecraftProperties {
    /// Mass, kg (> 0)
    pub mass: f64,
    /// Cross-sectional area, m² (≥ 0)
    pub area: f64,
    /// Drag coefficient `Cd`
    pub drag_coefficient: f64,
    /// Radiation pressure coefficient `Cr`
    pub radiation_pressure_coefficient: f64,
}

impl SpacecraftProperties {
    /// Build validated spacecraft properties.
    ///
    /// Arguments
    /// ---------
    /// * `mass`: kg, must be finite and > 0 (`mass`).
    /// * `area`: m², must be finite and ≥ 0 (`area`).
    /// * `drag_coefficient`: finite, ≥ 0 (`dragCd`).
    /// * `radiation_pressure_coefficient`: finite, ≥ 0 (`pressureCr`).
    ///
    /// Return
    /// ------
    /// * The properties, or [`OrbitPropError::InvalidParameter`] naming the offending key.
    pub fn new(
        mass: f64,
        area: f64,
        drag_coefficient: f64,
        radiation_pressure_coefficient: f64,
    ) -> Result<Self, OrbitPropError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "mass",
                mass,
                "mass must be finite and > 0",
            ));
        }
        for (name, value) in [
            ("area", area),
            ("dragCd", drag_coefficient),
            ("pressureCr", radiation_pressure_coefficient),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(OrbitPropError::invalid_parameter(
                    name,
                    value,
                    "must be finite and >= 0",
                ));
            }
        }

        Ok(SpacecraftProperties {
            mass,
            area,
            drag_coefficient,
            radiation_pressure_coefficient,
        })
    }

    /// Area-to-mass ratio, m²/kg.
    pub fn area_to_mass(&self) -> f64 {
        self.area / self.mass
    }
}
