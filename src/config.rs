//! # Run configuration
//!
//! A propagation run is described by three independent key/value sets, read from
//! `key: value` text files:
//!
//! | set        | keys                                                                              |
//! |------------|-----------------------------------------------------------------------------------|
//! | forces     | `gravity`, `GMdegree`, `GMorder`, `sun`, `moon`, `atmosphere`, `ATMmodel`, `SRP`, `OT`, `RAcc` |
//! | elements   | `a`, `e`, `i`, `omega`, `raan`, `lM`, `mass`, `area`, `pressureCr`, `dragCd`, `date` |
//! | integrator | `minStep`, `maxStep`, `positionTolerance`, `durationTime`, `propagationTime`        |
//!
//! Each set is turned into a typed bundle ([`ForceConfig`], [`ElementsConfig`],
//! [`IntegratorConfig`]) that is fully validated before any integration starts:
//! a missing key gives [`OrbitPropError::MissingParameter`], an unparsable or
//! out-of-domain value gives [`OrbitPropError::InvalidParameter`] naming the key.
//!
//! ## Text format
//!
//! ```text
//! # Initial orbit
//! a: 24396159
//! e: 0.72831215
//! i: 7
//! date: 2004-01-01T23:30:00.000
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Angles are in degrees.
use std::{collections::HashMap, str::FromStr, sync::LazyLock};

use itertools::Itertools;
use log::warn;
use regex::Regex;

use crate::{
    atmosphere::AtmosphereModelKind,
    constants::{Meter, Second, RADEG},
    integrator::StepSizeControl,
    orbit_type::keplerian_element::{AnomalyKind, KeplerianElements},
    orbitprop_errors::OrbitPropError,
    spacecraft::SpacecraftProperties,
    time::parse_date,
};

/// Raw key/value parameters of one configuration set.
pub type ParameterMap = HashMap<String, String>;

static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("key pattern is a valid regex")
});

/// Parse `key: value` lines into a [`ParameterMap`].
///
/// The key ends at the first `:`, so values may contain colons (dates). A key that
/// appears twice keeps its last value.
///
/// Return
/// ------
/// * The map, or [`OrbitPropError::InvalidParameter`] for a line that is not `key: value`.
pub fn parse_key_value(text: &str) -> Result<ParameterMap, OrbitPropError> {
    let mut map = ParameterMap::new();
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .splitn(2, ':')
            .map(str::trim)
            .collect_tuple::<(&str, &str)>()
            .filter(|(key, value)| KEY_PATTERN.is_match(key) && !value.is_empty())
            .ok_or_else(|| {
                OrbitPropError::invalid_parameter(
                    &format!("line {}", line_number + 1),
                    line,
                    "expected `key: value`",
                )
            })?;

        if map.insert(key.to_string(), value.to_string()).is_some() {
            warn!("Parameter '{key}' is defined more than once, keeping the last value");
        }
    }
    Ok(map)
}

fn required<'a>(map: &'a ParameterMap, key: &str) -> Result<&'a str, OrbitPropError> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| OrbitPropError::MissingParameter(key.to_string()))
}

fn parse_value<T: FromStr>(map: &ParameterMap, key: &str) -> Result<T, OrbitPropError>
where
    T::Err: std::fmt::Display,
{
    let raw = required(map, key)?;
    raw.parse::<T>()
        .map_err(|err| OrbitPropError::invalid_parameter(key, raw, &err.to_string()))
}

/// Finite floating-point value.
fn parse_real(map: &ParameterMap, key: &str) -> Result<f64, OrbitPropError> {
    let value: f64 = parse_value(map, key)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OrbitPropError::invalid_parameter(key, value, "must be finite"))
    }
}

/// `0` / `1` toggle.
fn parse_flag(map: &ParameterMap, key: &str) -> Result<bool, OrbitPropError> {
    match parse_value::<i64>(map, key)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(OrbitPropError::invalid_parameter(
            key,
            other,
            "expected 0 (disabled) or 1 (enabled)",
        )),
    }
}

fn parse_count(map: &ParameterMap, key: &str) -> Result<usize, OrbitPropError> {
    let value: i64 = parse_value(map, key)?;
    usize::try_from(value)
        .map_err(|_| OrbitPropError::invalid_parameter(key, value, "must be >= 0"))
}

/// Which force models are enabled.
///
/// The central body is always attracting: `gravity = 1` selects the spherical
/// harmonics truncated at `(GMdegree, GMorder)`, `gravity = 0` the point mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForceConfig {
    pub gravity: bool,
    pub degree: usize,
    pub order: usize,
    pub sun: bool,
    pub moon: bool,
    pub atmosphere: bool,
    pub atmosphere_model: AtmosphereModelKind,
    pub solar_radiation_pressure: bool,
    pub ocean_tides: bool,
    pub relativity: bool,
}

impl ForceConfig {
    /// Two-body motion only.
    pub fn point_mass() -> Self {
        ForceConfig::default()
    }

    pub fn from_map(map: &ParameterMap) -> Result<Self, OrbitPropError> {
        let degree = parse_count(map, "GMdegree")?;
        let order = parse_count(map, "GMorder")?;
        if order > degree {
            return Err(OrbitPropError::invalid_parameter(
                "GMorder",
                order,
                "order must not exceed GMdegree",
            ));
        }

        Ok(ForceConfig {
            gravity: parse_flag(map, "gravity")?,
            degree,
            order,
            sun: parse_flag(map, "sun")?,
            moon: parse_flag(map, "moon")?,
            atmosphere: parse_flag(map, "atmosphere")?,
            atmosphere_model: AtmosphereModelKind::try_from(parse_value::<i64>(map, "ATMmodel")?)?,
            solar_radiation_pressure: parse_flag(map, "SRP")?,
            ocean_tides: parse_flag(map, "OT")?,
            relativity: parse_flag(map, "RAcc")?,
        })
    }
}

/// Initial orbit and spacecraft properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementsConfig {
    /// Initial elements, mean anomaly, angles in radians
    pub elements: KeplerianElements,
    pub spacecraft: SpacecraftProperties,
}

impl ElementsConfig {
    pub fn from_map(map: &ParameterMap) -> Result<Self, OrbitPropError> {
        let epoch = parse_date(required(map, "date")?)?;

        let elements = KeplerianElements::new(
            epoch,
            parse_real(map, "a")?,
            parse_real(map, "e")?,
            parse_real(map, "i")? * RADEG,
            parse_real(map, "raan")? * RADEG,
            parse_real(map, "omega")? * RADEG,
            parse_real(map, "lM")? * RADEG,
            AnomalyKind::Mean,
        )?;

        let spacecraft = SpacecraftProperties::new(
            parse_real(map, "mass")?,
            parse_real(map, "area")?,
            parse_real(map, "dragCd")?,
            parse_real(map, "pressureCr")?,
        )?;

        Ok(ElementsConfig {
            elements,
            spacecraft,
        })
    }
}

/// Integrator bounds and propagation window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorConfig {
    pub min_step: Second,
    pub max_step: Second,
    pub position_tolerance: Meter,
    /// Sampling interval (`durationTime`), s
    pub sample_interval: Second,
    /// Length of the window (`propagationTime`), s; negative for backward propagation
    pub propagation_time: Second,
}

impl IntegratorConfig {
    pub fn from_map(map: &ParameterMap) -> Result<Self, OrbitPropError> {
        let config = IntegratorConfig {
            min_step: parse_real(map, "minStep")?,
            max_step: parse_real(map, "maxStep")?,
            position_tolerance: parse_real(map, "positionTolerance")?,
            sample_interval: parse_real(map, "durationTime")?,
            propagation_time: parse_real(map, "propagationTime")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OrbitPropError> {
        self.step_control()?;
        if !(self.position_tolerance.is_finite() && self.position_tolerance > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "positionTolerance",
                self.position_tolerance,
                "must be > 0",
            ));
        }
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(OrbitPropError::invalid_parameter(
                "durationTime",
                self.sample_interval,
                "must be > 0",
            ));
        }
        if !self.propagation_time.is_finite() {
            return Err(OrbitPropError::invalid_parameter(
                "propagationTime",
                self.propagation_time,
                "must be finite",
            ));
        }
        Ok(())
    }

    /// Step bounds with the default controller constants.
    pub fn step_control(&self) -> Result<StepSizeControl, OrbitPropError> {
        StepSizeControl::new(self.min_step, self.max_step)
    }
}

/// The three configuration sets of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub forces: ForceConfig,
    pub elements: ElementsConfig,
    pub integrator: IntegratorConfig,
}

impl ScenarioConfig {
    pub fn from_maps(
        forces: &ParameterMap,
        elements: &ParameterMap,
        integrator: &ParameterMap,
    ) -> Result<Self, OrbitPropError> {
        Ok(ScenarioConfig {
            forces: ForceConfig::from_map(forces)?,
            elements: ElementsConfig::from_map(elements)?,
            integrator: IntegratorConfig::from_map(integrator)?,
        })
    }

    /// Build the configuration from the text of the three `key: value` files.
    pub fn from_texts(
        forces: &str,
        elements: &str,
        integrator: &str,
    ) -> Result<Self, OrbitPropError> {
        Self::from_maps(
            &parse_key_value(forces)?,
            &parse_key_value(elements)?,
            &parse_key_value(integrator)?,
        )
    }
}
