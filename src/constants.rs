//! # Constants and type definitions for orbitprop
//!
//! This module centralizes the **physical constants**, **conversion factors** and
//! **type aliases** shared by the propagation engine.
//!
//! ## Overview
//!
//! - Earth gravity field reference values (EGM96)
//! - Third-body gravitational parameters (Sun, Moon)
//! - Solar radiation and Earth rotation constants
//! - Unit conversions (degrees ↔ radians, days ↔ seconds)
//! - Core type aliases used across the crate
//!
//! All lengths are in **meters**, all times in **seconds** and all angles in
//! **radians** unless the alias says otherwise.

// -------------------------------------------------------------------------------------------------
// Mathematical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds in a full radian
pub const ARCSEC_PER_RAD: f64 = 648_000.0 / std::f64::consts::PI;

/// Astronomical Unit in meters (IAU 2012)
pub const AU: f64 = 149_597_870_700.0;

/// Speed of light in m/s
pub const VLIGHT: f64 = 299_792_458.0;

// -------------------------------------------------------------------------------------------------
// Earth
// -------------------------------------------------------------------------------------------------

/// Earth gravitational parameter (EGM96), m³/s²
pub const MU_EARTH: f64 = 3.986_004_415e14;

/// Reference radius of the EGM96 gravity field, meters
pub const EARTH_GRAVITY_RADIUS: f64 = 6_378_136.3;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Nominal Earth rotation rate, rad/s
pub const OMEGA_EARTH: f64 = 7.292_115e-5;

/// Mean obliquity of the ecliptic at J2000, radians
pub const OBLIQUITY_J2000: f64 = 23.439_291_11 * RADEG;

/// Constant offset TT − TAI, seconds
pub const TT_MINUS_TAI: f64 = 32.184;

// -------------------------------------------------------------------------------------------------
// Third bodies and radiation
// -------------------------------------------------------------------------------------------------

/// Sun gravitational parameter (DE430), m³/s²
pub const MU_SUN: f64 = 1.327_124_400_18e20;

/// Moon gravitational parameter (DE430), m³/s²
pub const MU_MOON: f64 = 4.902_800_066e12;

/// Solar radius, meters
pub const SUN_RADIUS: f64 = 6.96e8;

/// Solar radiation pressure at 1 AU, N/m²
pub const SOLAR_PRESSURE_1AU: f64 = 4.56e-6;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Elapsed time in seconds
pub type Second = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

/// Flat position/velocity vector `[x, y, z, vx, vy, vz]` handed to the integrator (m, m/s)
pub type StateVector = [f64; 6];
