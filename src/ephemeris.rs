//! # Sun and Moon ephemerides
//!
//! Third-body, radiation pressure and tide models only need the geocentric
//! position of the perturbing body at an epoch. That capability is the
//! [`Ephemeris`] trait; any `Fn(&Epoch) -> Result<Vector3<f64>, OrbitPropError>`
//! closure implements it, so tabulated or externally computed ephemerides can be
//! plugged in without a wrapper type.
//!
//! Two low-precision analytical series are provided as defaults (Montenbruck & Gill,
//! *Satellite Orbits*, §3.3.2):
//!
//! * [`AnalyticalSun`] – about 0.1–1 % accuracy in position,
//! * [`AnalyticalMoon`] – a few arcminutes in longitude, ~500 km in distance.
//!
//! Both return coordinates in the mean equator and equinox of J2000 and are valid
//! for years 1900–2100; outside that range they fail with
//! [`OrbitPropError::EphemerisOutOfRange`].
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::{ARCSEC_PER_RAD, RADEG},
    orbitprop_errors::OrbitPropError,
    ref_system::ecliptic_to_equatorial,
    time::{format_epoch, julian_centuries_tt},
};

/// Geocentric position provider of a perturbing body (meters, inertial frame).
pub trait Ephemeris: Send + Sync {
    fn position(&self, epoch: &Epoch) -> Result<Vector3<f64>, OrbitPropError>;
}

impl<F> Ephemeris for F
where
    F: Fn(&Epoch) -> Result<Vector3<f64>, OrbitPropError> + Send + Sync,
{
    fn position(&self, epoch: &Epoch) -> Result<Vector3<f64>, OrbitPropError> {
        self(epoch)
    }
}

/// Julian centuries since J2000, checked against the 1900–2100 validity window.
fn centuries_in_range(body: &'static str, epoch: &Epoch) -> Result<f64, OrbitPropError> {
    let t = julian_centuries_tt(epoch);
    if !(-1.0..=1.0).contains(&t) {
        return Err(OrbitPropError::EphemerisOutOfRange {
            body,
            epoch: format_epoch(epoch),
        });
    }
    Ok(t)
}

fn from_spherical_ecliptic(longitude: f64, latitude: f64, distance: f64) -> Vector3<f64> {
    let (sl, cl) = longitude.sin_cos();
    let (sb, cb) = latitude.sin_cos();
    ecliptic_to_equatorial(&Vector3::new(
        distance * cl * cb,
        distance * sl * cb,
        distance * sb,
    ))
}

/// Low-precision analytical solar ephemeris.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticalSun;

impl Ephemeris for AnalyticalSun {
    fn position(&self, epoch: &Epoch) -> Result<Vector3<f64>, OrbitPropError> {
        let t = centuries_in_range("Sun", epoch)?;

        // Mean anomaly and ecliptic longitude (equinox J2000)
        let m = (357.5256 + 35_999.049 * t) * RADEG;
        let omega_plus_w = 282.94 * RADEG;
        let longitude =
            omega_plus_w + m + (6892.0 * m.sin() + 72.0 * (2.0 * m).sin()) / ARCSEC_PER_RAD;
        let distance = (149.619 - 2.499 * m.cos() - 0.021 * (2.0 * m).cos()) * 1e9;

        Ok(from_spherical_ecliptic(longitude, 0.0, distance))
    }
}

/// Low-precision analytical lunar ephemeris.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticalMoon;

impl Ephemeris for AnalyticalMoon {
    fn position(&self, epoch: &Epoch) -> Result<Vector3<f64>, OrbitPropError> {
        let t = centuries_in_range("Moon", epoch)?;

        // Fundamental arguments
        let l0 = (218.316_17 + 481_267.880_88 * t - 1.3972 * t) * RADEG;
        let l = (134.962_92 + 477_198.867_53 * t) * RADEG;
        let lp = (357.525_43 + 35_999.049_44 * t) * RADEG;
        let f = (93.272_83 + 483_202.018_73 * t) * RADEG;
        let d = (297.850_27 + 445_267.111_35 * t) * RADEG;

        let longitude = l0
            + (22_640.0 * l.sin() + 769.0 * (2.0 * l).sin() - 4586.0 * (l - 2.0 * d).sin()
                + 2370.0 * (2.0 * d).sin()
                - 668.0 * lp.sin()
                - 412.0 * (2.0 * f).sin()
                - 212.0 * (2.0 * l - 2.0 * d).sin()
                - 206.0 * (l + lp - 2.0 * d).sin()
                + 192.0 * (l + 2.0 * d).sin()
                - 165.0 * (lp - 2.0 * d).sin()
                + 148.0 * (l - lp).sin()
                - 125.0 * d.sin()
                - 110.0 * (l + lp).sin()
                - 55.0 * (2.0 * f - 2.0 * d).sin())
                / ARCSEC_PER_RAD;

        let latitude = (18_520.0
            * (f + longitude - l0 + (412.0 * (2.0 * f).sin() + 541.0 * lp.sin()) / ARCSEC_PER_RAD)
                .sin()
            - 526.0 * (f - 2.0 * d).sin()
            + 44.0 * (l + f - 2.0 * d).sin()
            - 31.0 * (-l + f - 2.0 * d).sin()
            - 25.0 * (-2.0 * l + f).sin()
            - 23.0 * (lp + f - 2.0 * d).sin()
            + 21.0 * (-l + f).sin()
            + 11.0 * (-lp + f - 2.0 * d).sin())
            / ARCSEC_PER_RAD;

        let distance = (385_000.0
            - 20_905.0 * l.cos()
            - 3699.0 * (2.0 * d - l).cos()
            - 2956.0 * (2.0 * d).cos()
            - 570.0 * (2.0 * l).cos()
            + 246.0 * (2.0 * l - 2.0 * d).cos()
            - 205.0 * (lp - 2.0 * d).cos()
            - 171.0 * (l + 2.0 * d).cos()
            - 152.0 * (l + lp - 2.0 * d).cos())
            * 1e3;

        Ok(from_spherical_ecliptic(longitude, latitude, distance))
    }
}
