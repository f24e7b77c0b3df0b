//! # Time system
//!
//! Calendar dates are parsed in **UTC** and every epoch handed to the integrator is
//! anchored to **TT** (Terrestrial Time), a continuous scale without leap seconds.
//! Both scales are provided by [hifitime](https://docs.rs/hifitime), whose [`Epoch`]
//! stores an integer-centuries + nanoseconds split and therefore keeps sub-microsecond
//! resolution over multi-year spans.
//!
//! The UTC → TT offset is explicit: `TT − UTC = ΔAT + 32.184 s`, where ΔAT is taken
//! from hifitime's built-in leap second table (see [`tt_minus_utc`]).
//!
//! ## Contract
//!
//! - [`to_epoch`] – calendar fields + time scale → [`Epoch`]
//! - [`parse_date`] – `yyyy-MM-ddTHH:mm:ss.SSS` (UTC) → [`Epoch`]
//! - [`duration_between`] – signed seconds between two epochs
//! - [`shift`] – epoch + seconds
//! - [`tai_minus_utc`], [`tt_minus_utc`] – leap-second and TT offsets
//! - [`gmst`] – Greenwich mean sidereal time, used for the Earth-fixed rotation
use std::sync::LazyLock;

use hifitime::{Duration, Epoch, TimeScale};
use regex::Regex;

use crate::{
    constants::{Second, DAYS_PER_CENTURY, DPI, MJD, SECONDS_PER_DAY, T2000, TT_MINUS_TAI},
    orbitprop_errors::OrbitPropError,
};

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?$")
        .expect("date pattern is a valid regex")
});

/// Build an epoch from calendar fields expressed in `time_scale`.
///
/// Arguments
/// ---------
/// * `year`, `month`, `day`, `hour`, `minute`: Gregorian calendar fields.
/// * `second`: seconds of the minute, with fraction (`0 ≤ second < 60`, or `< 61` on a leap second).
/// * `time_scale`: scale in which the fields are expressed (e.g. `TimeScale::UTC`).
///
/// Return
/// ------
/// * The corresponding [`Epoch`], or [`OrbitPropError::InvalidTimeFormat`] when the fields
///   do not describe a valid calendar date.
pub fn to_epoch(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: f64,
    time_scale: TimeScale,
) -> Result<Epoch, OrbitPropError> {
    if !second.is_finite() || !(0.0..61.0).contains(&second) {
        return Err(OrbitPropError::InvalidTimeFormat(format!(
            "second out of range: {second}"
        )));
    }

    let whole = second.trunc();
    let nanos = ((second - whole) * 1e9).round() as u32;
    let (whole, nanos) = if nanos >= 1_000_000_000 {
        (whole + 1.0, nanos - 1_000_000_000)
    } else {
        (whole, nanos)
    };

    Epoch::maybe_from_gregorian(
        year,
        month,
        day,
        hour,
        minute,
        whole as u8,
        nanos,
        time_scale,
    )
    .map_err(|err| {
        OrbitPropError::InvalidTimeFormat(format!(
            "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second} ({time_scale:?}): {err}"
        ))
    })
}

/// Parse a `yyyy-MM-ddTHH:mm:ss.SSS` UTC timestamp.
///
/// The fractional part is optional and may carry up to nine digits.
pub fn parse_date(date: &str) -> Result<Epoch, OrbitPropError> {
    let invalid = || OrbitPropError::InvalidTimeFormat(date.to_string());

    let caps = DATE_PATTERN.captures(date.trim()).ok_or_else(invalid)?;
    let field = |idx: usize| caps[idx].parse::<u32>().map_err(|_| invalid());

    let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
    let month = field(2)?;
    let day = field(3)?;
    let hour = field(4)?;
    let minute = field(5)?;
    let whole_second = field(6)?;

    let fraction = match caps.get(7) {
        Some(frac) => format!("0.{}", frac.as_str())
            .parse::<f64>()
            .map_err(|_| invalid())?,
        None => 0.0,
    };

    let narrow = |v: u32| u8::try_from(v).map_err(|_| invalid());
    to_epoch(
        year,
        narrow(month)?,
        narrow(day)?,
        narrow(hour)?,
        narrow(minute)?,
        whole_second as f64 + fraction,
        TimeScale::UTC,
    )
}

/// Signed number of seconds from `from` to `to` (positive when `to` is later).
pub fn duration_between(from: &Epoch, to: &Epoch) -> Second {
    (*to - *from).to_seconds()
}

/// Return `epoch` shifted by `seconds` (negative values move backward).
pub fn shift(epoch: &Epoch, seconds: Second) -> Epoch {
    *epoch + Duration::from_seconds(seconds)
}

/// Express an epoch in the continuous scale used during integration (TT).
pub fn to_integration_scale(epoch: &Epoch) -> Epoch {
    epoch.to_time_scale(TimeScale::TT)
}

/// Leap-second offset `ΔAT = TAI − UTC` in seconds at the given instant.
pub fn tai_minus_utc(epoch: &Epoch) -> Second {
    let (y, mo, d, h, mi, s, ns) = epoch.to_gregorian_utc();
    let as_utc = Epoch::from_gregorian(y, mo, d, h, mi, s, ns, TimeScale::UTC);
    let as_tai = Epoch::from_gregorian(y, mo, d, h, mi, s, ns, TimeScale::TAI);
    duration_between(&as_tai, &as_utc)
}

/// Offset `TT − UTC = ΔAT + 32.184 s` in seconds at the given instant.
pub fn tt_minus_utc(epoch: &Epoch) -> Second {
    tai_minus_utc(epoch) + TT_MINUS_TAI
}

/// Human readable UTC timestamp used in reports and error messages.
pub fn format_epoch(epoch: &Epoch) -> String {
    format!("{}", epoch.to_time_scale(TimeScale::UTC))
}

/// Julian centuries of TT elapsed since J2000.0.
pub fn julian_centuries_tt(epoch: &Epoch) -> f64 {
    (epoch.to_mjd_tt_days() - T2000) / DAYS_PER_CENTURY
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982/2000 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> f64 {
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / DAYS_PER_CENTURY;

    let mut gmst0 = ((C3 * t + C2) * t + C1) * t + C0;
    gmst0 *= DPI / SECONDS_PER_DAY;

    let h = (tjm - itjm) * DPI;
    (gmst0 + h * RAP).rem_euclid(DPI)
}

/// Rotation angle of the Earth-fixed frame about the inertial Z axis.
///
/// UT1 is approximated by UTC; the resulting error (|UT1 − UTC| < 0.9 s) only
/// affects the longitude of the tesseral gravity terms.
pub fn earth_rotation_angle(epoch: &Epoch) -> f64 {
    gmst(epoch.to_mjd_utc_days())
}

#[cfg(test)]
mod time_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_date() {
        let epoch = parse_date("2004-01-01T23:30:00.000").unwrap();
        assert_eq!(
            epoch,
            Epoch::from_gregorian_utc_hms(2004, 1, 1, 23, 30, 0)
        );

        let with_millis = parse_date("2004-01-01T23:30:00.250").unwrap();
        assert_relative_eq!(duration_between(&epoch, &with_millis), 0.25, epsilon = 1e-9);

        let no_fraction = parse_date("2021-01-01T00:00:00").unwrap();
        assert_eq!(no_fraction.to_mjd_utc_days(), 59215.0);
    }

    #[test]
    fn test_parse_invalid_date() {
        for bad in [
            "2004-13-01T00:00:00.000",
            "2004-02-30T00:00:00.000",
            "2004-01-01 23:30:00.000",
            "2004-01-01T25:30:00.000",
            "not a date",
            "",
        ] {
            let err = parse_date(bad).unwrap_err();
            assert!(
                matches!(err, OrbitPropError::InvalidTimeFormat(_)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_to_epoch_rejects_bad_seconds() {
        assert!(to_epoch(2004, 1, 1, 0, 0, f64::NAN, TimeScale::UTC).is_err());
        assert!(to_epoch(2004, 1, 1, 0, 0, -1.0, TimeScale::UTC).is_err());
    }

    #[test]
    fn test_shift_and_duration() {
        let t0 = parse_date("2004-01-01T23:30:00.000").unwrap();
        let t1 = shift(&t0, 630.0);
        assert_relative_eq!(duration_between(&t0, &t1), 630.0, epsilon = 1e-9);
        assert_relative_eq!(duration_between(&t1, &t0), -630.0, epsilon = 1e-9);
        assert!(t1 > t0);

        // Crossing the 2005-12-31 leap second keeps physical durations
        let before = parse_date("2005-12-31T23:59:59.000").unwrap();
        let after = parse_date("2006-01-01T00:00:00.000").unwrap();
        assert_relative_eq!(duration_between(&before, &after), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sub_millisecond_precision_over_years() {
        let t0 = parse_date("2004-01-01T23:30:00.000").unwrap();
        let ten_years = 10.0 * 365.25 * 86400.0;
        let t1 = shift(&shift(&t0, ten_years), 0.0001);
        assert_relative_eq!(
            duration_between(&t0, &t1) - ten_years,
            0.0001,
            epsilon = 1e-7
        );
    }

    #[test]
    fn test_tt_minus_utc() {
        // 32 leap seconds were in effect in 2004
        let epoch = parse_date("2004-01-01T23:30:00.000").unwrap();
        assert_relative_eq!(tai_minus_utc(&epoch), 32.0, epsilon = 1e-9);
        assert_relative_eq!(tt_minus_utc(&epoch), 64.184, epsilon = 1e-6);

        // Same offset as hifitime's own TT scale
        let (y, mo, d, h, mi, s, ns) = epoch.to_gregorian_utc();
        let same_fields_tt = Epoch::from_gregorian(y, mo, d, h, mi, s, ns, TimeScale::TT);
        assert_relative_eq!(
            duration_between(&same_fields_tt, &epoch),
            tt_minus_utc(&epoch),
            epsilon = 1e-6
        );

        // One more leap second after 2005-12-31
        let later = parse_date("2006-06-01T00:00:00.000").unwrap();
        assert_relative_eq!(tai_minus_utc(&later), 33.0, epsilon = 1e-9);
    }

    #[test]
    fn test_gmst() {
        let tut = 57028.478514610404;
        let res_gmst = gmst(tut);
        assert_relative_eq!(res_gmst, 4.851925725092499, epsilon = 1e-12);

        let res_gmst = gmst(T2000);
        assert_relative_eq!(res_gmst, 4.894961212789145, epsilon = 1e-12);
    }
}
