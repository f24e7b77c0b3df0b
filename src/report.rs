//! # Trajectory reports
//!
//! Three tabular views of a [`Trajectory`], one row per sample:
//!
//! * [`KeplerianRow`] – `a` (m), `e`, `i`, `ω`, `Ω`, `M` (deg)
//! * [`CartesianRow`] – position (km), velocity (km/s)
//! * [`EquinoctialRow`] – `a` (m), `h`, `k`, `p`, `q`, `λ` (deg, in `(−180, 180]`)
//!
//! Each row starts with the UTC timestamp and the seconds elapsed since the
//! initial epoch. Rows derive [`serde::Serialize`] and are written as CSV to any
//! [`std::io::Write`] sink. Element columns are left empty for samples without
//! osculating elements (non-elliptic states).
use std::io::Write;

use serde::Serialize;

use crate::{
    constants::RADEG,
    orbit_type::equinoctial_element::EquinoctialElements,
    orbitprop_errors::OrbitPropError,
    sampler::{Sample, Trajectory},
    time::format_epoch,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeplerianRow {
    pub date: String,
    #[serde(rename = "elapsed_s")]
    pub elapsed: f64,
    #[serde(rename = "a_m")]
    pub semi_major_axis: Option<f64>,
    #[serde(rename = "e")]
    pub eccentricity: Option<f64>,
    #[serde(rename = "i_deg")]
    pub inclination: Option<f64>,
    #[serde(rename = "omega_deg")]
    pub periapsis_argument: Option<f64>,
    #[serde(rename = "raan_deg")]
    pub ascending_node_longitude: Option<f64>,
    #[serde(rename = "mean_anomaly_deg")]
    pub mean_anomaly: Option<f64>,
}

impl From<&Sample> for KeplerianRow {
    fn from(sample: &Sample) -> Self {
        let kep = sample.elements.as_ref();
        KeplerianRow {
            date: format_epoch(&sample.epoch),
            elapsed: sample.elapsed,
            semi_major_axis: kep.map(|k| k.semi_major_axis),
            eccentricity: kep.map(|k| k.eccentricity),
            inclination: kep.map(|k| k.inclination / RADEG),
            periapsis_argument: kep.map(|k| k.periapsis_argument / RADEG),
            ascending_node_longitude: kep.map(|k| k.ascending_node_longitude / RADEG),
            mean_anomaly: kep.map(|k| k.mean_anomaly() / RADEG),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartesianRow {
    pub date: String,
    #[serde(rename = "elapsed_s")]
    pub elapsed: f64,
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
    pub vx_km_s: f64,
    pub vy_km_s: f64,
    pub vz_km_s: f64,
}

impl From<&Sample> for CartesianRow {
    fn from(sample: &Sample) -> Self {
        let r = sample.state.position * 1e-3;
        let v = sample.state.velocity * 1e-3;
        CartesianRow {
            date: format_epoch(&sample.epoch),
            elapsed: sample.elapsed,
            x_km: r.x,
            y_km: r.y,
            z_km: r.z,
            vx_km_s: v.x,
            vy_km_s: v.y,
            vz_km_s: v.z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquinoctialRow {
    pub date: String,
    #[serde(rename = "elapsed_s")]
    pub elapsed: f64,
    #[serde(rename = "a_m")]
    pub semi_major_axis: Option<f64>,
    pub h: Option<f64>,
    pub k: Option<f64>,
    pub p: Option<f64>,
    pub q: Option<f64>,
    #[serde(rename = "mean_longitude_deg")]
    pub mean_longitude: Option<f64>,
}

impl From<&Sample> for EquinoctialRow {
    fn from(sample: &Sample) -> Self {
        let equ = sample.elements.as_ref().map(EquinoctialElements::from);
        let equ = equ.as_ref();
        EquinoctialRow {
            date: format_epoch(&sample.epoch),
            elapsed: sample.elapsed,
            semi_major_axis: equ.map(|e| e.semi_major_axis),
            h: equ.map(|e| e.eccentricity_sin_lon),
            k: equ.map(|e| e.eccentricity_cos_lon),
            p: equ.map(|e| e.tan_half_incl_sin_node),
            q: equ.map(|e| e.tan_half_incl_cos_node),
            mean_longitude: equ.map(|e| e.signed_mean_longitude() / RADEG),
        }
    }
}

/// Write rows as CSV with a header line.
pub fn write_rows<W, R, I>(sink: W, rows: I) -> Result<(), OrbitPropError>
where
    W: Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_keplerian_report<W: Write>(
    sink: W,
    trajectory: &Trajectory,
) -> Result<(), OrbitPropError> {
    write_rows(sink, trajectory.iter().map(KeplerianRow::from))
}

pub fn write_cartesian_report<W: Write>(
    sink: W,
    trajectory: &Trajectory,
) -> Result<(), OrbitPropError> {
    write_rows(sink, trajectory.iter().map(CartesianRow::from))
}

pub fn write_equinoctial_report<W: Write>(
    sink: W,
    trajectory: &Trajectory,
) -> Result<(), OrbitPropError> {
    write_rows(sink, trajectory.iter().map(EquinoctialRow::from))
}

#[cfg(test)]
mod report_test {
    use std::ops::ControlFlow;

    use super::*;
    use crate::{
        constants::MU_EARTH,
        orbit_type::keplerian_element::keplerian_element_test::scenario_elements,
        sampler::Sampler,
    };
    use approx::assert_relative_eq;

    fn scenario_trajectory() -> Trajectory {
        let elements = scenario_elements();
        let state = elements.to_cartesian(MU_EARTH).unwrap();
        let mut traj = Trajectory::new();
        let flow = traj.handle_sample(&Sample::new(state, 0.0, true).unwrap());
        assert_eq!(flow, ControlFlow::Continue(()));
        traj
    }

    #[test]
    fn test_keplerian_row_units() {
        let traj = scenario_trajectory();
        let row = KeplerianRow::from(traj.first().unwrap());
        assert_relative_eq!(row.semi_major_axis.unwrap(), 24396159.0, max_relative = 1e-10);
        assert_relative_eq!(row.eccentricity.unwrap(), 0.72831215, epsilon = 1e-10);
        assert_relative_eq!(row.inclination.unwrap(), 7.0, epsilon = 1e-9);
        assert_relative_eq!(row.periapsis_argument.unwrap(), 180.0, epsilon = 1e-7);
        assert_relative_eq!(row.ascending_node_longitude.unwrap(), 261.0, epsilon = 1e-9);
        let mean_anomaly = row.mean_anomaly.unwrap();
        assert!(mean_anomaly.abs() < 1e-7 || (mean_anomaly - 360.0).abs() < 1e-7);
    }

    #[test]
    fn test_cartesian_row_in_km() {
        let traj = scenario_trajectory();
        let sample = traj.first().unwrap();
        let row = CartesianRow::from(sample);
        assert_relative_eq!(row.x_km * 1e3, sample.state.position.x, max_relative = 1e-14);
        assert_relative_eq!(row.vz_km_s * 1e3, sample.state.velocity.z, max_relative = 1e-14);
        // perigee radius a(1 − e) ≈ 6628 km
        let r = (row.x_km.powi(2) + row.y_km.powi(2) + row.z_km.powi(2)).sqrt();
        assert_relative_eq!(r, 24396.159 * (1.0 - 0.72831215), max_relative = 1e-9);
    }

    #[test]
    fn test_equinoctial_row() {
        let traj = scenario_trajectory();
        let row = EquinoctialRow::from(traj.first().unwrap());
        let lon = (261.0_f64 + 180.0).to_radians();
        assert_relative_eq!(row.h.unwrap(), 0.72831215 * lon.sin(), epsilon = 1e-9);
        assert_relative_eq!(row.k.unwrap(), 0.72831215 * lon.cos(), epsilon = 1e-9);
        assert_relative_eq!(
            row.q.unwrap(),
            (3.5_f64).to_radians().tan() * 261.0_f64.to_radians().cos(),
            epsilon = 1e-12
        );
        // λ = 441° ≡ 81°
        assert_relative_eq!(row.mean_longitude.unwrap(), 81.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csv_output() {
        let traj = scenario_trajectory();
        let mut buffer = Vec::new();
        write_keplerian_report(&mut buffer, &traj).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,elapsed_s,a_m,e,i_deg,omega_deg,raan_deg,mean_anomaly_deg"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("2004-01-01T23:30:00"), "{row}");
        assert!(lines.next().is_none());

        let mut buffer = Vec::new();
        write_cartesian_report(&mut buffer, &traj).unwrap();
        assert!(String::from_utf8(buffer)
            .unwrap()
            .starts_with("date,elapsed_s,x_km,y_km,z_km,vx_km_s,vy_km_s,vz_km_s"));

        let mut buffer = Vec::new();
        write_equinoctial_report(&mut buffer, &traj).unwrap();
        assert!(String::from_utf8(buffer)
            .unwrap()
            .starts_with("date,elapsed_s,a_m,h,k,p,q,mean_longitude_deg"));
    }

    #[test]
    fn test_rows_without_elements_leave_cells_empty() {
        let mut state = scenario_elements().to_cartesian(MU_EARTH).unwrap();
        state.velocity *= 3.0;
        let mut traj = Trajectory::new();
        let _ = traj.handle_sample(&Sample::new(state, 0.0, true).unwrap());
        assert_eq!(traj.first().unwrap().elements, None);

        let row = KeplerianRow::from(traj.first().unwrap());
        assert_eq!(row.semi_major_axis, None);
        assert_eq!(row.mean_anomaly, None);
        assert_eq!(EquinoctialRow::from(traj.first().unwrap()).h, None);

        let mut buffer = Vec::new();
        write_keplerian_report(&mut buffer, &traj).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("2004-01-01T23:30:00"), "{row}");
        assert!(row.ends_with(",0.0,,,,,,"), "{row}");

        // The Cartesian view is always complete
        let mut buffer = Vec::new();
        write_cartesian_report(&mut buffer, &traj).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(!text.lines().nth(1).unwrap().contains(",,"));
    }
}
