#![allow(dead_code)]

use std::sync::Arc;

use approx::assert_relative_eq;
use hifitime::Epoch;
use orbitprop::{
    constants::{EARTH_GRAVITY_RADIUS, MU_EARTH},
    force_models::{CentralBodyGravity, ForceStack},
    gravity_field::GravityField,
    integrator::StepSizeControl,
    kepler::angle_diff,
    orbit_type::keplerian_element::KeplerianElements,
    propagator::Propagator,
    spacecraft::SpacecraftProperties,
};

pub const FORCES_TWO_BODY: &str = "\
gravity: 0
GMdegree: 0
GMorder: 0
sun: 0
moon: 0
atmosphere: 0
ATMmodel: 1
SRP: 0
OT: 0
RAcc: 0
";

pub const FORCES_ALL: &str = "\
# every perturbation enabled
gravity: 1
GMdegree: 4
GMorder: 4
sun: 1
moon: 1
atmosphere: 1
ATMmodel: 1
SRP: 1
OT: 1
RAcc: 1
";

pub const ELEMENTS_GTO: &str = "\
a: 24396159
e: 0.72831215
i: 7
omega: 180
raan: 261
lM: 0
mass: 1000
area: 10
pressureCr: 1.8
dragCd: 2.2
date: 2004-01-01T23:30:00.000
";

pub const ELEMENTS_LEO: &str = "\
a: 6778137
e: 0.001
i: 51.6
omega: 30
raan: 120
lM: 10
mass: 500
area: 4
pressureCr: 1.5
dragCd: 2.2
date: 2004-01-01T23:30:00.000
";

pub const INTEGRATOR_630S: &str = "\
minStep: 0.001
maxStep: 1000
positionTolerance: 10
durationTime: 60
propagationTime: 630
";

pub const INTEGRATOR_ONE_HOUR: &str = "\
minStep: 0.001
maxStep: 60
positionTolerance: 1
durationTime: 600
propagationTime: 3600
";

pub fn reference_epoch() -> Epoch {
    Epoch::from_gregorian_utc_hms(2004, 1, 1, 23, 30, 0)
}

pub fn spacecraft() -> SpacecraftProperties {
    SpacecraftProperties::new(1000.0, 10.0, 2.2, 1.8).unwrap()
}

/// Point-mass Earth propagator with the given step bounds.
pub fn two_body_propagator(max_step: f64, position_tolerance: f64) -> Propagator {
    let field = Arc::new(GravityField::point_mass(MU_EARTH, EARTH_GRAVITY_RADIUS).unwrap());
    Propagator::new(
        ForceStack::new().with(CentralBodyGravity::point_mass(field)),
        spacecraft(),
        StepSizeControl::new(1e-3, max_step).unwrap(),
        position_tolerance,
    )
    .unwrap()
}

/// Compare two element sets, angles modulo 2π.
pub fn assert_orbit_close(actual: &KeplerianElements, expected: &KeplerianElements, epsilon: f64) {
    assert_eq!(actual.anomaly_kind, expected.anomaly_kind);
    assert_relative_eq!(
        actual.semi_major_axis,
        expected.semi_major_axis,
        max_relative = epsilon
    );
    assert_relative_eq!(
        actual.eccentricity,
        expected.eccentricity,
        epsilon = epsilon
    );
    assert_relative_eq!(actual.inclination, expected.inclination, epsilon = epsilon);
    assert!(
        angle_diff(actual.ascending_node_longitude, expected.ascending_node_longitude).abs()
            < epsilon
    );
    assert!(angle_diff(actual.periapsis_argument, expected.periapsis_argument).abs() < epsilon);
    assert!(angle_diff(actual.anomaly, expected.anomaly).abs() < epsilon);
}
