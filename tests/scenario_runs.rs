use approx::assert_relative_eq;
use orbitprop::{
    config::ScenarioConfig,
    constants::{MU_EARTH, RADEG},
    env_state::PropagationEnv,
    kepler::angle_diff,
    orbitprop_errors::{ErrorKind, OrbitPropError},
    report::{write_equinoctial_report, write_keplerian_report},
    sampler::SampleBounds,
    scenario::Scenario,
    time::duration_between,
};

mod common;
use common::{
    ELEMENTS_GTO, ELEMENTS_LEO, FORCES_ALL, FORCES_TWO_BODY, INTEGRATOR_630S,
    INTEGRATOR_ONE_HOUR,
};

#[test]
fn transfer_orbit_keeps_its_elements() {
    let scenario = Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_GTO, INTEGRATOR_630S).unwrap();
    let outcome = scenario.run(SampleBounds::IntervalOnly).unwrap();
    let trajectory = &outcome.trajectory;

    assert_eq!(trajectory.len(), 11);
    assert!(trajectory.is_monotonic());
    assert_eq!(trajectory.last().unwrap().elapsed, 600.0);

    let initial = &scenario.config().elements.elements;
    let mut previous_anomaly = -1.0;
    for sample in trajectory {
        let kep = sample.elements.as_ref().unwrap();
        assert_relative_eq!(kep.semi_major_axis, initial.semi_major_axis, max_relative = 1e-4);
        assert_relative_eq!(kep.eccentricity, initial.eccentricity, epsilon = 1e-4);
        assert!(angle_diff(kep.inclination, initial.inclination).abs() < 1e-8);
        assert!(
            angle_diff(kep.ascending_node_longitude, initial.ascending_node_longitude).abs()
                < 1e-8
        );
        assert!(angle_diff(kep.periapsis_argument, initial.periapsis_argument).abs() < 1e-4);

        // starts at perigee, well before apogee after 600 s
        let mean_anomaly = angle_diff(kep.mean_anomaly(), 0.0);
        assert!(mean_anomaly > previous_anomaly);
        previous_anomaly = mean_anomaly;
    }

    // the final state is still at the end of the window
    assert_eq!(
        duration_between(
            &scenario.initial_state().unwrap().epoch,
            &outcome.final_state().epoch
        ),
        630.0
    );
}

#[test]
fn both_bounds_add_the_target_sample() {
    let scenario = Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_GTO, INTEGRATOR_630S).unwrap();
    let interval_only = scenario.run(SampleBounds::IntervalOnly).unwrap();
    let both = scenario.run(SampleBounds::Both).unwrap();

    assert_eq!(both.trajectory.len(), 12);
    let last = both.trajectory.last().unwrap();
    assert_eq!(last.elapsed, 630.0);
    assert!(last.is_final);
    assert_eq!(last.state, *both.final_state());
    assert_eq!(interval_only.final_state(), both.final_state());
}

#[test]
fn perturbations_stay_small_in_low_orbit() {
    let two_body =
        Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_LEO, INTEGRATOR_ONE_HOUR).unwrap();
    let perturbed = Scenario::from_texts(FORCES_ALL, ELEMENTS_LEO, INTEGRATOR_ONE_HOUR).unwrap();

    assert_eq!(perturbed.propagator().unwrap().forces().len(), 7);

    let reference = two_body.run(SampleBounds::Both).unwrap();
    let outcome = perturbed.run(SampleBounds::Both).unwrap();
    assert_eq!(outcome.trajectory.len(), 7);

    let deviation =
        (outcome.final_state().position - reference.final_state().position).norm();
    // J2 dominates: kilometers after one hour, never hundreds of kilometers
    assert!(deviation > 100.0, "deviation {deviation} m");
    assert!(deviation < 200_000.0, "deviation {deviation} m");

    let initial = &perturbed.config().elements.elements;
    for sample in &outcome.trajectory {
        let kep = sample.elements.as_ref().unwrap();
        assert_relative_eq!(kep.semi_major_axis, initial.semi_major_axis, max_relative = 5e-3);
        assert!((kep.inclination - initial.inclination).abs() < 0.1 * RADEG);
    }
}

/// Integrator settings for a `duration` s run sampled every 600 s.
fn integrator_for(duration: f64) -> String {
    format!(
        "minStep: 0.001\nmaxStep: 60\npositionTolerance: 1\ndurationTime: 600\npropagationTime: {duration}\n"
    )
}

#[test]
fn perturbation_effect_grows_with_duration() {
    let period = 2.0 * std::f64::consts::PI * (6_778_137.0_f64.powi(3) / MU_EARTH).sqrt();

    let deviations: Vec<f64> = [630.0, period.round(), (3.0 * period).round()]
        .into_iter()
        .map(|duration| {
            let integrator = integrator_for(duration);
            let two_body = Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_LEO, &integrator)
                .unwrap()
                .run(SampleBounds::Both)
                .unwrap();
            let perturbed = Scenario::from_texts(FORCES_ALL, ELEMENTS_LEO, &integrator)
                .unwrap()
                .run(SampleBounds::Both)
                .unwrap();
            assert_eq!(
                two_body.final_state().epoch,
                perturbed.final_state().epoch
            );
            (perturbed.final_state().position - two_body.final_state().position).norm()
        })
        .collect();

    assert!(deviations[0] > 10.0, "{deviations:?}");
    assert!(deviations[1] > deviations[0], "{deviations:?}");
    assert!(deviations[2] > deviations[1], "{deviations:?}");
    // along-track drift after one revolution is already kilometric
    assert!(deviations[1] > 1_000.0, "{deviations:?}");
}

#[test]
fn reports_have_one_row_per_sample() {
    let scenario = Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_GTO, INTEGRATOR_630S).unwrap();
    let outcome = scenario.run(SampleBounds::Both).unwrap();

    let mut keplerian = Vec::new();
    write_keplerian_report(&mut keplerian, &outcome.trajectory).unwrap();
    let keplerian = String::from_utf8(keplerian).unwrap();
    assert_eq!(keplerian.lines().count(), 1 + outcome.trajectory.len());
    assert!(keplerian.lines().nth(1).unwrap().starts_with("2004-01-01T23:30:00"));

    let mut equinoctial = Vec::new();
    write_equinoctial_report(&mut equinoctial, &outcome.trajectory).unwrap();
    let mut reader = csv::Reader::from_reader(equinoctial.as_slice());
    for record in reader.records() {
        let record = record.unwrap();
        let lambda: f64 = record[7].parse().unwrap();
        assert!(lambda > -180.0 && lambda <= 180.0);
    }
}

#[test]
fn configuration_errors_are_reported_before_running() {
    let missing = ELEMENTS_GTO.replace("a: 24396159\n", "");
    let err = Scenario::from_texts(FORCES_TWO_BODY, &missing, INTEGRATOR_630S).unwrap_err();
    assert!(matches!(err, OrbitPropError::MissingParameter(ref key) if key == "a"));
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let hyperbolic = ELEMENTS_GTO.replace("e: 0.72831215", "e: 1.2");
    assert!(Scenario::from_texts(FORCES_TWO_BODY, &hyperbolic, INTEGRATOR_630S).is_err());

    let bad_date = ELEMENTS_GTO.replace("2004-01-01T23:30:00.000", "01/01/2004");
    assert!(matches!(
        Scenario::from_texts(FORCES_TWO_BODY, &bad_date, INTEGRATOR_630S),
        Err(OrbitPropError::InvalidTimeFormat(_))
    ));

    let inverted = INTEGRATOR_630S.replace("minStep: 0.001", "minStep: 5000");
    assert!(matches!(
        Scenario::from_texts(FORCES_TWO_BODY, ELEMENTS_GTO, &inverted),
        Err(OrbitPropError::InvalidParameter { .. })
    ));

    let order_above_degree = FORCES_ALL.replace("GMorder: 4", "GMorder: 5");
    assert!(matches!(
        ScenarioConfig::from_texts(&order_above_degree, ELEMENTS_GTO, INTEGRATOR_630S),
        Err(OrbitPropError::InvalidParameter { ref name, .. }) if name == "GMorder"
    ));
}

#[test]
fn gravity_field_too_small_fails_at_assembly() {
    let forces = FORCES_ALL
        .replace("GMdegree: 4", "GMdegree: 90")
        .replace("GMorder: 4", "GMorder: 90");
    let scenario = Scenario::new(
        ScenarioConfig::from_texts(&forces, ELEMENTS_LEO, INTEGRATOR_ONE_HOUR).unwrap(),
        PropagationEnv::default(),
    );
    assert!(matches!(
        scenario.run(SampleBounds::Both),
        Err(OrbitPropError::GravityFieldTooSmall { degree: 90, .. })
    ));
}
