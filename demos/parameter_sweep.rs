use std::{env, thread};

use log::info;
use orbitprop::{
    config::ScenarioConfig,
    constants::EARTH_MAJOR_AXIS,
    env_state::PropagationEnv,
    orbitprop_errors::OrbitPropError,
    sampler::{Sample, SampleBounds},
    scenario::Scenario,
    spacecraft::SpacecraftProperties,
};

const FORCES: &str = "\
gravity: 1
GMdegree: 2
GMorder: 0
sun: 0
moon: 0
atmosphere: 1
ATMmodel: 1
SRP: 0
OT: 0
RAcc: 0
";

const ELEMENTS: &str = "\
a: 6628137
e: 0.0005
i: 51.6
omega: 0
raan: 0
lM: 0
mass: 500
area: 1
pressureCr: 1.5
dragCd: 2.2
date: 2004-01-01T23:30:00.000
";

const INTEGRATOR: &str = "\
minStep: 0.001
maxStep: 120
positionTolerance: 1
durationTime: 3600
propagationTime: 86400
";

/// Semi-major axis decay over one day for a range of drag areas, one thread per run.
///
/// Usage:
///   parameter_sweep [AREA_M2 ...]
/// Example:
///   RUST_LOG=info parameter_sweep 1 5 10 20
///
/// Every run shares the same [`PropagationEnv`]; only the spacecraft area changes.
fn main() -> Result<(), OrbitPropError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let areas = env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<f64>()
                .map_err(|err| OrbitPropError::InvalidParameter {
                    name: "area".into(),
                    value: arg.clone(),
                    reason: err.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let areas = if areas.is_empty() {
        vec![1.0, 5.0, 10.0, 20.0]
    } else {
        areas
    };

    let base = ScenarioConfig::from_texts(FORCES, ELEMENTS, INTEGRATOR)?;
    let env = PropagationEnv::default();

    let results = thread::scope(|scope| {
        let handles = areas
            .iter()
            .map(|&area| {
                let mut config = base.clone();
                let env = env.clone();
                scope.spawn(move || -> Result<(f64, f64), OrbitPropError> {
                    let sc = config.elements.spacecraft;
                    config.elements.spacecraft = SpacecraftProperties::new(
                        sc.mass,
                        area,
                        sc.drag_coefficient,
                        sc.radiation_pressure_coefficient,
                    )?;
                    let outcome = Scenario::new(config, env).run(SampleBounds::Both)?;
                    let semi_major_axis =
                        |s: &Sample| s.elements.as_ref().map(|el| el.semi_major_axis);
                    let first = outcome.trajectory.first().and_then(semi_major_axis);
                    let last = outcome.trajectory.last().and_then(semi_major_axis);
                    info!("area {area} m²: {} samples", outcome.trajectory.len());
                    Ok((area, last.unwrap_or(f64::NAN) - first.unwrap_or(f64::NAN)))
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect::<Vec<_>>()
    });

    println!(
        "initial altitude {:.1} km",
        (base.elements.elements.semi_major_axis - EARTH_MAJOR_AXIS) / 1e3
    );
    println!("area_m2,delta_a_m");
    for result in results {
        let (area, delta_a) = result?;
        println!("{area},{delta_a:.3}");
    }
    Ok(())
}
