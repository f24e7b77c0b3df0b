use std::{env, fs, io};

use log::info;
use orbitprop::{
    orbitprop_errors::OrbitPropError,
    report::{write_cartesian_report, write_equinoctial_report, write_keplerian_report},
    sampler::SampleBounds,
    scenario::Scenario,
    time::format_epoch,
};

const DEFAULT_FORCES: &str = "\
gravity: 1
GMdegree: 6
GMorder: 6
sun: 1
moon: 1
atmosphere: 1
ATMmodel: 1
SRP: 1
OT: 0
RAcc: 0
";

const DEFAULT_ELEMENTS: &str = "\
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

const DEFAULT_INTEGRATOR: &str = "\
minStep: 0.001
maxStep: 1000
positionTolerance: 10
durationTime: 60
propagationTime: 630
";

#[derive(Debug, Clone, Copy)]
enum ReportFormat {
    Keplerian,
    Cartesian,
    Equinoctial,
}

/// Propagate one scenario and print the samples as CSV on stdout.
///
/// Usage:
///   propagate_scenario [FORCES ELEMENTS INTEGRATOR] [--format keplerian|cartesian|equinoctial] [--interval-only]
/// Example:
///   RUST_LOG=debug propagate_scenario forces.txt elements.txt integrator.txt --format equinoctial
///
/// Without configuration files the built-in transfer orbit scenario is used.
fn main() -> Result<(), OrbitPropError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1).collect::<Vec<_>>();

    let bounds = if let Some(pos) = args.iter().position(|a| a == "--interval-only") {
        args.remove(pos);
        SampleBounds::IntervalOnly
    } else {
        SampleBounds::Both
    };

    let format = match args.iter().position(|a| a == "--format") {
        Some(pos) => {
            args.remove(pos);
            if pos >= args.len() {
                return Err(OrbitPropError::MissingParameter("--format".into()));
            }
            match args.remove(pos).as_str() {
                "keplerian" => ReportFormat::Keplerian,
                "cartesian" => ReportFormat::Cartesian,
                "equinoctial" => ReportFormat::Equinoctial,
                other => {
                    return Err(OrbitPropError::InvalidParameter {
                        name: "--format".into(),
                        value: other.into(),
                        reason: "expected keplerian, cartesian or equinoctial".into(),
                    })
                }
            }
        }
        None => ReportFormat::Keplerian,
    };

    let scenario = match args.as_slice() {
        [] => Scenario::from_texts(DEFAULT_FORCES, DEFAULT_ELEMENTS, DEFAULT_INTEGRATOR)?,
        [forces, elements, integrator] => Scenario::from_texts(
            &fs::read_to_string(forces)?,
            &fs::read_to_string(elements)?,
            &fs::read_to_string(integrator)?,
        )?,
        _ => {
            return Err(OrbitPropError::InvalidParameter {
                name: "arguments".into(),
                value: args.join(" "),
                reason: "expected either no file or the three FORCES ELEMENTS INTEGRATOR files"
                    .into(),
            })
        }
    };

    let outcome = scenario.run(bounds)?;
    let final_state = outcome.final_state();
    info!(
        "Reached {} after {} accepted steps ({} rejected)",
        format_epoch(&final_state.epoch),
        outcome.report.stats.accepted_steps,
        outcome.report.stats.rejected_steps
    );

    let stdout = io::stdout().lock();
    match format {
        ReportFormat::Keplerian => write_keplerian_report(stdout, &outcome.trajectory),
        ReportFormat::Cartesian => write_cartesian_report(stdout, &outcome.trajectory),
        ReportFormat::Equinoctial => write_equinoctial_report(stdout, &outcome.trajectory),
    }
}
