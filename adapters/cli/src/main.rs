#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted Waypoint Defence match headlessly.
//!
//! The match configuration and the player's inputs come from a scenario file;
//! the bundled demo level is used when none is given. Presentation events are
//! logged through `tracing` and a summary is printed once the run finishes.

mod presenter;
mod report;
mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use waypoint_defence_system_bootstrap::Session;
use waypoint_defence_system_builder::Input;
use waypoint_defence_world::query;

use crate::{presenter::ConsolePresenter, report::MatchReport, scenario::Scenario};

#[derive(Debug, Parser)]
#[command(name = "waypoint-defence", about = "Plays a scripted Waypoint Defence match")]
struct Args {
    /// Scenario file to play; the bundled demo level is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run before giving up on an unresolved match.
    #[arg(long, default_value_t = 180.0)]
    seconds: f32,
    /// Simulated milliseconds advanced per frame.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,
    /// Overrides the scenario's spawn seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Format of the summary printed after the run.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug)]
struct RunSettings {
    duration: Duration,
    tick: Duration,
    seed: Option<u64>,
}

impl RunSettings {
    fn from_args(args: &Args) -> Result<Self> {
        let Ok(duration) = Duration::try_from_secs_f32(args.seconds) else {
            bail!("run length must be a non-negative number of seconds");
        };
        if duration.is_zero() {
            bail!("run length must be greater than zero");
        }

        Ok(Self {
            duration,
            tick: Duration::from_millis(args.tick_ms),
            seed: args.seed,
        })
    }
}

/// Entry point for the Waypoint Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = RunSettings::from_args(&args)?;
    let scenario = match &args.config {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };

    let report = play(scenario, settings)?;
    match args.report {
        ReportFormat::Text => println!("{}", report.to_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn play(scenario: Scenario, settings: RunSettings) -> Result<MatchReport> {
    let Scenario {
        mut config, script, ..
    } = scenario;
    if let Some(seed) = settings.seed {
        config.rng_seed = seed;
    }

    let mut session = Session::new(config).context("failed to start match")?;
    info!(target: "td.session", "{}", session.welcome_banner());

    let mut presenter = ConsolePresenter::default();
    let mut pending = script.iter().peekable();
    let mut clock = Duration::ZERO;
    let mut inputs: Vec<Input> = Vec::new();

    while clock < settings.duration {
        inputs.clear();
        while let Some(step) = pending.next_if(|step| step.at() <= clock) {
            inputs.push(step.action.to_input());
        }

        presenter.observe(session.tick(settings.tick, &inputs));
        clock += settings.tick;

        if query::is_over(session.world()) {
            break;
        }
    }

    let report = MatchReport::collect(&session, &presenter);
    info!(
        target: "td.session",
        frames = report.frames,
        outcome = ?report.outcome,
        "run finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(seconds: u64) -> RunSettings {
        RunSettings {
            duration: Duration::from_secs(seconds),
            tick: Duration::from_millis(50),
            seed: None,
        }
    }

    fn builtin() -> Scenario {
        Scenario::builtin().expect("bundled scenario parses")
    }

    #[test]
    fn opening_script_places_both_towers() {
        let report = play(builtin(), settings(1)).expect("run completes");
        assert_eq!(report.outcome, None);
        assert_eq!(report.frames, 20);
        assert_eq!(report.stats.towers_placed, 2);
        assert_eq!(report.stats.placements_rejected, 0);
        assert_eq!(report.balance, 0);
    }

    #[test]
    fn bundled_scenario_replays_identically() {
        let first = play(builtin(), settings(240)).expect("run completes");
        let second = play(builtin(), settings(240)).expect("run completes");
        assert_eq!(first, second);
        assert!(first.stats.enemies_spawned > 0);
        assert!(first.stats.shots_fired > 0);
    }

    #[test]
    fn seed_override_still_resolves_the_match() {
        let report = play(
            builtin(),
            RunSettings {
                seed: Some(7),
                ..settings(600)
            },
        )
        .expect("run completes");
        assert!(report.outcome.is_some());
    }

    #[test]
    fn zero_length_run_is_rejected() {
        let args = Args::parse_from(["waypoint-defence", "--seconds", "0"]);
        assert!(RunSettings::from_args(&args).is_err());
    }

    #[test]
    fn zero_tick_is_rejected_by_the_parser() {
        assert!(Args::try_parse_from(["waypoint-defence", "--tick-ms", "0"]).is_err());
    }
}
