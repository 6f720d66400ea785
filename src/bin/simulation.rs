//! Flight Telemetry Simulation
//!
//! Generates one climb/descent training profile and writes the aircraft
//! states to stdout. The mission log goes to stderr.
//!
//! # Usage
//! ```bash
//! ./simulation --minutes 2 --seed 7 | ./sop-trainer replay-stdin
//! ./simulation --scenario next_scenario.json --format csv > profile.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use sop_trainer::config::SimulationConfig;
use sop_trainer::telemetry::TelemetryGenerator;
use sop_trainer::types::{AircraftState, ScenarioParameters};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Flight telemetry generator for SOP training sessions")]
#[command(version)]
struct Args {
    /// Profile duration in minutes
    #[arg(short, long, default_value = "2.0")]
    minutes: f64,

    /// Ticks per second
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=100))]
    tps: u32,

    /// Time compression factor (0 = no delay, 1 = real-time)
    #[arg(short, long, default_value = "0")]
    speed: u32,

    /// Output format: json or csv
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Scenario parameters JSON file (default: neutral scenario)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress mission log (only output telemetry)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Csv,
}

// ============================================================================
// Output
// ============================================================================

const CSV_HEADER: &str =
    "timestamp,altitude,airspeed,vertical_speed,heading,landing_gear_state,flaps_setting";

fn csv_line(s: &AircraftState) -> String {
    format!(
        "{:.2},{:.1},{:.1},{:.0},{:.0},{},{}",
        s.timestamp,
        s.altitude,
        s.airspeed,
        s.vertical_speed,
        s.heading,
        s.landing_gear_state,
        s.flaps_setting
    )
}

fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", minutes, secs)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

/// Scenario from a JSON file. A missing or malformed file falls back to the
/// neutral scenario.
fn load_scenario(path: Option<&PathBuf>, quiet: bool) -> ScenarioParameters {
    let Some(p) = path else {
        return ScenarioParameters::neutral();
    };
    let parsed = std::fs::read_to_string(p)
        .with_context(|| format!("Failed to read scenario file {}", p.display()))
        .and_then(|raw| {
            serde_json::from_str::<ScenarioParameters>(&raw)
                .with_context(|| format!("Invalid scenario parameters in {}", p.display()))
        });
    match parsed {
        Ok(scenario) => scenario,
        Err(e) => {
            log_mission(0.0, &format!("WARNING: {:#}, using neutral scenario", e), quiet);
            ScenarioParameters::neutral()
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(
        args.minutes.is_finite() && args.minutes > 0.0,
        "--minutes must be a positive number"
    );

    let scenario = load_scenario(args.scenario.as_ref(), args.quiet);
    let config = SimulationConfig {
        duration_minutes: args.minutes,
        ticks_per_second: args.tps,
        seed: args.seed,
        ..SimulationConfig::default()
    };
    let generator = TelemetryGenerator::new(&config, &scenario, args.seed);
    let total = generator.total_ticks();

    log_mission(0.0, &"=".repeat(60), args.quiet);
    log_mission(0.0, "FLIGHT TELEMETRY SIMULATION", args.quiet);
    log_mission(0.0, &"=".repeat(60), args.quiet);
    log_mission(0.0, &format!("  Scenario: {}", scenario.scenario_id), args.quiet);
    for (key, value) in &scenario.conditions {
        log_mission(0.0, &format!("    {}: {}", key, value), args.quiet);
    }
    log_mission(
        0.0,
        &format!("  Duration: {:.1} min ({} ticks @ {} Hz)", args.minutes, total, args.tps),
        args.quiet,
    );
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0.0, "  0-50%:   Climb", args.quiet);
    log_mission(0.0, "  50-100%: Descent", args.quiet);
    log_mission(0.0, &"=".repeat(60), args.quiet);

    let tick_interval = if args.speed == 0 {
        None
    } else {
        Some(Duration::from_secs_f64(
            1.0 / (f64::from(args.tps) * f64::from(args.speed)),
        ))
    };

    let mut pending: Vec<_> = scenario.injections.iter().collect();
    pending.sort_by(|a, b| a.time.total_cmp(&b.time));
    let mut pending = pending.into_iter().peekable();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.format == OutputFormat::Csv {
        writeln!(out, "{}", CSV_HEADER)?;
    }

    let mut last_gear: Option<bool> = None;
    for state in generator {
        while let Some(inj) = pending.next_if(|i| i.time <= state.timestamp) {
            let detail = inj.system.as_deref().or(inj.message.as_deref()).unwrap_or("-");
            log_mission(state.timestamp, &format!(">>> INJECTION: {} ({})", inj.kind, detail), args.quiet);
        }
        if last_gear.is_some_and(|g| g != state.landing_gear_state) {
            let action = if state.landing_gear_state { "extended" } else { "retracted" };
            log_mission(
                state.timestamp,
                &format!("    Gear {} at {:.0} ft", action, state.altitude),
                args.quiet,
            );
        }
        last_gear = Some(state.landing_gear_state);

        let line = match args.format {
            OutputFormat::Json => serde_json::to_string(&state)?,
            OutputFormat::Csv => csv_line(&state),
        };
        // A closed pipe ends the run quietly
        if writeln!(out, "{}", line).is_err() {
            break;
        }

        if let Some(interval) = tick_interval {
            out.flush()?;
            std::thread::sleep(interval);
        }
    }
    out.flush().ok();

    log_mission(total as f64 / f64::from(args.tps), "SIMULATION COMPLETE", args.quiet);
    Ok(())
}
