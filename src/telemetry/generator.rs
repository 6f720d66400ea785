//! Synthetic climb/descent telemetry generator
//!
//! First half of the session climbs toward the configured target altitude and
//! airspeed, second half descends toward the ground. Each tick blends the
//! current value toward the phase target (`new = old + (target - old) * k`)
//! and adds uniform noise scaled by the scenario's turbulence factor.
//!
//! Gear and flaps follow a simple pilot policy (retract above a threshold in
//! the climb, extend below a threshold in the descent), skipped on a tick
//! with a small probability to seed human-error cases for the evaluator.
//! Scenario injections widen that gap: a sensor failure suppresses the policy
//! for a window, a distraction raises the skip probability for a window.

use rand::prelude::*;
use rand_distr::{Distribution, Uniform};
use tracing::{debug, warn};

use crate::config::defaults::{
    DESCENT_TARGET_ALTITUDE_FT, DISTRACTION_ERROR_PROBABILITY, DISTRACTION_WINDOW_SECS,
    FLAPS_APPROACH_DEG, GUSTY_WIND_THRESHOLD_KT, SENSOR_FAILURE_WINDOW_SECS, TURBULENCE_CALM,
    TURBULENCE_GUSTY, TURBULENCE_WET_RUNWAY,
};
use crate::config::SimulationConfig;
use crate::types::{AircraftState, FlightPhase, Injection, InjectionKind, ScenarioParameters};

/// Number of ticks produced for a session of `duration_minutes`.
pub fn tick_count(duration_minutes: f64, ticks_per_second: u32) -> usize {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return 0;
    }
    (duration_minutes * 60.0 * f64::from(ticks_per_second)).floor() as usize
}

/// Noise amplitude derived from scenario conditions.
///
/// Gusty wind dominates a wet runway; anything else is calm.
pub fn turbulence_factor(scenario: &ScenarioParameters) -> f64 {
    if scenario.wind_speed().is_some_and(|w| w > GUSTY_WIND_THRESHOLD_KT) {
        TURBULENCE_GUSTY
    } else if scenario.runway_condition() == Some("wet") {
        TURBULENCE_WET_RUNWAY
    } else {
        TURBULENCE_CALM
    }
}

/// Drop injections that cannot be scheduled (non-finite or negative time).
fn schedulable_injections(scenario: &ScenarioParameters) -> Vec<Injection> {
    scenario
        .injections
        .iter()
        .filter(|inj| {
            let ok = inj.time.is_finite() && inj.time >= 0.0;
            if !ok {
                warn!(kind = %inj.kind, time = inj.time, "[Generator] Ignoring unschedulable injection");
            }
            ok
        })
        .cloned()
        .collect()
}

// ============================================================================
// Generator
// ============================================================================

/// Tick-by-tick telemetry stream for one session.
///
/// Implements [`Iterator`], so it can be replayed lazily (live cadence) or
/// collected into the full sequence (batch cadence).
pub struct TelemetryGenerator {
    rng: StdRng,
    config: SimulationConfig,
    injections: Vec<Injection>,
    noise: Uniform<f64>,

    tick: usize,
    total_ticks: usize,

    altitude: f64,
    airspeed: f64,
    gear_down: bool,
    flaps: u8,
}

impl TelemetryGenerator {
    /// Build a generator for `config.duration_minutes` of telemetry.
    ///
    /// `seed = None` draws from entropy.
    pub fn new(config: &SimulationConfig, scenario: &ScenarioParameters, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let turbulence = turbulence_factor(scenario);
        let total_ticks = tick_count(config.duration_minutes, config.ticks_per_second);

        debug!(
            scenario_id = %scenario.scenario_id,
            turbulence,
            total_ticks,
            "[Generator] Stream configured"
        );

        Self {
            rng,
            config: config.clone(),
            injections: schedulable_injections(scenario),
            noise: Uniform::new_inclusive(-turbulence, turbulence),
            tick: 0,
            total_ticks,
            altitude: 0.0,
            airspeed: 0.0,
            gear_down: true,
            flaps: FLAPS_APPROACH_DEG,
        }
    }

    pub fn total_ticks(&self) -> usize {
        self.total_ticks
    }

    /// Collect the whole remaining stream.
    pub fn generate(self) -> Vec<AircraftState> {
        self.collect()
    }

    fn phase(&self) -> FlightPhase {
        if (self.tick as f64) < self.total_ticks as f64 / 2.0 {
            FlightPhase::Climb
        } else {
            FlightPhase::Descent
        }
    }

    fn injection_active(&self, kind: InjectionKind, timestamp: f64, window: f64) -> bool {
        self.injections
            .iter()
            .any(|i| i.kind == kind && i.is_active_at(timestamp, window))
    }

    fn step(&mut self) -> AircraftState {
        let cfg = &self.config;
        let tps = f64::from(cfg.ticks_per_second);
        let timestamp = self.tick as f64 / tps;
        let phase = self.phase();

        let (target_altitude, target_airspeed) = match phase {
            FlightPhase::Climb => (cfg.climb_target_altitude_ft, cfg.climb_target_airspeed_kt),
            FlightPhase::Descent => (DESCENT_TARGET_ALTITUDE_FT, cfg.descent_target_airspeed_kt),
        };

        let previous_altitude = self.altitude;
        let k = cfg.blend_factor;
        self.airspeed += (target_airspeed - self.airspeed) * k;
        self.altitude += (target_altitude - self.altitude) * k;

        let noise = self.noise.sample(&mut self.rng);
        self.airspeed = (self.airspeed + noise).max(0.0);
        self.altitude = (self.altitude + noise * 2.0).max(0.0);

        // Always draw, so injections never shift the random sequence.
        let roll: f64 = self.rng.gen();

        let sensor_failed = self.injection_active(
            InjectionKind::SensorFailure,
            timestamp,
            SENSOR_FAILURE_WINDOW_SECS,
        );
        let skip_probability =
            if self.injection_active(InjectionKind::Distraction, timestamp, DISTRACTION_WINDOW_SECS) {
                cfg.error_probability.max(DISTRACTION_ERROR_PROBABILITY)
            } else {
                cfg.error_probability
            };

        if !sensor_failed && roll >= skip_probability {
            match phase {
                FlightPhase::Climb if self.altitude > cfg.gear_retract_altitude_ft => {
                    self.gear_down = false;
                    self.flaps = 0;
                }
                FlightPhase::Descent if self.altitude < cfg.gear_extend_altitude_ft => {
                    self.gear_down = true;
                    self.flaps = FLAPS_APPROACH_DEG;
                }
                _ => {}
            }
        }

        AircraftState {
            timestamp,
            altitude: self.altitude,
            airspeed: self.airspeed,
            vertical_speed: (self.altitude - previous_altitude) * tps * 60.0,
            heading: cfg.runway_heading_deg,
            landing_gear_state: self.gear_down,
            flaps_setting: self.flaps,
        }
    }
}

impl Iterator for TelemetryGenerator {
    type Item = AircraftState;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tick >= self.total_ticks {
            return None;
        }
        let state = self.step();
        self.tick += 1;
        Some(state)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_ticks - self.tick;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TelemetryGenerator {}

/// Generate the complete stream for one session.
pub fn generate_stream(
    config: &SimulationConfig,
    scenario: &ScenarioParameters,
    seed: Option<u64>,
) -> Vec<AircraftState> {
    TelemetryGenerator::new(config, scenario, seed).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Injection;
    use serde_json::Value;

    fn config(duration_minutes: f64, error_probability: f64) -> SimulationConfig {
        SimulationConfig {
            duration_minutes,
            error_probability,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_tick_count_matches_duration_and_resolution() {
        for (minutes, expected) in [(0.5, 60), (1.0, 120), (2.0, 240), (0.01, 1), (3.25, 390)] {
            let stream = generate_stream(&config(minutes, 0.02), &ScenarioParameters::neutral(), Some(7));
            assert_eq!(stream.len(), expected, "duration {minutes} min");
        }
        assert_eq!(tick_count(0.0, 2), 0);
        assert_eq!(tick_count(-1.0, 2), 0);
        assert_eq!(tick_count(f64::NAN, 2), 0);
    }

    #[test]
    fn test_timestamps_strictly_increasing() {
        let stream = generate_stream(&config(2.0, 0.02), &ScenarioParameters::neutral(), Some(1));
        assert_eq!(stream[0].timestamp, 0.0);
        assert!(stream.windows(2).all(|w| w[1].timestamp > w[0].timestamp));
        assert_eq!(stream[1].timestamp, 0.5);
    }

    #[test]
    fn test_altitude_and_airspeed_never_negative_under_gusts() {
        let mut gusty = ScenarioParameters::neutral();
        gusty.conditions.insert("wind_speed".into(), Value::from(40));
        for seed in 0..20 {
            let stream = generate_stream(&config(2.0, 0.02), &gusty, Some(seed));
            assert!(stream.iter().all(|s| s.altitude >= 0.0 && s.airspeed >= 0.0));
        }
    }

    #[test]
    fn test_seeded_stream_is_reproducible() {
        let a = generate_stream(&config(1.0, 0.02), &ScenarioParameters::neutral(), Some(42));
        let b = generate_stream(&config(1.0, 0.02), &ScenarioParameters::neutral(), Some(42));
        let c = generate_stream(&config(1.0, 0.02), &ScenarioParameters::neutral(), Some(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_turbulence_factor_from_conditions() {
        let mut p = ScenarioParameters::neutral();
        assert_eq!(turbulence_factor(&p), TURBULENCE_CALM);

        p.conditions.insert("runway_condition".into(), Value::from("wet"));
        assert_eq!(turbulence_factor(&p), TURBULENCE_WET_RUNWAY);

        p.conditions.insert("wind_speed".into(), Value::from(15));
        assert_eq!(turbulence_factor(&p), TURBULENCE_GUSTY);

        // Non-numeric wind is ignored rather than rejected
        p.conditions.insert("wind_speed".into(), Value::from("strong"));
        assert_eq!(turbulence_factor(&p), TURBULENCE_WET_RUNWAY);
    }

    #[test]
    fn test_attentive_pilot_follows_gear_policy() {
        let cfg = config(2.0, 0.0);
        let stream = generate_stream(&cfg, &ScenarioParameters::neutral(), Some(3));
        let half = stream.len() / 2;

        for s in &stream[..half] {
            if s.altitude > cfg.gear_retract_altitude_ft {
                assert!(!s.landing_gear_state, "gear down in climb at {:.1} ft", s.altitude);
            }
        }
        for s in &stream[half..] {
            if s.altitude < cfg.gear_extend_altitude_ft {
                assert!(s.landing_gear_state, "gear up in descent at {:.1} ft", s.altitude);
                assert_eq!(s.flaps_setting, FLAPS_APPROACH_DEG);
            }
        }
    }

    #[test]
    fn test_always_skipping_pilot_never_moves_gear() {
        let stream = generate_stream(&config(1.0, 1.0), &ScenarioParameters::neutral(), Some(3));
        assert!(stream.iter().all(|s| s.landing_gear_state && s.flaps_setting == FLAPS_APPROACH_DEG));
    }

    #[test]
    fn test_sensor_failure_suppresses_policy_for_window() {
        let mut scenario = ScenarioParameters::neutral();
        scenario.injections.push(Injection::sensor_failure("landing_gear_indicator", 0.0));
        let stream = generate_stream(&config(2.0, 0.0), &scenario, Some(9));

        for s in stream.iter().filter(|s| s.timestamp < SENSOR_FAILURE_WINDOW_SECS) {
            assert!(s.landing_gear_state);
        }
        // Policy resumes once the window closes (still climbing, well above 300 ft)
        let after = stream
            .iter()
            .find(|s| s.timestamp >= SENSOR_FAILURE_WINDOW_SECS)
            .unwrap();
        assert!(!after.landing_gear_state);
    }

    #[test]
    fn test_distraction_causes_missed_actions_only_inside_window() {
        let cfg = config(2.0, 0.0);
        let mut distracted = ScenarioParameters::neutral();
        distracted.injections.push(Injection::distraction("ATC frequency change", 0.0));

        let mut changed_seeds = 0;
        for seed in 0..50 {
            let calm = generate_stream(&cfg, &ScenarioParameters::neutral(), Some(seed));
            let busy = generate_stream(&cfg, &distracted, Some(seed));

            // Rolls are drawn either way, so the flight path is unchanged
            for (a, b) in calm.iter().zip(&busy) {
                assert_eq!((a.altitude, a.airspeed), (b.altitude, b.airspeed));
            }

            let gear = |s: &[AircraftState]| -> Vec<(bool, u8)> {
                s.iter()
                    .filter(|t| t.timestamp < DISTRACTION_WINDOW_SECS)
                    .map(|t| (t.landing_gear_state, t.flaps_setting))
                    .collect()
            };
            if gear(&calm) != gear(&busy) {
                changed_seeds += 1;
            }

            // The first policy action after the window puts both pilots back in step
            let half = calm.len() / 2;
            let resync = calm[..half]
                .iter()
                .position(|t| t.timestamp >= DISTRACTION_WINDOW_SECS && t.altitude > cfg.gear_retract_altitude_ft)
                .unwrap();
            assert_eq!(calm[resync..], busy[resync..], "seed {seed}");
        }
        assert!(changed_seeds > 0);
    }

    #[test]
    fn test_unschedulable_injection_is_ignored() {
        let mut scenario = ScenarioParameters::neutral();
        scenario.injections.push(Injection::sensor_failure("landing_gear_indicator", f64::NAN));
        let with_bad = generate_stream(&config(1.0, 0.02), &scenario, Some(5));
        let clean = generate_stream(&config(1.0, 0.02), &ScenarioParameters::neutral(), Some(5));
        assert_eq!(with_bad, clean);
    }

    #[test]
    fn test_iterator_reports_exact_length() {
        let gen = TelemetryGenerator::new(&config(1.0, 0.02), &ScenarioParameters::neutral(), Some(1));
        assert_eq!(gen.len(), 120);
        assert_eq!(gen.total_ticks(), 120);
    }
}
