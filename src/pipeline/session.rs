//! One training session: the scenario it runs under and the violations
//! it has accumulated.
//!
//! The session object owns its [`ViolationLog`]. A new session therefore
//! always starts from an empty log, and abandoning a session drops its log.

use tracing::warn;

use crate::agents::PerformanceEvaluator;
use crate::catalog::RuleCatalog;
use crate::types::{AircraftState, ScenarioParameters, ViolationLog, ViolationRecord};

#[derive(Debug)]
pub struct TrainingSession {
    cycle: u64,
    scenario: ScenarioParameters,
    log: ViolationLog,
    ticks_evaluated: usize,
    last_timestamp: Option<f64>,
}

impl TrainingSession {
    pub fn new(cycle: u64, scenario: ScenarioParameters) -> Self {
        Self {
            cycle,
            scenario,
            log: ViolationLog::new(),
            ticks_evaluated: 0,
            last_timestamp: None,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn scenario(&self) -> &ScenarioParameters {
        &self.scenario
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario.scenario_id
    }

    pub fn log(&self) -> &ViolationLog {
        &self.log
    }

    pub fn ticks_evaluated(&self) -> usize {
        self.ticks_evaluated
    }

    /// Evaluate one tick and append its violations to the session log.
    ///
    /// A state older than the previous one is dropped with a warning.
    pub fn record(
        &mut self,
        evaluator: &PerformanceEvaluator,
        catalog: &RuleCatalog,
        state: &AircraftState,
    ) -> Vec<ViolationRecord> {
        if let Some(last) = self.last_timestamp {
            if state.timestamp < last {
                warn!(
                    cycle = self.cycle,
                    timestamp = state.timestamp,
                    last,
                    "[Session] Out-of-order telemetry dropped"
                );
                return Vec::new();
            }
        }
        self.last_timestamp = Some(state.timestamp);
        self.ticks_evaluated += 1;
        evaluator.evaluate(state, catalog, &mut self.log)
    }
}
