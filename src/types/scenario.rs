//! Scenario parameters produced by the mutator and consumed by the generator

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Condition keys understood by the telemetry generator.
pub mod condition_keys {
    pub const WIND_SPEED: &str = "wind_speed";
    pub const WIND_DIRECTION: &str = "wind_direction";
    pub const VISIBILITY: &str = "visibility";
    pub const RUNWAY_CONDITION: &str = "runway_condition";
    pub const WEATHER: &str = "weather";
}

/// Scenario id used for the neutral parameter set.
pub const NEUTRAL_SCENARIO_ID: &str = "Training_General_Review";

// ============================================================================
// Injections
// ============================================================================

/// Kind of scripted event injected into a scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    /// An instrument stops reporting; the pilot loses the cue for a procedure
    SensorFailure,
    /// A competing task pulls attention away from the checklist
    Distraction,
}

impl std::fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectionKind::SensorFailure => write!(f, "sensor_failure"),
            InjectionKind::Distraction => write!(f, "distraction"),
        }
    }
}

/// A scripted event at a fixed offset into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    #[serde(rename = "type")]
    pub kind: InjectionKind,
    /// Affected system (sensor failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Message presented to the pilot (distractions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Trigger time, seconds from session start
    pub time: f64,
}

impl Injection {
    pub fn sensor_failure(system: &str, time: f64) -> Self {
        Self {
            kind: InjectionKind::SensorFailure,
            system: Some(system.to_string()),
            message: None,
            time,
        }
    }

    pub fn distraction(message: &str, time: f64) -> Self {
        Self {
            kind: InjectionKind::Distraction,
            system: None,
            message: Some(message.to_string()),
            time,
        }
    }

    /// Whether the injection is in effect at `timestamp` for a window of `window_secs`.
    pub fn is_active_at(&self, timestamp: f64, window_secs: f64) -> bool {
        timestamp >= self.time && timestamp < self.time + window_secs
    }
}

// ============================================================================
// Scenario Parameters
// ============================================================================

/// Environmental conditions and scripted injections for one training cycle.
///
/// Produced fresh each cycle and fully replaces the previous cycle's
/// parameters; there is no merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub scenario_id: String,
    /// Arbitrary key → value conditions, ordered for deterministic output
    #[serde(default)]
    pub conditions: BTreeMap<String, Value>,
    #[serde(default)]
    pub injections: Vec<Injection>,
}

impl ScenarioParameters {
    /// Clear weather, no injections.
    pub fn neutral() -> Self {
        let mut conditions = BTreeMap::new();
        conditions.insert(condition_keys::WEATHER.to_string(), Value::from("clear"));
        Self {
            scenario_id: NEUTRAL_SCENARIO_ID.to_string(),
            conditions,
            injections: Vec::new(),
        }
    }

    pub fn condition(&self, key: &str) -> Option<&Value> {
        self.conditions.get(key)
    }

    /// Wind speed (kt) if present and numeric.
    pub fn wind_speed(&self) -> Option<f64> {
        self.condition(condition_keys::WIND_SPEED).and_then(Value::as_f64)
    }

    /// Runway condition string (e.g. "wet") if present.
    pub fn runway_condition(&self) -> Option<&str> {
        self.condition(condition_keys::RUNWAY_CONDITION).and_then(Value::as_str)
    }

    pub fn injections_of(&self, kind: InjectionKind) -> impl Iterator<Item = &Injection> {
        self.injections.iter().filter(move |i| i.kind == kind)
    }
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self::neutral()
    }
}
