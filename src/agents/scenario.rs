//! Scenario Generation Agent
//!
//! Two halves of the adapt step:
//! - [`WeaknessAnalyzer`] reduces a completed session's violation log to the
//!   most frequently violated rule (ties go to the rule seen first).
//! - [`ScenarioMutator`] looks that rule up in a fixed playbook of
//!   aggravating conditions and scripted injections and returns the next
//!   cycle's parameters.
//!
//! Both are deterministic; the mutator is a lookup table, not a search.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::catalog::RuleCatalog;
use crate::types::{
    condition_keys, Injection, RuleKind, RuleTally, ScenarioParameters, ViolationLog,
    WeaknessLabel, WeaknessSummary,
};

// ============================================================================
// Weakness Analyzer
// ============================================================================

/// Frequency-based weakness reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeaknessAnalyzer;

impl WeaknessAnalyzer {
    /// Most frequent rule id, or the no-violations sentinel.
    pub fn analyze(log: &ViolationLog) -> WeaknessLabel {
        Self::summarize(log).label
    }

    /// Per-rule tallies (first-seen order) plus the derived label.
    pub fn summarize(log: &ViolationLog) -> WeaknessSummary {
        let mut tallies: Vec<RuleTally> = Vec::new();

        for record in log {
            match tallies.iter_mut().find(|t| t.rule_id == record.rule_id) {
                Some(tally) => {
                    tally.count += 1;
                    tally.total_severity += u32::from(record.severity);
                }
                None => tallies.push(RuleTally {
                    rule_id: record.rule_id.clone(),
                    count: 1,
                    total_severity: u32::from(record.severity),
                }),
            }
        }

        // Strictly-greater keeps the earliest rule on ties.
        let mut top: Option<&RuleTally> = None;
        for tally in &tallies {
            if top.map_or(true, |best| tally.count > best.count) {
                top = Some(tally);
            }
        }

        let label = match top {
            Some(t) => WeaknessLabel::Rule(t.rule_id.clone()),
            None => WeaknessLabel::NoViolations,
        };

        if let WeaknessLabel::Rule(ref id) = label {
            info!(weakness = %id, total = log.len(), "[SGA] Identified weakness");
        } else {
            info!("[SGA] No violations recorded - general review");
        }

        WeaknessSummary {
            label,
            total_violations: log.len(),
            tallies,
        }
    }
}

// ============================================================================
// Scenario Mutator
// ============================================================================

/// Builds the aggravated scenario for one rule kind.
type PlaybookEntry = fn(&str) -> ScenarioParameters;

/// Fixed weakness → next-scenario lookup table.
#[derive(Debug, Clone)]
pub struct ScenarioMutator {
    playbook: BTreeMap<RuleKind, PlaybookEntry>,
}

impl ScenarioMutator {
    pub fn new() -> Self {
        let mut playbook: BTreeMap<RuleKind, PlaybookEntry> = BTreeMap::new();
        playbook.insert(RuleKind::GearCheck, gear_check_scenario);
        playbook.insert(RuleKind::FlapsTakeoff, flaps_takeoff_scenario);
        Self { playbook }
    }

    /// Next cycle's parameters for `label`.
    ///
    /// The sentinel, ids missing from the catalog, and ids without a playbook
    /// entry all fall back to [`ScenarioParameters::neutral`].
    pub fn mutate(&self, label: &WeaknessLabel, catalog: &RuleCatalog) -> ScenarioParameters {
        let Some(rule_id) = label.rule_id() else {
            return ScenarioParameters::neutral();
        };

        if !catalog.contains(rule_id) {
            debug!(rule_id = %rule_id, "[SGA] Weakness not in rule catalog, using neutral scenario");
            return ScenarioParameters::neutral();
        }

        let entry = RuleKind::from_id(rule_id).and_then(|k| self.playbook.get(&k));
        match entry {
            Some(build) => {
                let params = build(&scenario_id_for(label));
                info!(
                    scenario_id = %params.scenario_id,
                    injections = params.injections.len(),
                    "[SGA] Next scenario generated"
                );
                params
            }
            None => {
                debug!(rule_id = %rule_id, "[SGA] No playbook entry, using neutral scenario");
                ScenarioParameters::neutral()
            }
        }
    }
}

impl Default for ScenarioMutator {
    fn default() -> Self {
        Self::new()
    }
}

/// `Training_<label>`
pub fn scenario_id_for(label: &WeaknessLabel) -> String {
    format!("Training_{label}")
}

/// Gusty wind, low visibility, gear indicator failure a minute in.
fn gear_check_scenario(scenario_id: &str) -> ScenarioParameters {
    let mut conditions = BTreeMap::new();
    conditions.insert(condition_keys::WIND_SPEED.to_string(), Value::from(15));
    conditions.insert(condition_keys::VISIBILITY.to_string(), Value::from("low"));
    ScenarioParameters {
        scenario_id: scenario_id.to_string(),
        conditions,
        injections: vec![Injection::sensor_failure("landing_gear_indicator", 60.0)],
    }
}

/// Wet runway with a crosswind, ATC distraction early in the climb.
fn flaps_takeoff_scenario(scenario_id: &str) -> ScenarioParameters {
    let mut conditions = BTreeMap::new();
    conditions.insert(condition_keys::RUNWAY_CONDITION.to_string(), Value::from("wet"));
    conditions.insert(condition_keys::WIND_DIRECTION.to_string(), Value::from(270));
    ScenarioParameters {
        scenario_id: scenario_id.to_string(),
        conditions,
        injections: vec![Injection::distraction("ATC Traffic Alert", 10.0)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorType, InjectionKind, ViolationRecord};

    fn log_of(ids: &[&str]) -> ViolationLog {
        ids.iter()
            .enumerate()
            .map(|(i, id)| ViolationRecord {
                error_type: ErrorType::SopViolation,
                rule_id: (*id).to_string(),
                timestamp: i as f64,
                severity: if *id == "GEAR_CHECK" { 5 } else { 4 },
                details: String::new(),
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_analyze_picks_most_frequent_rule() {
        let log = log_of(&["FLAPS_TAKEOFF", "GEAR_CHECK", "GEAR_CHECK", "FLAPS_TAKEOFF", "GEAR_CHECK"]);
        assert_eq!(WeaknessAnalyzer::analyze(&log), WeaknessLabel::Rule("GEAR_CHECK".into()));
    }

    #[test]
    fn test_analyze_empty_log_is_sentinel() {
        assert_eq!(WeaknessAnalyzer::analyze(&ViolationLog::new()), WeaknessLabel::NoViolations);
    }

    #[test]
    fn test_analyze_tie_goes_to_first_seen() {
        let log = log_of(&["FLAPS_TAKEOFF", "GEAR_CHECK", "GEAR_CHECK", "FLAPS_TAKEOFF"]);
        assert_eq!(WeaknessAnalyzer::analyze(&log), WeaknessLabel::Rule("FLAPS_TAKEOFF".into()));
    }

    #[test]
    fn test_summary_ignores_severity_for_label() {
        // 2 x GEAR (severity 10) vs 3 x FLAPS (severity 12)
        let log = log_of(&["GEAR_CHECK", "FLAPS_TAKEOFF", "FLAPS_TAKEOFF", "GEAR_CHECK", "FLAPS_TAKEOFF"]);
        let summary = WeaknessAnalyzer::summarize(&log);
        assert_eq!(summary.label, WeaknessLabel::Rule("FLAPS_TAKEOFF".into()));
        assert_eq!(summary.total_violations, 5);
        assert_eq!(summary.tallies[0].rule_id, "GEAR_CHECK");
        assert_eq!(summary.tallies[0].count, 2);
        assert_eq!(summary.tallies[0].total_severity, 10);
        assert_eq!(summary.tallies[1].total_severity, 12);
    }

    #[test]
    fn test_mutate_gear_check_is_deterministic() {
        let catalog = RuleCatalog::builtin().unwrap();
        let mutator = ScenarioMutator::new();
        let label = WeaknessLabel::Rule("GEAR_CHECK".into());

        let first = mutator.mutate(&label, &catalog);
        let second = mutator.mutate(&label, &catalog);
        assert_eq!(first, second);

        assert_eq!(first.scenario_id, "Training_GEAR_CHECK");
        assert_eq!(first.conditions["wind_speed"], 15);
        assert_eq!(first.wind_speed(), Some(15.0));
        let failures: Vec<_> = first.injections_of(InjectionKind::SensorFailure).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].time, 60.0);
        assert_eq!(first.injections.len(), 1);
    }

    #[test]
    fn test_mutate_flaps_takeoff_adds_wet_runway_and_distraction() {
        let catalog = RuleCatalog::builtin().unwrap();
        let params = ScenarioMutator::new().mutate(&WeaknessLabel::Rule("FLAPS_TAKEOFF".into()), &catalog);
        assert_eq!(params.runway_condition(), Some("wet"));
        assert_eq!(params.conditions["wind_direction"], 270);
        assert_eq!(params.injections.len(), 1);
        assert_eq!(params.injections[0].kind, InjectionKind::Distraction);
        assert_eq!(params.injections[0].message.as_deref(), Some("ATC Traffic Alert"));
        assert_eq!(params.injections[0].time, 10.0);
    }

    #[test]
    fn test_mutate_sentinel_and_unknown_fall_back_to_neutral() {
        let catalog = RuleCatalog::builtin().unwrap();
        let mutator = ScenarioMutator::new();
        assert_eq!(
            mutator.mutate(&WeaknessLabel::NoViolations, &catalog),
            ScenarioParameters::neutral()
        );
        assert_eq!(
            mutator.mutate(&WeaknessLabel::Rule("TAXI_LIGHTS".into()), &catalog),
            ScenarioParameters::neutral()
        );
    }

    #[test]
    fn test_empty_log_round_trip_gives_neutral() {
        let catalog = RuleCatalog::builtin().unwrap();
        let label = WeaknessAnalyzer::analyze(&ViolationLog::new());
        let params = ScenarioMutator::new().mutate(&label, &catalog);
        assert_eq!(params, ScenarioParameters::neutral());
        assert_eq!(params.conditions["weather"], "clear");
    }
}
