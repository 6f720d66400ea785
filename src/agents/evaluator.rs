//! Performance Evaluation Agent
//!
//! Runs every catalog rule's registered check against one aircraft state per
//! tick, appends detected violations to the session log it is handed, and
//! echoes them back to the caller for immediate use (e.g. live push).
//!
//! The evaluator keeps no session state of its own. The orchestrator owns the
//! [`ViolationLog`] and passes it in, so a new session starts from an empty
//! log by construction.
//!
//! Ticks must arrive in non-decreasing timestamp order; the evaluator never
//! rewinds or reorders.

use tracing::{debug, warn};

use super::checks::CheckRegistry;
use crate::catalog::RuleCatalog;
use crate::report::SessionReport;
use crate::types::{AircraftState, ErrorType, SopRule, ViolationLog, ViolationRecord};

/// Stateless SOP evaluator.
#[derive(Debug, Clone, Default)]
pub struct PerformanceEvaluator {
    checks: CheckRegistry,
}

impl PerformanceEvaluator {
    /// Evaluator backed by the built-in check registry.
    pub fn new() -> Self {
        Self::with_checks(CheckRegistry::builtin())
    }

    pub fn with_checks(checks: CheckRegistry) -> Self {
        Self { checks }
    }

    /// Evaluate one state against every rule in the catalog.
    ///
    /// New violations are appended to `log` in detection order and also
    /// returned.
    pub fn evaluate(
        &self,
        state: &AircraftState,
        catalog: &RuleCatalog,
        log: &mut ViolationLog,
    ) -> Vec<ViolationRecord> {
        let mut detected = Vec::new();

        for rule in catalog.rules() {
            let Some(check) = rule.kind().and_then(|k| self.checks.get(k)) else {
                debug!(rule_id = %rule.rule_id, "No check registered for rule, skipping");
                continue;
            };

            if check(state) {
                let record = Self::violation(rule, state);
                warn!(
                    rule_id = %record.rule_id,
                    timestamp = record.timestamp,
                    severity = record.severity,
                    "[PEA] Violation detected: {}",
                    record.details
                );
                detected.push(record);
            }
        }

        for record in &detected {
            log.push(record.clone());
        }
        detected
    }

    /// Render the session log into a report.
    pub fn report(&self, log: &ViolationLog, scenario_id: &str) -> SessionReport {
        SessionReport::from_log(log, scenario_id)
    }

    fn violation(rule: &SopRule, state: &AircraftState) -> ViolationRecord {
        ViolationRecord {
            error_type: ErrorType::SopViolation,
            rule_id: rule.rule_id.clone(),
            timestamp: state.timestamp,
            severity: rule.severity,
            details: format!(
                "Violation of {} at alt={:.2}, speed={:.2}",
                rule.rule_id, state.altitude, state.airspeed
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleKind, SopRule};

    fn catalog_with(kind: RuleKind) -> RuleCatalog {
        let rule = match kind {
            RuleKind::GearCheck => SopRule::new(kind, "Altitude < 500ft", "Landing Gear DOWN", 10.0, 5),
            RuleKind::FlapsTakeoff => {
                SopRule::new(kind, "Altitude < 1000ft & Speed < 150kts", "Flaps > 0", 5.0, 4)
            }
        };
        RuleCatalog::new(vec![rule]).unwrap()
    }

    fn state(altitude: f64, airspeed: f64, gear_down: bool, flaps: u8) -> AircraftState {
        AircraftState {
            timestamp: 12.5,
            altitude,
            airspeed,
            landing_gear_state: gear_down,
            flaps_setting: flaps,
            ..Default::default()
        }
    }

    #[test]
    fn test_gear_up_at_400ft_is_one_violation() {
        let pea = PerformanceEvaluator::new();
        let catalog = catalog_with(RuleKind::GearCheck);
        let mut log = ViolationLog::new();

        let found = pea.evaluate(&state(400.0, 120.0, false, 20), &catalog, &mut log);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, "GEAR_CHECK");
        assert_eq!(found[0].severity, 5);
        assert_eq!(found[0].timestamp, 12.5);
        assert_eq!(found[0].error_type, ErrorType::SopViolation);
        assert_eq!(log.len(), 1);

        let found = pea.evaluate(&state(400.0, 120.0, true, 20), &catalog, &mut log);
        assert!(found.is_empty());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_flaps_zero_low_and_slow_is_one_violation() {
        let pea = PerformanceEvaluator::new();
        let catalog = catalog_with(RuleKind::FlapsTakeoff);
        let mut log = ViolationLog::new();

        let found = pea.evaluate(&state(900.0, 100.0, true, 0), &catalog, &mut log);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, "FLAPS_TAKEOFF");
        assert_eq!(found[0].severity, 4);

        let found = pea.evaluate(&state(900.0, 100.0, true, 10), &catalog, &mut log);
        assert!(found.is_empty());
    }

    #[test]
    fn test_one_state_can_violate_several_rules_in_catalog_order() {
        let pea = PerformanceEvaluator::new();
        let catalog = RuleCatalog::builtin().unwrap();
        let mut log = ViolationLog::new();

        let found = pea.evaluate(&state(300.0, 100.0, false, 0), &catalog, &mut log);
        let ids: Vec<&str> = found.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, ["GEAR_CHECK", "FLAPS_TAKEOFF"]);
        assert_eq!(log.records(), found.as_slice());
    }

    #[test]
    fn test_rule_without_registered_check_is_skipped() {
        let pea = PerformanceEvaluator::with_checks(CheckRegistry::empty());
        let catalog = RuleCatalog::builtin().unwrap();
        let mut log = ViolationLog::new();

        let found = pea.evaluate(&state(300.0, 100.0, false, 0), &catalog, &mut log);
        assert!(found.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_details_mention_rule_and_state() {
        let pea = PerformanceEvaluator::new();
        let catalog = catalog_with(RuleKind::GearCheck);
        let mut log = ViolationLog::new();
        let found = pea.evaluate(&state(412.346, 131.2, false, 20), &catalog, &mut log);
        assert_eq!(found[0].details, "Violation of GEAR_CHECK at alt=412.35, speed=131.20");
    }
}
