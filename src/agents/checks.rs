//! Named SOP checks and the registry that binds them to rule kinds
//!
//! Each rule kind has exactly one predicate over a single aircraft state.
//! This is a closed set: there is no condition language, new rule kinds
//! need a new predicate registered here.

use std::collections::BTreeMap;

use crate::types::{AircraftState, RuleKind};

/// Thresholds used by the built-in checks
pub mod check_thresholds {
    /// Below this altitude (ft) the gear must be down
    pub const GEAR_DOWN_ALTITUDE_FT: f64 = 500.0;
    /// Below this altitude (ft) flaps must be set when slow
    pub const FLAPS_ALTITUDE_FT: f64 = 1000.0;
    /// Below this airspeed (kt) flaps must be set when low
    pub const FLAPS_AIRSPEED_KT: f64 = 150.0;
}

/// Predicate returning `true` when the state violates the rule.
pub type CheckFn = fn(&AircraftState) -> bool;

/// GEAR_CHECK: low and gear not down.
pub fn gear_check(state: &AircraftState) -> bool {
    state.altitude < check_thresholds::GEAR_DOWN_ALTITUDE_FT && !state.gear_down()
}

/// FLAPS_TAKEOFF: low, slow and flaps retracted.
pub fn flaps_takeoff(state: &AircraftState) -> bool {
    state.altitude < check_thresholds::FLAPS_ALTITUDE_FT
        && state.airspeed < check_thresholds::FLAPS_AIRSPEED_KT
        && state.flaps_setting == 0
}

/// Lookup table from rule kind to its predicate.
#[derive(Debug, Clone)]
pub struct CheckRegistry {
    checks: BTreeMap<RuleKind, CheckFn>,
}

impl CheckRegistry {
    /// Registry with no checks.
    pub fn empty() -> Self {
        Self {
            checks: BTreeMap::new(),
        }
    }

    /// Registry with every built-in check.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(RuleKind::GearCheck, gear_check);
        registry.register(RuleKind::FlapsTakeoff, flaps_takeoff);
        registry
    }

    /// Register (or replace) the predicate for a rule kind.
    pub fn register(&mut self, kind: RuleKind, check: CheckFn) {
        self.checks.insert(kind, check);
    }

    pub fn get(&self, kind: RuleKind) -> Option<CheckFn> {
        self.checks.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
