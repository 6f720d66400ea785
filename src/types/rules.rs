//! SOP rule records and the closed set of rule kinds

use serde::{Deserialize, Serialize};

// ============================================================================
// Rule Kind
// ============================================================================

/// The closed set of named checks the evaluator knows how to run.
///
/// Adding a rule kind means adding a variant here and registering a predicate
/// in [`crate::agents::checks::CheckRegistry`]; call sites dispatch through
/// the registry and never match on rule id strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    /// Gear must be down below 500 ft
    #[serde(rename = "GEAR_CHECK")]
    GearCheck,
    /// Flaps must be set at low altitude and low speed
    #[serde(rename = "FLAPS_TAKEOFF")]
    FlapsTakeoff,
}

impl RuleKind {
    /// Every known rule kind, in catalog order.
    pub const ALL: [RuleKind; 2] = [RuleKind::GearCheck, RuleKind::FlapsTakeoff];

    /// Stable rule id used on the wire and in violation records.
    pub fn id(&self) -> &'static str {
        match self {
            RuleKind::GearCheck => "GEAR_CHECK",
            RuleKind::FlapsTakeoff => "FLAPS_TAKEOFF",
        }
    }

    /// Resolve a rule id back to its kind. Unknown ids yield `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// SOP Rule
// ============================================================================

/// A named condition / required-action pair.
///
/// Immutable after catalog construction and shared read-only by the
/// evaluator, the scenario mutator and the query responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopRule {
    pub rule_id: String,
    pub pre_condition: String,
    pub required_action: String,
    pub time_limit_sec: f64,
    /// Higher = more severe
    pub severity: u8,
}

impl SopRule {
    pub fn new(
        kind: RuleKind,
        pre_condition: &str,
        required_action: &str,
        time_limit_sec: f64,
        severity: u8,
    ) -> Self {
        Self {
            rule_id: kind.id().to_string(),
            pre_condition: pre_condition.to_string(),
            required_action: required_action.to_string(),
            time_limit_sec,
            severity,
        }
    }

    /// Kind of this rule, if the id belongs to the known set.
    pub fn kind(&self) -> Option<RuleKind> {
        RuleKind::from_id(&self.rule_id)
    }
}
