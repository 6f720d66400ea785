//! Weakness label and per-rule summary produced by the analyzer

use serde::{Deserialize, Serialize};

/// Sentinel text used when a session recorded no violations.
pub const NO_VIOLATIONS_LABEL: &str = "General_Review";

/// The dominant failure mode of one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule_id", rename_all = "snake_case")]
pub enum WeaknessLabel {
    /// Most frequently violated rule id
    Rule(String),
    /// The session recorded no violations
    NoViolations,
}

impl WeaknessLabel {
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            WeaknessLabel::Rule(id) => Some(id),
            WeaknessLabel::NoViolations => None,
        }
    }

    pub fn is_no_violations(&self) -> bool {
        matches!(self, WeaknessLabel::NoViolations)
    }
}

impl std::fmt::Display for WeaknessLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeaknessLabel::Rule(id) => f.write_str(id),
            WeaknessLabel::NoViolations => f.write_str(NO_VIOLATIONS_LABEL),
        }
    }
}

/// Occurrence count and summed severity for one rule within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTally {
    pub rule_id: String,
    pub count: usize,
    pub total_severity: u32,
}

/// Analyzer output: the label plus the per-rule tallies it was derived from.
///
/// Tallies are in first-seen order. Severity is reported but does not
/// influence the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaknessSummary {
    pub label: WeaknessLabel,
    pub total_violations: usize,
    pub tallies: Vec<RuleTally>,
}
