//! Violation records and the per-session violation log

use serde::{Deserialize, Serialize};

/// Classification tag carried by every violation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum ErrorType {
    #[default]
    #[serde(rename = "SOP_VIOLATION")]
    SopViolation,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorType::SopViolation => write!(f, "SOP_VIOLATION"),
        }
    }
}

/// A detected mismatch between one aircraft state and one SOP rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub error_type: ErrorType,
    /// Foreign key into the rule catalog
    pub rule_id: String,
    /// Timestamp of the offending state
    pub timestamp: f64,
    /// Copied from the rule at evaluation time
    pub severity: u8,
    pub details: String,
}

// ============================================================================
// Violation Log
// ============================================================================

/// Append-only, detection-ordered log of one session's violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationLog {
    records: Vec<ViolationRecord>,
}

impl ViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ViolationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ViolationRecord> {
        self.records.iter()
    }

    /// Records appended at or after `offset` (used to echo a tick's new violations).
    pub fn since(&self, offset: usize) -> &[ViolationRecord] {
        &self.records[offset.min(self.records.len())..]
    }
}

impl From<Vec<ViolationRecord>> for ViolationLog {
    fn from(records: Vec<ViolationRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a ViolationLog {
    type Item = &'a ViolationRecord;
    type IntoIter = std::slice::Iter<'a, ViolationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
