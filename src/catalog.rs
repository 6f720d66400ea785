//! SOP Rule Catalog
//!
//! The fixed set of rules the trainer evaluates against. Built once at
//! process start, validated, then shared read-only (`Arc<RuleCatalog>`) by the
//! evaluator, the scenario mutator and the query responder. There is no
//! dynamic add/remove, so concurrent readers need no locking.

use serde::Serialize;
use std::collections::HashSet;

use crate::types::{RuleKind, SopRule};

/// Catalog construction errors. Either one halts startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("rule catalog is empty - at least one SOP rule is required")]
    Empty,
    #[error("duplicate rule id '{0}' in rule catalog")]
    DuplicateId(String),
}

/// Immutable, validated list of SOP rules.
#[derive(Debug, Clone, Serialize)]
pub struct RuleCatalog {
    rules: Vec<SopRule>,
}

impl RuleCatalog {
    /// Validate and wrap a rule list.
    pub fn new(rules: Vec<SopRule>) -> Result<Self, CatalogError> {
        if rules.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.rule_id.as_str()) {
                return Err(CatalogError::DuplicateId(rule.rule_id.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// The hardcoded training catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(vec![
            SopRule::new(
                RuleKind::GearCheck,
                "Altitude < 500ft",
                "Landing Gear DOWN",
                10.0,
                5,
            ),
            SopRule::new(
                RuleKind::FlapsTakeoff,
                "Altitude < 1000ft & Speed < 150kts",
                "Flaps > 0",
                5.0,
                4,
            ),
        ])
    }

    pub fn rules(&self) -> &[SopRule] {
        &self.rules
    }

    pub fn get(&self, rule_id: &str) -> Option<&SopRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.get(rule_id).is_some()
    }

    /// Rules whose id resolves to one of `kinds`, in catalog order.
    pub fn rules_of_kinds<'a>(&'a self, kinds: &'a [RuleKind]) -> impl Iterator<Item = &'a SopRule> {
        self.rules
            .iter()
            .filter(move |r| r.kind().is_some_and(|k| kinds.contains(&k)))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
