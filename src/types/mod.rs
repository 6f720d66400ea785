//! Shared data structures for the adaptive training loop
//!
//! This module defines the records that flow around the monitor → analyze →
//! adapt cycle:
//! - AircraftState (one per telemetry tick)
//! - SopRule / RuleKind (the fixed rule catalog entries)
//! - ViolationRecord / ViolationLog (evaluator output, per session)
//! - WeaknessLabel / WeaknessSummary (analyzer output)
//! - ScenarioParameters (mutator output, generator input)

mod state;
mod rules;
mod violation;
mod scenario;
mod weakness;

pub use state::*;
pub use rules::*;
pub use violation::*;
pub use scenario::*;
pub use weakness::*;
