//! Agents of the adaptive training loop
//!
//! ## Monitor → Analyze → Adapt
//!
//! - **Performance Evaluation Agent** (`evaluator`): per-tick SOP checks
//! - **Scenario Generation Agent** (`scenario`): weakness analysis and
//!   next-scenario mutation
//! - **Feedback Coaching Agent** (`coach`): free-text SOP questions, outside
//!   the loop
//!
//! Rule predicates live in `checks`, keyed by [`crate::types::RuleKind`].

pub mod checks;
pub mod evaluator;
pub mod scenario;
pub mod coach;

pub use checks::{CheckFn, CheckRegistry};
pub use evaluator::PerformanceEvaluator;
pub use scenario::{scenario_id_for, ScenarioMutator, WeaknessAnalyzer};
pub use coach::{ask, NOT_FOUND_RESPONSE};
