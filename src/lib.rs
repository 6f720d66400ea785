//! SOP Trainer: adaptive flight-training SOP simulator
//!
//! Closed monitor → analyze → adapt loop over simulated flights.
//!
//! ## Architecture
//!
//! - **Telemetry generator** (`telemetry`): seeded climb/descent profiles
//!   perturbed by the current scenario
//! - **Performance Evaluation Agent** (`agents::evaluator`): per-tick SOP checks
//! - **Scenario Generation Agent** (`agents::scenario`): weakness analysis and
//!   next-scenario mutation
//! - **Feedback Coaching Agent** (`agents::coach`): SOP question answering
//! - **Orchestrator** (`pipeline`): batch and live cadences around one
//!   `TrainingCoordinator`

pub mod agents;
pub mod api;
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use catalog::{CatalogError, RuleCatalog};
pub use config::TrainerConfig;
pub use pipeline::{CycleOutcome, SessionError, TrainingCoordinator};
pub use report::SessionReport;
pub use types::{
    AircraftState, ScenarioParameters, SopRule, ViolationLog, ViolationRecord, WeaknessLabel,
    WeaknessSummary,
};
