//! Trainer Configuration Module
//!
//! Simulation, live-cadence, server and storage settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `SOP_TRAINER_CONFIG` environment variable (path to TOML file)
//! 2. `trainer_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(TrainerConfig::load());
//!
//! // Anywhere in the codebase:
//! let tps = config::get().simulation.ticks_per_second;
//! ```
//!
//! Only configuration is global. Session state is owned by the orchestrator.

mod trainer_config;
pub mod defaults;
pub mod validation;

pub use trainer_config::*;

use std::sync::OnceLock;

static TRAINER_CONFIG: OnceLock<TrainerConfig> = OnceLock::new();

/// Initialize the global trainer configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: TrainerConfig) {
    if TRAINER_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global trainer configuration.
///
/// Falls back to built-in defaults if `init()` was never called (tests,
/// library use).
pub fn get() -> &'static TrainerConfig {
    TRAINER_CONFIG.get_or_init(TrainerConfig::default)
}
