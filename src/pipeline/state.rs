//! Application State and Live Phase
//!
//! Dashboard-facing mirror of the training loop, read by API handlers and
//! written by the live runner and the coordinator's callers. The
//! authoritative session data (violation log, next scenario) stays with the
//! orchestrator; this is what a viewer needs to render status.

use serde::Serialize;
use std::time::Instant;

use super::coordinator::CycleOutcome;
use crate::types::{AircraftState, ScenarioParameters};

// ============================================================================
// Live Phase
// ============================================================================

/// Per-session lifecycle of the live cadence.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LivePhase {
    #[default]
    Idle,
    Streaming,
    Completed,
}

impl std::fmt::Display for LivePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LivePhase::Idle => write!(f, "Idle"),
            LivePhase::Streaming => write!(f, "Streaming"),
            LivePhase::Completed => write!(f, "Completed"),
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Shared state, wrapped in `Arc<RwLock<>>` by the server.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub live_phase: LivePhase,

    #[serde(skip)]
    pub uptime: Instant,

    /// Index of the last pushed tick in the active session
    pub tick_index: usize,

    /// Tick count of the active session
    pub total_ticks: usize,

    /// Violations recorded so far in the active session
    pub violations_so_far: usize,

    pub cycles_completed: u64,

    /// Scenario the next (or active) session runs under
    pub current_scenario: ScenarioParameters,

    /// Most recent tick pushed by the live runner
    pub latest_state: Option<AircraftState>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            live_phase: LivePhase::Idle,
            uptime: Instant::now(),
            tick_index: 0,
            total_ticks: 0,
            violations_so_far: 0,
            cycles_completed: 0,
            current_scenario: ScenarioParameters::neutral(),
            latest_state: None,
        }
    }
}

impl AppState {
    /// Reset per-session counters for a new stream.
    pub fn begin_stream(&mut self, total_ticks: usize) {
        self.live_phase = LivePhase::Streaming;
        self.tick_index = 0;
        self.total_ticks = total_ticks;
        self.violations_so_far = 0;
        self.latest_state = None;
    }

    /// Record a finished cycle and the scenario handed to the next one.
    pub fn record_outcome(&mut self, outcome: &CycleOutcome) {
        self.live_phase = LivePhase::Completed;
        self.cycles_completed = outcome.cycle.checked_add(1).unwrap_or(0);
        self.current_scenario = outcome.next_scenario.clone();
    }

    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }
}
