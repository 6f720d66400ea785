//! Training Coordinator - one adaptive training cycle at a time
//!
//! ```text
//! Idle → Generating → Evaluating → Reporting → Analyzing → Mutating → Idle
//!          │              │            │           │           │
//!          │              │            │           │           └ next scenario (+ snapshot)
//!          │              │            │           └ weakness label
//!          │              │            └ feedback report
//!          │              └ per-tick SOP checks into the session log
//!          └ telemetry stream from the current scenario
//! ```
//!
//! The coordinator owns the scenario handoff between cycles. A session is
//! opened with [`begin_session`](TrainingCoordinator::begin_session) and
//! closed with either [`complete_session`](TrainingCoordinator::complete_session)
//! (analysis + mutation) or [`abandon_session`](TrainingCoordinator::abandon_session)
//! (no analysis, scenario unchanged). At most one session is active.
//!
//! The live cadence evaluates ticks outside the coordinator and only holds
//! it (behind `Arc<tokio::sync::Mutex>`) to begin and complete, which makes
//! the handoff atomic with respect to session boundaries.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::processing_loop::{EvaluationLoop, LoopExit};
use super::session::TrainingSession;
use super::source::{ReplaySource, TelemetrySource};
use crate::agents::{PerformanceEvaluator, ScenarioMutator, WeaknessAnalyzer};
use crate::catalog::RuleCatalog;
use crate::config::SimulationConfig;
use crate::report::SessionReport;
use crate::storage::{SessionSnapshot, SnapshotStore};
use crate::telemetry::generate_stream;
use crate::types::{AircraftState, ScenarioParameters, WeaknessSummary};

// ============================================================================
// Phase / Outcome / Errors
// ============================================================================

/// Step of the training cycle the coordinator is in.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    #[default]
    Idle,
    Generating,
    Evaluating,
    Reporting,
    Analyzing,
    Mutating,
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchPhase::Idle => write!(f, "Idle"),
            BatchPhase::Generating => write!(f, "Generating"),
            BatchPhase::Evaluating => write!(f, "Evaluating"),
            BatchPhase::Reporting => write!(f, "Reporting"),
            BatchPhase::Analyzing => write!(f, "Analyzing"),
            BatchPhase::Mutating => write!(f, "Mutating"),
        }
    }
}

/// How a completed session ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// Every tick was evaluated
    Completed,
    /// The viewer went away mid-stream; the partial log was still analyzed
    ViewerDisconnected,
}

/// Result of one completed training cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub scenario_id: String,
    pub ticks_evaluated: usize,
    pub ended_by: SessionEnd,
    pub report: SessionReport,
    pub weakness: WeaknessSummary,
    pub next_scenario: ScenarioParameters,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a training session is already active (cycle {0})")]
    AlreadyActive(u64),

    #[error("no training session is active")]
    NotActive,

    #[error("session for cycle {got} does not match active cycle {active}")]
    Mismatch { active: u64, got: u64 },

    #[error("session cancelled")]
    Cancelled,

    #[error("telemetry source failed: {0}")]
    Source(String),
}

// ============================================================================
// Coordinator
// ============================================================================

pub struct TrainingCoordinator {
    catalog: Arc<RuleCatalog>,
    evaluator: PerformanceEvaluator,
    mutator: ScenarioMutator,
    simulation: SimulationConfig,
    snapshots: Option<SnapshotStore>,

    phase: BatchPhase,
    /// Parameters for the next (or active) session
    scenario: ScenarioParameters,
    cycles_completed: u64,
    active_cycle: Option<u64>,
    last_outcome: Option<CycleOutcome>,
}

impl TrainingCoordinator {
    /// Coordinator starting from the neutral scenario.
    pub fn new(catalog: Arc<RuleCatalog>, simulation: SimulationConfig) -> Self {
        info!(rules = catalog.len(), "Initializing Training Coordinator");
        Self {
            catalog,
            evaluator: PerformanceEvaluator::new(),
            mutator: ScenarioMutator::new(),
            simulation,
            snapshots: None,
            phase: BatchPhase::Idle,
            scenario: ScenarioParameters::neutral(),
            cycles_completed: 0,
            active_cycle: None,
            last_outcome: None,
        }
    }

    /// Persist a snapshot after every completed cycle, resuming from the
    /// stored one if it loads.
    pub fn with_snapshots(mut self, store: SnapshotStore) -> Self {
        if let Some(snapshot) = store.load() {
            self.resume_from(&snapshot);
        }
        self.snapshots = Some(store);
        self
    }

    /// Continue the loop from a previously completed cycle. A snapshot whose
    /// cycle has no successor is ignored and the loop starts from neutral.
    pub fn resume_from(&mut self, snapshot: &SessionSnapshot) {
        let Some(next_cycle) = snapshot.cycle.checked_add(1) else {
            warn!(cycle = snapshot.cycle, "Snapshot cycle out of range, starting from neutral");
            return;
        };
        self.scenario = snapshot.next_scenario.clone();
        self.cycles_completed = next_cycle;
        info!(
            cycle = self.cycles_completed,
            scenario_id = %self.scenario.scenario_id,
            "🔁 Resuming training loop from snapshot"
        );
    }

    pub fn catalog(&self) -> Arc<RuleCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn evaluator(&self) -> PerformanceEvaluator {
        self.evaluator.clone()
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn current_scenario(&self) -> &ScenarioParameters {
        &self.scenario
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn is_session_active(&self) -> bool {
        self.active_cycle.is_some()
    }

    pub fn last_outcome(&self) -> Option<&CycleOutcome> {
        self.last_outcome.as_ref()
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    /// Open a session under the current scenario without generating
    /// telemetry (the caller supplies states, e.g. from stdin).
    pub fn open_session(&mut self) -> Result<TrainingSession, SessionError> {
        if let Some(active) = self.active_cycle {
            return Err(SessionError::AlreadyActive(active));
        }
        let cycle = self.cycles_completed;
        self.active_cycle = Some(cycle);
        self.phase = BatchPhase::Evaluating;
        info!(cycle, scenario_id = %self.scenario.scenario_id, "🛫 Training session started");
        Ok(TrainingSession::new(cycle, self.scenario.clone()))
    }

    /// Open a session and generate its telemetry stream.
    pub fn begin_session(&mut self) -> Result<(TrainingSession, Vec<AircraftState>), SessionError> {
        if let Some(active) = self.active_cycle {
            return Err(SessionError::AlreadyActive(active));
        }
        self.phase = BatchPhase::Generating;
        let seed = self.simulation.cycle_seed(self.cycles_completed);
        let stream = generate_stream(&self.simulation, &self.scenario, seed);
        let session = self.open_session()?;
        Ok((session, stream))
    }

    /// Report, analyze and mutate; the mutated scenario replaces the current
    /// one and a snapshot is written when enabled.
    pub fn complete_session(
        &mut self,
        session: TrainingSession,
        ended_by: SessionEnd,
    ) -> Result<CycleOutcome, SessionError> {
        self.check_active(&session)?;

        self.phase = BatchPhase::Reporting;
        let report = self.evaluator.report(session.log(), session.scenario_id());

        self.phase = BatchPhase::Analyzing;
        let weakness = WeaknessAnalyzer::summarize(session.log());

        self.phase = BatchPhase::Mutating;
        let next_scenario = self.mutator.mutate(&weakness.label, &self.catalog);

        let outcome = CycleOutcome {
            cycle: session.cycle(),
            scenario_id: session.scenario_id().to_string(),
            ticks_evaluated: session.ticks_evaluated(),
            ended_by,
            report,
            weakness,
            next_scenario,
        };

        if let Some(store) = &self.snapshots {
            let snapshot = SessionSnapshot::new(
                outcome.cycle,
                &outcome.scenario_id,
                session.log().clone(),
                outcome.weakness.clone(),
                outcome.next_scenario.clone(),
            );
            if let Err(e) = store.save(&snapshot) {
                warn!(error = %e, "Failed to save session snapshot, continuing in memory");
            }
        }

        self.scenario = outcome.next_scenario.clone();
        self.cycles_completed = outcome.cycle.checked_add(1).unwrap_or_else(|| {
            warn!(cycle = outcome.cycle, "Cycle counter exhausted, restarting count at 0");
            0
        });
        self.active_cycle = None;
        self.phase = BatchPhase::Idle;
        self.last_outcome = Some(outcome.clone());

        info!(
            cycle = outcome.cycle,
            violations = outcome.report.total_violations,
            weakness = %outcome.weakness.label,
            next_scenario = %outcome.next_scenario.scenario_id,
            "✅ Training cycle complete"
        );
        Ok(outcome)
    }

    /// Drop a session without analysis. The current scenario is unchanged.
    pub fn abandon_session(&mut self, session: TrainingSession) -> Result<(), SessionError> {
        self.check_active(&session)?;
        self.active_cycle = None;
        self.phase = BatchPhase::Idle;
        info!(
            cycle = session.cycle(),
            ticks = session.ticks_evaluated(),
            "⏹ Training session stopped, results discarded"
        );
        Ok(())
    }

    fn check_active(&self, session: &TrainingSession) -> Result<(), SessionError> {
        match self.active_cycle {
            None => Err(SessionError::NotActive),
            Some(active) if active != session.cycle() => Err(SessionError::Mismatch {
                active,
                got: session.cycle(),
            }),
            Some(_) => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Batch cadence
    // ------------------------------------------------------------------------

    /// Run one full cycle as fast as the source allows.
    ///
    /// `tick_delay_ms` paces the generated stream (0 = no delay).
    pub async fn run_batch_cycle(
        &mut self,
        tick_delay_ms: u64,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, SessionError> {
        let (session, stream) = self.begin_session()?;
        let mut source = ReplaySource::new(stream, tick_delay_ms);
        self.run_session_from(session, &mut source, cancel).await
    }

    /// Evaluate an open session from `source`, then complete or abandon it.
    pub async fn run_session_from<S: TelemetrySource + ?Sized>(
        &mut self,
        mut session: TrainingSession,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome, SessionError> {
        let evaluation = EvaluationLoop::new(self.evaluator(), self.catalog(), cancel.clone());
        match evaluation.run(&mut session, source).await {
            LoopExit::Exhausted => self.complete_session(session, SessionEnd::Completed),
            LoopExit::Cancelled => {
                self.abandon_session(session)?;
                Err(SessionError::Cancelled)
            }
            LoopExit::SourceError(e) => {
                self.abandon_session(session)?;
                Err(SessionError::Source(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ViolationLog, WeaknessLabel};

    fn coordinator(seed: u64) -> TrainingCoordinator {
        let simulation = SimulationConfig {
            duration_minutes: 1.0,
            seed: Some(seed),
            ..SimulationConfig::default()
        };
        TrainingCoordinator::new(Arc::new(RuleCatalog::builtin().unwrap()), simulation)
    }

    #[test]
    fn test_only_one_session_at_a_time() {
        let mut c = coordinator(1);
        let (session, stream) = c.begin_session().unwrap();
        assert_eq!(stream.len(), 120);
        assert_eq!(c.phase(), BatchPhase::Evaluating);
        assert_eq!(c.begin_session().unwrap_err(), SessionError::AlreadyActive(0));
        assert_eq!(c.open_session().unwrap_err(), SessionError::AlreadyActive(0));
        c.abandon_session(session).unwrap();
        assert!(!c.is_session_active());
    }

    #[test]
    fn test_abandon_keeps_scenario_and_cycle() {
        let mut c = coordinator(2);
        let (mut session, stream) = c.begin_session().unwrap();
        let evaluator = c.evaluator();
        let catalog = c.catalog();
        for state in &stream {
            session.record(&evaluator, &catalog, state);
        }
        c.abandon_session(session).unwrap();
        assert_eq!(c.cycles_completed(), 0);
        assert_eq!(c.current_scenario(), &ScenarioParameters::neutral());
        assert!(c.last_outcome().is_none());
        assert_eq!(c.phase(), BatchPhase::Idle);
    }

    #[test]
    fn test_complete_hands_off_mutated_scenario() {
        let mut c = coordinator(3);
        let (mut session, _) = c.begin_session().unwrap();
        let evaluator = c.evaluator();
        let catalog = c.catalog();
        let gear_up_low = AircraftState {
            timestamp: 1.0,
            altitude: 250.0,
            airspeed: 170.0,
            landing_gear_state: false,
            flaps_setting: 20,
            ..Default::default()
        };
        session.record(&evaluator, &catalog, &gear_up_low);

        let outcome = c.complete_session(session, SessionEnd::Completed).unwrap();
        assert_eq!(outcome.weakness.label, WeaknessLabel::Rule("GEAR_CHECK".into()));
        assert_eq!(outcome.next_scenario.scenario_id, "Training_GEAR_CHECK");
        assert_eq!(outcome.report.total_violations, 1);
        assert_eq!(c.current_scenario().scenario_id, "Training_GEAR_CHECK");
        assert_eq!(c.cycles_completed(), 1);
        assert_eq!(c.phase(), BatchPhase::Idle);
    }

    #[test]
    fn test_completing_stale_session_is_rejected() {
        let mut c = coordinator(4);
        let (session, _) = c.begin_session().unwrap();
        c.abandon_session(session).unwrap();

        let stale = TrainingSession::new(0, ScenarioParameters::neutral());
        assert_eq!(
            c.complete_session(stale, SessionEnd::Completed).unwrap_err(),
            SessionError::NotActive
        );

        let _active = c.open_session().unwrap();
        let other = TrainingSession::new(9, ScenarioParameters::neutral());
        assert_eq!(
            c.abandon_session(other).unwrap_err(),
            SessionError::Mismatch { active: 0, got: 9 }
        );
    }

    #[tokio::test]
    async fn test_batch_cycle_advances_loop() {
        let mut c = coordinator(5);
        let token = CancellationToken::new();
        let first = c.run_batch_cycle(0, &token).await.unwrap();
        assert_eq!(first.cycle, 0);
        assert_eq!(first.ticks_evaluated, 120);
        assert_eq!(first.ended_by, SessionEnd::Completed);
        assert_eq!(first.scenario_id, "Training_General_Review");

        let second = c.run_batch_cycle(0, &token).await.unwrap();
        assert_eq!(second.cycle, 1);
        assert_eq!(second.scenario_id, first.next_scenario.scenario_id);
        assert_eq!(c.cycles_completed(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_batch_cycle_is_abandoned() {
        let mut c = coordinator(6);
        let token = CancellationToken::new();
        token.cancel();
        let err = c.run_batch_cycle(10_000, &token).await.unwrap_err();
        assert_eq!(err, SessionError::Cancelled);
        assert_eq!(c.cycles_completed(), 0);
        assert!(!c.is_session_active());
    }

    #[test]
    fn test_snapshot_written_and_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_session.json");

        let mut c = coordinator(7).with_snapshots(SnapshotStore::new(&path));
        let session = c.open_session().unwrap();
        let outcome = c.complete_session(session, SessionEnd::Completed).unwrap();
        assert_eq!(outcome.weakness.label, WeaknessLabel::NoViolations);
        assert!(path.exists());

        let mut resumed = coordinator(7);
        resumed.scenario.scenario_id = "stale".into();
        let resumed = resumed.with_snapshots(SnapshotStore::new(&path));
        assert_eq!(resumed.cycles_completed(), 1);
        assert_eq!(resumed.current_scenario(), &ScenarioParameters::neutral());
    }

    #[test]
    fn test_resume_ignores_cycle_without_successor() {
        let mut next = ScenarioParameters::neutral();
        next.scenario_id = "Training_GEAR_CHECK".into();
        let snapshot = SessionSnapshot::new(
            u64::MAX,
            "Training_General_Review",
            ViolationLog::new(),
            WeaknessAnalyzer::summarize(&ViolationLog::new()),
            next,
        );

        let mut c = coordinator(8);
        c.resume_from(&snapshot);
        assert_eq!(c.cycles_completed(), 0);
        assert_eq!(c.current_scenario(), &ScenarioParameters::neutral());
    }

    #[test]
    fn test_completing_last_cycle_restarts_count() {
        let mut c = coordinator(9);
        c.cycles_completed = u64::MAX;
        let session = c.open_session().unwrap();
        let outcome = c.complete_session(session, SessionEnd::Completed).unwrap();
        assert_eq!(outcome.cycle, u64::MAX);
        assert_eq!(c.cycles_completed(), 0);
        assert!(!c.is_session_active());
    }
}
