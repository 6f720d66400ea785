//! Live cadence: wall-clock paced sessions pushed to one viewer.
//!
//! A [`LiveRunner`] serves one viewer connection. It waits for a `Start`
//! command on the shared command channel, begins a session on the
//! coordinator, then emits one tick per interval: evaluate, push
//! `{type: "telemetry", data, errors}`. When the stream ends it pushes a
//! completion status, completes the session, then pushes a cycle summary.
//! Missed ticks are skipped so the schedule stays on a fixed grid.
//!
//! Outbound pushes use `try_send` on a bounded queue. A full queue drops
//! the frame; too many consecutive drops, or a closed queue, ends the
//! session as "viewer disconnected" and the partial log is still analyzed.
//! A `Stop` command abandons the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::coordinator::{CycleOutcome, SessionEnd, TrainingCoordinator};
use super::state::AppState;
use crate::config::LiveConfig;
use crate::types::{AircraftState, ViolationRecord, WeaknessLabel};

pub const COMPLETED_MESSAGE: &str = "Simulation Completed";
pub const STOPPED_MESSAGE: &str = "Simulation Stopped";

// ============================================================================
// Commands and Messages
// ============================================================================

/// Latest viewer command, distributed through a `watch` channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionCommand {
    #[default]
    Idle,
    Start,
    Stop,
}

/// Messages pushed to the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    Telemetry {
        data: AircraftState,
        errors: Vec<ViolationRecord>,
    },
    Status {
        message: String,
    },
    Summary {
        cycle: u64,
        scenario_id: String,
        total_violations: usize,
        weakness: WeaknessLabel,
        next_scenario_id: String,
    },
}

impl LiveMessage {
    pub fn status(message: &str) -> Self {
        LiveMessage::Status {
            message: message.to_string(),
        }
    }

    pub fn summary(outcome: &CycleOutcome) -> Self {
        LiveMessage::Summary {
            cycle: outcome.cycle,
            scenario_id: outcome.scenario_id.clone(),
            total_violations: outcome.report.total_violations,
            weakness: outcome.weakness.label.clone(),
            next_scenario_id: outcome.next_scenario.scenario_id.clone(),
        }
    }
}

/// How a live session ended.
#[derive(Debug)]
pub enum LiveExit {
    /// Analyzed and mutated (stream finished or viewer went away)
    Finished(Box<CycleOutcome>),
    /// Stop command, session abandoned
    Stopped,
    /// Process shutdown, session abandoned
    Shutdown,
    /// Another session was active or the handoff failed
    Rejected(String),
}

// ============================================================================
// Live Runner
// ============================================================================

pub struct LiveRunner {
    coordinator: Arc<Mutex<TrainingCoordinator>>,
    app_state: Arc<RwLock<AppState>>,
    command_tx: Arc<watch::Sender<SessionCommand>>,
    commands: watch::Receiver<SessionCommand>,
    outbound: mpsc::Sender<LiveMessage>,
    config: LiveConfig,
    cancel_token: CancellationToken,
}

impl LiveRunner {
    pub fn new(
        coordinator: Arc<Mutex<TrainingCoordinator>>,
        app_state: Arc<RwLock<AppState>>,
        command_tx: Arc<watch::Sender<SessionCommand>>,
        outbound: mpsc::Sender<LiveMessage>,
        config: LiveConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        let commands = command_tx.subscribe();
        Self {
            coordinator,
            app_state,
            command_tx,
            commands,
            outbound,
            config,
            cancel_token,
        }
    }

    /// Serve sessions until shutdown or the viewer goes away.
    pub async fn run(mut self) {
        loop {
            let command = *self.commands.borrow_and_update();
            if command == SessionCommand::Start {
                if let LiveExit::Shutdown = self.run_session().await {
                    break;
                }
            }
            if self.outbound.is_closed() {
                break;
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => break,
                _ = self.outbound.closed() => break,
                changed = self.commands.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("[Live] Runner finished");
    }

    /// Run one session to its end.
    pub async fn run_session(&mut self) -> LiveExit {
        let begun = self.coordinator.lock().await.begin_session();
        let (mut session, stream) = match begun {
            Ok(started) => started,
            Err(e) => {
                warn!(error = %e, "[Live] Session not started");
                let _ = self.outbound.try_send(LiveMessage::status(&e.to_string()));
                return LiveExit::Rejected(e.to_string());
            }
        };

        let (evaluator, catalog) = {
            let c = self.coordinator.lock().await;
            (c.evaluator(), c.catalog())
        };
        {
            let mut state = self.app_state.write().await;
            state.begin_stream(stream.len());
            state.current_scenario = session.scenario().clone();
        }
        info!(
            cycle = session.cycle(),
            ticks = stream.len(),
            interval_ms = self.config.tick_interval_ms,
            "📡 Live session streaming"
        );

        let mut interval = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = stream.into_iter().enumerate();
        let mut dropped = 0usize;
        let mut ended_by = SessionEnd::Completed;

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    self.abandon(session).await;
                    return LiveExit::Shutdown;
                }
                changed = self.commands.changed() => {
                    let stop = changed.is_err() || *self.commands.borrow_and_update() == SessionCommand::Stop;
                    if stop {
                        self.abandon(session).await;
                        let _ = self.outbound.try_send(LiveMessage::status(STOPPED_MESSAGE));
                        return LiveExit::Stopped;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let Some((index, state)) = ticks.next() else {
                break;
            };
            let errors = session.record(&evaluator, &catalog, &state);
            {
                let mut app = self.app_state.write().await;
                app.tick_index = index;
                app.violations_so_far = session.log().len();
                app.latest_state = Some(state);
            }

            match self.outbound.try_send(LiveMessage::Telemetry { data: state, errors }) {
                Ok(()) => dropped = 0,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    dropped += 1;
                    if dropped > self.config.max_dropped_frames {
                        warn!(dropped, "[Live] Viewer not draining frames, treating as disconnected");
                        ended_by = SessionEnd::ViewerDisconnected;
                        break;
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    info!("[Live] Viewer disconnected mid-session");
                    ended_by = SessionEnd::ViewerDisconnected;
                    break;
                }
            }
        }

        if ended_by == SessionEnd::Completed {
            let _ = self.outbound.try_send(LiveMessage::status(COMPLETED_MESSAGE));
        }

        let completed = self.coordinator.lock().await.complete_session(session, ended_by);
        let outcome = match completed {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "[Live] Session handoff failed");
                return LiveExit::Rejected(e.to_string());
            }
        };

        self.app_state.write().await.record_outcome(&outcome);
        self.command_tx.send_if_modified(|c| {
            if *c == SessionCommand::Start {
                *c = SessionCommand::Idle;
                true
            } else {
                false
            }
        });

        if ended_by == SessionEnd::Completed {
            let _ = self.outbound.try_send(LiveMessage::summary(&outcome));
        }
        LiveExit::Finished(Box::new(outcome))
    }

    async fn abandon(&self, session: super::session::TrainingSession) {
        if let Err(e) = self.coordinator.lock().await.abandon_session(session) {
            warn!(error = %e, "[Live] Failed to abandon session");
        }
        self.app_state.write().await.live_phase = super::state::LivePhase::Idle;
    }
}
