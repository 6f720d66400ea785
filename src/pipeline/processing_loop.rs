//! Evaluation loop shared by the batch cadence and stdin replay.
//!
//! Pulls states from a [`TelemetrySource`], evaluates each against the rule
//! catalog into the session's own log, and stops on end of data,
//! cancellation, or a source error. The caller decides what happens to the
//! session afterwards.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::TrainingSession;
use super::source::{TelemetryEvent, TelemetrySource};
use crate::agents::PerformanceEvaluator;
use crate::catalog::RuleCatalog;

/// Why the loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The source reached end of data
    Exhausted,
    /// Shutdown requested
    Cancelled,
    /// Unrecoverable source error
    SourceError(String),
}

pub struct EvaluationLoop {
    evaluator: PerformanceEvaluator,
    catalog: Arc<RuleCatalog>,
    cancel_token: CancellationToken,
}

impl EvaluationLoop {
    pub fn new(
        evaluator: PerformanceEvaluator,
        catalog: Arc<RuleCatalog>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            evaluator,
            catalog,
            cancel_token,
        }
    }

    /// Evaluate states from `source` into `session` until the source ends.
    pub async fn run<S: TelemetrySource + ?Sized>(
        &self,
        session: &mut TrainingSession,
        source: &mut S,
    ) -> LoopExit {
        info!(
            cycle = session.cycle(),
            scenario_id = %session.scenario_id(),
            "📊 Evaluating telemetry from {}...",
            source.source_name()
        );

        loop {
            let event = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("[EvaluationLoop] Shutdown signal received");
                    return LoopExit::Cancelled;
                }
                result = source.next_state() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[EvaluationLoop] Source error: {}", e);
                            return LoopExit::SourceError(e.to_string());
                        }
                    }
                }
            };

            let state = match event {
                TelemetryEvent::State(s) => s,
                TelemetryEvent::Eof => {
                    info!(
                        "[EvaluationLoop] Source reached end ({} ticks, {} violations)",
                        session.ticks_evaluated(),
                        session.log().len()
                    );
                    return LoopExit::Exhausted;
                }
            };

            session.record(&self.evaluator, &self.catalog, &state);

            if session.ticks_evaluated() % 60 == 0 {
                debug!(
                    ticks = session.ticks_evaluated(),
                    violations = session.log().len(),
                    "📈 Progress"
                );
            }
        }
    }
}
