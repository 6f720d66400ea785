//! API request handlers
//!
//! All JSON endpoints answer with the `{data, meta}` envelope. The HTML
//! report is served as `text/html`.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::agents;
use crate::catalog::RuleCatalog;
use crate::config::LiveConfig;
use crate::pipeline::{AppState, BatchPhase, LivePhase, SessionCommand, TrainingCoordinator};
use crate::types::{AircraftState, SopRule};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Application state mirrored by the live runner
    pub app_state: Arc<RwLock<AppState>>,
    /// Owner of the scenario handoff between cycles
    pub coordinator: Arc<Mutex<TrainingCoordinator>>,
    /// Read-only rule catalog
    pub catalog: Arc<RuleCatalog>,
    /// Latest viewer command, observed by every live runner
    pub commands: Arc<watch::Sender<SessionCommand>>,
    /// Live cadence settings for new viewer connections
    pub live: LiveConfig,
    /// Process shutdown
    pub cancel_token: CancellationToken,
}

impl DashboardState {
    pub fn new(
        coordinator: TrainingCoordinator,
        live: LiveConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        let catalog = coordinator.catalog();
        let app_state = AppState {
            cycles_completed: coordinator.cycles_completed(),
            current_scenario: coordinator.current_scenario().clone(),
            ..AppState::default()
        };
        let (commands, _) = watch::channel(SessionCommand::Idle);
        Self {
            app_state: Arc::new(RwLock::new(app_state)),
            coordinator: Arc::new(Mutex::new(coordinator)),
            catalog,
            commands: Arc::new(commands),
            live,
            cancel_token,
        }
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub live_phase: LivePhase,
    pub batch_phase: BatchPhase,
    pub session_active: bool,
    pub tick_index: usize,
    pub total_ticks: usize,
    pub violations_so_far: usize,
    pub cycles_completed: u64,
    pub current_scenario_id: String,
    pub latest_state: Option<AircraftState>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rules: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat - answer an SOP question
pub async fn post_chat(
    State(state): State<DashboardState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    // A missing question is answered like an empty one
    let message = request.message.unwrap_or_default();
    debug!(chars = message.len(), "[FCA] Question received");
    let response = agents::ask(&message, &state.catalog);
    ApiResponse::ok(ChatResponse { response })
}

/// POST /api/start - ask connected viewers to start a live session
pub async fn post_start(State(state): State<DashboardState>) -> Response {
    if state.coordinator.lock().await.is_session_active() {
        return ApiErrorResponse::conflict("a training session is already active");
    }
    state.commands.send_replace(SessionCommand::Start);
    info!("▶ Start command issued");
    ApiResponse::ok(CommandResponse { status: "started" })
}

/// POST /api/stop - abandon the active live session
pub async fn post_stop(State(state): State<DashboardState>) -> Response {
    state.commands.send_replace(SessionCommand::Stop);
    info!("⏹ Stop command issued");
    ApiResponse::ok(CommandResponse { status: "stopped" })
}

/// GET /api/status
pub async fn get_status(State(state): State<DashboardState>) -> Response {
    let (batch_phase, session_active) = {
        let c = state.coordinator.lock().await;
        (c.phase(), c.is_session_active())
    };
    let app = state.app_state.read().await;
    ApiResponse::ok(StatusResponse {
        live_phase: app.live_phase,
        batch_phase,
        session_active,
        tick_index: app.tick_index,
        total_ticks: app.total_ticks,
        violations_so_far: app.violations_so_far,
        cycles_completed: app.cycles_completed,
        current_scenario_id: app.current_scenario.scenario_id.clone(),
        latest_state: app.latest_state,
        uptime_secs: app.uptime_secs(),
    })
}

/// GET /api/report - latest completed cycle's report
pub async fn get_report(State(state): State<DashboardState>) -> Response {
    match state.coordinator.lock().await.last_outcome() {
        Some(outcome) => ApiResponse::ok(&outcome.report),
        None => ApiErrorResponse::not_found("no completed session yet"),
    }
}

/// GET /api/report.html - latest report as an HTML document
pub async fn get_report_html(State(state): State<DashboardState>) -> Response {
    match state.coordinator.lock().await.last_outcome() {
        Some(outcome) => Html(outcome.report.render_html()).into_response(),
        None => ApiErrorResponse::not_found("no completed session yet"),
    }
}

/// GET /api/scenario - parameters the next session will run under
pub async fn get_scenario(State(state): State<DashboardState>) -> Response {
    let scenario = state.coordinator.lock().await.current_scenario().clone();
    ApiResponse::ok(scenario)
}

/// GET /api/rules - the rule catalog
pub async fn get_rules(State(state): State<DashboardState>) -> Response {
    let rules: Vec<SopRule> = state.catalog.rules().to_vec();
    ApiResponse::ok(rules)
}

/// GET /health
pub async fn health_check(State(state): State<DashboardState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        rules: state.catalog.len(),
    })
}
