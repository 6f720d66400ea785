//! API route definitions
//!
//! - /api/chat - SOP question answering
//! - /api/start, /api/stop - live session control
//! - /api/status - live and batch progress
//! - /api/report, /api/report.html - latest cycle report
//! - /api/scenario - next scenario parameters
//! - /api/rules - rule catalog
//! - /ws - live telemetry stream

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, DashboardState};
use super::ws;

/// Create all API routes
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/chat", post(handlers::post_chat))
        .route("/start", post(handlers::post_start))
        .route("/stop", post(handlers::post_stop))
        .route("/status", get(handlers::get_status))
        .route("/report", get(handlers::get_report))
        .route("/report.html", get(handlers::get_report_html))
        .route("/scenario", get(handlers::get_scenario))
        .route("/rules", get(handlers::get_rules))
        .with_state(state)
}

/// Root-level routes: health check and the WebSocket stream
pub fn root_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleCatalog;
    use crate::config::{LiveConfig, SimulationConfig};
    use crate::pipeline::{SessionCommand, SessionEnd, TrainingCoordinator};
    use crate::types::AircraftState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    fn create_test_state() -> DashboardState {
        let catalog = Arc::new(RuleCatalog::builtin().unwrap());
        let coordinator = TrainingCoordinator::new(catalog, SimulationConfig::default());
        DashboardState::new(coordinator, LiveConfig::default(), CancellationToken::new())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Complete one session on the coordinator with a single gear-up tick
    /// below the retraction altitude.
    async fn complete_one_session(state: &DashboardState) {
        let mut coordinator = state.coordinator.lock().await;
        let mut session = coordinator.open_session().unwrap();
        let evaluator = coordinator.evaluator();
        let catalog = coordinator.catalog();
        session.record(
            &evaluator,
            &catalog,
            &AircraftState {
                timestamp: 3.0,
                altitude: 200.0,
                airspeed: 150.0,
                landing_gear_state: false,
                ..Default::default()
            },
        );
        coordinator.complete_session(session, SessionEnd::Completed).unwrap();
    }

    #[tokio::test]
    async fn test_chat_answers_from_catalog() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(post_json("/chat", r#"{"message":"What is the gear retraction altitude?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert!(v["data"]["response"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_chat_unknown_topic_gets_fallback() {
        let app = api_routes(create_test_state());
        let response = app
            .oneshot(post_json("/chat", r#"{"message":"Tell me about the weather"}"#))
            .await
            .unwrap();

        let v = body_json(response).await;
        assert_eq!(v["data"]["response"], crate::agents::NOT_FOUND_RESPONSE);
    }

    #[tokio::test]
    async fn test_chat_missing_or_empty_message_gets_fallback() {
        for body in ["{}", r#"{"message":""}"#, r#"{"message":"   "}"#] {
            let app = api_routes(create_test_state());
            let response = app.oneshot(post_json("/chat", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "body {body}");
            let v = body_json(response).await;
            assert_eq!(v["data"]["response"], crate::agents::NOT_FOUND_RESPONSE);
        }
    }

    #[tokio::test]
    async fn test_start_and_stop_publish_commands() {
        let state = create_test_state();
        let mut commands = state.commands.subscribe();

        let response = api_routes(state.clone())
            .oneshot(post_json("/start", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*commands.borrow_and_update(), SessionCommand::Start);

        let response = api_routes(state.clone())
            .oneshot(post_json("/stop", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*commands.borrow_and_update(), SessionCommand::Stop);
    }

    #[tokio::test]
    async fn test_start_while_active_is_conflict() {
        let state = create_test_state();
        let _session = state.coordinator.lock().await.open_session().unwrap();

        let response = api_routes(state).oneshot(post_json("/start", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_status_reports_idle() {
        let app = api_routes(create_test_state());
        let response = app.oneshot(get("/status")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"]["live_phase"], "idle");
        assert_eq!(v["data"]["cycles_completed"], 0);
        assert_eq!(v["data"]["session_active"], false);
        assert_eq!(v["data"]["current_scenario_id"], "Training_General_Review");
        assert!(v["data"]["latest_state"].is_null());
    }

    #[tokio::test]
    async fn test_status_exposes_latest_tick() {
        let state = create_test_state();
        state.app_state.write().await.latest_state = Some(AircraftState {
            timestamp: 12.5,
            altitude: 640.0,
            ..Default::default()
        });

        let v = body_json(api_routes(state).oneshot(get("/status")).await.unwrap()).await;
        assert_eq!(v["data"]["latest_state"]["timestamp"], 12.5);
        assert_eq!(v["data"]["latest_state"]["altitude"], 640.0);
    }

    #[tokio::test]
    async fn test_report_not_found_before_first_cycle() {
        let state = create_test_state();
        let response = api_routes(state.clone()).oneshot(get("/report")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = api_routes(state).oneshot(get("/report.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_after_completed_cycle() {
        let state = create_test_state();
        complete_one_session(&state).await;

        let response = api_routes(state.clone()).oneshot(get("/report")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"]["total_violations"], 1);
        assert_eq!(v["data"]["rows"][0]["rule_id"], "GEAR_CHECK");

        let response = api_routes(state.clone()).oneshot(get("/report.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Total Violations: 1"));

        // The mutated scenario is what the next session will run
        let v = body_json(api_routes(state).oneshot(get("/scenario")).await.unwrap()).await;
        assert_eq!(v["data"]["scenario_id"], "Training_GEAR_CHECK");
    }

    #[tokio::test]
    async fn test_rules_lists_catalog() {
        let app = api_routes(create_test_state());
        let v = body_json(app.oneshot(get("/rules")).await.unwrap()).await;
        let ids: Vec<&str> = v["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r["rule_id"].as_str())
            .collect();
        assert!(ids.contains(&"GEAR_CHECK"));
        assert!(ids.contains(&"FLAPS_TAKEOFF"));
    }

    #[tokio::test]
    async fn test_health_at_root() {
        let app = root_routes(create_test_state());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"]["status"], "ok");
    }
}
