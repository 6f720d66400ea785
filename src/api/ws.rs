//! WebSocket endpoint for the live cadence.
//!
//! Each connection gets its own [`LiveRunner`] and a bounded outbound
//! queue. Inbound text frames carry viewer commands:
//! `{"command": "start"}`, `{"command": "stop"}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::handlers::DashboardState;
use crate::pipeline::{LiveMessage, LiveRunner, SessionCommand};

/// Inbound viewer command frame.
#[derive(Debug, Deserialize)]
pub struct ViewerCommand {
    pub command: SessionCommand,
}

/// GET /ws - upgrade to the live telemetry stream
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<DashboardState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: DashboardState) {
    info!("🔌 Viewer connected");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<LiveMessage>(state.live.push_queue_capacity);

    let runner = LiveRunner::new(
        state.coordinator.clone(),
        state.app_state.clone(),
        state.commands.clone(),
        tx,
        state.live.clone(),
        state.cancel_token.child_token(),
    );
    let runner_task = tokio::spawn(runner.run());

    let mut writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!("[WS] Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = state.cancel_token.cancelled() => break,
            _ = &mut writer => break,
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => apply_command(&state, &text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("[WS] Receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Dropping the receiver tells the runner its viewer is gone
    writer.abort();
    if let Err(e) = runner_task.await {
        warn!("[WS] Live runner task failed: {}", e);
    }
    info!("🔌 Viewer disconnected");
}

fn apply_command(state: &DashboardState, text: &str) {
    match serde_json::from_str::<ViewerCommand>(text) {
        Ok(ViewerCommand { command }) => {
            debug!(?command, "[WS] Viewer command");
            state.commands.send_replace(command);
        }
        Err(e) => warn!("[WS] Ignoring malformed command: {}", e),
    }
}
