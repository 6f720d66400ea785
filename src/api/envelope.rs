//! `{data, meta}` / `{error, meta}` JSON bodies for the trainer API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

/// Stamped on every body so viewers can tell stale responses apart.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with `data` wrapped.
    pub fn ok(data: T) -> Response {
        Json(Self {
            data,
            meta: ResponseMeta::now(),
        })
        .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn respond(status: StatusCode, message: impl Into<String>) -> Response {
        let code = match status {
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::CONFLICT => "CONFLICT",
            _ => "ERROR",
        };
        let body = Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::now(),
        };
        (status, Json(body)).into_response()
    }

    /// Nothing to show yet (no completed cycle).
    pub fn not_found(message: impl Into<String>) -> Response {
        Self::respond(StatusCode::NOT_FOUND, message)
    }

    /// A training session already holds the coordinator.
    pub fn conflict(message: impl Into<String>) -> Response {
        Self::respond(StatusCode::CONFLICT, message)
    }
}
