use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::services::config_service;

/// Failures the relay can surface before any bytes have been streamed.
/// Once streaming has begun, failures are only observable as an early
/// close of the response body.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Client payload missing, malformed, or empty.
    #[error("messages array is required")]
    InvalidRequest,

    /// Upstream credential absent from process configuration. An
    /// operator error, not a user error.
    #[error("upstream API key not configured")]
    Configuration,

    /// Upstream returned a non-success status. Never retried: a silent
    /// retry would mean a duplicate billable model call.
    #[error("AI service error ({status})")]
    Upstream { status: u16, body: String },

    /// The upstream request could not be sent at all.
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        match self {
            ChatError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "messages array is required" })),
            )
                .into_response(),
            ChatError::Configuration => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": format!("{} not configured", config_service::API_KEY_VAR)
                })),
            )
                .into_response(),
            ChatError::Upstream { status, body } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(json!({ "error": "AI service error", "details": body })),
            )
                .into_response(),
            ChatError::Request(e) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "AI service error", "details": e.to_string() })),
            )
                .into_response(),
        }
    }
}
