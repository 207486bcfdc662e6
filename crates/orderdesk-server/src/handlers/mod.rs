//! HTTP route handlers for the orderdesk server.

pub mod chat;
pub mod order_status;

use axum::Json;

use crate::dto::StatusResponse;

/// Liveness probe for the website.
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: "Online" })
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
