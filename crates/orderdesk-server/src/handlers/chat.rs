//! Chat relay HTTP handler.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::{AgentChatRequest, AgentChatResponse};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::services::chat as chat_service;
use crate::ServerState;

/// POST /api/chat-with-agent
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    AppJson(req): AppJson<AgentChatRequest>,
) -> Result<Json<AgentChatResponse>, AppError> {
    let reply = chat_service::relay(&state, &req.message).await?;
    Ok(Json(AgentChatResponse { reply }))
}
