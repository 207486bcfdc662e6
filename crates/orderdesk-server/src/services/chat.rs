//! Single-turn chat relay to the configured agent.

use tracing::{error, info};

use crate::error::AppError;
use crate::ServerState;

const SERVICE: &str = "AI agent";

/// Sends `message` to the agent and returns its reply.
pub async fn relay(state: &ServerState, message: &str) -> Result<String, AppError> {
    if message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty.".into()));
    }

    info!("Relaying chat message ({} chars)", message.chars().count());

    state.agent.reply(message).await.map_err(|e| {
        error!("Chat agent call failed: {}", e);
        AppError::upstream(SERVICE, &e)
    })
}
