use serde::{Deserialize, Serialize};

// === HTTP DTOs ===

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "Status")]
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AgentChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AgentChatResponse {
    pub reply: String,
}
