//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use orderdesk_config::GenerativeConfig;
use orderdesk_core::{UpstreamError, FALLBACK_REPLY};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{decode_json, expect_success, transport_error, ChatAgent};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Single-turn chat against a generative model API.
pub struct GenerativeChatClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl GenerativeChatClient {
    pub fn new(client: Client, config: &GenerativeConfig) -> Self {
        info!(
            "GenerativeChatClient: model={}, api_base={}, api_key_len={}",
            config.model,
            config.api_base,
            config.api_key.expose().len()
        );
        Self {
            client,
            url: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.expose().to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

#[async_trait]
impl ChatAgent for GenerativeChatClient {
    async fn reply(&self, message: &str) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &self.system_prompt },
                ChatMessage { role: "user", content: message },
            ],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = expect_success(response).await?;
        let resp: ChatResponse = decode_json(response).await?;

        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty());

        Ok(content.unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}
