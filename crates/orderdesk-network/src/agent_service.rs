//! Client for a managed AI-agent service with a thread/message/run lifecycle.

use std::time::Duration;

use async_trait::async_trait;
use orderdesk_config::AgentServiceConfig;
use orderdesk_core::{UpstreamError, FALLBACK_REPLY};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::{decode_json, expect_success, transport_error, ChatAgent};

#[derive(Serialize)]
struct NewMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct Run {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Deserialize)]
struct RunError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    value: String,
}

/// Runs one message through a fresh agent thread and returns the reply.
pub struct AgentServiceClient {
    client: Client,
    endpoint: String,
    agent_id: String,
    token: String,
    api_version: String,
    poll_interval: Duration,
    run_timeout: Duration,
}

impl AgentServiceClient {
    pub fn new(client: Client, config: &AgentServiceConfig) -> Self {
        info!(
            "AgentServiceClient: endpoint={}, agent={}, api_version={}",
            config.endpoint, config.agent_id, config.api_version
        );
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            agent_id: config.agent_id.clone(),
            token: config.token.expose().to_string(),
            api_version: config.api_version.clone(),
            poll_interval: config.poll_interval,
            run_timeout: config.run_timeout,
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .query(&[("api-version", self.api_version.as_str())])
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, UpstreamError> {
        let response = self.request(builder).send().await.map_err(transport_error)?;
        let response = expect_success(response).await?;
        decode_json(response).await
    }

    async fn create_thread(&self) -> Result<String, UpstreamError> {
        let url = format!("{}/threads", self.endpoint);
        let thread: Created = self.send(self.client.post(url).json(&json!({}))).await?;
        Ok(thread.id)
    }

    async fn converse(&self, thread_id: &str, message: &str) -> Result<String, UpstreamError> {
        let messages_url = format!("{}/threads/{}/messages", self.endpoint, thread_id);
        let _: Created = self
            .send(self.client.post(&messages_url).json(&NewMessage { role: "user", content: message }))
            .await?;

        let runs_url = format!("{}/threads/{}/runs", self.endpoint, thread_id);
        let run: Run = self
            .send(self.client.post(&runs_url).json(&NewRun { assistant_id: &self.agent_id }))
            .await?;

        let run = self.wait_for_run(&runs_url, run).await?;
        if run.status != "completed" {
            let detail = run
                .last_error
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.unwrap_or_default(),
                        e.message.unwrap_or_default()
                    )
                })
                .unwrap_or_default();
            return Err(UpstreamError::RunFailed { status: run.status, detail });
        }

        let listed: MessageList = self
            .send(self.client.get(&messages_url).query(&[("order", "desc")]))
            .await?;
        Ok(extract_reply(listed.data).unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }

    async fn wait_for_run(&self, runs_url: &str, mut run: Run) -> Result<Run, UpstreamError> {
        let deadline = Instant::now() + self.run_timeout;
        while !is_terminal(&run.status) {
            if Instant::now() >= deadline {
                warn!("Agent run {} still {} at deadline", run.id, run.status);
                return Err(UpstreamError::Timeout);
            }
            sleep(self.poll_interval).await;
            let url = format!("{}/{}", runs_url, run.id);
            run = self.send(self.client.get(url)).await?;
            debug!("Agent run {} status: {}", run.id, run.status);
        }
        Ok(run)
    }

    async fn delete_thread(&self, thread_id: &str) {
        let url = format!("{}/threads/{}", self.endpoint, thread_id);
        let result = match self.request(self.client.delete(url)).send().await {
            Ok(response) => expect_success(response).await.map(|_| ()),
            Err(e) => Err(transport_error(e)),
        };
        if let Err(e) = result {
            warn!("Failed to delete agent thread {}: {}", thread_id, e);
        }
    }
}

#[async_trait]
impl ChatAgent for AgentServiceClient {
    async fn reply(&self, message: &str) -> Result<String, UpstreamError> {
        let thread_id = self.create_thread().await?;
        debug!("Created agent thread {}", thread_id);

        let result = self.converse(&thread_id, message).await;
        self.delete_thread(&thread_id).await;
        result
    }
}

fn is_terminal(status: &str) -> bool {
    matches!(
        status,
        "completed" | "failed" | "cancelled" | "expired" | "requires_action"
    )
}

/// Last text part of the newest assistant message that has any text.
fn extract_reply(messages: Vec<ThreadMessage>) -> Option<String> {
    messages
        .into_iter()
        .filter(|m| m.role == "assistant")
        .find_map(|m| m.content.into_iter().filter_map(|part| part.text).last())
        .map(|text| text.value)
}
