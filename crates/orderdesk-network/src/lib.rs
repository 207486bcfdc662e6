//! Upstream collaborators behind the orderdesk HTTP surface.
//!
//! Order lookups go through [`OrderSource`], chat requests through
//! [`ChatAgent`]. Each call is a single attempt; failures come back as a
//! typed [`UpstreamError`] for the server to map onto a status code.

mod agent_service;
mod function;
mod generative;
mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use orderdesk_config::{ChatBackendConfig, OrderSourceConfig};
use orderdesk_core::{RawRecord, UpstreamError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

pub use agent_service::AgentServiceClient;
pub use function::FunctionOrderSource;
pub use generative::GenerativeChatClient;
pub use sql::SqlOrderSource;

/// Fetches the raw order row for a customer.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Returns `Ok(None)` when no order matches `customer`.
    async fn fetch(&self, customer: &str) -> Result<Option<RawRecord>, UpstreamError>;
}

/// Produces a single reply to a user message.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, UpstreamError>;
}

/// Builds the configured order source.
pub fn order_source(config: &OrderSourceConfig, client: Client) -> Arc<dyn OrderSource> {
    match config {
        OrderSourceConfig::Function(function) => Arc::new(FunctionOrderSource::new(
            client,
            &function.url,
            function.key.as_ref().map(|k| k.expose().to_string()),
        )),
        OrderSourceConfig::Database(database) => Arc::new(SqlOrderSource::new(
            &database.path,
            &database.table,
            database.lookup,
        )),
    }
}

/// Builds the configured chat agent.
pub fn chat_agent(config: &ChatBackendConfig, client: Client) -> Arc<dyn ChatAgent> {
    match config {
        ChatBackendConfig::Agent(agent) => Arc::new(AgentServiceClient::new(client, agent)),
        ChatBackendConfig::Generative(generative) => {
            Arc::new(GenerativeChatClient::new(client, generative))
        }
    }
}

/// Classifies a transport-level reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        return UpstreamError::Timeout;
    }
    if err.is_decode() {
        return UpstreamError::Decode(err.to_string());
    }
    match err.status() {
        Some(status) => UpstreamError::from_status(status.as_u16(), err.to_string()),
        None => UpstreamError::Connectivity(err.to_string()),
    }
}

/// Passes 2xx responses through; turns anything else into a status error.
pub(crate) async fn expect_success(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::from_status(status.as_u16(), body))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use axum::Router;
    use reqwest::Client;

    /// Serves `app` on an ephemeral local port and returns its base URL.
    pub async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn client(timeout: Duration) -> Client {
        Client::builder().timeout(timeout).build().unwrap()
    }

    /// A base URL nothing is listening on.
    pub async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}
