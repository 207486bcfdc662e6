use std::sync::Arc;

use orderdesk_config::Settings;
use orderdesk_network::{ChatAgent, OrderSource};

pub struct ServerState {
    pub orders: Arc<dyn OrderSource>,
    pub agent: Arc<dyn ChatAgent>,
}

impl ServerState {
    pub fn new(orders: Arc<dyn OrderSource>, agent: Arc<dyn ChatAgent>) -> Self {
        Self { orders, agent }
    }

    /// Wires the configured order source and chat backend onto one shared HTTP client.
    pub fn from_settings(settings: &Settings, http: reqwest::Client) -> Self {
        let orders = orderdesk_network::order_source(&settings.order_source, http.clone());
        let agent = orderdesk_network::chat_agent(&settings.chat_backend, http);
        Self::new(orders, agent)
    }
}
