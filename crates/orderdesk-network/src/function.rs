//! Order lookups served by a remote HTTP function.

use async_trait::async_trait;
use orderdesk_core::{RawRecord, UpstreamError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::{decode_json, expect_success, transport_error, OrderSource};

const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Calls `GET {url}?customer_name=...`, optionally with a function key.
pub struct FunctionOrderSource {
    client: Client,
    url: String,
    key: Option<String>,
}

impl FunctionOrderSource {
    pub fn new(client: Client, url: &str, key: Option<String>) -> Self {
        info!(
            "FunctionOrderSource: url={}, authenticated={}",
            url,
            key.is_some()
        );
        Self {
            client,
            url: url.to_string(),
            key,
        }
    }
}

#[async_trait]
impl OrderSource for FunctionOrderSource {
    async fn fetch(&self, customer: &str) -> Result<Option<RawRecord>, UpstreamError> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("customer_name", customer)]);
        if let Some(key) = &self.key {
            request = request.header(FUNCTION_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Order function has no order for {:?}", customer);
            return Ok(None);
        }

        let response = expect_success(response).await?;
        let payload: Value = decode_json(response).await?;
        record_from_payload(payload)
    }
}

/// Accepts a single object, or a list whose first element is the match.
fn record_from_payload(payload: Value) -> Result<Option<RawRecord>, UpstreamError> {
    match payload {
        Value::Object(map) => Ok(Some(map.into())),
        Value::Array(items) => match items.into_iter().next() {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.into())),
            Some(other) => Err(UpstreamError::Decode(format!(
                "expected an order object in list, got {other}"
            ))),
        },
        other => Err(UpstreamError::Decode(format!(
            "expected an order object, got {other}"
        ))),
    }
}
