//! HTTP client for the Hyperliquid info endpoint

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::ExchangeInfo;
use crate::error::{Result, TrackerError};

/// Characters of each response body echoed to the debug log
const PREVIEW_CHARS: usize = 300;

/// Client for `POST /info` queries
pub struct InfoClient {
    http: reqwest::Client,
    endpoint: String,
}

impl InfoClient {
    /// Create a new client with a per-request timeout
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        info!(endpoint = %endpoint, timeout_secs = timeout.as_secs(), "Info client ready");

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    /// Exchange metadata (the coin universe), used by the debug probe
    pub async fn meta(&self) -> Result<Value> {
        self.query(json!({ "type": "meta" })).await
    }

    async fn query(&self, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        debug!(
            request = %body["type"],
            preview = %preview(&text),
            "Info response"
        );

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ExchangeInfo for InfoClient {
    async fn open_orders(&self, user: &str) -> Result<Vec<Value>> {
        let data = self
            .query(json!({ "type": "openOrders", "user": user }))
            .await?;
        parse_open_orders(data)
    }

    async fn all_mids(&self) -> Result<HashMap<String, String>> {
        let data = self.query(json!({ "type": "allMids" })).await?;
        parse_mids(data)
    }
}

fn parse_open_orders(data: Value) -> Result<Vec<Value>> {
    match data {
        Value::Array(orders) => Ok(orders),
        other => Err(TrackerError::UnexpectedResponse(format!(
            "openOrders returned {}",
            kind(&other)
        ))),
    }
}

/// Keeps string and numeric mids; anything else is dropped
fn parse_mids(data: Value) -> Result<HashMap<String, String>> {
    let Value::Object(map) = data else {
        return Err(TrackerError::UnexpectedResponse(format!(
            "allMids returned {}",
            kind(&data)
        )));
    };

    Ok(map
        .into_iter()
        .filter_map(|(coin, mid)| match mid {
            Value::String(s) => Some((coin, s)),
            Value::Number(n) => Some((coin, n.to_string())),
            _ => None,
        })
        .collect())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
