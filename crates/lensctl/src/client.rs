//! HTTP client for the lensd daemon.

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::time::Duration;

/// Generous ceiling: extraction and panels run several inference calls.
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct DaemonClient {
    base_url: String,
    user: Option<String>,
    client: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: &str, user: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        self.send(request).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body);
        self.send(request).await
    }

    async fn send(&self, mut request: reqwest::RequestBuilder) -> Result<Value> {
        if let Some(user) = &self.user {
            request = request.header("x-lens-user", user);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                anyhow!("Daemon not reachable at {}. Is lensd running?", self.base_url)
            } else {
                anyhow!("Request failed: {}", e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(anyhow!("Daemon returned {}: {}", status, body.trim()));
        }

        serde_json::from_str(&body).map_err(|e| anyhow!("Invalid response from daemon: {}", e))
    }
}
