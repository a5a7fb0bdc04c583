//! Inference gateway.
//!
//! The only component that talks to the external LLM service. Wraps request
//! construction, response-shape validation, and tolerant JSON extraction from
//! model output. Retry policy lives with the orchestrators, never here.
//!
//! Production code uses `HttpInferenceClient` against the Anthropic Messages
//! API. Test code uses `FakeInferenceClient` with scripted responses.

use crate::persona::ChatTurn;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

/// Default inference service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// Default model for all Lens operations.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Default output token bound, sized for JSON-shaped replies.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Default request timeout (secs).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Messages API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Inference service configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Inference errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Inference service returned a non-text content block")]
    UnexpectedResponseKind,

    #[error("Inference service returned an empty response")]
    EmptyResponse,

    #[error("Model output is not valid JSON: {0}")]
    ParseFailure(String),
}

/// Generic inference client trait.
///
/// `history` is the prior conversation, oldest first; `user` is the new
/// user-facing prompt; `max_tokens` bounds the output size per request.
/// Returns the raw text of the model's single top-level response.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        history: &[ChatTurn],
        user: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError>;
}

/// Strip markdown code fences and parse the remainder as JSON.
///
/// Models reliably emit only two fence variants, ```json and plain ```,
/// so exactly those are handled. On parse failure the caller decides the
/// fallback behavior.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, InferenceError> {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    serde_json::from_str(cleaned.trim()).map_err(|e| InferenceError::ParseFailure(e.to_string()))
}

/// Tolerant parse straight into a typed value.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, InferenceError> {
    serde_json::from_value(extract_json(raw)?)
        .map_err(|e| InferenceError::ParseFailure(e.to_string()))
}

// ============================================================================
// HTTP client (production)
// ============================================================================

/// Real inference client for the Anthropic Messages API.
pub struct HttpInferenceClient {
    config: InferenceConfig,
    client: reqwest::Client,
}

impl HttpInferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn complete(
        &self,
        system: &str,
        history: &[ChatTurn],
        user: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError> {
        let mut messages: Vec<serde_json::Value> = history
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect();
        messages.push(serde_json::json!({ "role": "user", "content": user }));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "messages": messages,
        });
        if !system.is_empty() {
            body["system"] = serde_json::json!(system);
        }

        let url = format!("{}/v1/messages", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.config.timeout_secs)
                } else {
                    InferenceError::Http(format!("Request failed: {}", e))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(InferenceError::Auth(format!("Status {}: {}", status, body)));
            }
            return Err(InferenceError::Http(format!("Status {}: {}", status, body)));
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| InferenceError::Http(format!("Failed to parse response: {}", e)))?;

        let block = parsed.content.first().ok_or(InferenceError::EmptyResponse)?;
        if block.kind != "text" {
            return Err(InferenceError::UnexpectedResponseKind);
        }
        if block.text.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        Ok(block.text.clone())
    }
}

// ============================================================================
// Fake client (testing)
// ============================================================================

/// One scripted reply for the fake client.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub delay_ms: u64,
    pub result: Result<String, InferenceError>,
}

impl ScriptedResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            result: Ok(text.into()),
        }
    }

    pub fn error(err: InferenceError) -> Self {
        Self {
            delay_ms: 0,
            result: Err(err),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Fake inference client with pre-scripted responses.
///
/// Responses are consumed in call order; a single remaining entry is returned
/// repeatedly. Each call can carry a delay so concurrency behavior is
/// observable in tests.
pub struct FakeInferenceClient {
    script: Mutex<Vec<ScriptedResponse>>,
    calls: Mutex<usize>,
}

impl FakeInferenceClient {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(0),
        }
    }

    /// Fake that always returns the same text.
    pub fn always_text(text: impl Into<String>) -> Self {
        Self::new(vec![ScriptedResponse::text(text)])
    }

    /// Fake that always returns the same error.
    pub fn always_error(err: InferenceError) -> Self {
        Self::new(vec![ScriptedResponse::error(err)])
    }

    /// Number of completed calls so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn next_scripted(&self) -> ScriptedResponse {
        let mut count = self.calls.lock().unwrap();
        *count += 1;

        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            ScriptedResponse::error(InferenceError::EmptyResponse)
        } else if script.len() == 1 {
            script[0].clone()
        } else {
            script.remove(0)
        }
    }
}

#[async_trait]
impl InferenceClient for FakeInferenceClient {
    async fn complete(
        &self,
        _system: &str,
        _history: &[ChatTurn],
        _user: &str,
        _max_tokens: u32,
    ) -> Result<String, InferenceError> {
        let scripted = self.next_scripted();
        if scripted.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(scripted.delay_ms)).await;
        }
        scripted.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_handles_plain_json() {
        let value = extract_json(r#"{"score": 7}"#).unwrap();
        assert_eq!(value["score"], 7);
    }

    #[test]
    fn extract_json_strips_json_fence() {
        let raw = "```json\n{\"score\": 7}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["score"], 7);
    }

    #[test]
    fn extract_json_strips_bare_fence() {
        let raw = "```\n{\"ok\": true}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn extract_json_signals_parse_failure() {
        let err = extract_json("I think it's great!").unwrap_err();
        assert!(matches!(err, InferenceError::ParseFailure(_)));
    }

    #[tokio::test]
    async fn fake_client_consumes_script_in_order() {
        let client = FakeInferenceClient::new(vec![
            ScriptedResponse::error(InferenceError::Timeout(60)),
            ScriptedResponse::text("second"),
        ]);

        let first = client.complete("s", &[], "u", 256).await;
        assert!(matches!(first, Err(InferenceError::Timeout(_))));

        let second = client.complete("s", &[], "u", 256).await.unwrap();
        assert_eq!(second, "second");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn fake_client_repeats_last_response() {
        let client = FakeInferenceClient::always_text("again");
        for _ in 0..3 {
            assert_eq!(client.complete("s", &[], "u", 256).await.unwrap(), "again");
        }
        assert_eq!(client.call_count(), 3);
    }
}
