//! Persona extraction orchestrator.
//!
//! Turns ordered interview answers into a structured persona. One retry with
//! an identical request on failure; a second failure is a hard error, because
//! a persona cannot be synthesized from a degraded default.

use crate::error::LensError;
use crate::gateway::{parse_json, InferenceClient, InferenceError, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::persona::{ConfidenceScores, PersonaAttributes, QuestionAnswer};
use crate::prompts::{format_responses, EXTRACTION_SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Structured output of a successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub narrative: String,
    pub attributes: PersonaAttributes,
    #[serde(rename = "confidence_scores")]
    pub confidence: ConfidenceScores,
}

/// Orchestrates the extraction call against the inference gateway.
#[derive(Clone)]
pub struct PersonaExtractor {
    client: Arc<dyn InferenceClient>,
}

impl PersonaExtractor {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Extract a persona from interview answers.
    ///
    /// Fails with `NoInputData` before any gateway call when `responses` is
    /// empty. Retries exactly once on transport or parse failure; never a
    /// third call.
    pub async fn extract(
        &self,
        responses: &[QuestionAnswer],
    ) -> Result<ExtractionResult, LensError> {
        if responses.is_empty() {
            return Err(LensError::NoInputData);
        }

        let user = format!(
            "Please analyze these interview responses and generate a structured persona profile:\n\n{}",
            format_responses(responses)
        );

        match self.attempt(&user).await {
            Ok(result) => Ok(result),
            Err(first) => {
                warn!("[EXTRACT]  First attempt failed, retrying once: {}", first);
                self.attempt(&user)
                    .await
                    .map_err(|second| LensError::ExtractionFailed(second.to_string()))
            }
        }
    }

    async fn attempt(&self, user: &str) -> Result<ExtractionResult, InferenceError> {
        let raw = self
            .client
            .complete(EXTRACTION_SYSTEM_PROMPT, &[], user, DEFAULT_MAX_OUTPUT_TOKENS)
            .await?;
        parse_json::<ExtractionResult>(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeInferenceClient;

    #[tokio::test]
    async fn empty_input_fails_before_any_call() {
        let fake = Arc::new(FakeInferenceClient::always_text("{}"));
        let extractor = PersonaExtractor::new(fake.clone());

        let err = extractor.extract(&[]).await.unwrap_err();
        assert!(matches!(err, LensError::NoInputData));
        assert_eq!(fake.call_count(), 0);
    }
}
