//! Single-persona chat orchestrator.
//!
//! One gateway call per message. Transport errors propagate; malformed model
//! output degrades to the raw text so the user always gets a usable reply.

use crate::error::LensError;
use crate::gateway::{parse_json, InferenceClient, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::persona::{ChatTurn, ConfidenceLabel, PersonaProfile};
use crate::prompts::build_chat_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Explanation attached to degraded replies.
pub const DEGRADED_EXPLANATION: &str = "Response generated from persona profile";

/// A persona's reply to one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub confidence: ConfidenceLabel,
    pub explanation: String,
}

/// Wire shape of a well-formed model reply. Confidence arrives as free text
/// and is validated separately, fail-closed to medium.
#[derive(Debug, Deserialize)]
struct RawChatReply {
    response: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Orchestrates chat calls against the inference gateway.
#[derive(Clone)]
pub struct PersonaChat {
    client: Arc<dyn InferenceClient>,
}

impl PersonaChat {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Chat with one persona.
    ///
    /// `history` is passed through unmodified, oldest first; capping is the
    /// caller's business. Never fails on a format violation: a reply that
    /// is not the documented JSON shape is returned as-is with medium
    /// confidence.
    pub async fn chat(
        &self,
        persona: &PersonaProfile,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<ChatReply, LensError> {
        let system = build_chat_prompt(persona);
        let raw = self
            .client
            .complete(&system, history, message, DEFAULT_MAX_OUTPUT_TOKENS)
            .await?;

        match parse_json::<RawChatReply>(&raw) {
            Ok(parsed) => Ok(ChatReply {
                response: parsed.response,
                confidence: parsed
                    .confidence
                    .map(|c| ConfidenceLabel::parse_lenient(&c))
                    .unwrap_or(ConfidenceLabel::Medium),
                explanation: parsed
                    .explanation
                    .unwrap_or_else(|| DEGRADED_EXPLANATION.to_string()),
            }),
            Err(e) => {
                debug!("[CHAT]  Reply was not JSON, degrading to raw text: {}", e);
                Ok(ChatReply {
                    response: raw,
                    confidence: ConfidenceLabel::Medium,
                    explanation: DEGRADED_EXPLANATION.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeInferenceClient;
    use crate::persona::{ConfidenceScores, PersonaAttributes};

    fn persona() -> PersonaProfile {
        PersonaProfile::new(
            None,
            "A test persona.".to_string(),
            PersonaAttributes::default(),
            ConfidenceScores::default(),
            true,
        )
    }

    #[tokio::test]
    async fn well_formed_reply_is_returned_verbatim() {
        let fake = Arc::new(FakeInferenceClient::always_text(
            r#"{"response": "I'd pick the train.", "confidence": "high", "explanation": "Grounded in values"}"#,
        ));
        let chat = PersonaChat::new(fake);

        let reply = chat.chat(&persona(), "Train or plane?", &[]).await.unwrap();
        assert_eq!(reply.response, "I'd pick the train.");
        assert_eq!(reply.confidence, ConfidenceLabel::High);
        assert_eq!(reply.explanation, "Grounded in values");
    }

    #[tokio::test]
    async fn unrecognized_confidence_clamps_to_medium() {
        let fake = Arc::new(FakeInferenceClient::always_text(
            r#"{"response": "Sure.", "confidence": "absolutely certain", "explanation": "x"}"#,
        ));
        let chat = PersonaChat::new(fake);

        let reply = chat.chat(&persona(), "Ok?", &[]).await.unwrap();
        assert_eq!(reply.confidence, ConfidenceLabel::Medium);
    }
}
