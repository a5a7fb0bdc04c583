//! Multi-persona panel orchestrator.
//!
//! Fans one question out to 2-5 personas concurrently, then synthesizes a
//! consensus analysis over the individual replies. Panel latency approximates
//! the slowest single persona call, not the sum. Results are collected by
//! input index so `individual[i]` always corresponds to `personas[i]`.

use crate::chat::PersonaChat;
use crate::error::LensError;
use crate::gateway::{parse_json, InferenceClient, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::persona::{
    AgreementLevel, ConfidenceLabel, ConsensusResult, Insight, PersonaProfile,
};
use crate::prompts::build_consensus_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Minimum personas on a panel. Consensus over a singleton is meaningless.
pub const MIN_PANEL_PERSONAS: usize = 2;

/// Maximum personas on a panel.
pub const MAX_PANEL_PERSONAS: usize = 5;

/// One persona's contribution to a panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelReply {
    pub persona_id: Uuid,
    pub persona_name: String,
    pub response: String,
    pub confidence: ConfidenceLabel,
    pub explanation: String,
}

/// Full panel outcome: the individual replies in input order plus the
/// consensus analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelResult {
    pub individual: Vec<PanelReply>,
    pub consensus: ConsensusResult,
}

/// Wire shape of the consensus reply: the analysis nested under `consensus`
/// with `insights` alongside.
#[derive(Debug, Deserialize)]
struct RawConsensus {
    consensus: RawConsensusInner,
    #[serde(default)]
    insights: Vec<Insight>,
}

#[derive(Debug, Deserialize)]
struct RawConsensusInner {
    agreement_level: AgreementLevel,
    #[serde(default)]
    common_themes: Vec<String>,
    #[serde(default)]
    key_differences: Vec<String>,
    #[serde(default)]
    summary: String,
}

/// Orchestrates panel queries.
#[derive(Clone)]
pub struct PersonaPanel {
    client: Arc<dyn InferenceClient>,
    chat: PersonaChat,
}

impl PersonaPanel {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self {
            chat: PersonaChat::new(client.clone()),
            client,
        }
    }

    /// Ask every persona the same question, then analyze consensus.
    ///
    /// Validates the persona count before any gateway call. One failed
    /// persona chat fails the whole panel; a malformed consensus reply
    /// degrades to a moderate-agreement wrapper around the raw text.
    pub async fn query(
        &self,
        personas: &[PersonaProfile],
        question: &str,
    ) -> Result<PanelResult, LensError> {
        let count = personas.len();
        if !(MIN_PANEL_PERSONAS..=MAX_PANEL_PERSONAS).contains(&count) {
            return Err(LensError::InvalidPersonaCount(count));
        }

        // Concurrent fan-out, no shared history between personas.
        let mut handles = Vec::with_capacity(count);
        for persona in personas {
            let chat = self.chat.clone();
            let persona = persona.clone();
            let question = question.to_string();
            handles.push(tokio::spawn(async move {
                let reply = chat.chat(&persona, &question, &[]).await?;
                Ok::<PanelReply, LensError>(PanelReply {
                    persona_id: persona.id,
                    persona_name: persona.display_name().to_string(),
                    response: reply.response,
                    confidence: reply.confidence,
                    explanation: reply.explanation,
                })
            }));
        }

        // Join in input order so positional correspondence holds downstream.
        let mut individual = Vec::with_capacity(count);
        for handle in handles {
            let reply = handle
                .await
                .map_err(|e| LensError::Internal(format!("Panel task failed: {}", e)))??;
            individual.push(reply);
        }

        let pairs: Vec<(String, String)> = individual
            .iter()
            .map(|r| (r.persona_name.clone(), r.response.clone()))
            .collect();
        let system = build_consensus_prompt(&pairs);
        let user = format!(
            "Analyze the consensus across these {} personas for the question: \"{}\"",
            count, question
        );

        let raw = self
            .client
            .complete(&system, &[], &user, DEFAULT_MAX_OUTPUT_TOKENS)
            .await?;

        let consensus = match parse_json::<RawConsensus>(&raw) {
            Ok(parsed) => ConsensusResult {
                agreement_level: parsed.consensus.agreement_level,
                common_themes: parsed.consensus.common_themes,
                key_differences: parsed.consensus.key_differences,
                summary: parsed.consensus.summary,
                insights: parsed.insights,
            },
            Err(e) => {
                debug!("[PANEL]  Consensus was not JSON, degrading: {}", e);
                ConsensusResult {
                    agreement_level: AgreementLevel::Moderate,
                    common_themes: Vec::new(),
                    key_differences: Vec::new(),
                    summary: raw,
                    insights: Vec::new(),
                }
            }
        };

        Ok(PanelResult {
            individual,
            consensus,
        })
    }
}
