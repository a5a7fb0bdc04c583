//! Core persona types.
//!
//! A persona is a structured profile synthesized from a contributor's
//! interview answers: a narrative, an attribute record, and per-category
//! confidence scores. Absent attribute fields mean "no evidence", not
//! "empty by construction": extraction only emits what the answers support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One interview answer, keyed by its 1-based question number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question_number: u32,
    pub question_text: String,
    pub response_text: String,
}

/// Demographic category labels. All free text: these are evidence-backed
/// descriptions, not a controlled vocabulary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household: Option<String>,
}

/// Brand and preference signals mentioned in the interview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasteSignals {
    #[serde(default)]
    pub brands_mentioned: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
}

/// The structured attribute record of a persona.
///
/// `decision_style` and `communication_style` are advisory labels
/// (analytical/emotional/social/practical and direct/warm/reserved/expressive
/// respectively) but are not strictly enforced; the model occasionally emits
/// variants and that is acceptable evidence. Unanticipated categories land in
/// `extra` so they round-trip through storage untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub behavioral_patterns: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub life_context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste_signals: Option<TasteSignals>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Per-category confidence in [0,1].
///
/// Each score reflects evidentiary strength for its own category only.
/// `overall` is a holistic judgment by the extractor, not a formula over
/// the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceScores {
    #[serde(default)]
    pub demographics: f64,
    #[serde(default)]
    pub values: f64,
    #[serde(default)]
    pub behavioral: f64,
    #[serde(default)]
    pub interests: f64,
    #[serde(default)]
    pub life_context: f64,
    #[serde(default)]
    pub overall: f64,
}

/// A stored persona profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: Uuid,
    /// Identity of the contributor/owner, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub narrative: String,
    pub attributes: PersonaAttributes,
    pub confidence: ConfidenceScores,
    pub published: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonaProfile {
    /// Build a fresh profile from an extraction result. Version starts at 1
    /// and stays there; edits touch `updated_at` only.
    pub fn new(
        owner: Option<String>,
        narrative: String,
        attributes: PersonaAttributes,
        confidence: ConfidenceScores,
        published: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            narrative,
            attributes,
            confidence,
            published,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-facing name: the extracted display name, falling back to the
    /// life stage, falling back to a generic label.
    pub fn display_name(&self) -> &str {
        if let Some(name) = &self.attributes.display_name {
            return name;
        }
        if let Some(demo) = &self.attributes.demographics {
            if let Some(stage) = &demo.life_stage {
                return stage;
            }
        }
        "Persona"
    }
}

/// Role of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One turn of a persona conversation, oldest first in history lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            confidence: None,
            explanation: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            confidence: None,
            explanation: None,
        }
    }
}

/// Self-reported confidence of a persona reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

impl ConfidenceLabel {
    /// Parse a model-emitted label, failing closed to `Medium` for anything
    /// outside the three allowed literals.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => ConfidenceLabel::High,
            "low" => ConfidenceLabel::Low,
            _ => ConfidenceLabel::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLabel::High => "high",
            ConfidenceLabel::Medium => "medium",
            ConfidenceLabel::Low => "low",
        }
    }
}

/// How strongly a panel of personas agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementLevel {
    Strong,
    Moderate,
    Weak,
    None,
}

impl AgreementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementLevel::Strong => "strong",
            AgreementLevel::Moderate => "moderate",
            AgreementLevel::Weak => "weak",
            AgreementLevel::None => "none",
        }
    }
}

/// An actionable insight distilled from a panel, with the persona names that
/// support it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub insight: String,
    #[serde(default)]
    pub supported_by: Vec<String>,
    pub confidence: ConfidenceLabel,
}

/// Consensus analysis across a panel's individual replies. Derived per query,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub agreement_level: AgreementLevel,
    pub common_themes: Vec<String>,
    pub key_differences: Vec<String>,
    pub summary: String,
    pub insights: Vec<Insight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_label_fails_closed_to_medium() {
        assert_eq!(ConfidenceLabel::parse_lenient("high"), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::parse_lenient("LOW"), ConfidenceLabel::Low);
        assert_eq!(
            ConfidenceLabel::parse_lenient("very confident"),
            ConfidenceLabel::Medium
        );
        assert_eq!(ConfidenceLabel::parse_lenient(""), ConfidenceLabel::Medium);
    }

    #[test]
    fn display_name_falls_back_through_life_stage() {
        let mut profile = PersonaProfile::new(
            None,
            "A narrative".to_string(),
            PersonaAttributes::default(),
            ConfidenceScores::default(),
            true,
        );
        assert_eq!(profile.display_name(), "Persona");

        profile.attributes.demographics = Some(Demographics {
            life_stage: Some("young professional".to_string()),
            ..Default::default()
        });
        assert_eq!(profile.display_name(), "young professional");

        profile.attributes.display_name = Some("Impact-Driven MBA Student".to_string());
        assert_eq!(profile.display_name(), "Impact-Driven MBA Student");
    }

    #[test]
    fn attributes_round_trip_unknown_fields() {
        let raw = serde_json::json!({
            "display_name": "Detail-Oriented UX Designer",
            "values": ["sustainability"],
            "media_diet": ["podcasts", "newsletters"]
        });
        let attrs: PersonaAttributes = serde_json::from_value(raw).unwrap();
        assert_eq!(attrs.values, vec!["sustainability"]);
        assert!(attrs.extra.contains_key("media_diet"));

        let back = serde_json::to_value(&attrs).unwrap();
        assert_eq!(back["media_diet"][0], "podcasts");
    }

    #[test]
    fn missing_confidence_categories_default_to_zero() {
        let scores: ConfidenceScores =
            serde_json::from_str(r#"{"values": 0.9, "overall": 0.7}"#).unwrap();
        assert_eq!(scores.values, 0.9);
        assert_eq!(scores.demographics, 0.0);
        assert_eq!(scores.overall, 0.7);
    }
}
