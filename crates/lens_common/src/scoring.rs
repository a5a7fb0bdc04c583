//! Answer quality scorer.
//!
//! Scores a single interview answer 1-10 via the inference gateway, with a
//! deterministic word-count heuristic when inference is unavailable. Once an
//! answer text exists this component never fails outward.

use crate::error::LensError;
use crate::gateway::{parse_json, InferenceClient};
use crate::prompts::build_scoring_prompt;
use crate::questions::question_by_index;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Scores are always out of 10.
pub const MAX_SCORE: u8 = 10;

/// Output bound for the rubric call. A score and one sentence of feedback.
pub const SCORING_MAX_OUTPUT_TOKENS: u32 = 200;

/// Feedback attached when the rubric reply decoded but carried no feedback.
const DEFAULT_FEEDBACK: &str = "Answer recorded";

/// Feedback attached to heuristic scores.
const LOCAL_FEEDBACK: &str = "Scored locally";

/// Result of scoring one answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub max_score: u8,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    score: serde_json::Value,
    #[serde(default)]
    feedback: Option<String>,
}

/// Deterministic word-count fallback. Buckets are deliberately generous to
/// short-but-real answers.
pub fn heuristic_score(answer: &str) -> u8 {
    let words = answer.split_whitespace().count();
    if words < 3 {
        2
    } else if words < 8 {
        4
    } else if words < 20 {
        6
    } else if words < 40 {
        7
    } else {
        8
    }
}

/// Scores answers against the rubric, falling back to the heuristic.
#[derive(Clone)]
pub struct AnswerScorer {
    client: Arc<dyn InferenceClient>,
}

impl AnswerScorer {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    /// Score one answer to the question at `question_index` (0-based).
    ///
    /// An out-of-range index fails before any gateway call. Everything else
    /// resolves to a usable score: rubric result clamped into [1,10], or the
    /// word-count heuristic when the gateway errors or its output cannot be
    /// decoded.
    pub async fn score(
        &self,
        question_index: usize,
        answer: &str,
    ) -> Result<ScoreResult, LensError> {
        let question = question_by_index(question_index)
            .ok_or(LensError::InvalidQuestionIndex(question_index))?;

        let prompt = build_scoring_prompt(question.question, answer);
        match self
            .client
            .complete("", &[], &prompt, SCORING_MAX_OUTPUT_TOKENS)
            .await
        {
            Ok(raw) => match parse_json::<RawScore>(&raw).ok().and_then(|r| {
                decode_score(&r.score).map(|score| (score, r.feedback))
            }) {
                Some((score, feedback)) => Ok(ScoreResult {
                    score,
                    max_score: MAX_SCORE,
                    feedback: feedback.unwrap_or_else(|| DEFAULT_FEEDBACK.to_string()),
                }),
                None => Ok(self.local(answer)),
            },
            Err(e) => {
                warn!("[SCORE]  Inference failed, scoring locally: {}", e);
                Ok(self.local(answer))
            }
        }
    }

    /// The offline path, also used when the caller explicitly wants a local
    /// score.
    pub fn local(&self, answer: &str) -> ScoreResult {
        ScoreResult {
            score: heuristic_score(answer),
            max_score: MAX_SCORE,
            feedback: LOCAL_FEEDBACK.to_string(),
        }
    }
}

/// Decode a model-emitted score value (number or numeric string), rounded to
/// the nearest integer and clamped into [1,10].
fn decode_score(value: &serde_json::Value) -> Option<u8> {
    let n = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(1.0, 10.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_bucket_boundaries() {
        assert_eq!(heuristic_score(""), 2);
        assert_eq!(heuristic_score("one two"), 2);
        assert_eq!(heuristic_score("one two three"), 4);
        assert_eq!(heuristic_score(&"w ".repeat(7)), 4);
        assert_eq!(heuristic_score(&"w ".repeat(8)), 6);
        assert_eq!(heuristic_score(&"w ".repeat(19)), 6);
        assert_eq!(heuristic_score(&"w ".repeat(20)), 7);
        assert_eq!(heuristic_score(&"w ".repeat(39)), 7);
        assert_eq!(heuristic_score(&"w ".repeat(40)), 8);
    }

    #[test]
    fn decode_score_clamps_and_rounds() {
        assert_eq!(decode_score(&serde_json::json!(14)), Some(10));
        assert_eq!(decode_score(&serde_json::json!(-3)), Some(1));
        assert_eq!(decode_score(&serde_json::json!(6.6)), Some(7));
        assert_eq!(decode_score(&serde_json::json!("8")), Some(8));
        assert_eq!(decode_score(&serde_json::json!("not a score")), None);
        assert_eq!(decode_score(&serde_json::json!(null)), None);
    }
}
