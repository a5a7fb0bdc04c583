//! Answer scorer behavior: clamping, heuristic fallback, and the
//! never-fail-outward contract.

use lens_common::gateway::{FakeInferenceClient, InferenceError};
use lens_common::{AnswerScorer, LensError, MAX_SCORE};
use std::sync::Arc;

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// P6: under forced gateway failure the word-count heuristic kicks in with
/// the documented bucket boundaries.
#[tokio::test]
async fn heuristic_buckets_under_gateway_failure() {
    let fake = Arc::new(FakeInferenceClient::always_error(InferenceError::Http(
        "down".to_string(),
    )));
    let scorer = AnswerScorer::new(fake);

    for (word_count, expected) in [(2usize, 2u8), (5, 4), (15, 6), (30, 7), (60, 8)] {
        let result = scorer.score(0, &words(word_count)).await.unwrap();
        assert_eq!(
            result.score, expected,
            "{} words should score {}",
            word_count, expected
        );
        assert_eq!(result.max_score, MAX_SCORE);
    }
}

/// P7: out-of-range model scores clamp into [1,10].
#[tokio::test]
async fn model_scores_are_clamped() {
    let high = Arc::new(FakeInferenceClient::always_text(
        r#"{"score": 14, "feedback": "x"}"#,
    ));
    let result = AnswerScorer::new(high).score(0, "an answer").await.unwrap();
    assert_eq!(result.score, 10);
    assert_eq!(result.feedback, "x");

    let low = Arc::new(FakeInferenceClient::always_text(r#"{"score": -3}"#));
    let result = AnswerScorer::new(low).score(0, "an answer").await.unwrap();
    assert_eq!(result.score, 1);
    assert_eq!(result.feedback, "Answer recorded");
}

#[tokio::test]
async fn fractional_scores_round_to_nearest() {
    let fake = Arc::new(FakeInferenceClient::always_text(
        r#"{"score": 6.6, "feedback": "solid"}"#,
    ));
    let result = AnswerScorer::new(fake).score(3, "an answer").await.unwrap();
    assert_eq!(result.score, 7);
}

/// Undecodable rubric output falls through to the heuristic instead of
/// failing the request.
#[tokio::test]
async fn undecodable_reply_falls_back_to_heuristic() {
    let fake = Arc::new(FakeInferenceClient::always_text(
        "That's a nice answer, maybe a 7?",
    ));
    let scorer = AnswerScorer::new(fake);

    let result = scorer.score(0, &words(15)).await.unwrap();
    assert_eq!(result.score, 6);
    assert_eq!(result.feedback, "Scored locally");
}

#[tokio::test]
async fn out_of_range_question_index_rejected_before_gateway() {
    let fake = Arc::new(FakeInferenceClient::always_text(r#"{"score": 7}"#));
    let scorer = AnswerScorer::new(fake.clone());

    let err = scorer.score(9, "an answer").await.unwrap_err();
    assert!(matches!(err, LensError::InvalidQuestionIndex(9)));
    assert_eq!(fake.call_count(), 0);
}
