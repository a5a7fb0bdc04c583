//! Chat orchestrator behavior: prompt purity and graceful degradation.

use lens_common::gateway::{FakeInferenceClient, InferenceError};
use lens_common::prompts::build_chat_prompt;
use lens_common::{
    ChatTurn, ConfidenceLabel, ConfidenceScores, LensError, PersonaAttributes, PersonaChat,
    PersonaProfile, DEGRADED_EXPLANATION,
};
use std::sync::Arc;

fn persona() -> PersonaProfile {
    PersonaProfile::new(
        None,
        "Marcus runs a logistics company in Atlanta.".to_string(),
        PersonaAttributes {
            display_name: Some("Practical-Minded Foreman".to_string()),
            values: vec!["hard work".to_string(), "family".to_string()],
            decision_style: Some("practical".to_string()),
            ..Default::default()
        },
        ConfidenceScores::default(),
        true,
    )
}

/// P1: building the chat instruction twice yields byte-identical output.
#[test]
fn chat_prompt_is_idempotent() {
    let p = persona();
    let first = build_chat_prompt(&p);
    let second = build_chat_prompt(&p);
    assert_eq!(first, second);
}

/// A non-JSON reply never throws; it becomes the answer with medium
/// confidence and the stock explanation.
#[tokio::test]
async fn non_json_reply_degrades_to_raw_text() {
    let fake = Arc::new(FakeInferenceClient::always_text("I think it's great!"));
    let chat = PersonaChat::new(fake.clone());

    let reply = chat
        .chat(&persona(), "What do you think of the product?", &[])
        .await
        .unwrap();

    assert_eq!(reply.response, "I think it's great!");
    assert_eq!(reply.confidence, ConfidenceLabel::Medium);
    assert_eq!(reply.explanation, DEGRADED_EXPLANATION);
    // Degrade, don't retry.
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn well_formed_reply_passes_through() {
    let fake = Arc::new(FakeInferenceClient::always_text(
        r#"{"response": "Show me the ROI first.", "confidence": "high", "explanation": "Practical decision style"}"#,
    ));
    let chat = PersonaChat::new(fake);

    let reply = chat.chat(&persona(), "Would you buy it?", &[]).await.unwrap();
    assert_eq!(reply.response, "Show me the ROI first.");
    assert_eq!(reply.confidence, ConfidenceLabel::High);
    assert_eq!(reply.explanation, "Practical decision style");
}

/// Transport errors are not degraded; they propagate to the caller.
#[tokio::test]
async fn transport_error_propagates() {
    let fake = Arc::new(FakeInferenceClient::always_error(InferenceError::Http(
        "service unavailable".to_string(),
    )));
    let chat = PersonaChat::new(fake);

    let err = chat.chat(&persona(), "Hello?", &[]).await.unwrap_err();
    assert!(matches!(err, LensError::Inference(InferenceError::Http(_))));
}

/// History is accepted as-is; the orchestrator imposes no cap of its own.
#[tokio::test]
async fn long_history_is_passed_through() {
    let fake = Arc::new(FakeInferenceClient::always_text(
        r#"{"response": "Still here.", "confidence": "low", "explanation": "thin data"}"#,
    ));
    let chat = PersonaChat::new(fake);

    let history: Vec<ChatTurn> = (0..50)
        .flat_map(|i| {
            [
                ChatTurn::user(format!("question {}", i)),
                ChatTurn::assistant(format!("answer {}", i)),
            ]
        })
        .collect();

    let reply = chat
        .chat(&persona(), "One more thing?", &history)
        .await
        .unwrap();
    assert_eq!(reply.confidence, ConfidenceLabel::Low);
}
