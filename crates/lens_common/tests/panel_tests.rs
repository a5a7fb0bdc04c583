//! Panel orchestrator behavior: count precondition, concurrency, ordering,
//! and consensus degradation.

use lens_common::gateway::{FakeInferenceClient, ScriptedResponse};
use lens_common::{
    AgreementLevel, ConfidenceScores, LensError, PersonaAttributes, PersonaPanel, PersonaProfile,
};
use std::sync::Arc;
use std::time::Instant;

fn named_persona(name: &str) -> PersonaProfile {
    PersonaProfile::new(
        None,
        format!("{} is a panel member.", name),
        PersonaAttributes {
            display_name: Some(name.to_string()),
            ..Default::default()
        },
        ConfidenceScores::default(),
        true,
    )
}

fn chat_reply(text: &str) -> String {
    format!(
        r#"{{"response": "{}", "confidence": "medium", "explanation": "panel"}}"#,
        text
    )
}

const GOOD_CONSENSUS: &str = r#"{
    "consensus": {
        "agreement_level": "strong",
        "common_themes": ["value for money"],
        "key_differences": ["risk appetite"],
        "summary": "Broad agreement with one holdout."
    },
    "insights": [
        {"insight": "Price is the main driver", "supported_by": ["A", "B"], "confidence": "high"}
    ]
}"#;

/// P8: singleton and oversized panels are rejected before any gateway call.
#[tokio::test]
async fn persona_count_validated_before_any_call() {
    let fake = Arc::new(FakeInferenceClient::always_text(GOOD_CONSENSUS));
    let panel = PersonaPanel::new(fake.clone());

    let one = vec![named_persona("A")];
    let err = panel.query(&one, "Thoughts?").await.unwrap_err();
    assert!(matches!(err, LensError::InvalidPersonaCount(1)));

    let six: Vec<PersonaProfile> = ["A", "B", "C", "D", "E", "F"]
        .iter()
        .map(|n| named_persona(n))
        .collect();
    let err = panel.query(&six, "Thoughts?").await.unwrap_err();
    assert!(matches!(err, LensError::InvalidPersonaCount(6)));

    assert_eq!(fake.call_count(), 0);
}

/// P4: three personas with 300ms/10ms/100ms underlying calls complete in
/// roughly the slowest call's time, and individual results keep input order
/// regardless of completion order.
#[tokio::test]
async fn fan_out_is_concurrent_and_order_preserving() {
    let personas = vec![
        named_persona("A"),
        named_persona("B"),
        named_persona("C"),
    ];

    let fake = Arc::new(FakeInferenceClient::new(vec![
        ScriptedResponse::text(chat_reply("reply from A")).with_delay(300),
        ScriptedResponse::text(chat_reply("reply from B")).with_delay(10),
        ScriptedResponse::text(chat_reply("reply from C")).with_delay(100),
        ScriptedResponse::text(GOOD_CONSENSUS),
    ]));
    let panel = PersonaPanel::new(fake.clone());

    let start = Instant::now();
    let result = panel.query(&personas, "Train or plane?").await.unwrap();
    let elapsed = start.elapsed();

    // Serialized, the three chat calls alone would take ~410ms.
    assert!(
        elapsed.as_millis() < 410,
        "panel took {:?}, fan-out appears serialized",
        elapsed
    );

    assert_eq!(result.individual.len(), 3);
    assert_eq!(result.individual[0].persona_id, personas[0].id);
    assert_eq!(result.individual[1].persona_id, personas[1].id);
    assert_eq!(result.individual[2].persona_id, personas[2].id);
    assert_eq!(result.individual[0].response, "reply from A");
    assert_eq!(result.individual[1].response, "reply from B");
    assert_eq!(result.individual[2].response, "reply from C");

    // Three chat calls plus one consensus call.
    assert_eq!(fake.call_count(), 4);
}

#[tokio::test]
async fn well_formed_consensus_is_parsed() {
    let personas = vec![named_persona("A"), named_persona("B")];
    let fake = Arc::new(FakeInferenceClient::new(vec![
        ScriptedResponse::text(chat_reply("yes")),
        ScriptedResponse::text(chat_reply("no")),
        ScriptedResponse::text(GOOD_CONSENSUS),
    ]));
    let panel = PersonaPanel::new(fake);

    let result = panel.query(&personas, "Buy it?").await.unwrap();
    assert_eq!(result.consensus.agreement_level, AgreementLevel::Strong);
    assert_eq!(result.consensus.common_themes, vec!["value for money"]);
    assert_eq!(result.consensus.insights.len(), 1);
    assert_eq!(result.consensus.insights[0].supported_by, vec!["A", "B"]);
}

/// P5: a non-JSON consensus reply degrades to moderate agreement wrapping the
/// raw text, with empty lists.
#[tokio::test]
async fn non_json_consensus_degrades() {
    let personas = vec![named_persona("A"), named_persona("B")];
    let fake = Arc::new(FakeInferenceClient::new(vec![
        ScriptedResponse::text(chat_reply("yes")),
        ScriptedResponse::text(chat_reply("no")),
        ScriptedResponse::text("Mixed opinions overall."),
    ]));
    let panel = PersonaPanel::new(fake);

    let result = panel.query(&personas, "Buy it?").await.unwrap();
    assert_eq!(result.consensus.summary, "Mixed opinions overall.");
    assert_eq!(result.consensus.agreement_level, AgreementLevel::Moderate);
    assert!(result.consensus.common_themes.is_empty());
    assert!(result.consensus.key_differences.is_empty());
    assert!(result.consensus.insights.is_empty());
}

/// Panel replies carry the persona display name for consensus attribution.
#[tokio::test]
async fn replies_carry_display_names() {
    let personas = vec![named_persona("Sarah M."), named_persona("Marcus T.")];
    let fake = Arc::new(FakeInferenceClient::new(vec![
        ScriptedResponse::text(chat_reply("I'd research it first")),
        ScriptedResponse::text(chat_reply("Show me the numbers")),
        ScriptedResponse::text(GOOD_CONSENSUS),
    ]));
    let panel = PersonaPanel::new(fake);

    let result = panel.query(&personas, "New gadget?").await.unwrap();
    assert_eq!(result.individual[0].persona_name, "Sarah M.");
    assert_eq!(result.individual[1].persona_name, "Marcus T.");
}
