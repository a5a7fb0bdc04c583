//! API surface tests over the full router with an in-memory store and a
//! scripted fake inference client.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lens_common::config::{AdminSettings, LensConfig};
use lens_common::gateway::{FakeInferenceClient, InferenceError, ScriptedResponse};
use lens_common::{InferenceClient, PersonaStore};
use lensd::server::{app, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

const ADMIN: &str = "ops@lens.example";

fn test_app(client: Arc<dyn InferenceClient>) -> Router {
    let store = Arc::new(PersonaStore::open_in_memory().unwrap());
    let config = LensConfig {
        admin: AdminSettings {
            emails: vec![ADMIN.to_string()],
        },
        ..Default::default()
    };
    app(Arc::new(AppState::with_parts(store, client, config)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-lens-user", user)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json_as(uri: &str, user: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-lens-user", user)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app.oneshot(get("/v1/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["personas_published"], 0);
}

#[tokio::test]
async fn evaluate_without_answer_returns_neutral_default() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .oneshot(post_json(
            "/v1/interview/evaluate",
            serde_json::json!({ "question_index": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["score"], 5);
    assert_eq!(body["feedback"], "Could not evaluate");
}

#[tokio::test]
async fn evaluate_scores_locally_when_inference_is_down() {
    let app = test_app(Arc::new(FakeInferenceClient::always_error(
        InferenceError::Http("down".to_string()),
    )));

    let response = app
        .oneshot(post_json(
            "/v1/interview/evaluate",
            serde_json::json!({
                "question_index": 2,
                "answer": "I keep coming back to honesty and craft in everything I choose to do"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    // 14 words lands in the 8-19 bucket.
    assert_eq!(body["score"], 6);
    assert_eq!(body["feedback"], "Scored locally");
}

#[tokio::test]
async fn save_response_validates_question_number() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .oneshot(post_json(
            "/v1/interview/response",
            serde_json::json!({
                "contributor_id": "contrib-1",
                "question_number": 10,
                "response_text": "An answer"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn complete_interview_persists_published_persona() {
    let extraction = serde_json::json!({
        "narrative": "A thoughtful person.",
        "attributes": { "display_name": "Thoughtful Tester", "values": ["honesty"] },
        "confidence_scores": { "values": 0.7, "overall": 0.6 }
    });
    let app = test_app(Arc::new(FakeInferenceClient::always_text(
        extraction.to_string(),
    )));

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/interview/complete",
            serde_json::json!({
                "contributor_id": "contrib-1",
                "answers": { "0": "I'm a tester.", "2": "Honesty matters." }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["responses_analyzed"], 2);
    assert_eq!(body["attributes"]["display_name"], "Thoughtful Tester");
    let persona_id = body["persona_id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/v1/personas/{}", persona_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["narrative"], "A thoughtful person.");
    assert_eq!(body["version"], 1);
}

#[tokio::test]
async fn complete_interview_without_answers_is_rejected() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .oneshot(post_json("/v1/interview/complete", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_degrades_to_raw_text_reply() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text(
        "I think it's great!",
    )));

    // Seed a persona to chat with.
    let seed = app
        .clone()
        .oneshot(post_json_as(
            "/v1/admin/seed",
            ADMIN,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(seed.status(), StatusCode::OK);

    let personas = body_json(app.clone().oneshot(get("/v1/personas")).await.unwrap()).await;
    let persona_id = personas["personas"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(post_json(
            "/v1/chat",
            serde_json::json!({
                "persona_id": persona_id,
                "message": "What do you think of the product?"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["response"], "I think it's great!");
    assert_eq!(body["confidence"], "medium");
    assert_eq!(body["explanation"], "Response generated from persona profile");
    assert!(body["session_id"].is_string());
}

#[tokio::test]
async fn chat_with_unknown_persona_is_404() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .oneshot(post_json(
            "/v1/chat",
            serde_json::json!({
                "persona_id": uuid::Uuid::new_v4(),
                "message": "Hello?"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn panel_rejects_bad_persona_count() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .oneshot(post_json(
            "/v1/chat/panel",
            serde_json::json!({
                "persona_ids": [uuid::Uuid::new_v4()],
                "message": "Thoughts?"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn panel_runs_over_seeded_personas() {
    let chat_reply =
        r#"{"response": "Depends on the price.", "confidence": "medium", "explanation": "values"}"#;
    let client = Arc::new(FakeInferenceClient::new(vec![
        ScriptedResponse::text(chat_reply),
        ScriptedResponse::text(chat_reply),
        ScriptedResponse::text("Mixed opinions overall."),
    ]));
    let app = test_app(client);

    app.clone()
        .oneshot(post_json_as(
            "/v1/admin/seed",
            ADMIN,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let personas = body_json(app.clone().oneshot(get("/v1/personas")).await.unwrap()).await;
    let ids: Vec<&str> = personas["personas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);

    let response = app
        .oneshot(post_json(
            "/v1/chat/panel",
            serde_json::json!({ "persona_ids": ids, "message": "Would you buy it?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["persona_count"], 2);
    assert_eq!(body["consensus"]["agreement_level"], "moderate");
    assert_eq!(body["consensus"]["summary"], "Mixed opinions overall.");
}

#[tokio::test]
async fn admin_routes_are_gated() {
    let app = test_app(Arc::new(FakeInferenceClient::always_text("unused")));

    let response = app
        .clone()
        .oneshot(get("/v1/admin/personas"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_as("/v1/admin/personas", "somebody@else.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_as("/v1/admin/personas", ADMIN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn mine_requires_identity_and_filters_by_owner() {
    let extraction = serde_json::json!({
        "narrative": "Owned persona.",
        "attributes": { "display_name": "Owned Persona" },
        "confidence_scores": { "overall": 0.5 }
    });
    let app = test_app(Arc::new(FakeInferenceClient::always_text(
        extraction.to_string(),
    )));

    app.clone()
        .oneshot(post_json(
            "/v1/interview/complete",
            serde_json::json!({
                "contributor_id": "owner@lens.example",
                "answers": { "0": "Mine." }
            }),
        ))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/v1/personas/mine")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_as("/v1/personas/mine", "owner@lens.example"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);

    let response = app
        .oneshot(get_as("/v1/personas/mine", "stranger@lens.example"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
}
