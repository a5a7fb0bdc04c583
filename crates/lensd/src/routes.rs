//! API routes for lensd.
//!
//! Identity is a trusted `x-lens-user` header; session plumbing lives with
//! the caller. Handlers keep the orchestrators' error policy: validation
//! errors are 400s before any inference call, degradable operations always
//! return a usable body, and only extraction surfaces inference failures.

use crate::demo;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use lens_common::questions::{
    question_by_index, question_by_number, INTERVIEW_QUESTIONS, MAX_MESSAGE_CHARS,
    MAX_RESPONSE_CHARS,
};
use lens_common::scoring::MAX_SCORE;
use lens_common::store::StoreStats;
use lens_common::{
    ChatTurn, ConfidenceLabel, ConfidenceScores, ConsensusResult, LensError, PersonaAttributes,
    PersonaProfile, PersonaUpdate, QuestionAnswer,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

/// Header carrying the caller identity.
const IDENTITY_HEADER: &str = "x-lens-user";

/// Most recent turns replayed from a stored session.
const SESSION_HISTORY_LIMIT: usize = 20;

fn identity(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn status_for(err: &LensError) -> StatusCode {
    match err {
        LensError::NoInputData
        | LensError::Validation(_)
        | LensError::InvalidPersonaCount(_)
        | LensError::InvalidQuestionIndex(_) => StatusCode::BAD_REQUEST,
        LensError::PersonaNotFound => StatusCode::NOT_FOUND,
        LensError::Forbidden | LensError::ConsentRequired => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_err(err: LensError) -> (StatusCode, String) {
    (status_for(&err), err.to_string())
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub personas_published: i64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let personas_published = state
        .store
        .stats()
        .map(|s| s.total_personas)
        .unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        personas_published,
    })
}

// ============================================================================
// Stats Routes
// ============================================================================

pub fn stats_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/stats", get(get_stats))
}

async fn get_stats(
    State(state): State<AppStateArc>,
) -> Result<Json<StoreStats>, (StatusCode, String)> {
    state.store.stats().map(Json).map_err(http_err)
}

// ============================================================================
// Interview Routes
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct QuestionInfo {
    pub number: u32,
    pub phase: &'static str,
    pub question: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponseRequest {
    pub contributor_id: String,
    pub question_number: u32,
    pub response_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveResponseResult {
    pub question_number: u32,
    pub saved: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub question_index: Option<usize>,
    #[serde(default)]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateResult {
    pub score: u8,
    pub max_score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub contributor_id: Option<String>,
    /// Answers keyed by 0-based question index, as the client collects them.
    #[serde(default)]
    pub answers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteResult {
    pub persona_id: Option<Uuid>,
    pub narrative: String,
    pub attributes: PersonaAttributes,
    pub confidence_scores: ConfidenceScores,
    pub responses_analyzed: usize,
}

pub fn interview_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/interview/questions", get(list_questions))
        .route("/v1/interview/response", post(save_response))
        .route("/v1/interview/evaluate", post(evaluate_answer))
        .route("/v1/interview/complete", post(complete_interview))
}

async fn list_questions() -> Json<Vec<QuestionInfo>> {
    Json(
        INTERVIEW_QUESTIONS
            .iter()
            .map(|q| QuestionInfo {
                number: q.number,
                phase: q.phase.as_str(),
                question: q.question,
                hint: q.hint,
            })
            .collect(),
    )
}

/// Upsert one interview answer. Re-answering replaces the stored text for
/// that question, never duplicates it.
async fn save_response(
    State(state): State<AppStateArc>,
    Json(req): Json<SaveResponseRequest>,
) -> Result<Json<SaveResponseResult>, (StatusCode, String)> {
    let question = question_by_number(req.question_number).ok_or_else(|| {
        http_err(LensError::Validation(format!(
            "question_number must be between 1 and {}",
            INTERVIEW_QUESTIONS.len()
        )))
    })?;

    let text = req.response_text.trim();
    if text.is_empty() || text.chars().count() > MAX_RESPONSE_CHARS {
        return Err(http_err(LensError::Validation(format!(
            "response_text must be 1 to {} characters",
            MAX_RESPONSE_CHARS
        ))));
    }

    let answer = QuestionAnswer {
        question_number: req.question_number,
        question_text: question.question.to_string(),
        response_text: text.to_string(),
    };
    state
        .store
        .upsert_response(&req.contributor_id, &answer)
        .map_err(http_err)?;

    Ok(Json(SaveResponseResult {
        question_number: req.question_number,
        saved: true,
    }))
}

/// Score one answer. Never 5xx: a missing answer yields the neutral default,
/// and the scorer falls back to its local heuristic on inference failure.
async fn evaluate_answer(
    State(state): State<AppStateArc>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResult>, (StatusCode, String)> {
    let answer = req.answer.as_deref().map(str::trim).unwrap_or_default();
    if answer.is_empty() {
        return Ok(Json(EvaluateResult {
            score: 5,
            max_score: MAX_SCORE,
            feedback: "Could not evaluate".to_string(),
        }));
    }

    let result = match req.question_index {
        Some(index) => state.scorer.score(index, answer).await.map_err(http_err)?,
        None => state.scorer.local(answer),
    };

    Ok(Json(EvaluateResult {
        score: result.score,
        max_score: result.max_score,
        feedback: result.feedback,
    }))
}

/// Finish an interview: gather answers (inline or stored), extract a persona,
/// and persist it published.
async fn complete_interview(
    State(state): State<AppStateArc>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResult>, (StatusCode, String)> {
    let mut responses: Vec<QuestionAnswer> = Vec::new();

    // Answers passed directly from the client win.
    if let Some(answers) = &req.answers {
        for (index, text) in answers {
            let Ok(index) = index.parse::<usize>() else {
                continue;
            };
            let number = (index + 1) as u32;
            let question_text = question_by_index(index)
                .map(|q| q.question.to_string())
                .unwrap_or_else(|| format!("Question {}", number));
            if !text.trim().is_empty() {
                responses.push(QuestionAnswer {
                    question_number: number,
                    question_text,
                    response_text: text.clone(),
                });
            }
        }
        responses.sort_by_key(|r| r.question_number);
    }

    // Otherwise pull whatever the contributor saved along the way.
    if responses.is_empty() {
        if let Some(contributor) = &req.contributor_id {
            responses = state.store.responses_for(contributor).map_err(http_err)?;
        }
    }

    if responses.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No responses found — please answer at least one question".to_string(),
        ));
    }

    info!("[EXTRACT]  Synthesizing persona from {} answers", responses.len());
    let extraction = state.extractor.extract(&responses).await.map_err(|e| {
        error!("[EXTRACT]  Failed: {}", e);
        http_err(e)
    })?;

    let persona = PersonaProfile::new(
        req.contributor_id.clone(),
        extraction.narrative.clone(),
        extraction.attributes.clone(),
        extraction.confidence.clone(),
        true,
    );

    // Persistence is best-effort: the extraction result is returned either way.
    let persona_id = match state.store.insert_persona(&persona) {
        Ok(()) => Some(persona.id),
        Err(e) => {
            warn!("[EXTRACT]  Persona save failed (non-critical): {}", e);
            None
        }
    };

    Ok(Json(CompleteResult {
        persona_id,
        narrative: extraction.narrative,
        attributes: extraction.attributes,
        confidence_scores: extraction.confidence,
        responses_analyzed: responses.len(),
    }))
}

// ============================================================================
// Persona Routes
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonaFilters {
    #[serde(default)]
    pub values: Option<String>,
    #[serde(default)]
    pub life_context: Option<String>,
    #[serde(default)]
    pub decision_style: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaView {
    pub id: Uuid,
    pub narrative: String,
    pub attributes: PersonaAttributes,
    pub confidence: ConfidenceScores,
    pub published: bool,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PersonaProfile> for PersonaView {
    fn from(p: PersonaProfile) -> Self {
        Self {
            id: p.id,
            narrative: p.narrative,
            attributes: p.attributes,
            confidence: p.confidence,
            published: p.published,
            version: p.version,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaListResponse {
    pub personas: Vec<PersonaView>,
    pub total: usize,
}

pub fn persona_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/personas", get(list_personas))
        .route("/v1/personas/mine", get(list_my_personas))
        .route("/v1/personas/:id", get(get_persona))
        .route("/v1/personas/:id", patch(edit_persona))
}

fn matches_filters(persona: &PersonaProfile, filters: &PersonaFilters) -> bool {
    if let Some(values) = &filters.values {
        let wanted: Vec<String> = values
            .to_lowercase()
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        let have: Vec<String> = persona
            .attributes
            .values
            .iter()
            .map(|v| v.to_lowercase())
            .collect();
        if !wanted
            .iter()
            .any(|w| have.iter().any(|h| h.contains(w.as_str())))
        {
            return false;
        }
    }

    if let Some(context) = &filters.life_context {
        let needle = context.to_lowercase();
        if !persona
            .attributes
            .life_context
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
        {
            return false;
        }
    }

    if let Some(style) = &filters.decision_style {
        if persona.attributes.decision_style.as_deref() != Some(style.as_str()) {
            return false;
        }
    }

    if let Some(term) = &filters.search {
        let needle = term.to_lowercase();
        let attributes_json = serde_json::to_string(&persona.attributes)
            .unwrap_or_default()
            .to_lowercase();
        if !persona.narrative.to_lowercase().contains(&needle)
            && !attributes_json.contains(&needle)
        {
            return false;
        }
    }

    true
}

async fn list_personas(
    State(state): State<AppStateArc>,
    Query(filters): Query<PersonaFilters>,
) -> Result<Json<PersonaListResponse>, (StatusCode, String)> {
    let personas: Vec<PersonaView> = state
        .store
        .list_published()
        .map_err(http_err)?
        .into_iter()
        .filter(|p| matches_filters(p, &filters))
        .map(Into::into)
        .collect();

    let total = personas.len();
    Ok(Json(PersonaListResponse { personas, total }))
}

async fn list_my_personas(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> Result<Json<PersonaListResponse>, (StatusCode, String)> {
    let owner = identity(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Identity required".to_string()))?;

    let personas: Vec<PersonaView> = state
        .store
        .list_by_owner(&owner)
        .map_err(http_err)?
        .into_iter()
        .map(Into::into)
        .collect();

    let total = personas.len();
    Ok(Json(PersonaListResponse { personas, total }))
}

async fn get_persona(
    State(state): State<AppStateArc>,
    Path(id): Path<Uuid>,
) -> Result<Json<PersonaView>, (StatusCode, String)> {
    let persona = state
        .store
        .get_published(id)
        .map_err(http_err)?
        .ok_or_else(|| http_err(LensError::PersonaNotFound))?;
    Ok(Json(persona.into()))
}

/// Owner edit of narrative, attributes, or the published flag. Admins may
/// edit any persona.
async fn edit_persona(
    State(state): State<AppStateArc>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<PersonaUpdate>,
) -> Result<Json<PersonaView>, (StatusCode, String)> {
    let caller = identity(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Identity required".to_string()))?;

    let persona = state
        .store
        .get_persona(id)
        .map_err(http_err)?
        .ok_or_else(|| http_err(LensError::PersonaNotFound))?;

    let is_owner = persona.owner.as_deref() == Some(caller.as_str());
    if !is_owner && !state.config.admin.is_admin(&caller) {
        return Err(http_err(LensError::Forbidden));
    }

    state.store.update_persona(id, &update).map_err(http_err)?;
    let updated = state
        .store
        .get_persona(id)
        .map_err(http_err)?
        .ok_or_else(|| http_err(LensError::PersonaNotFound))?;
    Ok(Json(updated.into()))
}

// ============================================================================
// Chat Routes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub persona_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Client-held history, used when no stored session history exists.
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub session_id: Option<Uuid>,
    pub response: String,
    pub confidence: ConfidenceLabel,
    pub explanation: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelRequest {
    pub persona_ids: Vec<Uuid>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelResponse {
    pub question: String,
    pub responses: Vec<lens_common::PanelReply>,
    pub consensus: ConsensusResult,
    pub persona_count: usize,
    pub latency_ms: u64,
}

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/chat", post(chat_message))
        .route("/v1/chat/panel", post(panel_query))
}

fn validate_message(message: &str) -> Result<&str, (StatusCode, String)> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(http_err(LensError::Validation(
            "message is required".to_string(),
        )));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(http_err(LensError::Validation(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        ))));
    }
    Ok(trimmed)
}

/// Ensure a session exists, persist the user turn, and replay stored history
/// (excluding the turn just saved). Failures here must never fail the chat.
fn prepare_session(
    state: &AppState,
    persona_id: Uuid,
    user_ref: Option<&str>,
    session_id: Option<Uuid>,
    message: &str,
) -> Result<(Uuid, Vec<ChatTurn>), LensError> {
    let session_id = match session_id {
        Some(id) => id,
        None => {
            let title: String = message.chars().take(100).collect();
            state.store.create_session(persona_id, user_ref, &title)?
        }
    };

    state
        .store
        .append_message(session_id, &ChatTurn::user(message))?;

    let mut history = state
        .store
        .session_history(session_id, SESSION_HISTORY_LIMIT)?;
    history.pop();
    Ok((session_id, history))
}

async fn chat_message(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let message = validate_message(&req.message)?.to_string();

    let persona = state
        .store
        .get_published(req.persona_id)
        .map_err(http_err)?
        .ok_or_else(|| http_err(LensError::PersonaNotFound))?;

    let caller = identity(&headers);

    // Best-effort side channel: session bookkeeping never blocks the reply.
    let (session_id, stored_history) = match prepare_session(
        &state,
        req.persona_id,
        caller.as_deref(),
        req.session_id,
        &message,
    ) {
        Ok((id, history)) => (Some(id), history),
        Err(e) => {
            warn!("[CHAT]  Session bookkeeping failed (non-critical): {}", e);
            (req.session_id, Vec::new())
        }
    };

    let history = if !stored_history.is_empty() {
        stored_history
    } else {
        req.history.unwrap_or_default()
    };

    let start = Instant::now();
    let reply = state
        .chat
        .chat(&persona, &message, &history)
        .await
        .map_err(|e| {
            error!("[CHAT]  Failed: {}", e);
            http_err(e)
        })?;
    let latency_ms = start.elapsed().as_millis() as u64;

    // Second half of the side channel: persist the reply and the query log.
    if let Some(sid) = session_id {
        let assistant_turn = ChatTurn {
            role: lens_common::TurnRole::Assistant,
            content: reply.response.clone(),
            confidence: Some(reply.confidence),
            explanation: Some(reply.explanation.clone()),
        };
        if let Err(e) = state.store.append_message(sid, &assistant_turn) {
            warn!("[CHAT]  Reply logging failed (non-critical): {}", e);
        }
        if let Err(e) =
            state
                .store
                .record_query(Some(sid), &state.config.inference.model, latency_ms)
        {
            warn!("[CHAT]  Query logging failed (non-critical): {}", e);
        }
    }

    info!(
        "[CHAT]  Done in {}ms  Confidence: {}",
        latency_ms,
        reply.confidence.as_str()
    );

    Ok(Json(ChatResponse {
        session_id,
        response: reply.response,
        confidence: reply.confidence,
        explanation: reply.explanation,
        latency_ms,
    }))
}

async fn panel_query(
    State(state): State<AppStateArc>,
    Json(req): Json<PanelRequest>,
) -> Result<Json<PanelResponse>, (StatusCode, String)> {
    let message = validate_message(&req.message)?.to_string();

    if !(lens_common::MIN_PANEL_PERSONAS..=lens_common::MAX_PANEL_PERSONAS)
        .contains(&req.persona_ids.len())
    {
        return Err(http_err(LensError::InvalidPersonaCount(
            req.persona_ids.len(),
        )));
    }

    let mut personas = Vec::with_capacity(req.persona_ids.len());
    for id in &req.persona_ids {
        if let Some(persona) = state.store.get_published(*id).map_err(http_err)? {
            personas.push(persona);
        }
    }
    if personas.is_empty() {
        return Err((StatusCode::NOT_FOUND, "No personas found".to_string()));
    }

    let start = Instant::now();
    let result = state
        .panel
        .query(&personas, &message)
        .await
        .map_err(|e| {
            error!("[PANEL]  Failed: {}", e);
            http_err(e)
        })?;
    let latency_ms = start.elapsed().as_millis() as u64;

    if let Err(e) = state
        .store
        .record_query(None, &state.config.inference.model, latency_ms)
    {
        warn!("[PANEL]  Query logging failed (non-critical): {}", e);
    }

    info!(
        "[PANEL]  {} personas answered in {}ms  Agreement: {}",
        result.individual.len(),
        latency_ms,
        result.consensus.agreement_level.as_str()
    );

    Ok(Json(PanelResponse {
        question: message,
        persona_count: result.individual.len(),
        responses: result.individual,
        consensus: result.consensus,
        latency_ms,
    }))
}

// ============================================================================
// Admin Routes
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AdminPersonaView {
    pub id: Uuid,
    pub owner: Option<String>,
    pub narrative: String,
    pub attributes: PersonaAttributes,
    pub confidence: ConfidenceScores,
    pub published: bool,
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResult {
    pub inserted: usize,
}

pub fn admin_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/admin/personas", get(admin_list_personas))
        .route("/v1/admin/personas/:id", delete(admin_delete_persona))
        .route("/v1/admin/seed", post(admin_seed))
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<String, (StatusCode, String)> {
    let caller = identity(headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Identity required".to_string()))?;
    if !state.config.admin.is_admin(&caller) {
        return Err(http_err(LensError::Forbidden));
    }
    Ok(caller)
}

async fn admin_list_personas(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> Result<Json<Vec<AdminPersonaView>>, (StatusCode, String)> {
    require_admin(&state, &headers)?;

    let personas = state
        .store
        .list_all()
        .map_err(http_err)?
        .into_iter()
        .map(|p| AdminPersonaView {
            id: p.id,
            owner: p.owner,
            narrative: p.narrative,
            attributes: p.attributes,
            confidence: p.confidence,
            published: p.published,
            version: p.version,
            created_at: p.created_at,
        })
        .collect();

    Ok(Json(personas))
}

async fn admin_delete_persona(
    State(state): State<AppStateArc>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let caller = require_admin(&state, &headers)?;

    let deleted = state.store.delete_persona(id).map_err(http_err)?;
    if !deleted {
        return Err(http_err(LensError::PersonaNotFound));
    }

    info!("[ADMIN]  {} deleted persona {}", caller, id);
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn admin_seed(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> Result<Json<SeedResult>, (StatusCode, String)> {
    require_admin(&state, &headers)?;

    let personas = demo::demo_personas();
    let mut inserted = 0;
    for persona in &personas {
        match state.store.insert_persona(persona) {
            Ok(()) => inserted += 1,
            Err(e) => warn!("[ADMIN]  Seed insert failed: {}", e),
        }
    }

    info!("[ADMIN]  Seeded {} demo personas", inserted);
    Ok(Json(SeedResult { inserted }))
}
