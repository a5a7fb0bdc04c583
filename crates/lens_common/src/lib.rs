//! Lens Common - Shared core for the Lens persona platform.
//!
//! Prompt building, the inference gateway, the extraction/chat/panel
//! orchestrators, the answer quality scorer, and the persona store.
//! The gateway is the only module that performs network calls to the
//! inference service.

pub mod chat;
pub mod config;
pub mod error;
pub mod extraction;
pub mod gateway;
pub mod panel;
pub mod persona;
pub mod prompts;
pub mod questions;
pub mod scoring;
pub mod store;

pub use chat::{ChatReply, PersonaChat, DEGRADED_EXPLANATION};
pub use config::LensConfig;
pub use error::LensError;
pub use extraction::{ExtractionResult, PersonaExtractor};
pub use gateway::{
    FakeInferenceClient, HttpInferenceClient, InferenceClient, InferenceConfig, InferenceError,
    ScriptedResponse,
};
pub use panel::{PanelReply, PanelResult, PersonaPanel, MAX_PANEL_PERSONAS, MIN_PANEL_PERSONAS};
pub use persona::{
    AgreementLevel, ChatTurn, ConfidenceLabel, ConfidenceScores, ConsensusResult, Demographics,
    Insight, PersonaAttributes, PersonaProfile, QuestionAnswer, TasteSignals, TurnRole,
};
pub use scoring::{heuristic_score, AnswerScorer, ScoreResult, MAX_SCORE};
pub use store::{PersonaStore, PersonaUpdate, StoreStats};
