//! Error types for Lens.

use crate::gateway::InferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("No interview responses to analyze. Answer at least one question first.")]
    NoInputData,

    #[error("A panel needs between 2 and 5 personas, got {0}")]
    InvalidPersonaCount(usize),

    #[error("Question index {0} is out of range")]
    InvalidQuestionIndex(usize),

    #[error("Persona extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Persona not found")]
    PersonaNotFound,

    #[error("Contributor has not granted consent")]
    ConsentRequired,

    #[error("Not authorized for this operation")]
    Forbidden,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for LensError {
    fn from(e: rusqlite::Error) -> Self {
        LensError::Storage(e.to_string())
    }
}
