//! Error types for senti-worker
//!
//! Request-level taxonomy:
//! - [`ValidationError`]: malformed input or unsupported language, reported as a
//!   single error result with no partial output
//! - [`InferenceError`]: one batch's inference call failed; isolated to that batch
//!   unless the failure policy says otherwise
//! - [`TransportError`]: queue polling/submission failure, logged by the poll loop

use crate::types::DocumentId;
use thiserror::Error;

pub use crate::models::InferenceError;
pub use crate::queue::client::TransportError;
pub use crate::queue::job::JobError;

/// Input rejected at the pipeline boundary before any inference work
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Model for language code '{0}' not found")]
    UnsupportedLanguage(String),

    #[error("Document {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Document {index} has an invalid '{field}' value: {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Unsupported input format: {0}")]
    UnsupportedShape(String),

    #[error("Duplicate document id {0}")]
    DuplicateId(DocumentId),
}

/// Request-level pipeline failure
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raised only under the `abort` chunk failure policy
    #[error("Inference failed for batch {chunk_index}: {source}")]
    ChunkAborted {
        chunk_index: usize,
        #[source]
        source: InferenceError,
    },
}

/// Top-level worker error
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Job payload error: {0}")]
    Job(#[from] JobError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WorkerError {
    /// Status code reported to the queue when a job fails
    pub fn status_code(&self) -> u16 {
        match self {
            WorkerError::Pipeline(PipelineError::Validation(_)) => 400,
            _ => 500,
        }
    }
}

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;
