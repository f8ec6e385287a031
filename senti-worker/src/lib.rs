//! senti-worker library
//!
//! Polls a job queue for sentiment requests, scores the referenced documents
//! in word-budgeted batches and submits one result record per document.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod types;
pub mod worker;

pub use error::{PipelineError, Result, ValidationError, WorkerError};
pub use models::{ModelRegistry, RegisteredModel, SentimentClassifier};
pub use pipeline::{PipelineConfig, SentimentPipeline};
pub use queue::QueueClient;
pub use worker::{CycleOutcome, Worker};
