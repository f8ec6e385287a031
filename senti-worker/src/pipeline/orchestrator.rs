//! Request-level pipeline: validate → chunk → score → reassemble

use super::chunker::{chunk_documents, Chunk};
use super::input::DocumentInput;
use super::scorer::score_chunk;
use crate::error::{PipelineError, ValidationError};
use crate::models::{InferenceError, ModelRegistry, RegisteredModel};
use crate::types::{Document, ScoredDocument};
use senti_common::config::{ChunkFailurePolicy, PipelineSettings};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default word budget per inference batch
pub const DEFAULT_MAX_WORDS: usize = 5000;

/// Per-request pipeline tuning
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub max_words: usize,
    pub failure_policy: ChunkFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            failure_policy: ChunkFailurePolicy::default(),
        }
    }
}

impl From<&PipelineSettings> for PipelineConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            max_words: settings.max_words,
            failure_policy: settings.chunk_failure_policy,
        }
    }
}

/// Sentiment batching pipeline over a shared, read-only model registry
///
/// Chunks are scored strictly one after another on the calling thread.
#[derive(Debug, Clone)]
pub struct SentimentPipeline {
    registry: Arc<ModelRegistry>,
    config: PipelineConfig,
}

impl SentimentPipeline {
    pub fn new(registry: Arc<ModelRegistry>, config: PipelineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate a raw `sentiments` value and run it
    pub fn run_value(
        &self,
        sentiments: &Value,
        language_code: &str,
    ) -> Result<Vec<ScoredDocument>, PipelineError> {
        let input = DocumentInput::from_value(sentiments)?;
        self.run(input, language_code)
    }

    /// Score every document of `input` with the model registered for `language_code`
    ///
    /// Scored entries come back sorted by id; failure entries follow them in
    /// the order the failures happened.
    pub fn run(
        &self,
        input: DocumentInput,
        language_code: &str,
    ) -> Result<Vec<ScoredDocument>, PipelineError> {
        let documents = input.into_documents()?;
        let model = self
            .registry
            .get(language_code)
            .ok_or_else(|| ValidationError::UnsupportedLanguage(language_code.to_string()))?;

        let document_count = documents.len();
        let chunks = chunk_documents(documents, self.config.max_words);
        info!(
            language = language_code,
            model = model.name(),
            documents = document_count,
            chunks = chunks.len(),
            max_words = self.config.max_words,
            "Scoring request"
        );

        let mut scored = Vec::with_capacity(document_count);
        let mut failed = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let started = Instant::now();
            match score_chunk(model, chunk) {
                Ok(results) => {
                    debug!(
                        chunk = index,
                        documents = chunk.len(),
                        words = chunk.word_count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Chunk scored"
                    );
                    scored.extend(results);
                }
                Err(err) => {
                    warn!(
                        chunk = index,
                        documents = chunk.len(),
                        words = chunk.word_count(),
                        policy = %self.config.failure_policy,
                        error = %err,
                        "Chunk inference failed"
                    );
                    match self.config.failure_policy {
                        ChunkFailurePolicy::Drop => failed.push(ScoredDocument::failed(format!(
                            "Inference failed for batch {index}: {err}"
                        ))),
                        ChunkFailurePolicy::RetryIndividually => {
                            retry_individually(model, chunk, &mut scored, &mut failed)
                        }
                        ChunkFailurePolicy::Abort => {
                            return Err(PipelineError::ChunkAborted {
                                chunk_index: index,
                                source: err,
                            })
                        }
                    }
                }
            }
        }

        scored.sort_by(|a, b| a.id().cmp(&b.id()));
        let failures = failed.len();
        scored.extend(failed);

        info!(
            documents = document_count,
            scored = scored.len() - failures,
            failures,
            "Request scored"
        );
        Ok(scored)
    }
}

/// Re-score each document of a failed chunk on its own
fn retry_individually(
    model: &RegisteredModel,
    chunk: &Chunk,
    scored: &mut Vec<ScoredDocument>,
    failed: &mut Vec<ScoredDocument>,
) {
    for document in chunk.documents() {
        let single = Chunk::single(document.clone());
        match score_chunk(model, &single) {
            Ok(results) => scored.extend(results),
            Err(err) => {
                debug!(id = %document.id, error = %err, "Document failed on retry");
                failed.push(ScoredDocument::failed(document_failure(document, &err)));
            }
        }
    }
}

fn document_failure(document: &Document, err: &InferenceError) -> String {
    format!("Inference failed for document {}: {err}", document.id)
}
