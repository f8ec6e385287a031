//! Inference adapter seam and language → model registry
//!
//! The batching pipeline only sees [`SentimentClassifier`]: a list of texts in,
//! one probability distribution over model-native labels out per text.
//! [`LabelMapping`] translates native labels (`LABEL_0`, ...) to the canonical
//! [`SentimentLabel`] set.

pub mod registry;
#[cfg(feature = "candle")]
pub mod roberta;

pub use registry::{load_registry, ModelRegistry, ModelRegistryBuilder, RegisteredModel};

use crate::types::SentimentLabel;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Inference adapter errors
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference backend error: {0}")]
    Backend(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),
}

#[cfg(feature = "candle")]
impl From<candle_core::Error> for InferenceError {
    fn from(err: candle_core::Error) -> Self {
        InferenceError::Backend(err.to_string())
    }
}

/// Probabilities over model-native labels for one text, in model output order
pub type Distribution = Vec<(String, f32)>;

/// Text → label distribution capability
///
/// Implementations truncate over-long texts themselves and must return exactly
/// one distribution per input text, in input order. A returned error fails the
/// whole batch.
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, texts: &[&str]) -> Result<Vec<Distribution>, InferenceError>;
}

/// Static model-native → canonical label table for one language
#[derive(Debug, Clone, Default)]
pub struct LabelMapping {
    table: HashMap<String, SentimentLabel>,
}

impl LabelMapping {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, SentimentLabel)>) -> Self {
        Self {
            table: entries
                .into_iter()
                .map(|(native, label)| (native.into(), label))
                .collect(),
        }
    }

    /// Build from the `[models.<lang>.labels]` config table
    pub fn from_config(labels: &BTreeMap<String, String>) -> Result<Self, String> {
        let mut table = HashMap::with_capacity(labels.len());
        let mut claimed: HashMap<SentimentLabel, &str> = HashMap::new();
        for (native, canonical) in labels {
            let label = canonical
                .parse::<SentimentLabel>()
                .map_err(|e| format!("label mapping for '{native}': {e}"))?;
            if let Some(previous) = claimed.insert(label, native) {
                return Err(format!(
                    "label mapping for '{native}': '{previous}' already maps to '{label}'"
                ));
            }
            table.insert(native.clone(), label);
        }
        Ok(Self { table })
    }

    /// Canonical label for a native label
    ///
    /// Native labels that already name a canonical label map to themselves.
    pub fn resolve(&self, native: &str) -> Option<SentimentLabel> {
        self.table
            .get(native)
            .copied()
            .or_else(|| native.parse().ok())
    }
}
