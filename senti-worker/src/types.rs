//! Core data model for the sentiment batching pipeline
//!
//! - [`Document`]: one input text with its caller-supplied identifier
//! - [`LabeledScore`] / [`ScoredDocument`]: internal scored representation
//! - [`OutputRecord`]: wire schema submitted back to the job queue

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Documents
// ============================================================================

/// Caller-supplied document identifier
///
/// Integers order before strings; callers are expected to keep one type per request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(id) => write!(f, "{id}"),
            DocumentId::Text(id) => write!(f, "{id:?}"),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Int(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

/// One text to classify
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Whitespace-delimited token count (not the model's subword count)
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

// ============================================================================
// Labels and scores
// ============================================================================

/// Canonical sentiment vocabulary
///
/// Variant order is the tie-break order used when picking a dominant label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLabel {
    /// All labels in canonical order
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Positive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SentimentLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("'{s}' is not a canonical sentiment label"))
    }
}

/// Probability of one canonical label for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledScore {
    pub label: SentimentLabel,
    pub score: f32,
    pub id: DocumentId,
}

/// Scoring outcome for one document, or for a batch that failed as a whole
///
/// `Failed` entries carry no identifier and never reach the wire schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoredDocument {
    Scored {
        id: DocumentId,
        text: String,
        /// Sorted by label
        scores: Vec<LabeledScore>,
    },
    Failed {
        error: String,
    },
}

impl ScoredDocument {
    pub fn failed(error: impl Into<String>) -> Self {
        ScoredDocument::Failed {
            error: error.into(),
        }
    }

    pub fn id(&self) -> Option<&DocumentId> {
        match self {
            ScoredDocument::Scored { id, .. } => Some(id),
            ScoredDocument::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScoredDocument::Failed { .. })
    }

    /// Score for `label`, if the adapter produced one
    pub fn score_of(&self, label: SentimentLabel) -> Option<f32> {
        match self {
            ScoredDocument::Scored { scores, .. } => scores
                .iter()
                .find(|s| s.label == label)
                .map(|s| s.score),
            ScoredDocument::Failed { .. } => None,
        }
    }
}

// ============================================================================
// Wire schema
// ============================================================================

/// Result record for one document as submitted to the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: DocumentId,
    pub document: String,
    pub sentiment: SentimentLabel,
    pub confidence_scores_positive: f32,
    pub confidence_scores_neutral: f32,
    pub confidence_scores_negative: f32,
}
