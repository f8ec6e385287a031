//! Batch scoring: one adapter call per chunk

use super::chunker::Chunk;
use crate::models::{InferenceError, RegisteredModel};
use crate::types::{LabeledScore, ScoredDocument};

/// Score every document of `chunk` with a single classifier call
///
/// Returns one `Scored` entry per document, in chunk order, with scores sorted
/// by label. Any adapter error, a row count mismatch, an unmapped native
/// label, a score outside `[0, 1]` or a label reported twice for one document
/// fails the whole chunk.
pub fn score_chunk(
    model: &RegisteredModel,
    chunk: &Chunk,
) -> Result<Vec<ScoredDocument>, InferenceError> {
    let texts = chunk.texts();
    let distributions = model.classifier().classify(&texts)?;

    if distributions.len() != chunk.len() {
        return Err(InferenceError::MalformedOutput(format!(
            "model '{}' returned {} distributions for {} documents",
            model.name(),
            distributions.len(),
            chunk.len()
        )));
    }

    chunk
        .documents()
        .iter()
        .zip(distributions)
        .map(|(document, distribution)| {
            let mut scores = distribution
                .into_iter()
                .map(|(native, score)| {
                    let label = model.labels().resolve(&native).ok_or_else(|| {
                        InferenceError::MalformedOutput(format!(
                            "model '{}' produced unmapped label '{native}'",
                            model.name()
                        ))
                    })?;
                    if !(0.0..=1.0).contains(&score) {
                        return Err(InferenceError::MalformedOutput(format!(
                            "score {score} for label '{native}' outside [0, 1]"
                        )));
                    }
                    Ok(LabeledScore {
                        label,
                        score,
                        id: document.id.clone(),
                    })
                })
                .collect::<Result<Vec<_>, InferenceError>>()?;
            scores.sort_by_key(|s| s.label);
            if let Some(pair) = scores.windows(2).find(|w| w[0].label == w[1].label) {
                return Err(InferenceError::MalformedOutput(format!(
                    "model '{}' produced label '{}' more than once",
                    model.name(),
                    pair[0].label
                )));
            }

            Ok(ScoredDocument::Scored {
                id: document.id.clone(),
                text: document.text.clone(),
                scores,
            })
        })
        .collect()
}
