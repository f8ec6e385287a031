//! Scored documents → wire records

use crate::types::{OutputRecord, ScoredDocument, SentimentLabel};

/// Wire record for a scored document; `None` for failure entries
///
/// A label missing from the scores counts as 0.0. The dominant label is the
/// highest score, ties going to the earlier label in canonical order
/// (negative, neutral, positive).
pub fn translate(scored: &ScoredDocument) -> Option<OutputRecord> {
    let ScoredDocument::Scored { id, text, .. } = scored else {
        return None;
    };

    let score = |label: SentimentLabel| scored.score_of(label).unwrap_or(0.0);

    Some(OutputRecord {
        id: id.clone(),
        document: text.clone(),
        sentiment: dominant_label(&score),
        confidence_scores_positive: score(SentimentLabel::Positive),
        confidence_scores_neutral: score(SentimentLabel::Neutral),
        confidence_scores_negative: score(SentimentLabel::Negative),
    })
}

/// Translate every scored entry, skipping failures
pub fn translate_all(scored: &[ScoredDocument]) -> Vec<OutputRecord> {
    scored.iter().filter_map(translate).collect()
}

/// Error messages of the failure entries, in formation order
pub fn failure_messages(scored: &[ScoredDocument]) -> Vec<&str> {
    scored
        .iter()
        .filter_map(|entry| match entry {
            ScoredDocument::Failed { error } => Some(error.as_str()),
            ScoredDocument::Scored { .. } => None,
        })
        .collect()
}

fn dominant_label(score: impl Fn(SentimentLabel) -> f32) -> SentimentLabel {
    let mut best = SentimentLabel::ALL[0];
    let mut best_score = score(best);
    for label in &SentimentLabel::ALL[1..] {
        let candidate = score(*label);
        if candidate > best_score {
            best = *label;
            best_score = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentId, LabeledScore};

    fn scored(id: i64, negative: f32, neutral: f32, positive: f32) -> ScoredDocument {
        let id = DocumentId::Int(id);
        let scores = [
            (SentimentLabel::Negative, negative),
            (SentimentLabel::Neutral, neutral),
            (SentimentLabel::Positive, positive),
        ]
        .into_iter()
        .map(|(label, score)| LabeledScore {
            label,
            score,
            id: id.clone(),
        })
        .collect();
        ScoredDocument::Scored {
            id,
            text: "some text".to_string(),
            scores,
        }
    }

    #[test]
    fn test_translate_positive() {
        let record = translate(&scored(5, 0.1, 0.2, 0.7)).unwrap();
        assert_eq!(record.id, DocumentId::Int(5));
        assert_eq!(record.document, "some text");
        assert_eq!(record.sentiment, SentimentLabel::Positive);
        assert_eq!(record.confidence_scores_negative, 0.1);
        assert_eq!(record.confidence_scores_neutral, 0.2);
        assert_eq!(record.confidence_scores_positive, 0.7);
    }

    #[test]
    fn test_ties_go_to_canonical_order() {
        let record = translate(&scored(0, 0.4, 0.4, 0.2)).unwrap();
        assert_eq!(record.sentiment, SentimentLabel::Negative);

        let record = translate(&scored(0, 0.2, 0.4, 0.4)).unwrap();
        assert_eq!(record.sentiment, SentimentLabel::Neutral);
    }

    #[test]
    fn test_missing_label_defaults_to_zero() {
        let entry = ScoredDocument::Scored {
            id: DocumentId::Int(1),
            text: "meh".to_string(),
            scores: vec![LabeledScore {
                label: SentimentLabel::Neutral,
                score: 0.9,
                id: DocumentId::Int(1),
            }],
        };
        let record = translate(&entry).unwrap();
        assert_eq!(record.sentiment, SentimentLabel::Neutral);
        assert_eq!(record.confidence_scores_positive, 0.0);
        assert_eq!(record.confidence_scores_negative, 0.0);
    }

    #[test]
    fn test_failures_skipped() {
        let entries = vec![
            scored(1, 0.8, 0.1, 0.1),
            ScoredDocument::failed("batch 1 failed"),
        ];
        assert!(translate(&entries[1]).is_none());

        let records = translate_all(&entries);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sentiment, SentimentLabel::Negative);
        assert_eq!(failure_messages(&entries), vec!["batch 1 failed"]);
    }
}
