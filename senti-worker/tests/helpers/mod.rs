//! Shared test helpers: a deterministic classifier and an in-process job queue

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use senti_common::config::ChunkFailurePolicy;
use senti_worker::models::{Distribution, InferenceError, LabelMapping};
use senti_worker::types::SentimentLabel;
use senti_worker::{
    ModelRegistry, PipelineConfig, RegisteredModel, SentimentClassifier, SentimentPipeline,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const QUEUE_PATH: &str = "/api/SentimentRequest";

/// Keyword classifier emitting cardiffnlp-style native labels
///
/// - "great" / "love" → mostly positive
/// - "bad" / "hate" → mostly negative
/// - anything else → mostly neutral
/// - a batch containing "boom" fails as a whole
pub struct KeywordClassifier;

impl SentimentClassifier for KeywordClassifier {
    fn classify(&self, texts: &[&str]) -> Result<Vec<Distribution>, InferenceError> {
        if texts.iter().any(|t| t.contains("boom")) {
            return Err(InferenceError::Backend("CUDA out of memory".to_string()));
        }
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let (negative, neutral, positive) = if lower.contains("great")
                    || lower.contains("love")
                {
                    (0.1, 0.2, 0.7)
                } else if lower.contains("bad") || lower.contains("hate") {
                    (0.8, 0.15, 0.05)
                } else {
                    (0.25, 0.5, 0.25)
                };
                vec![
                    ("LABEL_0".to_string(), negative),
                    ("LABEL_1".to_string(), neutral),
                    ("LABEL_2".to_string(), positive),
                ]
            })
            .collect())
    }
}

pub fn cardiff_labels() -> LabelMapping {
    LabelMapping::new([
        ("LABEL_0", SentimentLabel::Negative),
        ("LABEL_1", SentimentLabel::Neutral),
        ("LABEL_2", SentimentLabel::Positive),
    ])
}

/// Registry with the keyword classifier registered for `en`
pub fn test_registry() -> Arc<ModelRegistry> {
    Arc::new(
        ModelRegistry::builder()
            .register(
                "en",
                RegisteredModel::new("keyword-en", KeywordClassifier, cardiff_labels()),
            )
            .build(),
    )
}

pub fn test_pipeline(max_words: usize, failure_policy: ChunkFailurePolicy) -> SentimentPipeline {
    SentimentPipeline::new(
        test_registry(),
        PipelineConfig {
            max_words,
            failure_policy,
        },
    )
}

/// Write a double-encoded payload file for `sentiments`
pub fn write_payload(dir: &Path, name: &str, sentiments: Value) -> PathBuf {
    let inner = json!({ "sentiments": sentiments }).to_string();
    let path = dir.join(name);
    std::fs::write(&path, json!({ "Payload": inner }).to_string()).unwrap();
    path
}

/// In-process job queue
#[derive(Clone, Default)]
pub struct FakeQueue {
    pending: Arc<Mutex<VecDeque<Value>>>,
    submissions: Arc<Mutex<Vec<Value>>>,
    reject_submissions: bool,
}

impl FakeQueue {
    pub fn rejecting() -> Self {
        Self {
            reject_submissions: true,
            ..Self::default()
        }
    }

    pub fn push_job(&self, job: Value) {
        self.pending.lock().unwrap().push_back(job);
    }

    pub fn submissions(&self) -> Vec<Value> {
        self.submissions.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return the queue endpoint URL
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route(QUEUE_PATH, get(poll).post(submit))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}{QUEUE_PATH}")
    }
}

async fn poll(State(queue): State<FakeQueue>) -> Response {
    let job = queue.pending.lock().unwrap().pop_front();
    match job {
        Some(job) => Json(job).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn submit(State(queue): State<FakeQueue>, Json(body): Json<Value>) -> StatusCode {
    queue.submissions.lock().unwrap().push(body);
    if queue.reject_submissions {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}
