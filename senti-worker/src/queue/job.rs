//! Job descriptors, payload files and the submission envelope
//!
//! A polled job points at a payload file on a shared volume:
//!
//! ```json
//! {"Payload": "{\"sentiments\": [{\"id\": 1, \"document\": \"...\"}]}"}
//! ```
//!
//! `Payload` is itself a JSON-encoded string, so the file is decoded twice.

use crate::types::OutputRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Operation name echoed back when the job does not name one
pub const DEFAULT_OPERATION: &str = "sentiment";

/// Job payload errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to read payload file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in payload file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is missing field '{0}'")]
    MissingField(&'static str),

    #[error("Payload field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// Queue-assigned request identifier, echoed back verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Int(id) => write!(f, "{id}"),
            RequestId::Text(id) => f.write_str(id),
        }
    }
}

/// Pending job as returned by a queue poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    pub request_id: RequestId,

    /// Payload file path
    pub location: PathBuf,

    #[serde(default)]
    pub language_code: Option<String>,

    #[serde(default)]
    pub operation: Option<String>,
}

impl JobDescriptor {
    /// Decode a poll response body
    ///
    /// An empty body, `null`, or an object without a `location` means the
    /// queue has nothing for us.
    pub fn from_poll_body(body: &str) -> Result<Option<Self>, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(body)?;
        let has_location = value
            .get("location")
            .map(|location| !location.is_null())
            .unwrap_or(false);
        if !has_location {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }

    /// Requested language, or `default` when the job does not say
    pub fn language_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.language_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(default)
    }

    pub fn operation(&self) -> &str {
        self.operation.as_deref().unwrap_or(DEFAULT_OPERATION)
    }
}

/// Read a payload file and return its `sentiments` value, undecoded
pub fn load_documents(path: &Path) -> Result<Value, JobError> {
    let content = std::fs::read_to_string(path).map_err(|source| JobError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_payload(&content)
}

fn decode_payload(content: &str) -> Result<Value, JobError> {
    let root: Value = serde_json::from_str(content)?;
    let payload = root
        .get("Payload")
        .ok_or(JobError::MissingField("Payload"))?
        .as_str()
        .ok_or(JobError::InvalidField {
            field: "Payload",
            expected: "a JSON-encoded string",
        })?;

    let mut inner: Value = serde_json::from_str(payload)?;
    inner
        .get_mut("sentiments")
        .map(Value::take)
        .ok_or(JobError::MissingField("sentiments"))
}

/// Final state reported for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// `result` object of a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub code: u16,
    pub message: String,
    pub error: String,
    pub data: Vec<OutputRecord>,
}

/// Body POSTed back to the queue, once per job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub result: SubmissionResult,
    #[serde(rename = "requestID")]
    pub request_id: RequestId,
    pub status: JobStatus,
    pub operation: String,
}

impl Submission {
    /// Successful run; `failures` are the messages of dropped batches, if any
    pub fn completed(job: &JobDescriptor, data: Vec<OutputRecord>, failures: &[&str]) -> Self {
        Self::new(job, JobStatus::Completed, 200, failures.join("; "), data)
    }

    /// Request-level failure with no partial output
    pub fn failed(job: &JobDescriptor, code: u16, error: impl fmt::Display) -> Self {
        Self::new(job, JobStatus::Failed, code, error.to_string(), Vec::new())
    }

    fn new(
        job: &JobDescriptor,
        status: JobStatus,
        code: u16,
        error: String,
        data: Vec<OutputRecord>,
    ) -> Self {
        Self {
            result: SubmissionResult {
                code,
                message: status.as_str().to_string(),
                error,
                data,
            },
            request_id: job.request_id.clone(),
            status,
            operation: job.operation().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> JobDescriptor {
        JobDescriptor::from_poll_body(
            r#"{"requestId": "req-9", "location": "/data/job.json", "languageCode": null}"#,
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_poll_body_without_job() {
        assert_eq!(JobDescriptor::from_poll_body("").unwrap(), None);
        assert_eq!(JobDescriptor::from_poll_body("  \n").unwrap(), None);
        assert_eq!(JobDescriptor::from_poll_body("null").unwrap(), None);
        assert_eq!(JobDescriptor::from_poll_body(r#"{"location": null}"#).unwrap(), None);
        assert!(JobDescriptor::from_poll_body("not json").is_err());
    }

    #[test]
    fn test_descriptor_defaults() {
        let job = job();
        assert_eq!(job.request_id, RequestId::Text("req-9".to_string()));
        assert_eq!(job.location, PathBuf::from("/data/job.json"));
        assert_eq!(job.language_or("en"), "en");
        assert_eq!(job.operation(), "sentiment");

        let job = JobDescriptor::from_poll_body(
            r#"{"requestId": 12, "location": "x", "languageCode": "de", "operation": "tone"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(job.request_id, RequestId::Int(12));
        assert_eq!(job.language_or("en"), "de");
        assert_eq!(job.operation(), "tone");
    }

    #[test]
    fn test_decode_double_encoded_payload() {
        let inner = json!({"sentiments": ["good", "bad"]}).to_string();
        let file = json!({"Payload": inner}).to_string();
        assert_eq!(decode_payload(&file).unwrap(), json!(["good", "bad"]));
    }

    #[test]
    fn test_decode_payload_errors() {
        assert!(matches!(
            decode_payload(r#"{"payload": "{}"}"#),
            Err(JobError::MissingField("Payload"))
        ));
        assert!(matches!(
            decode_payload(r#"{"Payload": {"sentiments": []}}"#),
            Err(JobError::InvalidField { field: "Payload", .. })
        ));
        assert!(matches!(
            decode_payload(r#"{"Payload": "{\"texts\": []}"}"#),
            Err(JobError::MissingField("sentiments"))
        ));
        assert!(matches!(decode_payload("{"), Err(JobError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_documents(Path::new("/nonexistent/senti/job.json")).unwrap_err();
        assert!(matches!(err, JobError::Io { .. }));
    }

    #[test]
    fn test_submission_wire_shape() {
        let job = job();
        let value = serde_json::to_value(Submission::completed(&job, Vec::new(), &[])).unwrap();
        assert_eq!(
            value,
            json!({
                "result": {"code": 200, "message": "completed", "error": "", "data": []},
                "requestID": "req-9",
                "status": "completed",
                "operation": "sentiment"
            })
        );

        let failed = Submission::failed(&job, 400, "Model for language code 'xx' not found");
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.result.code, 400);
        assert_eq!(failed.result.message, "failed");
        assert!(failed.result.data.is_empty());
    }

    #[test]
    fn test_completed_joins_failures() {
        let submission = Submission::completed(&job(), Vec::new(), &["batch 0 failed", "batch 3 failed"]);
        assert_eq!(submission.result.error, "batch 0 failed; batch 3 failed");
    }
}
