//! HTTP job queue client
//!
//! One endpoint serves both directions: `GET` polls for a pending job, `POST`
//! submits a result envelope.

use super::job::{JobDescriptor, Submission};
use senti_common::config::QueueConfig;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("senti-worker/", env!("CARGO_PKG_VERSION"));

/// Queue transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Queue refused a submission
    #[error("Queue rejected submission with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Poll response was not a job descriptor
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Job queue client
#[derive(Debug, Clone)]
pub struct QueueClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl QueueClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &QueueConfig) -> Result<Self, TransportError> {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the queue for a pending job
    ///
    /// Any non-200 status or an empty body means no job.
    pub async fn poll(&self) -> Result<Option<JobDescriptor>, TransportError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status_code = status.as_u16(), body = %body, "No job available");
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        JobDescriptor::from_poll_body(&body).map_err(|e| TransportError::Parse(e.to_string()))
    }

    /// Post a result envelope
    pub async fn submit(&self, submission: &Submission) -> Result<(), TransportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            request_id = %submission.request_id,
            status_code = status.as_u16(),
            "Result submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = QueueClient::new(
            "http://localhost:5001/api/SentimentRequest",
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_from_config_uses_endpoint() {
        let config = QueueConfig::default();
        let client = QueueClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), config.endpoint);
    }
}
