//! Fixed-interval poll loop
//!
//! Each cycle polls the queue once, runs at most one job through the
//! pipeline and submits exactly one result for it. Cycles never overlap: a
//! slow job delays the next poll.

use crate::error::{Result, WorkerError};
use crate::pipeline::{failure_messages, translate_all, SentimentPipeline};
use crate::queue::{load_documents, JobDescriptor, QueueClient, RequestId, Submission};
use crate::types::ScoredDocument;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Queue had no job
    Idle,
    /// Job scored and a `completed` result submitted
    Completed {
        request_id: RequestId,
        records: usize,
        failed_chunks: usize,
    },
    /// Job failed as a whole and a `failed` result submitted
    Failed { request_id: RequestId },
}

/// Queue worker
pub struct Worker {
    client: QueueClient,
    pipeline: Arc<SentimentPipeline>,
    poll_interval: Duration,
    default_language: String,
}

impl Worker {
    pub fn new(
        client: QueueClient,
        pipeline: SentimentPipeline,
        poll_interval: Duration,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            client,
            pipeline: Arc::new(pipeline),
            poll_interval,
            default_language: default_language.into(),
        }
    }

    /// Poll once and process the job, if any
    ///
    /// Job-level failures are submitted to the queue and reported as
    /// [`CycleOutcome::Failed`]; only transport errors come back as `Err`.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Some(job) = self.client.poll().await? else {
            return Ok(CycleOutcome::Idle);
        };

        let language = job.language_or(&self.default_language).to_string();
        info!(
            request_id = %job.request_id,
            location = %job.location.display(),
            language = %language,
            operation = job.operation(),
            "Job received"
        );

        let started = Instant::now();
        let (submission, outcome) = match self.process(&job, language).await {
            Ok(scored) => {
                let records = translate_all(&scored);
                let failures = failure_messages(&scored);
                let outcome = CycleOutcome::Completed {
                    request_id: job.request_id.clone(),
                    records: records.len(),
                    failed_chunks: failures.len(),
                };
                (Submission::completed(&job, records, &failures), outcome)
            }
            Err(err) => {
                warn!(
                    request_id = %job.request_id,
                    code = err.status_code(),
                    error = %err,
                    "Job failed"
                );
                let submission = Submission::failed(&job, err.status_code(), &err);
                let outcome = CycleOutcome::Failed {
                    request_id: job.request_id.clone(),
                };
                (submission, outcome)
            }
        };

        self.client.submit(&submission).await?;

        info!(
            request_id = %job.request_id,
            status = submission.status.as_str(),
            records = submission.result.data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job finished"
        );
        Ok(outcome)
    }

    /// Load the payload and score it off the async runtime
    async fn process(&self, job: &JobDescriptor, language: String) -> Result<Vec<ScoredDocument>> {
        let pipeline = Arc::clone(&self.pipeline);
        let location = job.location.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<ScoredDocument>> {
            let sentiments = load_documents(&location)?;
            Ok(pipeline.run_value(&sentiments, &language)?)
        })
        .await?
    }

    /// Run cycles until `shutdown` resolves
    ///
    /// Errors are logged and the loop carries on after the poll interval.
    /// Shutdown is observed between cycles, never mid-job.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            endpoint = self.client.endpoint(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            languages = ?self.pipeline.registry().languages(),
            "Worker started"
        );

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => debug!("No pending job"),
                Ok(outcome) => debug!(?outcome, "Cycle finished"),
                Err(err) => log_cycle_error(&err),
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, worker stopped");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

fn log_cycle_error(err: &WorkerError) {
    match err {
        WorkerError::Transport(_) => warn!(error = %err, "Queue unavailable"),
        _ => error!(error = %err, "Poll cycle failed"),
    }
}
