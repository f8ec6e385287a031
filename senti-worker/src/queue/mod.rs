//! Job queue protocol: polling, payload files, result submission

pub mod client;
pub mod job;

pub use client::{QueueClient, TransportError};
pub use job::{
    load_documents, JobDescriptor, JobError, JobStatus, RequestId, Submission, SubmissionResult,
};
