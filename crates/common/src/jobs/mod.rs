//! Asynchronous job protocol
//!
//! A job is a metadata row plus a canonical envelope published on the jobs
//! queue. The worker owns the status transitions; this module owns the wire
//! shapes and the enqueue half.

use crate::db::models::Job;
use crate::db::Repository;
use crate::errors::Result;
use crate::queue::JobQueue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Debug no-op task
pub const TASK_TYPE_TEST: &str = "test";
/// Reflection-based document translation task
pub const TASK_TYPE_TRANSLATION: &str = "translation";

/// Canonical message published to the jobs topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: i64,
    pub task_type: String,
    pub payload: serde_json::Value,
    /// Propagated through the worker's tracing span
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
}

/// Payload of the "test" task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPayload {
    pub print: String,
}

/// Payload of the "translation" task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationPayload {
    pub source_language: String,
    pub target_language: String,
    pub country: String,
    /// Stringified resource ID of the document to translate
    pub target_resource_id: String,
    pub use_service: String,
    pub use_model: String,
}

/// Enqueue side of the job system
pub struct JobService {
    queue: Arc<JobQueue>,
    repo: Repository,
}

impl JobService {
    pub fn new(queue: Arc<JobQueue>, repo: Repository) -> Self {
        Self { queue, repo }
    }

    /// Create a pending job and publish its envelope. The returned job
    /// carries the broker-visible ID.
    pub async fn enqueue(&self, task_type: &str, payload: serde_json::Value) -> Result<Job> {
        let job = self.repo.create_job(task_type, payload.clone()).await?;

        let message = JobMessage {
            job_id: job.id,
            task_type: job.task_type.clone(),
            payload,
            correlation_id: Some(Uuid::new_v4()),
        };

        self.queue.send(&message).await?;

        info!(job_id = job.id, task_type = %job.task_type, "Job enqueued");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_round_trip() {
        let message = JobMessage {
            job_id: 7,
            task_type: TASK_TYPE_TRANSLATION.to_string(),
            payload: serde_json::json!({
                "source_language": "English",
                "target_language": "French",
                "country": "France",
                "target_resource_id": "42",
                "use_service": "ollama",
                "use_model": "phi4",
            }),
            correlation_id: Some(Uuid::new_v4()),
        };

        let json = serde_json::to_string(&message).unwrap();
        let parsed: JobMessage = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.job_id, 7);
        assert_eq!(parsed.task_type, TASK_TYPE_TRANSLATION);

        let payload: TranslationPayload = serde_json::from_value(parsed.payload).unwrap();
        assert_eq!(payload.target_resource_id, "42");
        assert_eq!(payload.use_service, "ollama");
    }

    #[test]
    fn test_envelope_without_correlation_id() {
        // Envelopes published by older builds have no correlation id.
        let parsed: JobMessage = serde_json::from_str(
            r#"{"job_id": 1, "task_type": "test", "payload": {"print": "hi"}}"#,
        )
        .unwrap();

        assert!(parsed.correlation_id.is_none());
    }
}
