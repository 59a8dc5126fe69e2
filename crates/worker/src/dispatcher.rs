//! Job dispatch state machine
//!
//! Per message: decode, look up the job, claim it with a compare-and-set on
//! pending -> running, run the task handler under the retry middleware, and
//! record the terminal state. Every outcome acks the message; the broker
//! never requeues on nack, and duplicate envelopes die on the CAS.

use crate::retry::{recover_panic, run_with_retry};
use crate::tasks::TaskHandler;
use corpora_common::db::models::JobStatus;
use corpora_common::db::Repository;
use corpora_common::errors::{AppError, Result};
use corpora_common::jobs::JobMessage;
use corpora_common::metrics;
use corpora_common::queue::{Delivery, JobQueue};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};

pub struct Dispatcher {
    repo: Repository,
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
    max_retries: u32,
    initial_interval: Duration,
}

impl Dispatcher {
    pub fn new(repo: Repository, max_retries: u32, initial_interval: Duration) -> Self {
        Self {
            repo,
            handlers: HashMap::new(),
            max_retries,
            initial_interval,
        }
    }

    pub fn register(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(handler.task_type(), handler);
        self
    }

    /// Process one delivery end to end. The message is always acked; the
    /// job row is the durable record of the outcome.
    pub async fn handle_delivery(&self, queue: &JobQueue, delivery: Delivery) {
        let message: JobMessage = match JobQueue::parse(&delivery) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable message");
                metrics::record_job("unknown", "dropped");
                self.ack(queue, &delivery).await;
                return;
            }
        };

        let correlation_id = message
            .correlation_id
            .map(|id| id.to_string())
            .unwrap_or_default();
        let span = info_span!(
            "job",
            job_id = message.job_id,
            task_type = %message.task_type,
            correlation_id = %correlation_id
        );

        self.process_message(queue, &delivery, message)
            .instrument(span)
            .await;
    }

    async fn process_message(&self, queue: &JobQueue, delivery: &Delivery, message: JobMessage) {
        // Orphan envelopes must not loop forever.
        match self.repo.find_job_by_id(message.job_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("Dropping envelope for unknown job");
                metrics::record_job(&message.task_type, "dropped");
                self.ack(queue, delivery).await;
                return;
            }
            Err(e) => {
                // Leave the message for redelivery; the store may recover.
                error!(error = %e, "Failed to look up job");
                return;
            }
        }

        // Claim the job. Losing the CAS means another worker has it (or had
        // it); this copy of the envelope is done either way.
        match self
            .repo
            .transition_job(message.job_id, JobStatus::Pending, JobStatus::Running, None)
            .await
        {
            Ok(()) => {}
            Err(AppError::Conflict { .. }) => {
                info!("Job already claimed, dropping duplicate envelope");
                metrics::record_job(&message.task_type, "dropped");
                self.ack(queue, delivery).await;
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to claim job");
                self.ack(queue, delivery).await;
                return;
            }
        }

        let outcome = self.run_handler(&message).await;

        match outcome {
            Ok(()) => {
                if let Err(e) = self
                    .repo
                    .transition_job(
                        message.job_id,
                        JobStatus::Running,
                        JobStatus::Completed,
                        None,
                    )
                    .await
                {
                    error!(error = %e, "Failed to record job completion");
                }
                metrics::record_job(&message.task_type, "completed");
                info!("Job completed");
            }
            Err(e) => {
                if let Err(update_err) = self
                    .repo
                    .transition_job(
                        message.job_id,
                        JobStatus::Running,
                        JobStatus::Failed,
                        Some(e.to_string()),
                    )
                    .await
                {
                    error!(error = %update_err, "Failed to record job failure");
                }
                metrics::record_job(&message.task_type, "failed");
                error!(error = %e, "Job failed");
            }
        }

        self.ack(queue, delivery).await;
    }

    /// Run the task handler with panic isolation and bounded retries.
    async fn run_handler(&self, message: &JobMessage) -> Result<()> {
        let handler = self
            .handlers
            .get(message.task_type.as_str())
            .cloned()
            .ok_or_else(|| AppError::InvalidRequest {
                message: format!("unknown task type: {}", message.task_type),
            })?;

        run_with_retry(self.max_retries, self.initial_interval, || {
            let handler = handler.clone();
            let payload = message.payload.clone();
            async move {
                tokio::spawn(async move { handler.handle(payload).await })
                    .await
                    .map_err(recover_panic)?
            }
        })
        .await
    }

    async fn ack(&self, queue: &JobQueue, delivery: &Delivery) {
        if let Err(e) = queue.ack(&delivery.receipt_handle).await {
            error!(error = %e, "Failed to ack message");
        }
    }
}
