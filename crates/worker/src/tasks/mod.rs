//! Per-task-type job handlers

mod translation;

pub use translation::TranslationTask;

use async_trait::async_trait;
use corpora_common::errors::{AppError, Result};
use corpora_common::jobs::TestPayload;
use tracing::info;

/// A handler for one task type
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task type this handler serves
    fn task_type(&self) -> &'static str;

    /// Process one job payload
    async fn handle(&self, payload: serde_json::Value) -> Result<()>;
}

/// Debug no-op task: logs a payload field and succeeds
pub struct TestTask;

#[async_trait]
impl TaskHandler for TestTask {
    fn task_type(&self) -> &'static str {
        corpora_common::jobs::TASK_TYPE_TEST
    }

    async fn handle(&self, payload: serde_json::Value) -> Result<()> {
        let payload: TestPayload =
            serde_json::from_value(payload).map_err(|e| AppError::InvalidRequest {
                message: format!("malformed test payload: {}", e),
            })?;

        info!(print = %payload.print, "Test job executed");
        Ok(())
    }
}
