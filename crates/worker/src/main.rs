//! Corpora Job Worker
//!
//! Polls the jobs queue and drives each job through its task handler:
//! 1. Claims the job with a compare-and-set on pending -> running
//! 2. Runs the per-task-type handler under the retry middleware
//! 3. Records the terminal state before acking the message

mod dispatcher;
mod retry;
mod tasks;

use crate::dispatcher::Dispatcher;
use crate::retry::DEFAULT_INITIAL_INTERVAL;
use crate::tasks::{TestTask, TranslationTask};
use corpora_common::config::AppConfig;
use corpora_common::db::{DbPool, Repository};
use corpora_common::llm::OllamaClient;
use corpora_common::metrics;
use corpora_common::object_store::{ObjectStore, S3ObjectStore};
use corpora_common::queue::JobQueue;
use corpora_common::VERSION;
use std::sync::Arc;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting Corpora worker v{}", VERSION);

    let config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    metrics::register_metrics();

    info!("Connecting to database...");
    let db = DbPool::new(&config.postgres, &config.database_url()).await?;
    let repo = Repository::new(db);

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.object_store));
    let llm = Arc::new(OllamaClient::new(&config.llm));

    let queue = JobQueue::new(&config.queue).await?;

    let dispatcher = Dispatcher::new(
        repo.clone(),
        config.queue.max_retries,
        DEFAULT_INITIAL_INTERVAL,
    )
    .register(Arc::new(TestTask))
    .register(Arc::new(TranslationTask::new(
        repo,
        store,
        llm,
        &config.object_store,
    )));

    info!("Worker ready, polling for jobs...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            result = queue.receive() => {
                match result {
                    Ok(deliveries) => {
                        for delivery in deliveries {
                            dispatcher.handle_delivery(&queue, delivery).await;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to receive messages");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    info!("Worker shutting down");
    Ok(())
}
