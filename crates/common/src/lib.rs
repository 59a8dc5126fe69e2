//! Corpora Common Library
//!
//! Shared code for the Corpora services including:
//! - Database models and repository pattern
//! - Object store, vector store and LLM client abstractions
//! - Job queue and enqueue protocol
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod ids;
pub mod jobs;
pub mod llm;
pub mod metrics;
pub mod object_store;
pub mod queue;
pub mod vector;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};
pub use llm::LlmClient;
pub use object_store::ObjectStore;
pub use vector::VectorStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
