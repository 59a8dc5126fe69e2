//! Knowledge-base service
//!
//! Composes the metadata store, object store, vector store, LLM gateway and
//! retrieval engine into the public knowledge-base operations: lifecycle,
//! resource binding, querying, chat composition and health.

mod binding;
mod chat;
mod health;
mod service;

pub use binding::SUMMARIZER_SYSTEM;
pub use chat::{format_prompt, ChatService, ChatTurn};
pub use health::{check_health, ComponentStatus, HealthComponents, HealthStatus};
pub use service::{KbSummary, KnowledgeService, KbQueryResult};
