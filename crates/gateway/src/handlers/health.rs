//! Health endpoint

use axum::{extract::State, Json};
use corpora_knowledge::{check_health, HealthStatus};

use crate::AppState;

/// Report component health: metadata store, vector store, LLM gateway
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(check_health(&state.repo, &state.vector, &state.llm).await)
}
