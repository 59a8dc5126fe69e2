//! Retrieval-augmented chat handlers

use axum::{
    extract::{Query, State},
    Json,
};
use corpora_common::db::models::ChatMessage;
use corpora_common::errors::{AppError, Result};
use corpora_knowledge::ChatTurn;
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub knowledge_base_id: String,

    #[serde(default)]
    pub resource_ids: Vec<String>,

    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub session_id: String,
}

/// Answer the last user message with retrieved context
pub async fn completions(
    State(state): State<AppState>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<ChatMessage>> {
    let mut resource_ids = Vec::with_capacity(request.resource_ids.len());
    for raw in &request.resource_ids {
        resource_ids.push(raw.parse::<i64>().map_err(|_| {
            AppError::invalid(format!("invalid resource ID: {}", raw))
        })?);
    }

    let reply = state
        .chat
        .generate_completion(&request.knowledge_base_id, &resource_ids, &request.messages)
        .await?;

    Ok(Json(reply))
}

/// Chat history for a session
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>> {
    Ok(Json(state.chat.get_history(&query.session_id).await?))
}
