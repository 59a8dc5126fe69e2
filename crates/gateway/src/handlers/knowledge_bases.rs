//! Knowledge-base lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use corpora_common::db::models::KnowledgeBase;
use corpora_common::errors::{AppError, Result};
use corpora_knowledge::KbSummary;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateKbRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub embedding_model: Option<String>,

    pub reasoning_model: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbResponse {
    pub id: String,
    pub name: String,
    pub embedding_model: String,
    pub reasoning_model: String,
    pub created_at: String,
}

impl From<KnowledgeBase> for KbResponse {
    fn from(kb: KnowledgeBase) -> Self {
        Self {
            id: kb.id,
            name: kb.name,
            embedding_model: kb.embedding_model,
            reasoning_model: kb.reasoning_model,
            created_at: kb.created_at.to_rfc3339(),
        }
    }
}

/// List all knowledge bases
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<KbResponse>>> {
    let kbs = state.knowledge.list_kbs().await?;
    Ok(Json(kbs.into_iter().map(Into::into).collect()))
}

/// Create a knowledge base
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateKbRequest>,
) -> Result<(StatusCode, Json<KbResponse>)> {
    request.validate().map_err(|e| AppError::InvalidRequest {
        message: e.to_string(),
    })?;

    let kb = state
        .knowledge
        .create_kb(
            &request.name,
            request.embedding_model,
            request.reasoning_model,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(kb.into())))
}

/// Delete a knowledge base and its vector class
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.knowledge.delete_kb(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Aggregate figures for a knowledge base
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<KbSummary>> {
    Ok(Json(state.knowledge.kb_summary(&id).await?))
}
