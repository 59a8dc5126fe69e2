//! Knowledge-base search handler

use axum::{
    extract::{Path, State},
    Json,
};
use corpora_common::errors::{AppError, Result};
use corpora_search::{RetrievalMode, SearchRequest, SearchResult, DEFAULT_K};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub query: String,

    #[serde(default)]
    pub resource_ids: Vec<String>,

    #[serde(default)]
    pub use_hybrid: bool,

    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

/// Search a knowledge base in dense or hybrid mode
pub async fn search(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SearchBody>,
) -> Result<Json<Vec<SearchResult>>> {
    let kb = state.knowledge.require_kb(&id).await?;

    let mut resource_ids = Vec::with_capacity(body.resource_ids.len());
    for raw in &body.resource_ids {
        resource_ids.push(raw.parse::<i64>().map_err(|_| {
            AppError::invalid(format!("invalid resource ID: {}", raw))
        })?);
    }

    let mode = if body.use_hybrid {
        RetrievalMode::Hybrid
    } else {
        RetrievalMode::Dense
    };

    let mut request = SearchRequest::new(id, body.query, mode);
    request.resource_ids = resource_ids;
    request.k = body.k;

    let results = state
        .knowledge
        .engine()
        .search(&kb.embedding_model, &request)
        .await?;

    Ok(Json(results))
}
