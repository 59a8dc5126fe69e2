//! Synchronous PDF-to-chunks conversion

use axum::{extract::State, http::StatusCode, Json};
use corpora_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub pdf_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

/// Extract a resource into chunks. Extraction runs synchronously; the
/// response still reports 202 with a conversion tag for API parity.
pub async fn convert(
    State(state): State<AppState>,
    Json(request): Json<ConversionRequest>,
) -> Result<(StatusCode, Json<ConversionResponse>)> {
    let resource_id: i64 = request
        .pdf_id
        .parse()
        .map_err(|_| AppError::invalid(format!("invalid PDF ID: {}", request.pdf_id)))?;

    let chunks = state.pipeline.reindex_resource(resource_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ConversionResponse {
            job_id: format!("conv_{}", resource_id),
            status: "completed".to_string(),
            message: format!("Successfully converted PDF into {} chunks", chunks.len()),
        }),
    ))
}
