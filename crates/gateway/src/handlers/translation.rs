//! Translation job submission

use axum::{extract::State, http::StatusCode, Json};
use corpora_common::errors::{AppError, Result};
use corpora_common::jobs::{TranslationPayload, TASK_TYPE_TRANSLATION};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    #[validate(length(min = 1))]
    pub text_id: String,

    #[validate(length(min = 1))]
    pub source_language: String,

    #[validate(length(min = 1))]
    pub target_language: String,

    #[serde(default)]
    pub country: String,

    #[serde(default = "default_provider")]
    pub model_provider: String,

    #[validate(length(min = 1))]
    pub model: String,
}

fn default_provider() -> String {
    "ollama".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

/// Enqueue an asynchronous translation job
pub async fn translate(
    State(state): State<AppState>,
    Json(request): Json<TranslationRequest>,
) -> Result<(StatusCode, Json<TranslationResponse>)> {
    request.validate().map_err(|e| AppError::InvalidRequest {
        message: e.to_string(),
    })?;

    if request.model_provider != "ollama" {
        return Err(AppError::invalid(format!(
            "unsupported model provider: {}",
            request.model_provider
        )));
    }

    let payload = TranslationPayload {
        source_language: request.source_language,
        target_language: request.target_language,
        country: request.country,
        target_resource_id: request.text_id,
        use_service: request.model_provider,
        use_model: request.model,
    };

    let job = state
        .jobs
        .enqueue(TASK_TYPE_TRANSLATION, serde_json::to_value(&payload)?)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TranslationResponse {
            job_id: job.id.to_string(),
            status: "accepted".to_string(),
            message: "Translation job created successfully".to_string(),
        }),
    ))
}
