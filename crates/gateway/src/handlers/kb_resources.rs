//! Knowledge-base resource handlers
//!
//! Uploading a resource into a knowledge base runs the full pipeline in one
//! request: store the file, extract chunks, then embed and bind them.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use corpora_common::db::models::Resource;
use corpora_common::errors::{AppError, Result};
use corpora_common::object_store::format_ref;
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbResourceResponse {
    pub id: i64,
    pub filename: String,
    pub chunk_count: usize,
}

/// List resources bound into a knowledge base
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Resource>>> {
    state.knowledge.require_kb(&id).await?;

    let mut resources = Vec::new();
    for resource_id in state.repo.resource_ids_in_kb(&id).await? {
        if let Some(resource) = state.repo.find_resource_by_id(resource_id).await? {
            resources.push(resource);
        }
    }

    Ok(Json(resources))
}

/// Upload a document into a knowledge base: store, extract, embed, bind
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<KbResourceResponse>)> {
    state.knowledge.require_kb(&id).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::invalid("file field has no filename"))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid(format!("failed to read file: {}", e)))?;

        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| AppError::invalid("no file uploaded"))?;
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::invalid("only PDF files are allowed"));
    }

    let bucket = &state.config.object_store.pdf_bucket;
    let key = format!("{}.pdf", Uuid::new_v4());
    state.store.put(bucket, &key, data).await?;

    let resource = state
        .repo
        .create_resource(&filename, &format_ref(bucket, &key))
        .await?;

    let chunks = state.pipeline.reindex_resource(resource.id).await?;
    state.knowledge.add_resource_to_kb(&id, resource.id).await?;

    tracing::info!(
        kb_id = %id,
        resource_id = resource.id,
        chunks = chunks.len(),
        "Resource ingested into knowledge base"
    );

    Ok((
        StatusCode::CREATED,
        Json(KbResourceResponse {
            id: resource.id,
            filename: resource.filename,
            chunk_count: chunks.len(),
        }),
    ))
}

/// Remove a resource and everything derived from it
pub async fn remove(
    State(state): State<AppState>,
    Path((id, resource_id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    state.knowledge.require_kb(&id).await?;
    state.knowledge.delete_resource(&id, resource_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
