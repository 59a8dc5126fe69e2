//! Source document upload and listing

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use corpora_common::db::models::Resource;
use corpora_common::errors::{AppError, Result};
use corpora_common::object_store::format_ref;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    10
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub id: i64,
    pub filename: String,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub resources: Vec<Resource>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
    pub total: u64,
}

/// Upload a PDF and create its resource record
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
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

    tracing::info!(resource_id = resource.id, filename = %resource.filename, "Resource uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: resource.id,
            filename: resource.filename,
        }),
    ))
}

/// List uploaded resources with pagination
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let (resources, total) = state.repo.list_resources(query.limit, query.offset).await?;

    Ok(Json(ListResponse {
        resources,
        pagination: Pagination {
            limit: query.limit,
            offset: query.offset,
            total,
        },
    }))
}
