//! Translation task handler
//!
//! Translates every chunk of a resource through the reflection flow and
//! persists the translated chunks plus the assembled document. The prologue
//! deletes prior translations for the same (resource, target language), so
//! redelivered jobs converge on exactly one set of artifacts.

use crate::tasks::TaskHandler;
use async_trait::async_trait;
use corpora_common::config::ObjectStoreConfig;
use corpora_common::db::Repository;
use corpora_common::errors::{AppError, Result};
use corpora_common::jobs::{TranslationPayload, TASK_TYPE_TRANSLATION};
use corpora_common::llm::LlmClient;
use corpora_common::object_store::{format_ref, parse_ref, ObjectStore};
use corpora_translation::TranslationFlow;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct TranslationTask {
    repo: Repository,
    store: Arc<dyn ObjectStore>,
    llm: Arc<dyn LlmClient>,
    chunks_bucket: String,
    resources_bucket: String,
}

impl TranslationTask {
    pub fn new(
        repo: Repository,
        store: Arc<dyn ObjectStore>,
        llm: Arc<dyn LlmClient>,
        config: &ObjectStoreConfig,
    ) -> Self {
        Self {
            repo,
            store,
            llm,
            chunks_bucket: config.translated_chunks_bucket.clone(),
            resources_bucket: config.translated_resources_bucket.clone(),
        }
    }

    /// Remove prior translations of this resource into the target language,
    /// chunks before resources. Blob deletions are best-effort; keys are
    /// deterministic and will be overwritten.
    async fn cleanup_existing(&self, resource_id: i64, target_lang: &str) -> Result<()> {
        let existing = self
            .repo
            .translated_resources_by_original(resource_id, Some(target_lang))
            .await?;

        for translated in existing {
            for chunk in self.repo.translated_chunks_by_resource(translated.id).await? {
                self.delete_blob_best_effort(&chunk.storage_url).await;
            }
            self.repo.delete_translated_chunks(translated.id).await?;

            self.delete_blob_best_effort(&translated.storage_url).await;
            self.repo.delete_translated_resource(translated.id).await?;
        }

        Ok(())
    }

    async fn delete_blob_best_effort(&self, storage_url: &str) {
        let (bucket, key) = match parse_ref(storage_url) {
            Ok(parts) => parts,
            Err(_) => {
                warn!(url = %storage_url, "Skipping malformed storage reference");
                return;
            }
        };

        if let Err(e) = self.store.delete(bucket, key).await {
            warn!(url = %storage_url, error = %e, "Failed to delete prior translation blob");
        }
    }

    #[instrument(skip(self, payload), fields(resource_id = %payload.target_resource_id, target = %payload.target_language))]
    async fn translate_resource(&self, payload: TranslationPayload) -> Result<()> {
        let resource_id: i64 =
            payload
                .target_resource_id
                .parse()
                .map_err(|_| AppError::InvalidRequest {
                    message: format!("invalid resource ID: {}", payload.target_resource_id),
                })?;

        let resource = self
            .repo
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("resource", resource_id))?;

        self.store.ensure_bucket(&self.resources_bucket).await?;
        self.store.ensure_bucket(&self.chunks_bucket).await?;

        self.cleanup_existing(resource_id, &payload.target_language)
            .await?;

        let (_, resource_key) = parse_ref(&resource.storage_url)?;
        let translated_key = format!("{}_translated_{}", resource_key, payload.target_language);

        let translated_resource = self
            .repo
            .create_translated_resource(
                resource_id,
                &format!("{}_translated_{}", resource.filename, payload.target_language),
                &format_ref(&self.resources_bucket, &translated_key),
                &payload.source_language,
                &payload.target_language,
                &payload.country,
            )
            .await?;

        let chunks = self.repo.chunks_by_resource(resource_id).await?;

        let flow = TranslationFlow::new(self.llm.clone(), payload.use_model.as_str());

        // Chunks are translated in source order; the assembled document
        // preserves it.
        let mut translations = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let (bucket, key) = parse_ref(&chunk.storage_url)?;
            let content = self.store.get(bucket, key).await?;
            let content = String::from_utf8_lossy(&content).into_owned();

            let translated = flow
                .translate(
                    &content,
                    &payload.source_language,
                    &payload.target_language,
                    &payload.country,
                )
                .await?;

            let translated_chunk_key =
                format!("{}_translated_{}", key, payload.target_language);
            self.store
                .put(
                    &self.chunks_bucket,
                    &translated_chunk_key,
                    translated.clone().into_bytes(),
                )
                .await?;

            self.repo
                .create_translated_chunk(
                    translated_resource.id,
                    chunk.id,
                    &format!("{}_translated", chunk.external_chunk_id),
                    &format_ref(&self.chunks_bucket, &translated_chunk_key),
                )
                .await?;

            translations.push(translated);
        }

        self.store
            .put(
                &self.resources_bucket,
                &translated_key,
                translations.join("\n").into_bytes(),
            )
            .await?;

        info!(
            resource_id,
            chunks = chunks.len(),
            target = %payload.target_language,
            "Resource translated"
        );

        Ok(())
    }
}

#[async_trait]
impl TaskHandler for TranslationTask {
    fn task_type(&self) -> &'static str {
        TASK_TYPE_TRANSLATION
    }

    async fn handle(&self, payload: serde_json::Value) -> Result<()> {
        let payload: TranslationPayload =
            serde_json::from_value(payload).map_err(|e| AppError::InvalidRequest {
                message: format!("malformed translation payload: {}", e),
            })?;

        self.translate_resource(payload).await
    }
}
