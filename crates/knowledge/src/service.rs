//! Knowledge-base lifecycle and querying

use corpora_common::db::models::KnowledgeBase;
use corpora_common::db::Repository;
use corpora_common::errors::{AppError, Result};
use corpora_common::llm::LlmClient;
use corpora_common::object_store::{parse_ref, ObjectStore};
use corpora_common::vector::{class_name, VectorStore};
use corpora_search::{RetrievalEngine, RetrievalMode, SearchRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Aggregate figures for one knowledge base
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbSummary {
    pub name: String,
    pub resource_count: usize,
    pub total_bytes: u64,
    pub vector_count: u64,
    pub embedding_model: String,
    pub reasoning_model: String,
}

/// One hydrated result of a knowledge-base query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbQueryResult {
    pub chunk_id: i64,
    pub resource_id: i64,
    pub score: f64,
    pub content: String,
    pub summary: String,
    pub storage_url: String,
}

/// Knowledge-base operations
pub struct KnowledgeService {
    repo: Repository,
    store: Arc<dyn ObjectStore>,
    vector: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    engine: RetrievalEngine,
    default_embedding_model: String,
    default_reasoning_model: String,
}

impl KnowledgeService {
    pub fn new(
        repo: Repository,
        store: Arc<dyn ObjectStore>,
        vector: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
        default_embedding_model: impl Into<String>,
        default_reasoning_model: impl Into<String>,
    ) -> Self {
        let engine = RetrievalEngine::new(vector.clone(), llm.clone());
        Self {
            repo,
            store,
            vector,
            llm,
            engine,
            default_embedding_model: default_embedding_model.into(),
            default_reasoning_model: default_reasoning_model.into(),
        }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    /// Create a knowledge base and its vector class
    pub async fn create_kb(
        &self,
        name: &str,
        embedding_model: Option<String>,
        reasoning_model: Option<String>,
    ) -> Result<KnowledgeBase> {
        if name.trim().is_empty() {
            return Err(AppError::invalid("knowledge base name must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let embedding_model =
            embedding_model.unwrap_or_else(|| self.default_embedding_model.clone());
        let reasoning_model =
            reasoning_model.unwrap_or_else(|| self.default_reasoning_model.clone());

        let kb = self
            .repo
            .create_knowledge_base(&id, name, &embedding_model, &reasoning_model)
            .await?;

        self.vector.ensure_class(&class_name(&kb.id)).await?;

        info!(kb_id = %kb.id, name = %kb.name, "Knowledge base created");
        Ok(kb)
    }

    /// Fetch a knowledge base or fail with NotFound
    pub async fn require_kb(&self, id: &str) -> Result<KnowledgeBase> {
        self.repo
            .find_knowledge_base(id)
            .await?
            .ok_or_else(|| AppError::not_found("knowledge base", id))
    }

    pub async fn list_kbs(&self) -> Result<Vec<KnowledgeBase>> {
        self.repo.list_knowledge_bases().await
    }

    /// Delete a knowledge base: vector class first, then bindings, then the
    /// row, so a partial failure leaves only re-deletable derived state.
    #[instrument(skip(self))]
    pub async fn delete_kb(&self, id: &str) -> Result<()> {
        self.require_kb(id).await?;

        self.vector.delete_class(&class_name(id)).await?;
        self.repo.delete_bindings_by_kb(id).await?;
        self.repo.delete_knowledge_base(id).await?;

        info!(kb_id = %id, "Knowledge base deleted");
        Ok(())
    }

    /// Aggregate figures for a knowledge base
    pub async fn kb_summary(&self, id: &str) -> Result<KbSummary> {
        let kb = self.require_kb(id).await?;
        let class = class_name(id);

        let resource_count = self.repo.resource_ids_in_kb(id).await?.len();
        let vector_count = self.vector.count(&class).await?;
        let total_bytes = self.vector.total_content_bytes(&class).await?;

        Ok(KbSummary {
            name: kb.name,
            resource_count,
            total_bytes,
            vector_count,
            embedding_model: kb.embedding_model,
            reasoning_model: kb.reasoning_model,
        })
    }

    /// Query a knowledge base in dense mode and hydrate chunk content from
    /// the object store.
    #[instrument(skip(self, query))]
    pub async fn query_kb(&self, kb_id: &str, query: &str, k: usize) -> Result<Vec<KbQueryResult>> {
        let kb = self.require_kb(kb_id).await?;

        let mut request = SearchRequest::new(kb_id, query, RetrievalMode::Dense);
        request.k = k;

        let results = self.engine.search(&kb.embedding_model, &request).await?;

        let mut hydrated = Vec::with_capacity(results.len());
        for result in results {
            let chunk = match self.repo.find_chunk_by_id(result.chunk_id).await? {
                Some(chunk) => chunk,
                None => {
                    // The vector store may briefly trail the metadata store.
                    warn!(chunk_id = result.chunk_id, "Search hit without a chunk row");
                    continue;
                }
            };

            let (bucket, key) = parse_ref(&chunk.storage_url)?;
            let content = self.store.get(bucket, key).await?;

            hydrated.push(KbQueryResult {
                chunk_id: chunk.id,
                resource_id: chunk.resource_id,
                score: result.score,
                content: String::from_utf8_lossy(&content).into_owned(),
                summary: result.summary,
                storage_url: chunk.storage_url,
            });
        }

        Ok(hydrated)
    }

    /// Remove a resource and everything derived from it, derived stores
    /// first: vectors, bindings, translated chunks and resources, chunk
    /// blobs and rows, then the resource blob and row. Blob deletions are
    /// best-effort; re-running the cascade reconciles leftovers.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, kb_id: &str, resource_id: i64) -> Result<()> {
        let resource = self
            .repo
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("resource", resource_id))?;

        self.vector
            .delete_by_resource(&class_name(kb_id), resource_id)
            .await?;
        self.repo.delete_bindings(kb_id, resource_id).await?;

        // Translated artifacts, chunks before resources.
        let translated = self
            .repo
            .translated_resources_by_original(resource_id, None)
            .await?;
        for tr in translated {
            for tc in self.repo.translated_chunks_by_resource(tr.id).await? {
                self.delete_blob_best_effort(&tc.storage_url).await;
            }
            self.repo.delete_translated_chunks(tr.id).await?;
            self.delete_blob_best_effort(&tr.storage_url).await;
            self.repo.delete_translated_resource(tr.id).await?;
        }

        for chunk in self.repo.chunks_by_resource(resource_id).await? {
            self.delete_blob_best_effort(&chunk.storage_url).await;
        }
        self.repo.delete_chunks_by_resource(resource_id).await?;

        self.delete_blob_best_effort(&resource.storage_url).await;
        self.repo.delete_resource(resource_id).await?;

        info!(kb_id, resource_id, "Resource deleted");
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
            warn!(url = %storage_url, error = %e, "Failed to delete blob");
        }
    }
}
