//! Binding resources into a knowledge base
//!
//! For every chunk of the resource: fetch its text, embed it with the
//! knowledge base's embedding model, ask the reasoning model for a
//! contextual summary, store the vector object, and record the binding row.
//! A failed LLM call fails the whole binding; the caller retries, and the
//! prologue delete makes the retry idempotent.

use crate::service::KnowledgeService;
use corpora_common::errors::{AppError, Result};
use corpora_common::object_store::parse_ref;
use corpora_common::vector::{class_name, VectorProperties};
use tracing::{info, instrument};

/// System message for chunk summarization
pub const SUMMARIZER_SYSTEM: &str = "You are a text summarizer. Generate a brief, \
informative description of the given text content.";

impl KnowledgeService {
    /// Bind every chunk of a resource into a knowledge base.
    #[instrument(skip(self))]
    pub async fn add_resource_to_kb(&self, kb_id: &str, resource_id: i64) -> Result<()> {
        let kb = self.require_kb(kb_id).await?;

        let resource = self
            .repo()
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("resource", resource_id))?;

        let chunks = self.repo().chunks_by_resource(resource_id).await?;

        let class = class_name(kb_id);
        self.vector_store().ensure_class(&class).await?;

        // Drop whatever a previous (possibly interrupted) binding left
        // behind, so redelivered work converges instead of duplicating.
        self.vector_store()
            .delete_by_resource(&class, resource_id)
            .await?;
        self.repo().delete_bindings(kb_id, resource_id).await?;

        for chunk in &chunks {
            let (bucket, key) = parse_ref(&chunk.storage_url)?;
            let bytes = self.object_store().get(bucket, key).await?;
            let content = String::from_utf8_lossy(&bytes).into_owned();

            let embedding = self.llm().embed(&kb.embedding_model, &content).await?;
            let summary = self
                .llm()
                .generate(&kb.reasoning_model, SUMMARIZER_SYSTEM, &content, None)
                .await?;

            let title = format!("{} - Part {}", resource.filename, chunk.chunk_order);

            self.vector_store()
                .upsert_one(
                    &class,
                    &embedding,
                    &VectorProperties {
                        content,
                        summary: summary.clone(),
                        resource_id,
                        chunk_id: chunk.id,
                        order: chunk.chunk_order,
                        title: title.clone(),
                    },
                )
                .await?;

            self.repo()
                .create_binding(kb_id, resource_id, chunk.id, &title, &summary)
                .await?;
        }

        info!(kb_id, resource_id, chunks = chunks.len(), "Resource bound to knowledge base");
        Ok(())
    }
}
