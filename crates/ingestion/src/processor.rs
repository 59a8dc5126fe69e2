//! Ingestion pipeline
//!
//! Strictly sequential per resource and idempotent on re-entry: prior chunk
//! blobs are deleted best-effort (their keys will be overwritten anyway),
//! prior chunk rows are removed in one statement, then extraction output is
//! persisted under deterministic keys.

use crate::extractor::{Element, ExtractorClient};
use corpora_common::db::models::Chunk;
use corpora_common::db::Repository;
use corpora_common::errors::{AppError, Result};
use corpora_common::metrics;
use corpora_common::object_store::{format_ref, parse_ref, ObjectStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Deterministic object key for a chunk: `<stem>_<external_chunk_id>.txt`
pub fn chunk_object_key(filename: &str, external_chunk_id: &str) -> String {
    let stem = filename
        .rsplit('/')
        .next()
        .unwrap_or(filename)
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    format!("{}_{}.txt", stem, external_chunk_id)
}

/// Resource (re)indexing pipeline
pub struct IngestPipeline {
    store: Arc<dyn ObjectStore>,
    repo: Repository,
    extractor: ExtractorClient,
    chunks_bucket: String,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        repo: Repository,
        extractor: ExtractorClient,
        chunks_bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            repo,
            extractor,
            chunks_bucket: chunks_bucket.into(),
        }
    }

    /// Extract a resource into chunks, replacing any prior extraction.
    ///
    /// Serialization per resource is the caller's responsibility.
    #[instrument(skip(self))]
    pub async fn reindex_resource(&self, resource_id: i64) -> Result<Vec<Chunk>> {
        let started = Instant::now();

        let resource = self
            .repo
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::not_found("resource", resource_id))?;

        // Step 1: load source bytes.
        let (bucket, key) = parse_ref(&resource.storage_url)?;
        let content = self.store.get(bucket, key).await?;

        // Step 2: quiesce prior derivations. Blob deletes are best-effort;
        // the keys are deterministic and will be overwritten below.
        let existing = self.repo.chunks_by_resource(resource_id).await?;
        for chunk in &existing {
            let (bucket, key) = match parse_ref(&chunk.storage_url) {
                Ok(parts) => parts,
                Err(_) => {
                    warn!(chunk_id = chunk.id, url = %chunk.storage_url, "Skipping malformed chunk reference");
                    continue;
                }
            };
            if let Err(e) = self.store.delete(bucket, key).await {
                warn!(chunk_id = chunk.id, error = %e, "Failed to delete prior chunk blob");
            }
        }
        self.repo.delete_chunks_by_resource(resource_id).await?;

        // Step 3: extract.
        let elements = self.extractor.extract(&resource.filename, content).await?;

        // Step 4: persist non-empty elements. The external id keeps the
        // element's slot among all returned elements; order renumbers the
        // kept ones 1..n.
        self.store.ensure_bucket(&self.chunks_bucket).await?;

        let mut chunks = Vec::new();
        for planned in plan_chunks(&elements) {
            let key = chunk_object_key(&resource.filename, &planned.external_chunk_id);
            let text = &elements[planned.element_index].text;

            self.store
                .put(&self.chunks_bucket, &key, text.clone().into_bytes())
                .await?;

            let chunk = self
                .repo
                .create_chunk(
                    resource_id,
                    &planned.external_chunk_id,
                    &format_ref(&self.chunks_bucket, &key),
                    planned.order,
                )
                .await?;

            chunks.push(chunk);
        }

        metrics::record_ingestion(started.elapsed().as_secs_f64(), chunks.len());
        info!(
            resource_id,
            elements = elements.len(),
            chunks = chunks.len(),
            "Resource reindexed"
        );

        Ok(chunks)
    }
}

/// Identity of one chunk to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    /// Index into the element list
    pub element_index: usize,
    /// Keeps the element's 1-based slot among all elements, empty ones
    /// included
    pub external_chunk_id: String,
    /// Renumbered 1..n over the kept elements
    pub order: i32,
}

/// Plan chunk identities for an element list, skipping empty elements
pub fn plan_chunks(elements: &[Element]) -> Vec<PlannedChunk> {
    let mut plan: Vec<PlannedChunk> = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        if element.text.is_empty() {
            continue;
        }
        plan.push(PlannedChunk {
            element_index: index,
            external_chunk_id: format!("chunk_{}", index + 1),
            order: plan.len() as i32 + 1,
        });
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ElementMetadata;

    fn element(text: &str) -> Element {
        Element {
            element_type: "NarrativeText".into(),
            text: text.into(),
            element_id: "e".into(),
            metadata: ElementMetadata::default(),
        }
    }

    #[test]
    fn test_chunk_object_key() {
        assert_eq!(chunk_object_key("report.pdf", "chunk_1"), "report_chunk_1.txt");
        assert_eq!(chunk_object_key("no-extension", "chunk_2"), "no-extension_chunk_2.txt");
        assert_eq!(chunk_object_key("a.b.pdf", "chunk_3"), "a.b_chunk_3.txt");
    }

    #[test]
    fn test_plan_skips_empty_elements_and_renumbers_order() {
        let elements = vec![element("α"), element(""), element("β"), element("γ")];

        let plan = plan_chunks(&elements);
        let identities: Vec<(&str, i32)> = plan
            .iter()
            .map(|p| (p.external_chunk_id.as_str(), p.order))
            .collect();

        assert_eq!(
            identities,
            vec![("chunk_1", 1), ("chunk_3", 2), ("chunk_4", 3)]
        );
    }

    #[test]
    fn test_plan_all_empty_yields_no_chunks() {
        let elements = vec![element(""), element("")];
        assert!(plan_chunks(&elements).is_empty());
    }
}
