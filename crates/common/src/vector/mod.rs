//! Vector store abstraction
//!
//! Each knowledge base owns one *class* — a named, isolated collection of
//! vector objects. The backing implementation keeps all classes in a single
//! pgvector table scoped by a `class_name` column, with a tsvector column
//! providing the lexical index, so class lifecycle and lexical index
//! lifecycle are coupled by construction.

mod pgvector;

pub use pgvector::PgVectorStore;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default maximum number of query results
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Vector class name for a knowledge base
pub fn class_name(kb_id: &str) -> String {
    format!("KnowledgeBase_{}", kb_id)
}

/// Domain properties stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorProperties {
    pub content: String,
    pub summary: String,
    pub resource_id: i64,
    pub chunk_id: i64,
    pub order: i32,
    pub title: String,
}

/// A single search hit
#[derive(Debug, Clone)]
pub struct VectorHit {
    /// Store-generated object ID
    pub id: Uuid,
    /// Distance for dense queries, fused score for hybrid queries
    pub score: f64,
    /// 1 - distance/2 for cosine distance
    pub certainty: f64,
    pub properties: VectorProperties,
}

/// Dense query options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Maximum results; defaults to [`DEFAULT_QUERY_LIMIT`]
    pub limit: Option<usize>,
    /// Optional maximum cosine distance
    pub distance: Option<f64>,
    /// Optional minimum certainty; converted to a distance bound
    pub certainty: Option<f64>,
}

/// Hybrid query options
#[derive(Debug, Clone)]
pub struct HybridOptions {
    /// Text query for the lexical leg
    pub query_text: String,
    /// Weight of the vector leg in [0, 1]; the lexical leg gets `1 - alpha`
    pub alpha: f64,
    pub limit: Option<usize>,
}

impl HybridOptions {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            alpha: 0.75,
            limit: None,
        }
    }
}

/// Outcome of a batch upsert; failures are reported per object
#[derive(Debug, Default)]
pub struct BatchUpsert {
    pub ids: Vec<Uuid>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug)]
pub struct BatchFailure {
    /// Index of the failed object in the input batch
    pub index: usize,
    pub message: String,
}

/// Trait for vector storage and search
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the class if missing; an existing class is success
    async fn ensure_class(&self, class: &str) -> Result<()>;

    /// Drop the class and every object in it
    async fn delete_class(&self, class: &str) -> Result<()>;

    /// Insert a single vector object, returning its generated ID
    async fn upsert_one(
        &self,
        class: &str,
        vector: &[f32],
        properties: &VectorProperties,
    ) -> Result<Uuid>;

    /// Insert a batch; per-object failures are surfaced in the result
    async fn upsert_batch(
        &self,
        class: &str,
        objects: &[(Vec<f32>, VectorProperties)],
    ) -> Result<BatchUpsert>;

    /// Nearest-neighbor query, ordered by ascending distance
    async fn query_dense(
        &self,
        class: &str,
        vector: &[f32],
        options: &QueryOptions,
    ) -> Result<Vec<VectorHit>>;

    /// BM25-style lexical query, ordered by descending rank
    async fn query_lexical(&self, class: &str, query: &str, limit: usize)
        -> Result<Vec<VectorHit>>;

    /// Alpha-weighted fusion of the dense and lexical legs, ordered by
    /// descending hybrid score
    async fn query_hybrid(
        &self,
        class: &str,
        vector: &[f32],
        options: &HybridOptions,
    ) -> Result<Vec<VectorHit>>;

    /// Delete one object by its store-generated ID
    async fn delete_by_id(&self, class: &str, id: Uuid) -> Result<()>;

    /// Delete every object of a resource within a class
    async fn delete_by_resource(&self, class: &str, resource_id: i64) -> Result<u64>;

    /// Number of objects in a class
    async fn count(&self, class: &str) -> Result<u64>;

    /// Total content bytes stored in a class
    async fn total_content_bytes(&self, class: &str) -> Result<u64>;

    /// Check store connectivity
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("research"), "KnowledgeBase_research");
    }
}
