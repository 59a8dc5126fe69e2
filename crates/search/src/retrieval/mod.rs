//! Retrieval types and engine

pub mod fusion;

use corpora_common::errors::Result;
use corpora_common::llm::LlmClient;
use corpora_common::metrics;
use corpora_common::vector::{class_name, QueryOptions, VectorHit, VectorStore};
use fusion::WeightedRrf;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Default number of results
pub const DEFAULT_K: usize = 5;

/// Upper bound on the number of results
pub const MAX_K: usize = 20;

/// Retrieval mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Vector similarity only
    Dense,
    /// Fused vector + lexical
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Dense => "dense",
            RetrievalMode::Hybrid => "hybrid",
        }
    }
}

/// Search request parameters
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub kb_id: String,

    /// Restrict results to these resources; empty means no restriction
    pub resource_ids: Vec<i64>,

    pub query: String,

    pub mode: RetrievalMode,

    /// Number of results to return, capped at [`MAX_K`]
    pub k: usize,
}

impl SearchRequest {
    pub fn new(kb_id: impl Into<String>, query: impl Into<String>, mode: RetrievalMode) -> Self {
        Self {
            kb_id: kb_id.into(),
            resource_ids: Vec::new(),
            query: query.into(),
            mode,
            k: DEFAULT_K,
        }
    }
}

/// Position of a chunk within its resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkLocation {
    pub order: i32,
}

/// A single ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub content: String,
    pub summary: String,
    pub score: f64,
    pub resource_id: i64,
    pub chunk_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ChunkLocation>,
}

/// Retrieval engine over the vector store and the LLM gateway
pub struct RetrievalEngine {
    vector: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    fusion: WeightedRrf,
}

impl RetrievalEngine {
    pub fn new(vector: Arc<dyn VectorStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            vector,
            llm,
            fusion: WeightedRrf::default(),
        }
    }

    pub fn with_fusion(mut self, fusion: WeightedRrf) -> Self {
        self.fusion = fusion;
        self
    }

    /// Run a search against a knowledge base.
    ///
    /// The query is embedded with the knowledge base's embedding model; a
    /// hybrid request adds a lexical leg and fuses both lists. The resource
    /// filter applies after fusion so the ranking reflects the full corpus.
    #[instrument(skip(self, request), fields(kb_id = %request.kb_id, mode = request.mode.as_str()))]
    pub async fn search(
        &self,
        embedding_model: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>> {
        let started = Instant::now();

        if request.query.trim().is_empty() || request.k == 0 {
            return Ok(Vec::new());
        }
        let k = request.k.min(MAX_K);

        // Fail fast on embedding problems; no partial results.
        let embedding = self.llm.embed(embedding_model, &request.query).await?;

        let class = class_name(&request.kb_id);
        let options = QueryOptions {
            limit: Some(k),
            ..Default::default()
        };

        let dense = self.vector.query_dense(&class, &embedding, &options).await?;

        let lexical = match request.mode {
            RetrievalMode::Dense => Vec::new(),
            RetrievalMode::Hybrid => self.vector.query_lexical(&class, &request.query, k).await?,
        };

        let results = rank_and_filter(
            &self.fusion,
            request.mode,
            dense,
            lexical,
            &request.resource_ids,
            k,
        );

        metrics::record_search(
            started.elapsed().as_secs_f64(),
            request.mode.as_str(),
            results.len(),
        );
        debug!(results = results.len(), "Search complete");

        Ok(results)
    }
}

/// Rank hits, apply the resource filter, and bound the result size.
///
/// Dense-only requests keep the store's distance ordering and report the
/// distance as the score; hybrid requests are fused first.
fn rank_and_filter(
    fusion: &WeightedRrf,
    mode: RetrievalMode,
    dense: Vec<VectorHit>,
    lexical: Vec<VectorHit>,
    resource_ids: &[i64],
    k: usize,
) -> Vec<SearchResult> {
    let ranked: Vec<VectorHit> = match mode {
        RetrievalMode::Dense => dense,
        RetrievalMode::Hybrid => fusion
            .fuse(dense, lexical)
            .into_iter()
            .map(|fused| fused.hit)
            .collect(),
    };

    let filter: HashSet<i64> = resource_ids.iter().copied().collect();

    ranked
        .into_iter()
        .filter(|hit| filter.is_empty() || filter.contains(&hit.properties.resource_id))
        .take(k)
        .map(|hit| SearchResult {
            content: hit.properties.content,
            summary: hit.properties.summary,
            score: hit.score,
            resource_id: hit.properties.resource_id,
            chunk_id: hit.properties.chunk_id,
            location: Some(ChunkLocation {
                order: hit.properties.order,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpora_common::vector::VectorProperties;
    use uuid::Uuid;

    fn hit(chunk_id: i64, resource_id: i64) -> VectorHit {
        VectorHit {
            id: Uuid::from_u128(chunk_id as u128),
            score: 0.0,
            certainty: 0.0,
            properties: VectorProperties {
                content: format!("content {}", chunk_id),
                summary: String::new(),
                resource_id,
                chunk_id,
                order: chunk_id as i32,
                title: String::new(),
            },
        }
    }

    #[test]
    fn test_hybrid_filter_applies_after_fusion() {
        // Dense: A(R1), X(R2), B(R1); lexical: Y(R2), A(R1); filter [R1],
        // k=2. Fusion ranks A, X, B, Y; filtering keeps A then B.
        let results = rank_and_filter(
            &WeightedRrf::default(),
            RetrievalMode::Hybrid,
            vec![hit(1, 1), hit(10, 2), hit(2, 1)],
            vec![hit(11, 2), hit(1, 1)],
            &[1],
            2,
        );

        let chunk_ids: Vec<i64> = results.iter().map(|r| r.chunk_id).collect();
        assert_eq!(chunk_ids, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_resource_ids_in_filter() {
        let results = rank_and_filter(
            &WeightedRrf::default(),
            RetrievalMode::Dense,
            vec![hit(1, 1), hit(2, 2)],
            vec![],
            &[1, 1],
            5,
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].resource_id, 1);
    }

    #[test]
    fn test_dense_mode_keeps_store_order() {
        let mut close = hit(1, 1);
        close.score = 0.1;
        let mut far = hit(2, 1);
        far.score = 0.9;

        let results = rank_and_filter(
            &WeightedRrf::default(),
            RetrievalMode::Dense,
            vec![close, far],
            vec![],
            &[],
            5,
        );

        assert_eq!(results[0].chunk_id, 1);
        assert!((results[0].score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let results = rank_and_filter(
            &WeightedRrf::default(),
            RetrievalMode::Hybrid,
            vec![hit(1, 1)],
            vec![hit(2, 2)],
            &[],
            10,
        );

        assert_eq!(results.len(), 2);
    }
}
