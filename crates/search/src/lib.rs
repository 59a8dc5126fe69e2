//! Corpora retrieval engine
//!
//! Fuses dense (vector) and sparse (lexical) search results into a single
//! ranked list with weighted reciprocal-rank scoring, resource-scoped
//! filtering and bounded result size.

mod retrieval;

pub use retrieval::{
    fusion::{FusedHit, WeightedRrf},
    ChunkLocation, RetrievalEngine, RetrievalMode, SearchRequest, SearchResult, DEFAULT_K, MAX_K,
};
