//! Corpora ingestion pipeline
//!
//! Moves an uploaded document through extraction into persisted, ordered
//! chunks: source bytes are loaded from the object store, prior derivations
//! are quiesced, the remote extractor turns the document into structured
//! elements, and each non-empty element becomes a chunk blob plus a metadata
//! row. Re-entrant: every step overwrites deterministic keys or deletes its
//! predecessors first.

mod extractor;
mod processor;

pub use extractor::{Element, ElementMetadata, ExtractorClient};
pub use processor::{chunk_object_key, plan_chunks, IngestPipeline, PlannedChunk};
