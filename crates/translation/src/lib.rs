//! Reflection-based document translation
//!
//! Translates text through a strictly sequenced three-step prompt protocol:
//! initial translation, expert critique, revision. Long texts are split into
//! token-bounded chunks, each run through the protocol with the full text as
//! tagged context, and reassembled in source order.

mod flow;
mod prompts;
mod render;

pub use flow::{calculate_chunk_size, TranslationFlow, DEFAULT_MAX_TOKENS_PER_CHUNK};
pub use render::{render, TemplateData};
