//! Retrieval-augmented chat completion

use corpora_common::db::models::ChatMessage;
use corpora_common::db::Repository;
use corpora_common::errors::{AppError, Result};
use corpora_common::llm::LlmClient;
use corpora_search::{RetrievalEngine, RetrievalMode, SearchRequest, SearchResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const CHAT_SYSTEM: &str = "You are a helpful assistant answering questions about the \
user's documents. Ground your answers in the provided context; when the context does \
not cover the question, say so.";

/// One conversation turn as sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub session_id: String,
    #[serde(default)]
    pub message_id: String,
    pub role: String,
    pub content: String,
}

/// Chat completion over a knowledge base
pub struct ChatService {
    repo: Repository,
    engine: Arc<RetrievalEngine>,
    llm: Arc<dyn LlmClient>,
}

impl ChatService {
    pub fn new(repo: Repository, engine: Arc<RetrievalEngine>, llm: Arc<dyn LlmClient>) -> Self {
        Self { repo, engine, llm }
    }

    /// Answer the last user message with retrieved context, persisting the
    /// assistant reply to the session history.
    #[instrument(skip(self, messages), fields(kb_id))]
    pub async fn generate_completion(
        &self,
        kb_id: &str,
        resource_ids: &[i64],
        messages: &[ChatTurn],
    ) -> Result<ChatMessage> {
        let kb = self
            .repo
            .find_knowledge_base(kb_id)
            .await?
            .ok_or_else(|| AppError::not_found("knowledge base", kb_id))?;

        let last = messages
            .last()
            .ok_or_else(|| AppError::invalid("messages must not be empty"))?;

        if last.role != "user" {
            return Err(AppError::invalid("last message must have the user role"));
        }

        let mut request = SearchRequest::new(kb_id, last.content.clone(), RetrievalMode::Dense);
        request.resource_ids = resource_ids.to_vec();

        let context = self.engine.search(&kb.embedding_model, &request).await?;
        let prompt = format_prompt(messages, &context);

        let completion = self
            .llm
            .generate(&kb.reasoning_model, CHAT_SYSTEM, &prompt, None)
            .await?;

        self.repo
            .save_chat_message(
                &last.session_id,
                &Uuid::new_v4().to_string(),
                "assistant",
                &completion,
            )
            .await
    }

    /// Chat history for a session, oldest first
    pub async fn get_history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.repo.chat_history(session_id).await
    }
}

/// Compose the model prompt from retrieved context and the conversation.
pub fn format_prompt(messages: &[ChatTurn], context: &[SearchResult]) -> String {
    let mut prompt = String::new();

    if !context.is_empty() {
        prompt.push_str("Context:\n");
        for (index, chunk) in context.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n", index + 1, chunk.content.trim()));
        }
        prompt.push('\n');
    }

    prompt.push_str("Conversation:\n");
    for message in messages {
        prompt.push_str(&format!("{}: {}\n", message.role, message.content));
    }
    prompt.push_str("assistant:");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, content: &str) -> ChatTurn {
        ChatTurn {
            session_id: "s1".into(),
            message_id: String::new(),
            role: role.into(),
            content: content.into(),
        }
    }

    fn result(content: &str) -> SearchResult {
        SearchResult {
            content: content.into(),
            summary: String::new(),
            score: 1.0,
            resource_id: 1,
            chunk_id: 1,
            location: None,
        }
    }

    #[test]
    fn test_format_prompt_numbers_context() {
        let prompt = format_prompt(
            &[turn("user", "what is corpora?")],
            &[result("first chunk"), result("second chunk")],
        );

        assert!(prompt.contains("[1] first chunk"));
        assert!(prompt.contains("[2] second chunk"));
        assert!(prompt.contains("user: what is corpora?"));
        assert!(prompt.ends_with("assistant:"));
    }

    #[test]
    fn test_format_prompt_without_context() {
        let prompt = format_prompt(&[turn("user", "hello")], &[]);
        assert!(!prompt.contains("Context:"));
        assert!(prompt.starts_with("Conversation:"));
    }
}
