//! LLM gateway abstraction
//!
//! Provides a unified interface over the model server for:
//! - Embeddings
//! - Chat/generation (with internal streaming aggregation)
//! - Token-length estimation and token-measured text splitting

pub mod token_count;

pub use token_count::{estimate_tokens, TokenEstimator};

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Trait for LLM operations
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate an embedding vector for the given text
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;

    /// Generate a completion for the given system message and prompt
    async fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        options: Option<serde_json::Value>,
    ) -> Result<String>;

    /// Check gateway reachability
    async fn health(&self) -> Result<()>;

    /// Estimate the token count of a text
    fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Split text into chunks of at most `chunk_size` estimated tokens with
    /// the given token overlap
    fn split(&self, text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
        split_text(text, chunk_size, overlap)
    }
}

/// Recursive text splitting measured in estimated tokens
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkConfig::new(chunk_size)
        .with_sizer(TokenEstimator)
        .with_overlap(overlap)
        .map_err(|e| AppError::Fatal {
            message: format!("invalid chunk configuration: {}", e),
        })?;

    let splitter = TextSplitter::new(config);
    Ok(splitter.chunks(text).map(str::to_string).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

/// One newline-delimited fragment of a streamed generation
#[derive(Deserialize)]
struct GenerateFragment {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    truncated: bool,
}

/// Ollama API client
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    fn status_error(status: reqwest::StatusCode, body: String) -> AppError {
        if status.is_client_error() {
            AppError::RemoteRejected {
                service: "llm".into(),
                status: status.as_u16(),
                message: body,
            }
        } else {
            AppError::Transient {
                message: format!("llm gateway returned {}: {}", status, body),
            }
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model,
            prompt: text,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }

        let result: EmbeddingResponse = response.json().await?;
        Ok(result.embedding.into_iter().map(|v| v as f32).collect())
    }

    async fn generate(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
        options: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!("{}/generate", self.base_url);
        let request = GenerateRequest {
            model,
            system,
            prompt,
            stream: true,
            options,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }

        // The body is a lazy sequence of newline-delimited JSON fragments;
        // collapse it into one string, stopping at the done marker.
        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        let mut full_response = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline).collect();
                let line = &line[..line.len() - 1];
                if line.is_empty() {
                    continue;
                }

                let fragment: GenerateFragment = serde_json::from_slice(line)?;
                full_response.push_str(&fragment.response);

                if fragment.truncated {
                    return Err(AppError::Truncated {
                        message: "response was truncated by the model".into(),
                    });
                }

                if fragment.done {
                    debug!(model, chars = full_response.len(), "Generation complete");
                    return Ok(full_response);
                }
            }
        }

        Err(AppError::Transient {
            message: "generation stream ended without a done marker".into(),
        })
    }

    async fn health(&self) -> Result<()> {
        let url = format!("{}/tags", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Transient {
                message: format!("llm gateway returned {}", response.status()),
            })
        }
    }
}

/// Scripted LLM client for tests
pub struct MockLlm {
    dimension: usize,
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
}

impl MockLlm {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
        }
    }

    /// Queue a canned generation response
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock llm lock poisoned")
            .push_back(response.into());
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
        // Deterministic per input so tests can assert on it
        let seed = text.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));
        Ok((0..self.dimension)
            .map(|i| ((seed + i as u32) % 100) as f32 / 100.0)
            .collect())
    }

    async fn generate(
        &self,
        _model: &str,
        _system: &str,
        prompt: &str,
        _options: Option<serde_json::Value>,
    ) -> Result<String> {
        let queued = self
            .responses
            .lock()
            .expect("mock llm lock poisoned")
            .pop_front();

        Ok(queued.unwrap_or_else(|| format!("echo: {}", prompt)))
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_chunk_size() {
        let text = "One sentence here. Another sentence there. ".repeat(50);
        let chunks = split_text(&text, 50, 5).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(estimate_tokens(chunk) <= 50);
        }
    }

    #[test]
    fn test_split_short_text_is_single_chunk() {
        let chunks = split_text("just a few words", 100, 10).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_split_rejects_overlap_larger_than_chunk() {
        assert!(split_text("text", 10, 20).is_err());
    }

    #[tokio::test]
    async fn test_mock_embedding_is_deterministic() {
        let llm = MockLlm::new(8);
        let a = llm.embed("m", "hello").await.unwrap();
        let b = llm.embed("m", "hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn test_mock_scripted_responses() {
        let llm = MockLlm::new(4);
        llm.push_response("first");
        llm.push_response("second");

        assert_eq!(llm.generate("m", "s", "p", None).await.unwrap(), "first");
        assert_eq!(llm.generate("m", "s", "p", None).await.unwrap(), "second");
    }
}
