//! Remote document extractor client
//!
//! Converts a PDF into an ordered list of structured elements over a
//! multipart RPC. The chunking strategy is fixed: sections are split by
//! title at 5000 characters and small neighbors are combined below 3500.

use corpora_common::config::ExtractorConfig;
use corpora_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const CHUNKING_STRATEGY: &str = "by_title";
const MAX_CHARACTERS: &str = "5000";
const COMBINE_UNDER_N_CHARS: &str = "3500";

/// One extracted element, in document order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,

    #[serde(default)]
    pub text: String,

    pub element_id: String,

    #[serde(default)]
    pub metadata: ElementMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<i32>,
}

/// Extraction API client
pub struct ExtractorClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExtractorClient {
    pub fn new(config: &ExtractorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    /// Extract structured elements from a document
    pub async fn extract(&self, filename: &str, content: Vec<u8>) -> Result<Vec<Element>> {
        let url = format!("{}/general/v0/general", self.base_url);

        let file_part = reqwest::multipart::Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| AppError::Fatal {
                message: format!("failed to build multipart request: {}", e),
            })?;

        let form = reqwest::multipart::Form::new()
            .part("files", file_part)
            .text("chunking_strategy", CHUNKING_STRATEGY)
            .text("max_characters", MAX_CHARACTERS)
            .text("combine_under_n_chars", COMBINE_UNDER_N_CHARS)
            .text("output_format", "application/json");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_client_error() {
                AppError::RemoteRejected {
                    service: "extractor".into(),
                    status: status.as_u16(),
                    message: body,
                }
            } else {
                AppError::Transient {
                    message: format!("extractor returned {}: {}", status, body),
                }
            });
        }

        let elements: Vec<Element> = response.json().await?;
        debug!(filename, count = elements.len(), "Document extracted");

        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_deserialization() {
        let json = r#"[
            {"type": "NarrativeText", "text": "Hello.", "element_id": "e1",
             "metadata": {"filename": "a.pdf", "page_number": 1}},
            {"type": "PageBreak", "text": "", "element_id": "e2"}
        ]"#;

        let elements: Vec<Element> = serde_json::from_str(json).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].element_type, "NarrativeText");
        assert_eq!(elements[0].metadata.page_number, Some(1));
        assert!(elements[1].text.is_empty());
    }
}
