//! Translate / reflect / improve control flow

use crate::prompts;
use crate::render::{render, TemplateData};
use corpora_common::errors::Result;
use corpora_common::llm::LlmClient;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 1000;

/// Reflection-based translation over a single model binding
pub struct TranslationFlow {
    llm: Arc<dyn LlmClient>,
    model: String,
    max_tokens_per_chunk: usize,
}

impl TranslationFlow {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
        }
    }

    pub fn with_max_tokens_per_chunk(mut self, max_tokens_per_chunk: usize) -> Self {
        self.max_tokens_per_chunk = max_tokens_per_chunk;
        self
    }

    /// Translate a text, choosing the single- or multi-chunk path by its
    /// estimated token length.
    #[instrument(skip(self, text), fields(model = %self.model))]
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        country: &str,
    ) -> Result<String> {
        let token_length = self.llm.count_tokens(text);

        if token_length < self.max_tokens_per_chunk {
            self.translate_single(text, source_lang, target_lang, country)
                .await
        } else {
            self.translate_multi(text, source_lang, target_lang, country, token_length)
                .await
        }
    }

    async fn translate_single(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        country: &str,
    ) -> Result<String> {
        let mut data = TemplateData {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            country: country.to_string(),
            source_text: text.to_string(),
            ..Default::default()
        };

        // Step 1: initial translation
        data.translation = self
            .step(
                prompts::ONE_CHUNK_INITIAL_SYSTEM,
                prompts::ONE_CHUNK_INITIAL_PROMPT,
                &data,
            )
            .await?;

        // Step 2: reflection
        let reflect_prompt = if country.is_empty() {
            prompts::ONE_CHUNK_REFLECT_PROMPT
        } else {
            prompts::ONE_CHUNK_REFLECT_COUNTRY_PROMPT
        };
        data.reflection = self
            .step(prompts::ONE_CHUNK_REFLECT_SYSTEM, reflect_prompt, &data)
            .await?;

        // Step 3: improvement
        self.step(
            prompts::ONE_CHUNK_IMPROVE_SYSTEM,
            prompts::ONE_CHUNK_IMPROVE_PROMPT,
            &data,
        )
        .await
    }

    async fn translate_multi(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        country: &str,
        token_length: usize,
    ) -> Result<String> {
        let chunk_size = calculate_chunk_size(token_length, self.max_tokens_per_chunk);
        let chunks = self.llm.split(text, chunk_size, chunk_size / 10)?;

        debug!(
            token_length,
            chunk_size,
            chunk_count = chunks.len(),
            "Splitting for multi-chunk translation"
        );

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let data = TemplateData {
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                country: country.to_string(),
                tagged_text: tag_chunk(text, chunk),
                chunk_to_translate: chunk.clone(),
                ..Default::default()
            };

            translated.push(self.translate_chunk(data).await?);
        }

        Ok(translated.join(" "))
    }

    async fn translate_chunk(&self, mut data: TemplateData) -> Result<String> {
        data.translation = self
            .step(
                prompts::MULTI_CHUNK_INITIAL_SYSTEM,
                prompts::MULTI_CHUNK_INITIAL_PROMPT,
                &data,
            )
            .await?;

        let reflect_prompt = if data.country.is_empty() {
            prompts::MULTI_CHUNK_REFLECT_PROMPT
        } else {
            prompts::MULTI_CHUNK_REFLECT_COUNTRY_PROMPT
        };
        data.reflection = self
            .step(prompts::MULTI_CHUNK_REFLECT_SYSTEM, reflect_prompt, &data)
            .await?;

        self.step(
            prompts::MULTI_CHUNK_IMPROVE_SYSTEM,
            prompts::MULTI_CHUNK_IMPROVE_PROMPT,
            &data,
        )
        .await
    }

    /// Render one template pair and run the model
    async fn step(
        &self,
        system_template: &str,
        prompt_template: &str,
        data: &TemplateData,
    ) -> Result<String> {
        let system = render(system_template, data)?;
        let prompt = render(prompt_template, data)?;

        self.llm.generate(&self.model, &system, &prompt, None).await
    }
}

/// Wrap the chunk's first occurrence in the full text with
/// `<TRANSLATE_THIS>` markers.
fn tag_chunk(full_text: &str, chunk: &str) -> String {
    full_text.replacen(
        chunk,
        &format!("<TRANSLATE_THIS>{}</TRANSLATE_THIS>", chunk),
        1,
    )
}

/// Size chunks so the text splits into even pieces that all fit the limit.
///
/// For counts above the limit the text needs `ceil(count / limit)` chunks;
/// the base size is the even share, plus a share of the remainder when the
/// division is not exact.
pub fn calculate_chunk_size(token_count: usize, token_limit: usize) -> usize {
    if token_count <= token_limit {
        return token_count;
    }

    let num_chunks = token_count.div_ceil(token_limit);
    let mut chunk_size = token_count / num_chunks;

    let remaining = token_count % token_limit;
    if remaining > 0 {
        chunk_size += remaining / num_chunks;
    }

    chunk_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpora_common::llm::MockLlm;

    #[test]
    fn test_calculate_chunk_size() {
        assert_eq!(calculate_chunk_size(1000, 500), 500);
        assert_eq!(calculate_chunk_size(1530, 500), 389);
        assert_eq!(calculate_chunk_size(2242, 500), 496);
        assert_eq!(calculate_chunk_size(500, 500), 500);
        assert_eq!(calculate_chunk_size(10, 20), 10);
    }

    #[test]
    fn test_chunk_count_stays_bounded() {
        for (count, limit) in [(1001, 500), (5000, 999), (12345, 1000)] {
            let size = calculate_chunk_size(count, limit);
            assert!(size <= limit);
            assert!(count.div_ceil(size) <= count.div_ceil(limit) + 1);
        }
    }

    #[test]
    fn test_tag_chunk_first_occurrence_only() {
        let tagged = tag_chunk("abc abc abc", "abc");
        assert_eq!(tagged, "<TRANSLATE_THIS>abc</TRANSLATE_THIS> abc abc");
    }

    #[tokio::test]
    async fn test_single_chunk_returns_improvement_verbatim() {
        let llm = Arc::new(MockLlm::new(4));
        llm.push_response("initial translation");
        llm.push_response("reflection notes");
        llm.push_response("improved translation");

        let flow = TranslationFlow::new(llm, "test-model");
        let out = flow
            .translate("short text", "English", "French", "")
            .await
            .unwrap();

        assert_eq!(out, "improved translation");
    }

    #[tokio::test]
    async fn test_multi_chunk_joins_with_space() {
        let llm = Arc::new(MockLlm::new(4));
        // Three scripted steps per chunk, far more than any split will use.
        for _ in 0..60 {
            llm.push_response("part");
        }

        // Force the multi-chunk path with a tiny budget.
        let flow = TranslationFlow::new(llm, "test-model").with_max_tokens_per_chunk(8);
        let text = "alpha beta gamma delta. epsilon zeta eta theta. iota kappa lambda mu.";
        let out = flow.translate(text, "English", "German", "").await.unwrap();

        // Output is the per-chunk improvements joined by single spaces.
        assert!(!out.is_empty());
        assert!(out.split(' ').all(|part| part == "part"));
        assert!(out.split(' ').count() >= 2);
    }

    #[tokio::test]
    async fn test_boundary_token_count_picks_path() {
        // count_tokens("a b") = 2 words + 2 baseline = 4.
        let llm = Arc::new(MockLlm::new(4));
        assert_eq!(llm.count_tokens("a b"), 4);

        for _ in 0..3 {
            llm.push_response("single path");
        }

        // max = 5 > 4: single-chunk path (strict less-than).
        let flow = TranslationFlow::new(llm.clone(), "m").with_max_tokens_per_chunk(5);
        assert_eq!(
            flow.translate("a b", "en", "fr", "").await.unwrap(),
            "single path"
        );

        // max = 4 == count: multi-chunk path.
        let flow = TranslationFlow::new(llm.clone(), "m").with_max_tokens_per_chunk(4);
        for _ in 0..30 {
            llm.push_response("multi");
        }
        assert_eq!(flow.translate("a b", "en", "fr", "").await.unwrap(), "multi");
    }
}
