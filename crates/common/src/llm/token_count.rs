//! BERT-style token count estimation
//!
//! A character-based heuristic, not a real WordPiece tokenizer: `[CLS]` and
//! `[SEP]` contribute a baseline of 2, short words count as one token,
//! longer words as one per four characters, punctuation as one each and
//! numeric words as one per character. Good enough for chunk budgeting;
//! do not use where exact counts matter.

use text_splitter::ChunkSizer;

/// Estimate the token count of a text
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    // [CLS] and [SEP]
    let mut count = 2;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return count;
    }

    for word in trimmed.split_whitespace() {
        count += estimate_word_tokens(word);
    }

    count
}

fn estimate_word_tokens(word: &str) -> usize {
    let chars: Vec<char> = word.chars().collect();

    if chars.len() == 1 && chars[0].is_ascii_punctuation() {
        return 1;
    }

    // Each character of a number may be an independent token
    if is_number(&chars) {
        return chars.len();
    }

    if chars.len() <= 4 {
        1
    } else {
        chars.len().div_ceil(4)
    }
}

fn is_number(chars: &[char]) -> bool {
    chars
        .iter()
        .all(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
}

/// Measures chunk sizes in estimated tokens for the text splitter
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEstimator;

impl ChunkSizer for TokenEstimator {
    fn size(&self, chunk: &str) -> usize {
        estimate_tokens(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(estimate_tokens("   \n\t"), 2);
    }

    #[test]
    fn test_short_words() {
        // 2 baseline + one per word
        assert_eq!(estimate_tokens("the cat sat"), 5);
    }

    #[test]
    fn test_long_words() {
        // "serialization" has 13 chars -> ceil(13/4) = 4
        assert_eq!(estimate_tokens("serialization"), 6);
    }

    #[test]
    fn test_punctuation() {
        // "hello" -> 2, "," -> 1, "world" -> 2, "!" -> 1, baseline 2
        assert_eq!(estimate_tokens("hello , world !"), 8);
    }

    #[test]
    fn test_numbers_count_per_character() {
        // "1234" -> 4, baseline 2
        assert_eq!(estimate_tokens("1234"), 6);
        // "3.14" -> 4
        assert_eq!(estimate_tokens("3.14"), 6);
    }
}
