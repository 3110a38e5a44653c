//! Approximate token counting
//!
//! These are heuristics, not a tokenizer. Counts are only meant to be in
//! the right ballpark for usage accounting and never match any specific
//! model's vocabulary.

use crate::protocol::openai::{ChatMessage, ContentPart, MessageContent};

/// Per-message overhead for role and framing tokens
const MESSAGE_OVERHEAD: u64 = 4;
/// Flat overhead for priming the assistant reply
const COMPLETION_OVERHEAD: u64 = 3;
/// Flat charge per attached image
const IMAGE_TOKENS: u64 = 100;

const CODE_MARKERS: &[&str] = &["func ", "function ", "def ", "class ", "{", "}"];

/// Estimate the token count of a single text
///
/// Content classes are checked in order: code-like text counts one token
/// per 2.5 bytes, text containing CJK scripts counts one token per code
/// point, and everything else averages a byte-based and a word-based
/// estimate. Non-empty text is at least one token.
pub fn estimate_tokens(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }

    let bytes = text.len() as u64;

    if CODE_MARKERS.iter().any(|marker| text.contains(marker)) {
        // bytes / 2.5, truncated
        return (bytes * 2 / 5).max(1);
    }

    if text.chars().any(is_cjk) {
        return text.chars().count() as u64;
    }

    let char_based = bytes / 4;
    let word_based = text.split_whitespace().count() as u64 * 2;

    ((char_based + word_based) / 2).max(1)
}

/// Estimate the prompt token count of a conversation
pub fn estimate_message_tokens(messages: &[ChatMessage]) -> u64 {
    let per_message: u64 = messages
        .iter()
        .map(|message| MESSAGE_OVERHEAD + estimate_tokens(&message.role) + estimate_content_tokens(message.content.as_ref()))
        .sum();

    per_message + COMPLETION_OVERHEAD
}

fn estimate_content_tokens(content: Option<&MessageContent>) -> u64 {
    match content {
        None => 0,
        Some(MessageContent::Text(text)) => estimate_tokens(text),
        Some(MessageContent::Parts(parts)) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => estimate_tokens(text),
                ContentPart::ImageUrl { .. } => IMAGE_TOKENS,
                ContentPart::Unsupported => 0,
            })
            .sum(),
    }
}

/// Han ideographs, hiragana, katakana and hangul syllables
const fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4e00}'..='\u{9fa5}' | '\u{3040}'..='\u{30ff}' | '\u{ac00}'..='\u{d7af}')
}
