//! Token budget estimation.
//!
//! Counts are advisory. Known model families are counted with their BPE
//! encoding; anything else falls back to a byte heuristic that overestimates
//! on purpose and is flagged as approximate.

use crate::prompt::Message;

/// Tokens added per chat message for the role/content framing.
const TOKENS_PER_MESSAGE: usize = 3;
/// Tokens priming the assistant reply.
const REPLY_PRIMER_TOKENS: usize = 3;
/// Heuristic used when no tokenizer is available for a model.
const BYTES_PER_TOKEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimate {
    pub tokens: usize,
    /// `true` when the count comes from the byte heuristic.
    pub approximate: bool,
}

impl TokenEstimate {
    fn exact(tokens: usize) -> Self {
        Self {
            tokens,
            approximate: false,
        }
    }

    fn approximate(tokens: usize) -> Self {
        Self {
            tokens,
            approximate: true,
        }
    }
}

/// Estimate how many tokens `text` costs for `model`.
pub fn estimate(text: &str, model: &str) -> TokenEstimate {
    match bpe::count(text, model) {
        Some(tokens) => TokenEstimate::exact(tokens),
        None => TokenEstimate::approximate(text.len().div_ceil(BYTES_PER_TOKEN)),
    }
}

/// Estimate a whole chat request, including per-message framing.
pub fn estimate_messages(messages: &[Message], model: &str) -> TokenEstimate {
    let mut total = TokenEstimate::exact(REPLY_PRIMER_TOKENS);
    for message in messages {
        let role = estimate(message.role.as_str(), model);
        let content = estimate(&message.content, model);
        total.tokens += TOKENS_PER_MESSAGE + role.tokens + content.tokens;
        total.approximate |= role.approximate || content.approximate;
    }
    total
}

/// Context window of a known model family, in tokens.
pub fn context_window(model: &str) -> Option<usize> {
    const WINDOWS: &[(&str, usize)] = &[
        ("gpt-4o", 128_000),
        ("gpt-4-turbo", 128_000),
        ("gpt-4-1106", 128_000),
        ("gpt-4-0125", 128_000),
        ("gpt-4-32k", 32_768),
        ("gpt-4", 8_192),
        ("gpt-3.5-turbo-instruct", 4_096),
        ("gpt-3.5-turbo", 16_385),
        ("o1", 200_000),
        ("o3", 200_000),
    ];

    WINDOWS
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, window)| *window)
}

#[cfg(feature = "tiktoken")]
mod bpe {
    use once_cell::sync::Lazy;
    use tiktoken_rs::CoreBPE;
    use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};

    // loaded on first use; `None` if the encoding data fails to load
    static O200K: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::o200k_base().ok());
    static CL100K: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::cl100k_base().ok());
    static P50K: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::p50k_base().ok());
    static R50K: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::r50k_base().ok());

    pub(super) fn count(text: &str, model: &str) -> Option<usize> {
        #[allow(unreachable_patterns)]
        let encoding = match get_tokenizer(model)? {
            Tokenizer::O200kBase => &O200K,
            Tokenizer::Cl100kBase => &CL100K,
            Tokenizer::P50kBase | Tokenizer::P50kEdit => &P50K,
            Tokenizer::R50kBase | Tokenizer::Gpt2 => &R50K,
            _ => return None,
        };
        let bpe = Lazy::force(encoding).as_ref()?;
        Some(bpe.encode_with_special_tokens(text).len())
    }
}

#[cfg(not(feature = "tiktoken"))]
mod bpe {
    pub(super) fn count(_text: &str, _model: &str) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    #[test]
    fn unknown_models_fall_back_to_heuristic() {
        let est = estimate("Hello, world!", "my-local-llama");
        assert!(est.approximate);
        assert_eq!(est.tokens, 5);
        assert_eq!(estimate("", "my-local-llama").tokens, 0);
    }

    #[cfg(feature = "tiktoken")]
    #[test]
    fn known_models_are_counted_exactly() {
        let est = estimate("Hello, world!", "gpt-4");
        assert!(!est.approximate);
        assert_eq!(est.tokens, 4);

        let longer = estimate(&"The quick brown fox jumps. ".repeat(20), "gpt-4o");
        assert!(!longer.approximate);
        assert!(longer.tokens > 20);
    }

    #[test]
    fn messages_add_framing() {
        let messages = vec![
            Message::new(Role::System, "Be brief."),
            Message::new(Role::User, "Inputs: none"),
        ];
        let model = "my-local-llama";
        let content: usize = messages
            .iter()
            .map(|m| estimate(m.role.as_str(), model).tokens + estimate(&m.content, model).tokens)
            .sum();
        let est = estimate_messages(&messages, model);
        assert!(est.approximate);
        assert_eq!(est.tokens, content + 2 * TOKENS_PER_MESSAGE + REPLY_PRIMER_TOKENS);
    }

    #[test]
    fn context_windows_prefer_the_longest_prefix() {
        assert_eq!(context_window("gpt-4o-mini"), Some(128_000));
        assert_eq!(context_window("gpt-4-32k-0613"), Some(32_768));
        assert_eq!(context_window("gpt-4"), Some(8_192));
        assert_eq!(context_window("gpt-3.5-turbo"), Some(16_385));
        assert_eq!(context_window("mistral-7b"), None);
    }
}
