//! Decoding completions into the declared return types.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};

use crate::declaration::ReturnKind;
use crate::error::{DecodeError, GptError, TransportError};

/// Raw chunk stream handed over by a [`CompletionClient`](crate::CompletionClient).
pub type ChunkStream = BoxStream<'static, Result<String, TransportError>>;

/// What the completion endpoint produced for one call.
pub enum Completion {
    Text(String),
    Stream(ChunkStream),
}

/// Return types an LLM-backed function may declare.
pub trait FunctionOutput: Sized + Send + 'static {
    const KIND: ReturnKind;

    fn decode(completion: Completion) -> Result<Self, GptError>;
}

impl FunctionOutput for String {
    const KIND: ReturnKind = ReturnKind::Text;

    fn decode(completion: Completion) -> Result<Self, GptError> {
        match completion {
            Completion::Text(text) => Ok(decode_text(&text)),
            Completion::Stream(_) => Err(unexpected(Self::KIND)),
        }
    }
}

impl FunctionOutput for bool {
    const KIND: ReturnKind = ReturnKind::Boolean;

    fn decode(completion: Completion) -> Result<Self, GptError> {
        match completion {
            Completion::Text(text) => Ok(decode_bool(&text)?),
            Completion::Stream(_) => Err(unexpected(Self::KIND)),
        }
    }
}

impl FunctionOutput for CompletionStream {
    const KIND: ReturnKind = ReturnKind::Stream;

    fn decode(completion: Completion) -> Result<Self, GptError> {
        match completion {
            Completion::Stream(chunks) => Ok(CompletionStream::new(chunks)),
            Completion::Text(_) => Err(unexpected(Self::KIND)),
        }
    }
}

fn unexpected(expected: ReturnKind) -> GptError {
    DecodeError::UnexpectedCompletion { expected }.into()
}

pub fn decode_text(raw: &str) -> String {
    raw.trim().to_owned()
}

const AFFIRMATIVE: &[&str] = &["true", "yes", "y", "correct", "affirmative"];
const NEGATIVE: &[&str] = &["false", "no", "n", "incorrect", "negative"];

/// Parse a yes/no style answer.
///
/// The whole normalized answer is tried first, then its leading word, so
/// `"Yes."` and `"No, it is not"` both decode. The leading word only counts
/// when punctuation closes it: `"No doubt about it"` is an error. Nothing is
/// ever coerced to `false`.
pub fn decode_bool(raw: &str) -> Result<bool, DecodeError> {
    let normalized = normalize(raw);
    let lead = normalized
        .find(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | '!'))
        .filter(|&end| !normalized[end..].starts_with(char::is_whitespace))
        .map(|end| normalize(&normalized[..end]));

    std::iter::once(normalized.as_str())
        .chain(lead.as_deref())
        .find_map(word_to_bool)
        .ok_or_else(|| DecodeError::UnrecognizedBoolean {
            text: raw.to_owned(),
        })
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | ',' | ';' | ':'))
        .trim()
        .to_lowercase()
}

fn word_to_bool(word: &str) -> Option<bool> {
    if AFFIRMATIVE.contains(&word) {
        Some(true)
    } else if NEGATIVE.contains(&word) {
        Some(false)
    } else {
        None
    }
}

/// Streamed completion: text chunks in the order the endpoint sent them.
///
/// Single pass. The stream owns the underlying HTTP response; dropping it (or
/// calling [`close`](Self::close)) releases the connection. Once exhausted it
/// keeps returning `None`.
pub struct CompletionStream {
    chunks: futures::stream::Fuse<ChunkStream>,
}

impl CompletionStream {
    pub fn new(chunks: ChunkStream) -> Self {
        Self {
            chunks: chunks.fuse(),
        }
    }

    /// Drain the remaining chunks into one string.
    pub async fn collect_text(mut self) -> Result<String, GptError> {
        let mut out = String::new();
        while let Some(chunk) = self.next().await {
            out.push_str(&chunk?);
        }
        Ok(out)
    }

    /// Release the connection without reading the rest of the answer.
    pub fn close(self) {}
}

impl Stream for CompletionStream {
    type Item = Result<String, GptError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.chunks
            .poll_next_unpin(cx)
            .map(|item| item.map(|chunk| chunk.map_err(GptError::from)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl FusedStream for CompletionStream {
    fn is_terminated(&self) -> bool {
        self.chunks.is_terminated()
    }
}

impl std::fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStream")
            .field("terminated", &self.chunks.is_terminated())
            .finish()
    }
}
