//! The completion endpoint seam.
//!
//! [`CompletionClient`] is everything a [`GptFunction`](crate::GptFunction)
//! needs from an LLM API: one request in, either a full text or a chunk
//! stream out. [`OpenAiClient`] speaks the OpenAI chat completions protocol;
//! tests and alternative backends implement the trait directly.

mod openai;
pub mod sse;

use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::decode::ChunkStream;
use crate::error::{ConfigurationError, GptError, TransportError};
use crate::prompt::Message;

pub use openai::{ClientConfig, DEFAULT_BASE_URL, OpenAiClient};

/// Body of one chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    pub stream: bool,
}

pub trait CompletionClient: Send + Sync {
    /// Send a non-streaming request and return the full completion text.
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, TransportError>>;

    /// Send a streaming request and return the text deltas as they arrive.
    fn stream<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, TransportError>>;
}

pub type SharedClient = Arc<dyn CompletionClient>;

static DEFAULT_CLIENT: OnceCell<SharedClient> = OnceCell::new();

/// Process-wide [`OpenAiClient`] configured from the environment.
///
/// Built on first success and shared afterwards. A failed attempt (for
/// example `OPENAI_API_KEY` unset) is not cached, so the next call reads the
/// environment again. This is the client `#[gpt]` functions use unless they
/// name another one.
pub fn default_client() -> Result<SharedClient, GptError> {
    shared_client(&DEFAULT_CLIENT, || {
        let config = ClientConfig::from_env()?;
        Ok(Arc::new(OpenAiClient::new(config)) as SharedClient)
    })
}

fn shared_client<F>(cell: &OnceCell<SharedClient>, build: F) -> Result<SharedClient, GptError>
where
    F: FnOnce() -> Result<SharedClient, ConfigurationError>,
{
    cell.get_or_try_init(build)
        .map(Arc::clone)
        .map_err(GptError::from)
}
