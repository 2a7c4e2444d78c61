//! OpenAI-compatible chat completions over HTTP.

use std::fmt;

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CompletionClient, CompletionRequest, sse};
use crate::decode::ChunkStream;
use crate::error::{ConfigurationError, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const ORG_ID_VAR: &str = "OPENAI_ORG_ID";
const BASE_URL_VAR: &str = "OPENAI_BASE_URL";

/// Endpoint and credentials for [`OpenAiClient`].
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub organization: Option<String>,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `OPENAI_API_KEY` (required), `OPENAI_ORG_ID` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let non_empty = |var| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR)
            .ok_or(ConfigurationError::MissingApiKey { var: API_KEY_VAR })?;

        Ok(Self {
            api_key,
            organization: non_empty(ORG_ID_VAR),
            base_url: non_empty(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    config: ClientConfig,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, ...).
    pub fn with_http_client(config: ClientConfig, http: Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<Response, TransportError> {
        let url = self.config.completions_url();
        debug!(
            target: "gptfn::client",
            %url,
            model = %request.model,
            stream = request.stream,
            "sending completion request"
        );

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "gptfn::client", %status, %body, "completion request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn complete_text(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let body: ChatCompletion = self.send(request).await?.json().await?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(TransportError::MalformedResponse("no choices".into()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            return Err(TransportError::Truncated);
        }

        choice
            .message
            .and_then(|m| m.content)
            .ok_or(TransportError::MalformedResponse("choice without content".into()))
    }
}

impl CompletionClient for OpenAiClient {
    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, TransportError>> {
        self.complete_text(request).boxed()
    }

    fn stream<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, TransportError>> {
        async move {
            let response = self.send(request).await?;
            Ok(sse::completion_chunks(response.bytes_stream()))
        }
        .boxed()
    }
}
