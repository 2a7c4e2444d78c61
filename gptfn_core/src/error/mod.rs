//! Error types for declaring and calling LLM-backed functions.

use std::borrow::Cow;

use thiserror::Error;

use crate::declaration::ReturnKind;

/*───────────────────────────────────────────────────────────────────────────*/

/// A declaration or model configuration was rejected.
///
/// Raised when a [`GptFunction`](crate::GptFunction) is built, never halfway
/// through a request. `Clone` so a lazily built declaration can hand the same
/// failure to every caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("function name must not be empty")]
    EmptyName,

    #[error("function '{name}' must have a doc comment describing its behaviour")]
    MissingDocstring { name: String },

    #[error(
        "function '{name}' returns `{found}`; expected one of `String`, `bool` or `CompletionStream`"
    )]
    UnsupportedReturnType { name: String, found: String },

    #[error("function '{function}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { function: String, parameter: String },

    #[error("model identifier must not be empty")]
    EmptyModel,

    #[error("temperature must be a finite value in 0.0..=2.0, got {value}")]
    InvalidTemperature { value: f32 },

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    /// The caller asked for a different output than the declaration returns.
    #[error("function '{name}' is declared to return {declared}, not {requested}")]
    ReturnTypeMismatch {
        name: String,
        declared: ReturnKind,
        requested: ReturnKind,
    },

    #[error("environment variable {var} is not set")]
    MissingApiKey { var: &'static str },
}

/// Call-time arguments could not be bound to the declared parameters.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("missing argument '{name}'")]
    Missing { name: String },

    #[error("unexpected argument '{name}'")]
    Unexpected { name: String },

    #[error("argument '{name}' was given more than once")]
    Duplicate { name: String },

    #[error("expected at most {expected} positional arguments, got {found}")]
    TooMany { expected: usize, found: usize },

    #[error("argument could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures talking to the completion endpoint. Never retried here.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint answered {status}: {body}")]
    Status { status: u16, body: String },

    /// The model stopped because it ran out of tokens.
    #[error("the model's response exceeded the maximum length")]
    Truncated,

    #[error("malformed completion response: {0}")]
    MalformedResponse(Cow<'static, str>),

    #[error("invalid completion JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The completion text could not be mapped onto the declared return type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected a true/false answer, got {text:?}")]
    UnrecognizedBoolean { text: String },

    #[error("completion shape does not match a {expected} function")]
    UnexpectedCompletion { expected: ReturnKind },
}

/*───────────────────────────────────────────────────────────────────────────*/

/// All the ways a call into a [`GptFunction`](crate::GptFunction) can fail.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GptError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<serde_json::Error> for GptError {
    fn from(err: serde_json::Error) -> Self {
        GptError::Arguments(ArgumentError::Serialize(err))
    }
}
