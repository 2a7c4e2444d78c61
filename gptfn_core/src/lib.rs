//! Runtime for **gptfn**: functions whose implementation is a chat completion.
//!
//! A [`GptFunction`] pairs a [`FunctionDeclaration`] (name, parameters, doc
//! comment, return type) with a [`ModelConfig`]. Calling it renders a prompt,
//! sends one request through a [`CompletionClient`] and decodes the answer
//! into `String`, `bool` or a [`CompletionStream`].
//!
//! Most users never touch this crate directly and write `#[gpt]` functions
//! through the `gptfn` facade instead.
#![deny(unsafe_code)]

pub mod arguments;
pub mod client;
pub mod config;
pub mod declaration;
pub mod decode;
pub mod error;
pub mod function;
pub mod prompt;
pub mod registry;
pub mod tokens;

// Re-exported for use in generated code
pub use inventory;
pub use once_cell;

pub use arguments::{Arguments, BoundArguments};
pub use client::{
    ClientConfig, CompletionClient, CompletionRequest, OpenAiClient, SharedClient, default_client,
};
pub use config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, ModelConfig};
pub use declaration::{FunctionDeclaration, Parameter, ReturnKind};
pub use decode::{ChunkStream, Completion, CompletionStream, FunctionOutput};
pub use error::{ArgumentError, ConfigurationError, DecodeError, GptError, TransportError};
pub use function::{GptFunction, GptFunctionBuilder};
pub use prompt::{Message, Prompt, Role};
pub use registry::{FunctionRegistration, find_function, registered_functions};
pub use tokens::{TokenEstimate, context_window};
