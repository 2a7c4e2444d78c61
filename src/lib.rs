//! **gptfn**: write the signature and the doc comment, a chat model writes
//! the body.
//!
//! ```ignore
//! use gptfn::prelude::*;
//!
//! #[gpt]
//! /// Rewrite the sentence the way a pirate would say it.
//! async fn pirate(sentence: &str) -> String {}
//!
//! # async fn run() -> Result<(), GptError> {
//! let reply = pirate("Hello, friend!").await?;
//! # Ok(()) }
//! ```
//!
//! Functions may return `String`, `bool` or a [`CompletionStream`] of text
//! chunks. Requests go to the OpenAI chat completions endpoint configured by
//! `OPENAI_API_KEY` (and optionally `OPENAI_ORG_ID`, `OPENAI_BASE_URL`);
//! pass `client = path::to::fn` to `#[gpt]` to use any other
//! [`CompletionClient`].

pub mod prelude;

pub use gptfn_core::*;
pub use gptfn_macros::gpt;
