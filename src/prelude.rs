//! Convenient re-exports for common usage patterns.
//!
//! ```rust
//! use gptfn::prelude::*;
//! ```

// Macros
pub use crate::gpt;

// Essential types
pub use crate::{
    Arguments, CompletionClient, CompletionStream, GptError, GptFunction, ModelConfig,
    SharedClient,
};

// Registry
pub use crate::{find_function, registered_functions};

// Streams are consumed with `StreamExt::next`
pub use futures::StreamExt;
