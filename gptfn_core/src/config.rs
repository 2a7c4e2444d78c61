//! Per-function model settings.

use serde::Serialize;

use crate::error::ConfigurationError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Highest temperature the chat completions API accepts.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Model settings fixed when a function is declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Sequences at which the model stops generating.
    pub stop: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            stop: Vec::new(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.model.trim().is_empty() {
            return Err(ConfigurationError::EmptyModel);
        }
        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ConfigurationError::InvalidTemperature {
                value: self.temperature,
            });
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigurationError::InvalidMaxTokens);
        }
        Ok(())
    }
}
