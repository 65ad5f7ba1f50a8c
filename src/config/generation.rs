//! Generation mode and the immutable config snapshot used for one call.

use std::fmt;

use crate::error::ConfigError;

/// Which prompt template to use. Chosen once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Single `type(scope): description` line.
    #[default]
    Brief,
    /// Subject, blank line, body and optional footer.
    Detailed,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Brief => write!(f, "brief"),
            GenerationMode::Detailed => write!(f, "detailed"),
        }
    }
}

/// Snapshot of the model parameters, taken at the start of one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model_name: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_diff_length: usize,
}

impl GenerationConfig {
    /// Build a validated snapshot.
    ///
    /// Rejects an empty model name, a temperature outside `[0, 1]`, and zero
    /// output-token or diff-length limits.
    pub fn new(
        model_name: impl Into<String>,
        temperature: f32,
        max_output_tokens: u32,
        max_diff_length: usize,
    ) -> Result<Self, ConfigError> {
        let model_name = model_name.into();
        if model_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model",
                reason: "model name must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                key: "temperature",
                reason: format!("{temperature} is outside [0, 1]"),
            });
        }
        if max_output_tokens == 0 {
            return Err(ConfigError::Invalid {
                key: "max_output_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        if max_diff_length == 0 {
            return Err(ConfigError::Invalid {
                key: "max_diff_length",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            model_name,
            temperature,
            max_output_tokens,
            max_diff_length,
        })
    }
}
