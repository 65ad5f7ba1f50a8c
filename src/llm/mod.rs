//! Model client seam, the Gemini implementation, and failure classification.

pub mod classify;
pub mod gemini;

use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

pub use classify::classify_failure;
pub use gemini::GeminiClient;

/// Prompt plus the config snapshot it should be generated with.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub config: GenerationConfig,
}

/// A hosted model that turns a prompt into text.
///
/// `configure` establishes or replaces the session and is the only method
/// that mutates the client. `generate` issues exactly one call, with no
/// retry; errors come back already classified.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Set up (or rotate) the credential used for subsequent calls.
    fn configure(&mut self, api_key: &str) -> Result<(), GenerationError>;

    /// Whether `configure` has succeeded at least once.
    fn is_configured(&self) -> bool;

    /// Raw model text, or `None` when the response carried no text.
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GenerationError>;
}
