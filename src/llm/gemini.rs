//! Gemini `generateContent` client over reqwest.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_BASE_URL;
use crate::error::GenerationError;

use super::classify::classify_failure;
use super::{GenerationClient, GenerationRequest};

/// Header carrying the API key; keeps it out of URLs and logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Maximum length of an error body echoed back in failure messages.
const ERROR_BODY_PREVIEW_LEN: usize = 500;

struct Session {
    http: reqwest::Client,
    api_key: String,
}

/// Gemini client. Unusable until [`configure`](GenerationClient::configure) is called.
pub struct GeminiClient {
    base_url: String,
    session: Option<Session>,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.session.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn configure(&mut self, api_key: &str) -> Result<(), GenerationError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GenerationError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("commitwright/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::Failed(format!("failed to create HTTP client: {e}")))?;

        self.session = Some(Session {
            http,
            api_key: api_key.to_string(),
        });
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GenerationError> {
        let session = self.session.as_ref().ok_or(GenerationError::NotConfigured)?;
        let config = &request.config;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationParams {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                // Latency matters more than reasoning depth here.
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        };

        debug!(
            "Calling {} (temperature={}, max_output_tokens={})",
            config.model_name, config.temperature, config.max_output_tokens
        );
        let started = Instant::now();

        let response = session
            .http
            .post(self.endpoint(&config.model_name))
            .header(API_KEY_HEADER, &session.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(format!(
                "HTTP {}: {}",
                status.as_u16(),
                api_error_message(&text)
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| classify_failure(format!("invalid response body: {e}")))?;

        debug!("Model {} answered in {:?}", config.model_name, started.elapsed());
        Ok(parsed.text())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    max_output_tokens: u32,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    thought: bool,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, or None if it has none.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let texts = content
            .parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: String,
}

/// Pull `status: message` out of a Google API error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{}: {}", status, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.chars().take(ERROR_BODY_PREVIEW_LEN).collect(),
    }
}
