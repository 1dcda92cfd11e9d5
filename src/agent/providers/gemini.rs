//! Google Gemini provider over the `generateContent` REST endpoint.
//!
//! The key travels in the `x-goog-api-key` header so it never appears in
//! URLs, and therefore never in transport error messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, UpstreamError};

const PROVIDER: &str = "gemini";

/// Gemini (quality tier) LLM provider.
pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

impl GeminiProvider {
    /// Creates a new provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AgentError::invalid(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Builds the request body. System messages become `systemInstruction`;
    /// assistant turns use Gemini's `model` role.
    fn build_request(request: &ChatRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request.system_text().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }

    /// Extracts text and usage from a parsed response.
    fn parse_response(response: GeminiResponse) -> Result<ChatResponse, UpstreamError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::malformed(PROVIDER, "no candidates in response".to_string()))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.is_empty() {
            return Err(UpstreamError::malformed(
                PROVIDER,
                format!(
                    "empty candidate (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        let usage = response
            .usage_metadata
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_token_count.unwrap_or(0),
                completion_tokens: u.candidates_token_count.unwrap_or(0),
                total_tokens: u.total_token_count.unwrap_or(0),
            });

        Ok(ChatResponse {
            content,
            usage,
            finish_reason: candidate.finish_reason.map(|r| r.to_lowercase()),
        })
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                provider: PROVIDER,
                secs: self.timeout_secs,
            }
        } else {
            UpstreamError::network(PROVIDER, err.to_string())
        }
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        key: &ApiKey,
    ) -> Result<ChatResponse, UpstreamError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        debug!(model = %request.model, "gemini generate content");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, "gemini returned error status");
            // Gemini reports quota exhaustion as 429 RESOURCE_EXHAUSTED and
            // bad keys as 400 INVALID_ARGUMENT with an API_KEY_INVALID reason.
            let err = if status.as_u16() == 400 && body.contains("API_KEY_INVALID") {
                UpstreamError::Unauthorized {
                    provider: PROVIDER,
                    message: body,
                }
            } else {
                UpstreamError::from_status(PROVIDER, status.as_u16(), body)
            };
            return Err(err);
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_transport_error(&e)
            } else {
                UpstreamError::malformed(PROVIDER, format!("failed to parse response: {e}"))
            }
        })?;

        Self::parse_response(parsed)
    }
}
