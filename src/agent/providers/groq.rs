//! Groq provider implementation using the `async-openai` crate.
//!
//! Groq serves an `OpenAI`-compatible chat completions API, so the same
//! SDK types are used with the base URL pointed at Groq.

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequest,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::ExponentialBackoffBuilder;
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, UpstreamError};

const PROVIDER: &str = "groq";

/// Groq (fast tier) LLM provider.
///
/// A fresh SDK client is assembled per call around a shared HTTP client,
/// so the key only lives for the duration of [`LlmProvider::chat`].
pub struct GroqProvider {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl GroqProvider {
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
            base_url: config.groq_base_url.clone(),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Backoff policy that never retries. Retries are owned by
    /// [`BoundedProvider`](crate::agent::client::BoundedProvider).
    fn no_backoff() -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build()
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                    msg.content.clone(),
                ),
                name: None,
            }),
            Role::Assistant => {
                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(
                        async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        ),
                    ),
                    name: None,
                    tool_calls: None,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            ..Default::default()
        }
    }

    /// Classifies an API error body by its `type`/`code`/message.
    ///
    /// Server errors reach us with neither `type` nor `code` set, and are
    /// the only API errors treated as retryable.
    fn classify_api_error(
        message: &str,
        error_type: Option<&str>,
        code: Option<&str>,
    ) -> UpstreamError {
        let lower = message.to_lowercase();
        let marker = |needle: &str| {
            error_type.is_some_and(|t| t.contains(needle)) || code.is_some_and(|c| c.contains(needle))
        };

        if marker("invalid_api_key")
            || marker("permission")
            || lower.contains("invalid api key")
            || lower.contains("unauthorized")
        {
            UpstreamError::Unauthorized {
                provider: PROVIDER,
                message: message.to_string(),
            }
        } else if marker("rate_limit") || marker("quota") || lower.contains("rate limit") {
            UpstreamError::RateLimited {
                provider: PROVIDER,
                message: message.to_string(),
            }
        } else {
            UpstreamError::Unknown {
                provider: PROVIDER,
                status: None,
                message: message.to_string(),
                retryable: error_type.is_none() && code.is_none(),
            }
        }
    }

    /// Maps an SDK error onto [`UpstreamError`].
    fn map_error(err: OpenAIError, timeout_secs: u64) -> UpstreamError {
        match err {
            OpenAIError::ApiError(api) => {
                Self::classify_api_error(&api.message, api.r#type.as_deref(), api.code.as_deref())
            }
            OpenAIError::Reqwest(e) => {
                if e.is_timeout() {
                    UpstreamError::Timeout {
                        provider: PROVIDER,
                        secs: timeout_secs,
                    }
                } else if let Some(status) = e.status() {
                    UpstreamError::from_status(PROVIDER, status.as_u16(), e.to_string())
                } else {
                    UpstreamError::network(PROVIDER, e.to_string())
                }
            }
            other => UpstreamError::malformed(PROVIDER, other.to_string()),
        }
    }
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        key: &ApiKey,
    ) -> Result<ChatResponse, UpstreamError> {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&self.base_url)
            .with_api_key(key.expose());
        let client = Client::with_config(openai_config)
            .with_http_client(self.http.clone())
            .with_backoff(Self::no_backoff());

        debug!(model = %request.model, "groq chat completion");

        let response = client
            .chat()
            .create(Self::build_request(request))
            .await
            .map_err(|e| Self::map_error(e, self.timeout_secs))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| UpstreamError::malformed(PROVIDER, "no choices in response".to_string()))?;

        let finish_reason = choice
            .finish_reason
            .as_ref()
            .map(|fr| format!("{fr:?}").to_lowercase());

        let content = choice.message.content.clone().unwrap_or_default();
        if content.trim().is_empty() {
            return Err(UpstreamError::malformed(
                PROVIDER,
                format!(
                    "empty completion (finish reason: {})",
                    finish_reason.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            content,
            usage,
            finish_reason,
        })
    }
}
