//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific HTTP or SDK calls. This keeps all agent logic
//! decoupled from any particular LLM vendor.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use super::secret::ApiKey;
use crate::error::UpstreamError;

/// Trait for LLM provider backends.
///
/// The key is supplied on every call and must not be retained by the
/// implementation once the call returns.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"groq"`, `"gemini"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on auth failures, rate limits, timeouts,
    /// or any other API failure.
    async fn chat(&self, request: &ChatRequest, key: &ApiKey)
    -> Result<ChatResponse, UpstreamError>;
}

#[cfg(test)]
#[allow(missing_docs)]
pub(crate) mod testing {
    //! Scripted provider shared by agent and orchestrator tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::agent::message::{Role, TokenUsage};

    /// Returns a fixed result and records every request it receives.
    pub struct StubProvider {
        pub name: &'static str,
        pub result: Result<String, UpstreamError>,
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl StubProvider {
        pub fn ok(name: &'static str, text: &str) -> Self {
            Self {
                name,
                result: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(name: &'static str, err: UpstreamError) -> Self {
            Self {
                result: Err(err),
                ..Self::ok(name, "")
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// User message of the most recent request.
        pub fn last_user_message(&self) -> String {
            self.requests
                .lock()
                .map(|requests| {
                    requests
                        .last()
                        .and_then(|r| r.messages.iter().find(|m| m.role == Role::User))
                        .map(|m| m.content.clone())
                        .unwrap_or_default()
                })
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn chat(
            &self,
            request: &ChatRequest,
            _key: &ApiKey,
        ) -> Result<ChatResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.result.clone().map(|content| ChatResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                },
                finish_reason: Some("stop".to_string()),
            })
        }
    }
}
