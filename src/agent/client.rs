//! Provider registry, call bounding, and preflight checks.
//!
//! Maps model tiers to concrete [`LlmProvider`] implementations and wraps
//! them in [`BoundedProvider`] so every model call carries a timeout and
//! an explicit retry budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatRequest, ChatResponse, system_message, user_message};
use crate::agent::model::Tier;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::{GeminiProvider, GroqProvider};
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, UpstreamError};
use crate::search::SearchChain;

/// Wraps a provider with a per-call timeout and a bounded retry.
///
/// Only transient failures are retried (see [`UpstreamError::is_transient`]);
/// auth and rate-limit errors are returned immediately.
pub struct BoundedProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
    max_retries: u32,
}

impl BoundedProvider {
    /// Wraps `inner` with the given timeout and retry budget.
    #[must_use]
    pub fn new(inner: Arc<dyn LlmProvider>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            inner,
            timeout,
            max_retries,
        }
    }

    async fn attempt(
        &self,
        request: &ChatRequest,
        key: &ApiKey,
    ) -> Result<ChatResponse, UpstreamError> {
        match tokio::time::timeout(self.timeout, self.inner.chat(request, key)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout {
                provider: self.inner.name(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

impl std::fmt::Debug for BoundedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedProvider")
            .field("provider", &self.inner.name())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for BoundedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        key: &ApiKey,
    ) -> Result<ChatResponse, UpstreamError> {
        let mut attempt = 0;
        loop {
            match self.attempt(request, key).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        error = %e,
                        "transient upstream failure, retrying"
                    );
                }
                result => return result,
            }
        }
    }
}

/// Creates the bounded provider serving the given tier.
///
/// # Errors
///
/// Returns [`AgentError::InvalidConfiguration`] if the underlying HTTP
/// client cannot be built.
pub fn create_provider(
    tier: Tier,
    config: &AgentConfig,
) -> Result<Arc<dyn LlmProvider>, AgentError> {
    let inner: Arc<dyn LlmProvider> = match tier {
        Tier::Fast => Arc::new(GroqProvider::new(config)?),
        Tier::Quality => Arc::new(GeminiProvider::new(config)?),
    };
    Ok(Arc::new(BoundedProvider::new(
        inner,
        config.request_timeout,
        config.max_retries,
    )))
}

/// Creates the default search chain: Tavily, then DuckDuckGo.
///
/// # Errors
///
/// Returns [`AgentError::InvalidConfiguration`] if an HTTP client cannot
/// be built.
pub fn create_search_chain(config: &AgentConfig) -> Result<SearchChain, AgentError> {
    SearchChain::standard(config)
}

/// Sends a minimal "Reply with OK" request to verify the key and that the
/// model is reachable with it.
///
/// # Errors
///
/// Returns the [`UpstreamError`] raised by the provider.
pub async fn check_access(
    provider: &dyn LlmProvider,
    model: &str,
    key: &ApiKey,
) -> Result<(), UpstreamError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![
            system_message("You are a health check."),
            user_message("Reply with OK"),
        ],
        temperature: Some(0.0),
        max_tokens: Some(8),
    };
    debug!(provider = provider.name(), model, "preflight check");
    provider.chat(&request, key).await.map(|_| ())
}
