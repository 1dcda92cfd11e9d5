//! Reactive (drafting) agent.
//!
//! Sends the topic to the fast-tier model once and returns the draft. It
//! never uses tools and never retries on its own; the provider it is given
//! carries the retry budget.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::model::ModelConfig;
use super::output::{AgentOutput, AgentRole};
use super::prompt::build_reactive_prompt;
use super::provider::LlmProvider;
use super::secret::ApiKey;
use super::traits::{Agent, AgentContext};

/// Agent that writes a quick first draft for a topic.
pub struct ReactiveAgent {
    provider: Arc<dyn LlmProvider>,
    config: ModelConfig,
    max_tokens: u32,
    system_prompt: String,
}

impl ReactiveAgent {
    /// Creates a reactive agent for one run.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: ModelConfig,
        max_tokens: u32,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            config,
            max_tokens,
            system_prompt,
        }
    }

    /// Drafts content for `topic`.
    ///
    /// Model failures come back as an output with empty text and the error
    /// recorded.
    pub async fn draft(&self, topic: &str, key: &ApiKey) -> AgentOutput {
        let model = self.model();
        match self.execute(key, &build_reactive_prompt(topic)).await {
            Ok(response) => {
                debug!(
                    model,
                    tokens = response.usage.total_tokens,
                    finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                    "reactive draft complete"
                );
                AgentOutput::success(AgentRole::Reactive, model, response.content, response.usage)
            }
            Err(e) => {
                warn!(model, kind = %e.kind(), "reactive draft failed");
                AgentOutput::failure(AgentRole::Reactive, model, &e)
            }
        }
    }
}

#[async_trait]
impl Agent for ReactiveAgent {
    fn name(&self) -> &'static str {
        "reactive"
    }

    fn role(&self) -> AgentRole {
        AgentRole::Reactive
    }

    fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        self.config.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    async fn generate(&self, ctx: &AgentContext<'_>) -> AgentOutput {
        self.draft(ctx.topic, ctx.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::Tier;
    use crate::agent::prompt::REACTIVE_SYSTEM_PROMPT;
    use crate::agent::provider::testing::StubProvider;
    use crate::error::{ErrorKind, UpstreamError};

    fn agent(provider: Arc<StubProvider>) -> ReactiveAgent {
        ReactiveAgent::new(
            provider,
            ModelConfig::new("llama-3.3-70b-versatile", 0.7),
            512,
            REACTIVE_SYSTEM_PROMPT.to_string(),
        )
    }

    #[test]
    fn test_agent_properties() {
        let agent = agent(Arc::new(StubProvider::ok("groq", "")));
        assert_eq!(agent.name(), "reactive");
        assert_eq!(agent.role(), AgentRole::Reactive);
        assert_eq!(agent.model(), "llama-3.3-70b-versatile");
        assert!((agent.temperature() - 0.7).abs() < f32::EPSILON);
        assert_eq!(agent.max_tokens(), 512);
        assert!(Tier::Fast.supports(agent.model()));
    }

    #[tokio::test]
    async fn test_draft_success() {
        let provider = Arc::new(StubProvider::ok("groq", "E-bikes: fast, green, fun."));
        let output = agent(provider.clone())
            .draft("electric bikes", &ApiKey::new("gsk"))
            .await;

        assert!(output.is_ok());
        assert_eq!(output.text, "E-bikes: fast, green, fun.");
        assert_eq!(output.source_agent, AgentRole::Reactive);
        assert!(!output.tool_used);
        assert_eq!(output.usage.total_tokens, 30);
        assert_eq!(provider.calls(), 1);
        assert!(provider.last_user_message().contains("<topic>electric bikes</topic>"));

        let requests = provider.requests.lock().map(|r| r.clone()).unwrap_or_default();
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].max_tokens, Some(512));
    }

    #[tokio::test]
    async fn test_draft_failure_is_captured() {
        let provider = Arc::new(StubProvider::failing(
            "groq",
            UpstreamError::Unauthorized {
                provider: "groq",
                message: "Invalid API Key".to_string(),
            },
        ));
        let output = agent(provider.clone())
            .draft("electric bikes", &ApiKey::new("bad"))
            .await;

        assert!(output.text.is_empty());
        assert_eq!(
            output.error.map(|e| e.kind),
            Some(ErrorKind::UpstreamAuthError)
        );
        assert_eq!(provider.calls(), 1);
    }
}
