//! Agent trait definition.
//!
//! Both agents (reactive, proactive) implement this trait, which gives the
//! orchestrator a uniform `generate(context) -> AgentOutput` capability.

use async_trait::async_trait;

use super::message::{ChatRequest, TokenUsage, system_message, user_message};
use super::output::{AgentOutput, AgentRole};
use super::provider::LlmProvider;
use super::secret::ApiKey;
use crate::error::UpstreamError;

/// Response from a single agent model call.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Per-run inputs handed to [`Agent::generate`].
///
/// Keys are borrowed from the run's request and never outlive it.
#[derive(Debug, Clone, Copy)]
pub struct AgentContext<'a> {
    /// Trimmed topic.
    pub topic: &'a str,
    /// Reactive draft, absent when the reactive agent failed.
    pub draft: Option<&'a str>,
    /// Key for this agent's model provider.
    pub key: &'a ApiKey,
    /// Whether the agent may use web search.
    pub enable_search: bool,
    /// Key for key-requiring search providers.
    pub search_key: Option<&'a ApiKey>,
}

/// Trait implemented by all agents in the pipeline.
///
/// Agents encapsulate a role with a fixed system prompt and model
/// configuration. [`Agent::generate`] never fails: model errors are
/// captured into the returned [`AgentOutput`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Pipeline stage this agent fills.
    fn role(&self) -> AgentRole;

    /// Provider serving this agent's model.
    fn provider(&self) -> &dyn LlmProvider;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Sampling temperature.
    fn temperature(&self) -> f32;

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        1024
    }

    /// Sends one request built from the agent's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on any provider failure.
    async fn execute(&self, key: &ApiKey, user_msg: &str) -> Result<AgentResponse, UpstreamError> {
        let request = ChatRequest {
            model: self.model().to_string(),
            messages: vec![system_message(self.system_prompt()), user_message(user_msg)],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
        };

        let response = self.provider().chat(&request, key).await?;

        Ok(AgentResponse {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }

    /// Produces this agent's output for a run.
    async fn generate(&self, ctx: &AgentContext<'_>) -> AgentOutput;
}
