//! Pipeline run request and its precondition checks.

use super::model::{ModelConfig, Tier};
use super::secret::{ApiKeys, Provider};
use crate::error::AgentError;

/// Maximum topic length in bytes.
pub const MAX_TOPIC_LEN: usize = 10_000;

/// Everything one pipeline run needs.
///
/// Owns the run's keys; dropping the request zeroes them.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// What to write about.
    pub topic: String,
    /// Reactive (Groq) model settings.
    pub groq_config: ModelConfig,
    /// Proactive (Gemini) model settings.
    pub gemini_config: ModelConfig,
    /// Whether the proactive agent may search the web.
    pub enable_search: bool,
    /// Request-scoped keys.
    pub api_keys: ApiKeys,
}

impl RunRequest {
    /// Creates a request with default model settings and search enabled.
    #[must_use]
    pub fn new(topic: impl Into<String>, api_keys: ApiKeys) -> Self {
        Self {
            topic: topic.into(),
            groq_config: ModelConfig::default_for(Tier::Fast),
            gemini_config: ModelConfig::default_for(Tier::Quality),
            enable_search: true,
            api_keys,
        }
    }

    /// Sets the reactive model settings.
    #[must_use]
    pub fn with_groq(mut self, config: ModelConfig) -> Self {
        self.groq_config = config;
        self
    }

    /// Sets the proactive model settings.
    #[must_use]
    pub fn with_gemini(mut self, config: ModelConfig) -> Self {
        self.gemini_config = config;
        self
    }

    /// Enables or disables web search.
    #[must_use]
    pub const fn with_search(mut self, enabled: bool) -> Self {
        self.enable_search = enabled;
        self
    }

    /// Checks every precondition, in order: topic, model ids and
    /// temperatures, then credentials for each provider the run will call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] or
    /// [`AgentError::MissingCredential`] for the first violation found.
    pub fn validate(&self) -> Result<(), AgentError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(AgentError::invalid("topic cannot be empty"));
        }
        if topic.len() > MAX_TOPIC_LEN {
            return Err(AgentError::invalid(format!(
                "topic exceeds maximum length ({} bytes, max {MAX_TOPIC_LEN})",
                topic.len()
            )));
        }

        self.groq_config.validate(Tier::Fast)?;
        self.gemini_config.validate(Tier::Quality)?;

        for provider in self.required_providers() {
            if !self.api_keys.contains(provider) {
                return Err(AgentError::MissingCredential { provider });
            }
        }
        Ok(())
    }

    /// Providers whose keys this request needs.
    #[must_use]
    pub fn required_providers(&self) -> Vec<Provider> {
        let mut providers = vec![Provider::Groq, Provider::Gemini];
        if self.enable_search {
            providers.push(Provider::Tavily);
        }
        providers
    }
}
