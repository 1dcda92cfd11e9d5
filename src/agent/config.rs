//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! API keys are deliberately absent: they belong to a single run and travel
//! in [`RunRequest`](super::request::RunRequest) instead.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default Groq OpenAI-compatible endpoint.
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default Tavily endpoint.
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
/// Default DuckDuckGo Instant Answer endpoint.
pub const DEFAULT_DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";

/// Default per-call model timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Default per-provider search timeout in seconds.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 15;
/// Upper bound accepted for either timeout.
const MAX_TIMEOUT_SECS: u64 = 300;
/// Default retries on transient model failures.
const DEFAULT_MAX_RETRIES: u32 = 1;
/// Highest retry count accepted.
const MAX_RETRIES: u32 = 1;
/// Default reactive (draft) max tokens.
const DEFAULT_REACTIVE_MAX_TOKENS: u32 = 1024;
/// Default proactive (refinement) max tokens.
const DEFAULT_PROACTIVE_MAX_TOKENS: u32 = 4096;
/// Default number of search hits requested.
const DEFAULT_MAX_SEARCH_RESULTS: usize = 5;

/// Configuration for the agent pipeline.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL for the Groq (fast tier) API.
    pub groq_base_url: String,
    /// Base URL for the Gemini (quality tier) API.
    pub gemini_base_url: String,
    /// Base URL for the Tavily search API.
    pub tavily_base_url: String,
    /// Base URL for the DuckDuckGo Instant Answer API.
    pub duckduckgo_base_url: String,
    /// Timeout applied to every model call.
    pub request_timeout: Duration,
    /// Timeout applied to each search provider attempt.
    pub search_timeout: Duration,
    /// Retries on transient model failures (0 or 1).
    pub max_retries: u32,
    /// Maximum tokens for the reactive draft.
    pub reactive_max_tokens: u32,
    /// Maximum tokens for the proactive refinement.
    pub proactive_max_tokens: u32,
    /// Number of search hits to request.
    pub max_search_results: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing file.
    pub prompt_dir: Option<PathBuf>,
    /// Record wall-clock timings on outputs.
    pub record_timing: bool,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if an environment value
    /// fails validation.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            groq_base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            tavily_base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            duckduckgo_base_url: DEFAULT_DUCKDUCKGO_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            search_timeout: Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            reactive_max_tokens: DEFAULT_REACTIVE_MAX_TOKENS,
            proactive_max_tokens: DEFAULT_PROACTIVE_MAX_TOKENS,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
            prompt_dir: None,
            record_timing: true,
        }
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    groq_base_url: Option<String>,
    gemini_base_url: Option<String>,
    tavily_base_url: Option<String>,
    duckduckgo_base_url: Option<String>,
    request_timeout: Option<Duration>,
    search_timeout: Option<Duration>,
    max_retries: Option<u32>,
    reactive_max_tokens: Option<u32>,
    proactive_max_tokens: Option<u32>,
    max_search_results: Option<usize>,
    prompt_dir: Option<PathBuf>,
    record_timing: Option<bool>,
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.groq_base_url.is_none() {
            self.groq_base_url = std::env::var("GROQ_BASE_URL").ok();
        }
        if self.gemini_base_url.is_none() {
            self.gemini_base_url = std::env::var("GEMINI_BASE_URL").ok();
        }
        if self.tavily_base_url.is_none() {
            self.tavily_base_url = std::env::var("TAVILY_BASE_URL").ok();
        }
        if self.request_timeout.is_none() {
            self.request_timeout = env_secs("TANDEM_TIMEOUT_SECS");
        }
        if self.search_timeout.is_none() {
            self.search_timeout = env_secs("TANDEM_SEARCH_TIMEOUT_SECS");
        }
        if self.max_retries.is_none() {
            self.max_retries = std::env::var("TANDEM_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_search_results.is_none() {
            self.max_search_results = std::env::var("TANDEM_MAX_SEARCH_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("TANDEM_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the Groq base URL.
    #[must_use]
    pub fn groq_base_url(mut self, url: impl Into<String>) -> Self {
        self.groq_base_url = Some(url.into());
        self
    }

    /// Sets the Gemini base URL.
    #[must_use]
    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = Some(url.into());
        self
    }

    /// Sets the Tavily base URL.
    #[must_use]
    pub fn tavily_base_url(mut self, url: impl Into<String>) -> Self {
        self.tavily_base_url = Some(url.into());
        self
    }

    /// Sets the DuckDuckGo base URL.
    #[must_use]
    pub fn duckduckgo_base_url(mut self, url: impl Into<String>) -> Self {
        self.duckduckgo_base_url = Some(url.into());
        self
    }

    /// Sets the per-call model timeout.
    #[must_use]
    pub const fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Sets the per-provider search timeout.
    #[must_use]
    pub const fn search_timeout(mut self, duration: Duration) -> Self {
        self.search_timeout = Some(duration);
        self
    }

    /// Sets the retry count for transient model failures.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the reactive max tokens.
    #[must_use]
    pub const fn reactive_max_tokens(mut self, n: u32) -> Self {
        self.reactive_max_tokens = Some(n);
        self
    }

    /// Sets the proactive max tokens.
    #[must_use]
    pub const fn proactive_max_tokens(mut self, n: u32) -> Self {
        self.proactive_max_tokens = Some(n);
        self
    }

    /// Sets the number of search hits requested.
    #[must_use]
    pub const fn max_search_results(mut self, n: usize) -> Self {
        self.max_search_results = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Enables or disables timing on outputs.
    #[must_use]
    pub const fn record_timing(mut self, enabled: bool) -> Self {
        self.record_timing = Some(enabled);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if a timeout is zero or
    /// above the maximum, more than one retry is requested, or zero search
    /// results are requested.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let defaults = AgentConfig::default();

        let request_timeout = self.request_timeout.unwrap_or(defaults.request_timeout);
        let search_timeout = self.search_timeout.unwrap_or(defaults.search_timeout);
        for (name, timeout) in [("request", request_timeout), ("search", search_timeout)] {
            if timeout.is_zero() || timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
                return Err(AgentError::invalid(format!(
                    "{name} timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"
                )));
            }
        }

        let max_retries = self.max_retries.unwrap_or(defaults.max_retries);
        if max_retries > MAX_RETRIES {
            return Err(AgentError::invalid(format!(
                "max_retries must be at most {MAX_RETRIES}, got {max_retries}"
            )));
        }

        let max_search_results = self
            .max_search_results
            .unwrap_or(defaults.max_search_results);
        if max_search_results == 0 {
            return Err(AgentError::invalid("max_search_results must be at least 1"));
        }

        Ok(AgentConfig {
            groq_base_url: self.groq_base_url.unwrap_or(defaults.groq_base_url),
            gemini_base_url: self.gemini_base_url.unwrap_or(defaults.gemini_base_url),
            tavily_base_url: self.tavily_base_url.unwrap_or(defaults.tavily_base_url),
            duckduckgo_base_url: self
                .duckduckgo_base_url
                .unwrap_or(defaults.duckduckgo_base_url),
            request_timeout,
            search_timeout,
            max_retries,
            reactive_max_tokens: self
                .reactive_max_tokens
                .unwrap_or(defaults.reactive_max_tokens),
            proactive_max_tokens: self
                .proactive_max_tokens
                .unwrap_or(defaults.proactive_max_tokens),
            max_search_results,
            prompt_dir: self.prompt_dir,
            record_timing: self.record_timing.unwrap_or(defaults.record_timing),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.groq_base_url, DEFAULT_GROQ_BASE_URL);
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.search_timeout, Duration::from_secs(15));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.max_search_results, 5);
        assert!(config.record_timing);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .groq_base_url("http://localhost:1234/v1")
            .request_timeout(Duration::from_secs(30))
            .max_retries(0)
            .max_search_results(3)
            .record_timing(false)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.groq_base_url, "http://localhost:1234/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.max_search_results, 3);
        assert!(!config.record_timing);
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = AgentConfig::builder()
            .request_timeout(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(AgentError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_builder_rejects_unbounded_timeout() {
        let result = AgentConfig::builder()
            .search_timeout(Duration::from_secs(3600))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_extra_retries() {
        let result = AgentConfig::builder().max_retries(3).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_results() {
        let result = AgentConfig::builder().max_search_results(0).build();
        assert!(result.is_err());
    }
}
