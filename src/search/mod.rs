//! Web search tool adapters.
//!
//! A [`SearchChain`] holds an ordered list of [`SearchProvider`]s and asks
//! each in turn until one answers. The standard chain is Tavily (needs a
//! key) followed by the DuckDuckGo Instant Answer API (no key).

pub mod duckduckgo;
pub mod tavily;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::config::AgentConfig;
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, SearchError};

pub use duckduckgo::DuckDuckGoSearch;
pub use tavily::TavilySearch;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page or topic title.
    pub title: String,
    /// Relevant excerpt.
    pub snippet: String,
    /// Source URL.
    pub url: String,
}

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs and failure reports.
    fn name(&self) -> &'static str;

    /// Whether [`SearchProvider::search`] needs a key.
    fn requires_key(&self) -> bool;

    /// Runs a query, returning at most `max_results` hits in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on missing or rejected keys, quota
    /// exhaustion, or request failures. No hits is `Ok(vec![])`.
    async fn search(
        &self,
        query: &str,
        key: Option<&ApiKey>,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

/// Hits returned by the provider that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Name of the provider that answered.
    pub provider: &'static str,
    /// Hits in rank order (possibly empty).
    pub hits: Vec<SearchHit>,
    /// Failures of providers tried before the one that answered.
    pub fallbacks: Vec<String>,
}

/// Ordered provider list tried strictly in sequence.
#[derive(Clone)]
pub struct SearchChain {
    providers: Vec<Arc<dyn SearchProvider>>,
    timeout: Duration,
}

impl SearchChain {
    /// Creates a chain from an ordered provider list.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Tavily first, DuckDuckGo second.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if an HTTP client
    /// cannot be built.
    pub fn standard(config: &AgentConfig) -> Result<Self, AgentError> {
        let providers: Vec<Arc<dyn SearchProvider>> = vec![
            Arc::new(TavilySearch::new(config)?),
            Arc::new(DuckDuckGoSearch::new(config)?),
        ];
        Ok(Self::new(providers, config.search_timeout))
    }

    /// Provider names in the order they are tried.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Asks each provider once, in order, and returns the first answer.
    ///
    /// `key` is handed only to providers that require one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::SearchUnavailable`] when every provider fails.
    pub async fn search(
        &self,
        query: &str,
        key: Option<&ApiKey>,
        max_results: usize,
    ) -> Result<SearchOutcome, AgentError> {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name();
            let provider_key = if provider.requires_key() { key } else { None };

            let result = match tokio::time::timeout(
                self.timeout,
                provider.search(query, provider_key, max_results),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(SearchError::Timeout {
                    provider: name,
                    secs: self.timeout.as_secs(),
                }),
            };

            match result {
                Ok(hits) => {
                    info!(provider = name, hits = hits.len(), "search answered");
                    return Ok(SearchOutcome {
                        provider: name,
                        hits,
                        fallbacks: attempts,
                    });
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "search provider failed");
                    attempts.push(e.to_string());
                }
            }
        }

        debug!(tried = attempts.len(), "all search providers failed");
        Err(AgentError::SearchUnavailable { attempts })
    }
}

impl std::fmt::Debug for SearchChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchChain")
            .field("providers", &self.provider_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Maps an HTTP status from a search API onto [`SearchError`].
pub(crate) fn status_error(provider: &'static str, status: u16, body: &str) -> SearchError {
    match status {
        401 | 403 => SearchError::Unauthorized { provider },
        // Tavily uses 432/433 for plan and pay-as-you-go limits.
        429 | 432 | 433 => SearchError::QuotaExceeded { provider },
        _ => SearchError::Request {
            provider,
            message: format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
        },
    }
}

/// Maps a transport failure onto [`SearchError`].
pub(crate) fn transport_error(
    provider: &'static str,
    timeout: Duration,
    err: &reqwest::Error,
) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout {
            provider,
            secs: timeout.as_secs(),
        }
    } else {
        SearchError::Request {
            provider,
            message: err.to_string(),
        }
    }
}


#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::{StubSearch, hit};
    use super::*;

    fn chain(providers: &[&Arc<StubSearch>]) -> SearchChain {
        SearchChain::new(
            providers
                .iter()
                .map(|p| Arc::clone(*p) as Arc<dyn SearchProvider>)
                .collect(),
            Duration::from_secs(15),
        )
    }

    #[tokio::test]
    async fn test_primary_answers_secondary_untouched() {
        let primary = Arc::new(StubSearch::ok("primary", vec![hit("E-bike sales")]).keyed());
        let secondary = Arc::new(StubSearch::ok("secondary", vec![hit("Other")]));
        let key = ApiKey::new("tvly-test");

        let outcome = chain(&[&primary, &secondary])
            .search("electric bikes", Some(&key), 5)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.provider, "primary");
        assert_eq!(outcome.hits.len(), 1);
        assert!(outcome.fallbacks.is_empty());
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_secondary_tried_exactly_once_after_failure() {
        let primary = Arc::new(
            StubSearch::failing("primary", SearchError::Unauthorized { provider: "primary" })
                .keyed(),
        );
        let secondary = Arc::new(StubSearch::ok("secondary", vec![hit("Fallback")]));
        let key = ApiKey::new("tvly-bad");

        let outcome = chain(&[&primary, &secondary])
            .search("electric bikes", Some(&key), 5)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.provider, "secondary");
        assert_eq!(outcome.fallbacks, vec!["primary: unauthorized".to_string()]);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        // Keyless providers never see the key.
        assert_eq!(secondary.saw_key.load(Ordering::SeqCst), 0);
        assert_eq!(primary.saw_key.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failing_reports_each_attempt() {
        let primary = Arc::new(StubSearch::failing(
            "primary",
            SearchError::QuotaExceeded { provider: "primary" },
        ));
        let secondary = Arc::new(StubSearch::failing(
            "secondary",
            SearchError::Request {
                provider: "secondary",
                message: "HTTP 500".to_string(),
            },
        ));

        let result = chain(&[&primary, &secondary])
            .search("electric bikes", None, 5)
            .await;

        match result {
            Err(AgentError::SearchUnavailable { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].contains("quota"));
                assert!(attempts[1].contains("HTTP 500"));
            }
            other => panic!("expected SearchUnavailable, got {other:?}"),
        }
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_hits_is_an_answer() {
        let primary = Arc::new(StubSearch::ok("primary", Vec::new()));
        let secondary = Arc::new(StubSearch::ok("secondary", vec![hit("Unused")]));

        let outcome = chain(&[&primary, &secondary])
            .search("obscure", None, 5)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.provider, "primary");
        assert!(outcome.hits.is_empty());
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_then_falls_back() {
        let mut slow = StubSearch::ok("primary", vec![hit("Late")]);
        slow.delay = Some(Duration::from_secs(60));
        let primary = Arc::new(slow);
        let secondary = Arc::new(StubSearch::ok("secondary", vec![hit("On time")]));

        let outcome = chain(&[&primary, &secondary])
            .search("electric bikes", None, 5)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.provider, "secondary");
        assert!(outcome.fallbacks[0].contains("timed out after 15s"));
    }

    #[test]
    fn test_status_error_mapping() {
        assert_eq!(
            status_error("tavily", 401, ""),
            SearchError::Unauthorized { provider: "tavily" }
        );
        assert_eq!(
            status_error("tavily", 432, ""),
            SearchError::QuotaExceeded { provider: "tavily" }
        );
        assert!(matches!(
            status_error("tavily", 500, "oops"),
            SearchError::Request { .. }
        ));
    }
}
