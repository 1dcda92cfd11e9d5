//! Tavily search API (primary provider, requires a key).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SearchHit, SearchProvider, status_error, transport_error};
use crate::agent::config::AgentConfig;
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, SearchError};

const PROVIDER: &str = "tavily";

/// Tavily `/search` client.
pub struct TavilySearch {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    /// Creates a client from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(config.search_timeout)
            .build()
            .map_err(|e| AgentError::invalid(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.tavily_base_url.trim_end_matches('/').to_string(),
            timeout: config.search_timeout,
        })
    }
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn requires_key(&self) -> bool {
        true
    }

    async fn search(
        &self,
        query: &str,
        key: Option<&ApiKey>,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let key = key.ok_or(SearchError::MissingKey { provider: PROVIDER })?;
        debug!(max_results, "tavily search");

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(key.expose())
            .json(&TavilyRequest {
                query,
                max_results,
                search_depth: "basic",
            })
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status.as_u16(), &body));
        }

        let parsed: TavilyResponse = response.json().await.map_err(|e| SearchError::Request {
            provider: PROVIDER,
            message: format!("failed to parse response: {e}"),
        })?;

        Ok(parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty() || !r.content.is_empty())
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                snippet: r.content,
                url: r.url,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> TavilySearch {
        let config = AgentConfig::builder()
            .tavily_base_url(base_url)
            .build()
            .unwrap_or_else(|_| unreachable!());
        TavilySearch::new(&config).unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_search_parses_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_header("authorization", "Bearer tvly-test")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"query": "electric bikes", "max_results": 2}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "query": "electric bikes",
                    "results": [
                        {"title": "E-bike market", "url": "https://a.example", "content": "Sales grew.", "score": 0.9},
                        {"title": "Commuting", "url": "https://b.example", "content": "Cities adapt.", "score": 0.8}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let hits = client_for(&server.url())
            .search("electric bikes", Some(&ApiKey::new("tvly-test")), 2)
            .await
            .unwrap_or_else(|_| unreachable!());

        mock.assert_async().await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "E-bike market");
        assert_eq!(hits[0].snippet, "Sales grew.");
        assert_eq!(hits[1].url, "https://b.example");
    }

    #[tokio::test]
    async fn test_search_without_key() {
        let client = client_for("http://127.0.0.1:9");
        let result = client.search("anything", None, 5).await;
        assert_eq!(result, Err(SearchError::MissingKey { provider: "tavily" }));
    }

    #[tokio::test]
    async fn test_search_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/search")
            .with_status(401)
            .with_body(r#"{"detail": {"error": "Unauthorized: missing or invalid API key."}}"#)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .search("electric bikes", Some(&ApiKey::new("bad")), 5)
            .await;
        assert_eq!(result, Err(SearchError::Unauthorized { provider: "tavily" }));
    }

    #[tokio::test]
    async fn test_search_quota_exceeded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/search")
            .with_status(432)
            .with_body(r#"{"detail": {"error": "This request exceeds your plan's set usage limit."}}"#)
            .create_async()
            .await;

        let result = client_for(&server.url())
            .search("electric bikes", Some(&ApiKey::new("tvly-test")), 5)
            .await;
        assert_eq!(result, Err(SearchError::QuotaExceeded { provider: "tavily" }));
    }
}
