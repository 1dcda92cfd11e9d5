//! DuckDuckGo Instant Answer API (secondary provider, no key).
//!
//! The Instant Answer API returns an abstract for well-known topics plus a
//! tree of related topics. Both are flattened into [`SearchHit`]s.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{SearchHit, SearchProvider, status_error, transport_error};
use crate::agent::config::AgentConfig;
use crate::agent::secret::ApiKey;
use crate::error::{AgentError, SearchError};

const PROVIDER: &str = "duckduckgo";

/// DuckDuckGo Instant Answer client.
pub struct DuckDuckGoSearch {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
    /// Present on category groups instead of `Text`/`FirstURL`.
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

impl DuckDuckGoSearch {
    /// Creates a client from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(config.search_timeout)
            .user_agent(concat!("tandem/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::invalid(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.duckduckgo_base_url.trim_end_matches('/').to_string(),
            timeout: config.search_timeout,
        })
    }

    fn collect_hits(answer: InstantAnswer, max_results: usize) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        if !answer.abstract_text.is_empty() {
            hits.push(SearchHit {
                title: if answer.heading.is_empty() {
                    "Summary".to_string()
                } else {
                    answer.heading
                },
                snippet: answer.abstract_text,
                url: answer.abstract_url,
            });
        }

        let mut stack: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
        while let Some(topic) = stack.pop() {
            if hits.len() >= max_results {
                break;
            }
            if !topic.topics.is_empty() {
                stack.extend(topic.topics.into_iter().rev());
                continue;
            }
            if topic.text.is_empty() {
                continue;
            }
            // Topic text reads "Title - description"; the title is the part
            // before the first separator.
            let title = topic
                .text
                .split(" - ")
                .next()
                .unwrap_or(&topic.text)
                .to_string();
            hits.push(SearchHit {
                title,
                snippet: topic.text,
                url: topic.first_url,
            });
        }

        hits.truncate(max_results);
        hits
    }
}

impl std::fmt::Debug for DuckDuckGoSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDuckGoSearch")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn requires_key(&self) -> bool {
        false
    }

    async fn search(
        &self,
        query: &str,
        _key: Option<&ApiKey>,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        debug!(max_results, "duckduckgo instant answer");

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status.as_u16(), &body));
        }

        // The API answers unknown queries with an empty body or `{}`.
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, &e))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let answer: InstantAnswer =
            serde_json::from_str(&body).map_err(|e| SearchError::Request {
                provider: PROVIDER,
                message: format!("failed to parse response: {e}"),
            })?;

        Ok(Self::collect_hits(answer, max_results))
    }
}
