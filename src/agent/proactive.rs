//! Proactive (refinement) agent.
//!
//! Optionally grounds the topic with a web search, then asks the
//! quality-tier model to critique and refine the reactive draft and to
//! suggest next steps. Missing drafts and search failures degrade the
//! output instead of failing it.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::model::ModelConfig;
use super::output::{AgentOutput, AgentRole};
use super::prompt::build_proactive_prompt;
use super::provider::LlmProvider;
use super::secret::ApiKey;
use super::traits::{Agent, AgentContext};
use crate::error::AgentError;
use crate::search::{SearchChain, SearchHit};

/// Longest search query sent to a provider, in characters.
const MAX_QUERY_CHARS: usize = 400;

/// Agent that refines a draft with optional search evidence.
pub struct ProactiveAgent {
    provider: Arc<dyn LlmProvider>,
    search: SearchChain,
    config: ModelConfig,
    max_tokens: u32,
    max_search_results: usize,
    system_prompt: String,
}

/// Evidence gathered before the model call.
struct Research {
    hits: Option<Vec<SearchHit>>,
    tool_used: bool,
    notes: Vec<String>,
}

impl ProactiveAgent {
    /// Creates a proactive agent for one run.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: SearchChain,
        config: ModelConfig,
        max_tokens: u32,
        max_search_results: usize,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            search,
            config,
            max_tokens,
            max_search_results,
            system_prompt,
        }
    }

    /// Refines `draft` for `topic`.
    ///
    /// An empty `draft` runs in degraded mode from the topic alone. The
    /// search chain is consulted only when `enable_search` is set.
    pub async fn refine(
        &self,
        topic: &str,
        draft: &str,
        key: &ApiKey,
        enable_search: bool,
        search_key: Option<&ApiKey>,
    ) -> AgentOutput {
        let model = self.model();
        let draft = Some(draft.trim()).filter(|d| !d.is_empty());

        let mut notes = Vec::new();
        if draft.is_none() {
            notes.push(
                "Degraded mode: no draft was available from the Reactive Agent; \
                 content was produced from the topic alone."
                    .to_string(),
            );
        }

        let research = if enable_search {
            self.research(topic, search_key).await
        } else {
            Research {
                hits: None,
                tool_used: false,
                notes: vec!["Web search disabled; content was not checked against live sources.".to_string()],
            }
        };
        notes.extend(research.notes);

        let user_msg = build_proactive_prompt(topic, draft, research.hits.as_deref());
        let mut output = match self.execute(key, &user_msg).await {
            Ok(response) => {
                debug!(
                    model,
                    tokens = response.usage.total_tokens,
                    "proactive refinement complete"
                );
                let mut text = response.content;
                if let Some(hits) = research.hits.as_deref() {
                    append_sources(&mut text, hits);
                }
                AgentOutput::success(AgentRole::Proactive, model, text, response.usage)
            }
            Err(e) => {
                warn!(model, kind = %e.kind(), "proactive refinement failed");
                AgentOutput::failure(AgentRole::Proactive, model, &e)
            }
        };

        output.tool_used = research.tool_used;
        output.notes = notes;
        output
    }

    /// Runs the search chain for `topic`, converting failures into notes.
    async fn research(&self, topic: &str, search_key: Option<&ApiKey>) -> Research {
        let query = search_query(topic);
        match self
            .search
            .search(&query, search_key, self.max_search_results)
            .await
        {
            Ok(outcome) => {
                let mut notes = Vec::new();
                if !outcome.fallbacks.is_empty() {
                    notes.push(format!(
                        "Primary search failed ({}); results from {}.",
                        outcome.fallbacks.join("; "),
                        outcome.provider
                    ));
                }
                if outcome.hits.is_empty() {
                    notes.push(format!(
                        "Web search ({}) returned no results; content was not fact-checked.",
                        outcome.provider
                    ));
                }
                info!(
                    provider = outcome.provider,
                    hits = outcome.hits.len(),
                    "research complete"
                );
                Research {
                    hits: Some(outcome.hits),
                    tool_used: true,
                    notes,
                }
            }
            Err(AgentError::SearchUnavailable { attempts }) => {
                warn!(tried = attempts.len(), "search unavailable, continuing without evidence");
                Research {
                    hits: None,
                    tool_used: false,
                    notes: vec![format!(
                        "Web search unavailable ({}); content was not fact-checked.",
                        attempts.join("; ")
                    )],
                }
            }
            Err(e) => {
                warn!(error = %e, "search failed, continuing without evidence");
                Research {
                    hits: None,
                    tool_used: false,
                    notes: vec![format!("Web search failed ({e}); content was not fact-checked.")],
                }
            }
        }
    }
}

/// Derives the search query from the topic.
fn search_query(topic: &str) -> String {
    topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect()
}

/// Appends a markdown "Sources" list for the hits that carry a URL.
fn append_sources(text: &mut String, hits: &[SearchHit]) {
    let mut sources = hits.iter().filter(|h| !h.url.is_empty()).peekable();
    if sources.peek().is_none() {
        return;
    }
    text.push_str("\n\n**Sources**\n");
    for (i, hit) in sources.enumerate() {
        let title = if hit.title.is_empty() { &hit.url } else { &hit.title };
        let _ = writeln!(text, "{}. [{}]({})", i + 1, title, hit.url);
    }
}

#[async_trait]
impl Agent for ProactiveAgent {
    fn name(&self) -> &'static str {
        "proactive"
    }

    fn role(&self) -> AgentRole {
        AgentRole::Proactive
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
        self.refine(
            ctx.topic,
            ctx.draft.unwrap_or_default(),
            ctx.key,
            ctx.enable_search,
            ctx.search_key,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::agent::prompt::PROACTIVE_SYSTEM_PROMPT;
    use crate::agent::provider::testing::StubProvider;
    use crate::error::{ErrorKind, SearchError, UpstreamError};
    use crate::search::SearchProvider;
    use crate::search::testing::{StubSearch, hit};

    fn agent(provider: Arc<StubProvider>, search: &[Arc<StubSearch>]) -> ProactiveAgent {
        let chain = SearchChain::new(
            search
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn SearchProvider>)
                .collect(),
            Duration::from_secs(15),
        );
        ProactiveAgent::new(
            provider,
            chain,
            ModelConfig::new("gemini-2.5-flash", 0.3),
            2048,
            5,
            PROACTIVE_SYSTEM_PROMPT.to_string(),
        )
    }

    #[test]
    fn test_search_query_normalizes_whitespace() {
        assert_eq!(search_query("  electric \n bikes  "), "electric bikes");
        assert_eq!(search_query(&"x".repeat(1000)).len(), MAX_QUERY_CHARS);
    }

    #[test]
    fn test_append_sources() {
        let mut text = "Body".to_string();
        let mut no_url = hit("No url");
        no_url.url = String::new();
        append_sources(&mut text, &[hit("E-bike market"), no_url]);
        assert!(text.contains("**Sources**"));
        assert!(text.contains("1. [E-bike market](https://example.com/e-bike-market)"));
        assert!(!text.contains("No url"));

        let mut untouched = "Body".to_string();
        append_sources(&mut untouched, &[]);
        assert_eq!(untouched, "Body");
    }

    #[tokio::test]
    async fn test_refine_with_search() {
        let provider = Arc::new(StubProvider::ok("gemini", "Analysis... Refinement... Next Steps..."));
        let primary = Arc::new(StubSearch::ok("tavily", vec![hit("E-bike market")]).keyed());
        let secondary = Arc::new(StubSearch::ok("duckduckgo", Vec::new()));
        let tavily_key = ApiKey::new("tvly");

        let output = agent(provider.clone(), &[primary.clone(), secondary.clone()])
            .refine("electric bikes", "Draft", &ApiKey::new("g"), true, Some(&tavily_key))
            .await;

        assert!(output.is_ok());
        assert!(output.tool_used);
        assert!(output.notes.is_empty());
        assert!(output.text.contains("**Sources**"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
        let sent = provider.last_user_message();
        assert!(sent.contains("<draft>\nDraft\n</draft>"));
        assert!(sent.contains("<search_results>"));
    }

    #[tokio::test]
    async fn test_refine_without_search_never_searches() {
        let provider = Arc::new(StubProvider::ok("gemini", "Refined"));
        let primary = Arc::new(StubSearch::ok("tavily", vec![hit("Unused")]));

        let output = agent(provider, &[primary.clone()])
            .refine("electric bikes", "Draft", &ApiKey::new("g"), false, None)
            .await;

        assert!(!output.tool_used);
        assert_eq!(primary.calls(), 0);
        assert_eq!(output.text, "Refined");
        assert!(output.notes[0].contains("disabled"));
    }

    #[tokio::test]
    async fn test_refine_empty_draft_is_degraded() {
        let provider = Arc::new(StubProvider::ok("gemini", "Standalone content"));

        let output = agent(provider.clone(), &[])
            .refine("electric bikes", "   ", &ApiKey::new("g"), false, None)
            .await;

        assert_eq!(output.text, "Standalone content");
        assert!(output.notes.iter().any(|n| n.starts_with("Degraded mode")));
        assert!(!provider.last_user_message().contains("<draft>"));
    }

    #[tokio::test]
    async fn test_refine_search_unavailable_degrades() {
        let provider = Arc::new(StubProvider::ok("gemini", "Refined"));
        let primary = Arc::new(StubSearch::failing(
            "tavily",
            SearchError::QuotaExceeded { provider: "tavily" },
        ));
        let secondary = Arc::new(StubSearch::failing(
            "duckduckgo",
            SearchError::Request {
                provider: "duckduckgo",
                message: "HTTP 500".to_string(),
            },
        ));

        let output = agent(provider, &[primary.clone(), secondary.clone()])
            .refine("electric bikes", "Draft", &ApiKey::new("g"), true, None)
            .await;

        assert!(output.is_ok());
        assert!(!output.tool_used);
        assert!(output.notes[0].contains("Web search unavailable"));
        assert!(!output.text.contains("**Sources**"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_refine_empty_results_still_uses_tool() {
        let provider = Arc::new(StubProvider::ok("gemini", "Refined"));
        let primary = Arc::new(StubSearch::ok("tavily", Vec::new()));

        let output = agent(provider.clone(), &[primary])
            .refine("obscure topic", "Draft", &ApiKey::new("g"), true, None)
            .await;

        assert!(output.tool_used);
        assert!(output.notes[0].contains("returned no results"));
        assert!(provider.last_user_message().contains("returned no results"));
    }

    #[tokio::test]
    async fn test_refine_model_failure_is_captured() {
        let provider = Arc::new(StubProvider::failing(
            "gemini",
            UpstreamError::Timeout {
                provider: "gemini",
                secs: 60,
            },
        ));
        let primary = Arc::new(StubSearch::ok("tavily", vec![hit("E-bike market")]));

        let output = agent(provider, &[primary])
            .refine("electric bikes", "Draft", &ApiKey::new("g"), true, None)
            .await;

        assert!(output.text.is_empty());
        assert!(output.tool_used);
        assert_eq!(output.error.map(|e| e.kind), Some(ErrorKind::UpstreamTimeout));
    }
}
