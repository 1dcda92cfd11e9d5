//! Orchestrator for the reactive → proactive pipeline.
//!
//! Validates the request, runs the reactive agent to completion, then runs
//! the proactive agent on its draft. Both outputs are always returned;
//! only precondition failures and cancellation abort a run.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::{create_provider, create_search_chain};
use super::config::AgentConfig;
use super::model::Tier;
use super::output::{AgentOutput, RunResult};
use super::proactive::ProactiveAgent;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::reactive::ReactiveAgent;
use super::request::RunRequest;
use super::secret::Provider;
use super::traits::{Agent, AgentContext};
use crate::error::AgentError;
use crate::search::SearchChain;

/// Orchestrates one draft-then-refine run per call.
pub struct Orchestrator {
    fast: Arc<dyn LlmProvider>,
    quality: Arc<dyn LlmProvider>,
    search: SearchChain,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates an orchestrator from explicit collaborators.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    #[must_use]
    pub fn new(
        fast: Arc<dyn LlmProvider>,
        quality: Arc<dyn LlmProvider>,
        search: SearchChain,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            fast,
            quality,
            search,
            config,
            prompts,
        }
    }

    /// Creates an orchestrator wired to Groq, Gemini, Tavily and DuckDuckGo.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] if an HTTP client
    /// cannot be built.
    pub fn from_config(config: AgentConfig) -> Result<Self, AgentError> {
        let fast = create_provider(Tier::Fast, &config)?;
        let quality = create_provider(Tier::Quality, &config)?;
        let search = create_search_chain(&config)?;
        Ok(Self::new(fast, quality, search, config))
    }

    /// Replaces the loaded prompt set.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Prompt set in use.
    #[must_use]
    pub const fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    /// Runs the pipeline.
    ///
    /// # Steps
    ///
    /// 1. Validate the request (no network call on failure)
    /// 2. Draft with the reactive agent
    /// 3. Refine with the proactive agent, passing the draft only if the
    ///    reactive agent succeeded
    ///
    /// The request's keys are dropped, and so zeroed, before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] or
    /// [`AgentError::MissingCredential`] on precondition failures. Model and
    /// search failures are reported inside the [`RunResult`].
    pub async fn run(&self, request: RunRequest) -> Result<RunResult, AgentError> {
        request.validate()?;

        let RunRequest {
            topic,
            groq_config,
            gemini_config,
            enable_search,
            api_keys,
        } = request;
        let topic = topic.trim();
        let (Some(groq_key), Some(gemini_key)) =
            (api_keys.get(Provider::Groq), api_keys.get(Provider::Gemini))
        else {
            return Err(AgentError::MissingCredential {
                provider: if api_keys.contains(Provider::Groq) {
                    Provider::Gemini
                } else {
                    Provider::Groq
                },
            });
        };
        let search_key = api_keys.get(Provider::Tavily);

        info!(
            groq_model = %groq_config.model,
            gemini_model = %gemini_config.model,
            enable_search,
            "pipeline run started"
        );
        let start = Instant::now();

        let reactive = ReactiveAgent::new(
            Arc::clone(&self.fast),
            groq_config,
            self.config.reactive_max_tokens,
            self.prompts.reactive.clone(),
        );
        let reactive_ctx = AgentContext {
            topic,
            draft: None,
            key: groq_key,
            enable_search: false,
            search_key: None,
        };
        let reactive_output = self.timed(&reactive, &reactive_ctx).await;

        if let Some(err) = &reactive_output.error {
            warn!(kind = %err.kind, "reactive agent failed, proactive agent runs without draft");
        }

        let proactive = ProactiveAgent::new(
            Arc::clone(&self.quality),
            self.search.clone(),
            gemini_config,
            self.config.proactive_max_tokens,
            self.config.max_search_results,
            self.prompts.proactive.clone(),
        );
        let proactive_ctx = AgentContext {
            topic,
            draft: reactive_output
                .is_ok()
                .then_some(reactive_output.text.as_str()),
            key: gemini_key,
            enable_search,
            search_key,
        };
        let proactive_output = self.timed(&proactive, &proactive_ctx).await;

        let elapsed_ms = self.config.record_timing.then(|| millis(start));
        info!(
            reactive_ok = reactive_output.is_ok(),
            proactive_ok = proactive_output.is_ok(),
            tool_used = proactive_output.tool_used,
            elapsed_ms,
            "pipeline run finished"
        );

        drop(api_keys);
        Ok(RunResult {
            reactive_output,
            proactive_output,
            elapsed_ms,
        })
    }

    /// Runs the pipeline until it completes or `token` is cancelled.
    ///
    /// In-flight model and search calls are dropped on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Cancelled`] if the token fires first, or any
    /// error [`Orchestrator::run`] returns.
    pub async fn run_until_cancelled(
        &self,
        request: RunRequest,
        token: &CancellationToken,
    ) -> Result<RunResult, AgentError> {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                warn!("pipeline run cancelled");
                Err(AgentError::Cancelled)
            }
            result = self.run(request) => result,
        }
    }

    async fn timed(&self, agent: &dyn Agent, ctx: &AgentContext<'_>) -> AgentOutput {
        let start = Instant::now();
        let mut output = agent.generate(ctx).await;
        if self.config.record_timing {
            output.elapsed_ms = Some(millis(start));
        }
        output
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("fast", &self.fast.name())
            .field("quality", &self.quality.name())
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

fn millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
