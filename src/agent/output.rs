//! Data types for agent outputs and pipeline results.
//!
//! Model failures never abort a run. They are recorded on the failing
//! agent's [`AgentOutput`] and the [`RunResult`] always carries both.

use serde::{Deserialize, Serialize};

use super::message::TokenUsage;
use crate::error::{ErrorKind, UpstreamError};

/// Which pipeline stage produced an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Fast drafting agent.
    Reactive,
    /// Refinement and research agent.
    Proactive,
}

impl AgentRole {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reactive => "Reactive Agent",
            Self::Proactive => "Proactive Agent",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A captured model-call failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error category.
    pub kind: ErrorKind,
    /// Provider message.
    pub message: String,
}

impl From<&UpstreamError> for ErrorInfo {
    fn from(err: &UpstreamError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Output of one agent in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Generated text. Empty when `error` is set.
    pub text: String,
    /// Agent that produced this output.
    pub source_agent: AgentRole,
    /// Whether a search provider answered for this output.
    pub tool_used: bool,
    /// Model failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Degraded-mode and fallback notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Model identifier used.
    pub model: String,
    /// Token usage for the model call.
    #[serde(default)]
    pub usage: TokenUsage,
    /// Wall-clock time spent, when timing is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl AgentOutput {
    /// Successful output.
    #[must_use]
    pub fn success(source_agent: AgentRole, model: &str, text: String, usage: TokenUsage) -> Self {
        Self {
            text,
            source_agent,
            tool_used: false,
            error: None,
            notes: Vec::new(),
            model: model.to_string(),
            usage,
            elapsed_ms: None,
        }
    }

    /// Failed output: empty text with the error recorded.
    #[must_use]
    pub fn failure(source_agent: AgentRole, model: &str, err: &UpstreamError) -> Self {
        Self {
            text: String::new(),
            source_agent,
            tool_used: false,
            error: Some(ErrorInfo::from(err)),
            notes: Vec::new(),
            model: model.to_string(),
            usage: TokenUsage::default(),
            elapsed_ms: None,
        }
    }

    /// Returns `true` if the model call succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Combined result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Draft from the reactive agent.
    pub reactive_output: AgentOutput,
    /// Refinement from the proactive agent.
    pub proactive_output: AgentOutput,
    /// Total wall-clock time, when timing is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl RunResult {
    /// Total tokens across both agents.
    #[must_use]
    pub const fn total_tokens(&self) -> u32 {
        self.reactive_output
            .usage
            .total_tokens
            .saturating_add(self.proactive_output.usage.total_tokens)
    }
}
