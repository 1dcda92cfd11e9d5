//! Dual-agent content pipeline.
//!
//! A fast model drafts, a quality model refines with optional web search
//! evidence, and the orchestrator returns both outputs side by side.
//!
//! # Architecture
//!
//! ```text
//! RunRequest → Orchestrator (validate: topic, models, temperatures, keys)
//!   ├── ReactiveAgent  (Groq, fast tier) → draft
//!   └── ProactiveAgent (Gemini, quality tier)
//!       ├── SearchChain: Tavily → DuckDuckGo (optional)
//!       └── refine(topic, draft?, evidence?) → analysis, refinement, next steps
//! → RunResult { reactive_output, proactive_output }
//! ```
//!
//! Model calls go through [`BoundedProvider`](client::BoundedProvider),
//! which owns the timeout and the single retry on transient failures.

pub mod client;
pub mod config;
pub mod message;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod proactive;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod reactive;
pub mod request;
pub mod secret;
pub mod traits;

// Re-export key types
pub use client::{BoundedProvider, check_access, create_provider, create_search_chain};
pub use config::AgentConfig;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use model::{ModelConfig, Tier};
pub use orchestrator::Orchestrator;
pub use output::{AgentOutput, AgentRole, ErrorInfo, RunResult};
pub use proactive::ProactiveAgent;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use reactive::ReactiveAgent;
pub use request::RunRequest;
pub use secret::{ApiKey, ApiKeys, Provider};
pub use traits::{Agent, AgentContext, AgentResponse};
