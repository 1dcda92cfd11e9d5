//! # tandem
//!
//! A dual-agent content pipeline. A fast Groq model writes a first draft;
//! a Gemini model then critiques and refines it, optionally grounding the
//! result in web search (Tavily, falling back to DuckDuckGo), and suggests
//! next steps.
//!
//! ## Quick start
//!
//! ```no_run
//! use tandem::agent::{AgentConfig, ApiKeys, Orchestrator, Provider, RunRequest};
//!
//! # async fn demo() -> Result<(), tandem::error::AgentError> {
//! let orchestrator = Orchestrator::from_config(AgentConfig::from_env()?)?;
//! let keys = ApiKeys::new()
//!     .with_raw(Provider::Groq, "gsk-...")
//!     .with_raw(Provider::Gemini, "AIza...")
//!     .with_raw(Provider::Tavily, "tvly-...");
//! let result = orchestrator.run(RunRequest::new("electric bikes", keys)).await?;
//! println!("{}", result.proactive_output.text);
//! # Ok(())
//! # }
//! ```
//!
//! Keys are request-scoped: they travel inside the [`agent::RunRequest`],
//! are never logged, and are zeroed when the run ends.

pub mod agent;
pub mod cli;
pub mod error;
pub mod search;

pub use agent::{AgentOutput, Orchestrator, RunRequest, RunResult};
pub use error::{AgentError, Error, Result};
