//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::agent::model::Tier;

/// Tandem: a fast drafting agent paired with a research-backed refinement agent.
///
/// Drafts content for a topic with a Groq model, then refines it with a
/// Gemini model that can fact-check against web search results.
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// API keys, read from flags or the provider's environment variable.
///
/// Values are trimmed and stripped of surrounding quotes before use. The
/// raw strings are zeroed when the parsed [`Cli`] is dropped.
#[derive(Args, Clone, Default)]
pub struct KeyArgs {
    /// Groq API key.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<Zeroizing<String>>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<Zeroizing<String>>,

    /// Tavily API key (needed when web search is enabled).
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for KeyArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<Zeroizing<String>>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("KeyArgs")
            .field("groq_api_key", &redact(&self.groq_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .finish()
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft and refine content for a topic.
    ///
    /// Prints the reactive draft followed by the proactive refinement.
    /// Press Ctrl-C to cancel a run in flight.
    #[command(after_help = r#"Examples:
  tandem run "electric bikes"                           # Defaults, web search on
  tandem run "remote work" --no-search                  # Skip web search
  tandem run "urban gardening" --gemini-model gemini-2.5-pro --gemini-temperature 0.5
  tandem --format json run "electric bikes" | jq '.proactive_output.text'
"#)]
    Run {
        /// Topic or idea to write about.
        topic: String,

        /// Groq model for the reactive draft.
        #[arg(long, default_value = Tier::Fast.default_model())]
        groq_model: String,

        /// Sampling temperature for the reactive draft (0.0-1.0).
        #[arg(long, default_value_t = Tier::Fast.default_temperature())]
        groq_temperature: f32,

        /// Gemini model for the proactive refinement.
        #[arg(long, default_value = Tier::Quality.default_model())]
        gemini_model: String,

        /// Sampling temperature for the proactive refinement (0.0-1.0).
        #[arg(long, default_value_t = Tier::Quality.default_temperature())]
        gemini_temperature: f32,

        /// Disable web search for the proactive agent.
        #[arg(long)]
        no_search: bool,

        /// Per-call model timeout in seconds.
        #[arg(long, env = "TANDEM_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,

        /// Directory containing prompt template overrides.
        #[arg(long, env = "TANDEM_PROMPT_DIR")]
        prompt_dir: Option<PathBuf>,

        /// API keys.
        #[command(flatten)]
        keys: KeyArgs,
    },

    /// List supported models and defaults per tier.
    Models,

    /// Verify API keys and model access with a minimal request.
    #[command(after_help = r#"Examples:
  tandem check                                   # Check both providers with default models
  tandem check --groq-model llama-3.3-70b-versatile
"#)]
    Check {
        /// Groq model to check access to.
        #[arg(long, default_value = Tier::Fast.default_model())]
        groq_model: String,

        /// Gemini model to check access to.
        #[arg(long, default_value = Tier::Quality.default_model())]
        gemini_model: String,

        /// API keys.
        #[command(flatten)]
        keys: KeyArgs,
    },

    /// Write default prompt templates for customization.
    ///
    /// Existing files are never overwritten.
    InitPrompts {
        /// Target directory (default: ~/.config/tandem/prompts).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["tandem", "run", "electric bikes"])
            .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Commands::Run {
                topic,
                groq_model,
                gemini_model,
                no_search,
                ..
            } => {
                assert_eq!(topic, "electric bikes");
                assert_eq!(groq_model, "llama-3.1-8b-instant");
                assert_eq!(gemini_model, "gemini-2.5-flash");
                assert!(!no_search);
            }
            _ => unreachable!(),
        }
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tandem", "models", "--format", "json", "-v"])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.format, "json");
        assert!(cli.verbose);
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "tandem",
            "run",
            "remote work",
            "--groq-temperature",
            "0.9",
            "--no-search",
            "--groq-api-key",
            "gsk-flag",
        ])
        .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Commands::Run {
                groq_temperature,
                no_search,
                keys,
                ..
            } => {
                assert!((groq_temperature - 0.9).abs() < f32::EPSILON);
                assert!(no_search);
                assert_eq!(keys.groq_api_key.as_deref().map(String::as_str), Some("gsk-flag"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parsed_keys_are_redacted() {
        let cli = Cli::try_parse_from([
            "tandem",
            "check",
            "--groq-api-key",
            "gsk-secret",
            "--tavily-api-key",
            "tvly-secret",
        ])
        .unwrap_or_else(|_| unreachable!());
        let debug = format!("{cli:?}");
        assert!(!debug.contains("gsk-secret"));
        assert!(!debug.contains("tvly-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
