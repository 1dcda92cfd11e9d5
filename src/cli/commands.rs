//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Async work runs on a
//! tokio runtime created per command.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent::client::{check_access, create_provider};
use crate::agent::config::AgentConfig;
use crate::agent::model::{ModelConfig, Tier};
use crate::agent::orchestrator::Orchestrator;
use crate::agent::prompt::PromptSet;
use crate::agent::request::RunRequest;
use crate::agent::secret::{ApiKeys, Provider};
use crate::cli::output::{CheckReport, OutputFormat, format_check, format_models, format_run_result};
use crate::cli::parser::{Cli, Commands, KeyArgs};
use crate::error::{CommandError, Result};

/// Parameters for the run command.
#[derive(Debug, Clone)]
pub struct RunCommandParams<'a> {
    /// Topic to write about.
    pub topic: &'a str,
    /// Reactive model settings.
    pub groq: ModelConfig,
    /// Proactive model settings.
    pub gemini: ModelConfig,
    /// Whether web search is enabled.
    pub enable_search: bool,
    /// Per-call model timeout override.
    pub timeout_secs: Option<u64>,
    /// Prompt directory override.
    pub prompt_dir: Option<&'a Path>,
}

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Run {
            topic,
            groq_model,
            groq_temperature,
            gemini_model,
            gemini_temperature,
            no_search,
            timeout_secs,
            prompt_dir,
            keys,
        } => {
            let params = RunCommandParams {
                topic,
                groq: ModelConfig::new(groq_model.as_str(), *groq_temperature),
                gemini: ModelConfig::new(gemini_model.as_str(), *gemini_temperature),
                enable_search: !*no_search,
                timeout_secs: *timeout_secs,
                prompt_dir: prompt_dir.as_deref(),
            };
            cmd_run(&params, collect_keys(keys), format)
        }
        Commands::Models => Ok(format_models(format)),
        Commands::Check {
            groq_model,
            gemini_model,
            keys,
        } => cmd_check(groq_model, gemini_model, collect_keys(keys), format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Sanitizes the raw key arguments into a request-scoped key set.
fn collect_keys(keys: &KeyArgs) -> ApiKeys {
    [
        (Provider::Groq, &keys.groq_api_key),
        (Provider::Gemini, &keys.gemini_api_key),
        (Provider::Tavily, &keys.tavily_api_key),
    ]
    .into_iter()
    .fold(ApiKeys::new(), |acc, (provider, raw)| match raw {
        Some(raw) => acc.with_raw(provider, raw),
        None => acc,
    })
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Runs the pipeline for one topic.
fn cmd_run(params: &RunCommandParams<'_>, keys: ApiKeys, format: OutputFormat) -> Result<String> {
    let request = RunRequest::new(params.topic, keys)
        .with_groq(params.groq.clone())
        .with_gemini(params.gemini.clone())
        .with_search(params.enable_search);

    // Fail fast on preconditions before building clients or a runtime.
    request.validate()?;

    let mut builder = AgentConfig::builder().from_env();
    if let Some(secs) = params.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let config = builder.build()?;
    let orchestrator = Orchestrator::from_config(config)?;

    let rt = runtime()?;
    let result = rt.block_on(async {
        let token = CancellationToken::new();
        let on_interrupt = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling run");
                on_interrupt.cancel();
            }
        });
        orchestrator.run_until_cancelled(request, &token).await
    })?;

    Ok(format_run_result(&result, format))
}

/// Runs the preflight check against both model providers.
fn cmd_check(
    groq_model: &str,
    gemini_model: &str,
    keys: ApiKeys,
    format: OutputFormat,
) -> Result<String> {
    let targets = [
        (Provider::Groq, Tier::Fast, groq_model),
        (Provider::Gemini, Tier::Quality, gemini_model),
    ];
    for (_, tier, model) in &targets {
        ModelConfig::new(*model, tier.default_temperature()).validate(*tier)?;
    }

    let config = AgentConfig::builder().from_env().build()?;
    let rt = runtime()?;

    let mut reports = Vec::with_capacity(targets.len());
    for (provider, tier, model) in targets {
        let error = match keys.get(provider) {
            None => Some(format!("missing API key (set {})", provider.env_var())),
            Some(key) => {
                let client = create_provider(tier, &config)?;
                debug!(%provider, model, "checking access");
                rt.block_on(check_access(client.as_ref(), model, key))
                    .err()
                    .map(|e| e.to_string())
            }
        };
        reports.push(CheckReport {
            provider: provider.to_string(),
            model: model.to_string(),
            error,
        });
    }
    drop(keys);

    let output = format_check(&reports, format);
    if reports.iter().any(|r| r.error.is_some()) {
        return Err(CommandError::ExecutionFailed(output.trim_end().to_string()).into());
    }
    Ok(output)
}

/// Writes the default prompt templates.
fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str("  ");
                    output.push_str(
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown"),
                    );
                    output.push('\n');
                }
                output.push_str("\nEdit these files to customize agent system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AgentError, Error};
    use clap::Parser;
    use zeroize::Zeroizing;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_collect_keys_sanitizes() {
        let keys = collect_keys(&KeyArgs {
            groq_api_key: Some(Zeroizing::new("  \"gsk-abc\"  ".to_string())),
            gemini_api_key: Some(Zeroizing::new("   ".to_string())),
            tavily_api_key: None,
        });
        assert_eq!(keys.get(Provider::Groq).map(|k| k.expose()), Some("gsk-abc"));
        assert!(!keys.contains(Provider::Gemini));
        assert!(!keys.contains(Provider::Tavily));
    }

    #[test]
    fn test_models_command() {
        let output = execute(&parse(&["tandem", "models"])).unwrap_or_default();
        assert!(output.contains("llama-3.3-70b-versatile"));
        assert!(output.contains("gemini-2.5-pro"));
    }

    #[test]
    fn test_run_blank_topic_fails_fast() {
        let params = RunCommandParams {
            topic: "  ",
            groq: ModelConfig::default_for(Tier::Fast),
            gemini: ModelConfig::default_for(Tier::Quality),
            enable_search: false,
            timeout_secs: None,
            prompt_dir: None,
        };
        let result = cmd_run(&params, ApiKeys::new(), OutputFormat::Text);
        assert!(matches!(
            result,
            Err(Error::Agent(AgentError::InvalidConfiguration { .. }))
        ));
    }

    #[test]
    fn test_run_missing_key_fails_fast() {
        let params = RunCommandParams {
            topic: "electric bikes",
            groq: ModelConfig::default_for(Tier::Fast),
            gemini: ModelConfig::default_for(Tier::Quality),
            enable_search: true,
            timeout_secs: None,
            prompt_dir: None,
        };
        let keys = ApiKeys::new()
            .with_raw(Provider::Groq, "gsk")
            .with_raw(Provider::Gemini, "AIza");
        let result = cmd_run(&params, keys, OutputFormat::Text);
        assert!(matches!(
            result,
            Err(Error::Agent(AgentError::MissingCredential {
                provider: Provider::Tavily
            }))
        ));
    }

    #[test]
    fn test_check_rejects_unknown_model() {
        let result = cmd_check("gpt-4o", "gemini-2.5-flash", ApiKeys::new(), OutputFormat::Text);
        assert!(matches!(
            result,
            Err(Error::Agent(AgentError::InvalidConfiguration { .. }))
        ));
    }

    #[test]
    fn test_check_reports_missing_keys() {
        let result = cmd_check(
            "llama-3.1-8b-instant",
            "gemini-2.5-flash",
            ApiKeys::new(),
            OutputFormat::Text,
        );
        match result {
            Err(Error::Command(CommandError::ExecutionFailed(msg))) => {
                assert!(msg.contains("GROQ_API_KEY"));
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_init_prompts_json() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let target = dir.path().join("prompts");
        let output =
            cmd_init_prompts(Some(&target), OutputFormat::Json).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap_or_default();
        assert_eq!(value["count"], 2);
        assert!(target.join("reactive.md").exists());
        assert!(target.join("proactive.md").exists());
    }
}
