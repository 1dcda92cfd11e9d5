//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::model::Tier;
use crate::agent::output::{AgentOutput, RunResult};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, falling back to text for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).map_or_else(
            |e| format!("{{\"error\": \"serialization failed: {e}\"}}\n"),
            |json| json + "\n",
        )
    }
}

/// Renders a run result.
#[must_use]
pub fn format_run_result(result: &RunResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(result),
        OutputFormat::Text => {
            let mut out = String::new();
            write_agent_section(&mut out, &result.reactive_output);
            out.push('\n');
            write_agent_section(&mut out, &result.proactive_output);

            let _ = write!(out, "\n---\nTokens: {}", result.total_tokens());
            if let Some(ms) = result.elapsed_ms {
                let _ = write!(out, " | Time: {:.1}s", ms_to_secs(ms));
            }
            out.push('\n');
            out
        }
    }
}

fn write_agent_section(out: &mut String, output: &AgentOutput) {
    let tool = if output.tool_used { " | web search" } else { "" };
    let _ = writeln!(
        out,
        "=== {} ({}{tool}) ===\n",
        output.source_agent, output.model
    );

    match &output.error {
        Some(err) => {
            let _ = writeln!(out, "Error [{}]: {}", err.kind, err.message);
        }
        None => {
            out.push_str(output.text.trim_end());
            out.push('\n');
        }
    }

    for note in &output.notes {
        let _ = writeln!(out, "\nNote: {note}");
    }
    if let Some(ms) = output.elapsed_ms {
        let _ = writeln!(out, "\n({:.1}s)", ms_to_secs(ms));
    }
}

#[allow(clippy::cast_precision_loss)]
fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// A tier's models, for `tandem models`.
#[derive(Debug, Serialize)]
struct TierModels {
    tier: Tier,
    provider: &'static str,
    models: &'static [&'static str],
    default_model: &'static str,
    default_temperature: f32,
}

/// Renders the supported model table.
#[must_use]
pub fn format_models(format: OutputFormat) -> String {
    let tiers: Vec<TierModels> = [(Tier::Fast, "groq"), (Tier::Quality, "gemini")]
        .into_iter()
        .map(|(tier, provider)| TierModels {
            tier,
            provider,
            models: tier.supported_models(),
            default_model: tier.default_model(),
            default_temperature: tier.default_temperature(),
        })
        .collect();

    match format {
        OutputFormat::Json => format.to_json(&tiers),
        OutputFormat::Text => {
            let mut out = String::new();
            for t in &tiers {
                let _ = writeln!(
                    out,
                    "{} ({}), default temperature {:.1}:",
                    t.tier, t.provider, t.default_temperature
                );
                for model in t.models {
                    let marker = if *model == t.default_model { " (default)" } else { "" };
                    let _ = writeln!(out, "  {model}{marker}");
                }
            }
            out
        }
    }
}

/// Result of one preflight check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Provider checked.
    pub provider: String,
    /// Model checked.
    pub model: String,
    /// `None` on success, the failure otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Renders preflight results.
#[must_use]
pub fn format_check(reports: &[CheckReport], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(reports),
        OutputFormat::Text => {
            let mut out = String::new();
            for r in reports {
                match &r.error {
                    None => {
                        let _ = writeln!(out, "{} ({}): OK", r.provider, r.model);
                    }
                    Some(e) => {
                        let _ = writeln!(out, "{} ({}): FAILED - {e}", r.provider, r.model);
                    }
                }
            }
            out
        }
    }
}
