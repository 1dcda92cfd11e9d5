//! Model tiers, supported identifiers, and per-agent model settings.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Lowest accepted sampling temperature.
pub const MIN_TEMPERATURE: f32 = 0.0;
/// Highest accepted sampling temperature.
pub const MAX_TEMPERATURE: f32 = 1.0;

/// Models served by the fast (Groq) tier.
const FAST_MODELS: &[&str] = &["llama-3.1-8b-instant", "llama-3.3-70b-versatile"];
/// Models served by the quality (Gemini) tier.
const QUALITY_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro"];

/// Which provider class a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Low-latency drafting models.
    Fast,
    /// Slower, higher-quality refinement models.
    Quality,
}

impl Tier {
    /// Model identifiers accepted for this tier.
    #[must_use]
    pub const fn supported_models(self) -> &'static [&'static str] {
        match self {
            Self::Fast => FAST_MODELS,
            Self::Quality => QUALITY_MODELS,
        }
    }

    /// Default model identifier.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        self.supported_models()[0]
    }

    /// Default sampling temperature.
    #[must_use]
    pub const fn default_temperature(self) -> f32 {
        match self {
            Self::Fast => 0.3,
            Self::Quality => 0.7,
        }
    }

    /// Returns `true` if `model` belongs to this tier.
    #[must_use]
    pub fn supports(self, model: &str) -> bool {
        self.supported_models().contains(&model)
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Quality => "quality",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model name and temperature for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider model identifier.
    pub model: String,
    /// Sampling temperature, `0.0..=1.0`.
    pub temperature: f32,
}

impl ModelConfig {
    /// Creates a model configuration.
    #[must_use]
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    /// Default configuration for a tier.
    #[must_use]
    pub fn default_for(tier: Tier) -> Self {
        Self::new(tier.default_model(), tier.default_temperature())
    }

    /// Checks the model belongs to `tier` and the temperature is in range.
    ///
    /// Out-of-range temperatures are rejected, not clamped.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfiguration`] describing the problem.
    pub fn validate(&self, tier: Tier) -> Result<(), AgentError> {
        if !tier.supports(&self.model) {
            return Err(AgentError::invalid(format!(
                "model '{}' is not a {tier}-tier model (expected one of: {})",
                self.model,
                tier.supported_models().join(", ")
            )));
        }
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(AgentError::invalid(format!(
                "temperature {} for '{}' is outside [{MIN_TEMPERATURE}, {MAX_TEMPERATURE}]",
                self.temperature, self.model
            )));
        }
        Ok(())
    }
}
