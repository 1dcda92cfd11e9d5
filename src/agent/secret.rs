//! Request-scoped API keys.
//!
//! Keys travel by value with a single run and are zeroed when dropped.
//! Nothing in the crate stores them in process-wide state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A provider whose key a run may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Groq (fast tier).
    Groq,
    /// Google Gemini (quality tier).
    Gemini,
    /// Tavily web search (primary search provider).
    Tavily,
}

impl Provider {
    /// Environment variable the CLI reads this provider's key from.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Tavily => "TAVILY_API_KEY",
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::Tavily => "tavily",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API key. Zeroed on drop, never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key as-is.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Cleans up a pasted key: trims whitespace and surrounding quotes.
    ///
    /// Returns `None` when nothing is left.
    #[must_use]
    pub fn sanitized(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned.to_string()))
        }
    }

    /// Borrows the secret value for an outgoing request.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Keys for one run, by provider.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: HashMap<Provider, ApiKey>,
}

impl ApiKeys {
    /// Creates an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key, replacing any previous key for the provider.
    #[must_use]
    pub fn with(mut self, provider: Provider, key: ApiKey) -> Self {
        self.keys.insert(provider, key);
        self
    }

    /// Adds a raw key after sanitizing it; blank input is ignored.
    #[must_use]
    pub fn with_raw(self, provider: Provider, raw: &str) -> Self {
        match ApiKey::sanitized(raw) {
            Some(key) => self.with(provider, key),
            None => self,
        }
    }

    /// Returns the key for a provider.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&ApiKey> {
        self.keys.get(&provider)
    }

    /// Returns `true` if a key is present for the provider.
    #[must_use]
    pub fn contains(&self, provider: Provider) -> bool {
        self.keys.contains_key(&provider)
    }

    /// Removes and returns the key for a provider.
    pub fn take(&mut self, provider: Provider) -> Option<ApiKey> {
        self.keys.remove(&provider)
    }
}
