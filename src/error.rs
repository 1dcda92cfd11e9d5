//! Error types for tandem.
//!
//! Errors are split by layer: [`UpstreamError`] for model API calls,
//! [`SearchError`] for search tool calls, [`AgentError`] for pipeline
//! preconditions and orchestration, and [`CommandError`] for the CLI.
//! The crate-level [`Error`] wraps all of them.

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::agent::secret::Provider;

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Agent pipeline error.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command error.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by the pipeline itself.
///
/// `MissingCredential` and `InvalidConfiguration` are precondition
/// failures raised before any network call. Model call failures never
/// surface here during a run; they are captured into the agent's output.
#[derive(Debug, ThisError)]
pub enum AgentError {
    /// A provider that the request would invoke has no key.
    #[error("missing API key for {provider} (set {})", provider.env_var())]
    MissingCredential {
        /// Provider whose key is absent.
        provider: Provider,
    },

    /// Request or configuration failed validation.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// What was wrong.
        message: String,
    },

    /// Every search provider in the chain failed.
    #[error("search unavailable: {}", attempts.join("; "))]
    SearchUnavailable {
        /// One failure description per provider tried, in order.
        attempts: Vec<String>,
    },

    /// A model call failed (only surfaced outside a pipeline run, e.g. preflight).
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The run was cancelled before it completed.
    #[error("run cancelled")]
    Cancelled,
}

impl AgentError {
    /// Shorthand for [`AgentError::InvalidConfiguration`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Typed failure from a hosted model API.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum UpstreamError {
    /// The key was rejected or lacks access to the model.
    #[error("{provider}: unauthorized: {message}")]
    Unauthorized {
        /// Provider name.
        provider: &'static str,
        /// Provider message.
        message: String,
    },

    /// Rate limit or quota exhausted.
    #[error("{provider}: rate limited: {message}")]
    RateLimited {
        /// Provider name.
        provider: &'static str,
        /// Provider message.
        message: String,
    },

    /// The call did not complete within its time bound.
    #[error("{provider}: timed out after {secs}s")]
    Timeout {
        /// Provider name.
        provider: &'static str,
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// Any other failure (network, 5xx, malformed response, ...).
    #[error("{provider}: {message}")]
    Unknown {
        /// Provider name.
        provider: &'static str,
        /// HTTP status when one was received.
        status: Option<u16>,
        /// Failure description.
        message: String,
        /// Network or server-side failure that may succeed on retry.
        retryable: bool,
    },
}

impl UpstreamError {
    /// Returns `true` for failures worth a single retry: timeouts, network
    /// errors, and server-side (5xx) errors.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Unknown { retryable, .. } => *retryable,
            Self::Unauthorized { .. } | Self::RateLimited { .. } => false,
        }
    }

    /// Wraps a transport failure that produced no HTTP status.
    #[must_use]
    pub const fn network(provider: &'static str, message: String) -> Self {
        Self::Unknown {
            provider,
            status: None,
            message,
            retryable: true,
        }
    }

    /// Wraps a malformed or unexpected response body.
    #[must_use]
    pub const fn malformed(provider: &'static str, message: String) -> Self {
        Self::Unknown {
            provider,
            status: None,
            message,
            retryable: false,
        }
    }

    /// Classifies an HTTP error status into a typed error.
    #[must_use]
    pub fn from_status(provider: &'static str, status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized { provider, message },
            429 => Self::RateLimited { provider, message },
            _ => Self::Unknown {
                provider,
                status: Some(status),
                message,
                retryable: status >= 500,
            },
        }
    }

    /// The user-facing error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::UpstreamAuthError,
            Self::RateLimited { .. } => ErrorKind::UpstreamRateLimited,
            Self::Timeout { .. } => ErrorKind::UpstreamTimeout,
            Self::Unknown { .. } => ErrorKind::UpstreamUnknownError,
        }
    }
}

/// Error category recorded on an agent output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Key rejected by the provider.
    UpstreamAuthError,
    /// Provider rate limit or quota.
    UpstreamRateLimited,
    /// Call exceeded its time bound.
    UpstreamTimeout,
    /// Any other upstream failure.
    UpstreamUnknownError,
}

impl ErrorKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamAuthError => "upstream_auth_error",
            Self::UpstreamRateLimited => "upstream_rate_limited",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamUnknownError => "upstream_unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure from a single search provider.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SearchError {
    /// Provider needs a key and none was supplied.
    #[error("{provider}: no API key")]
    MissingKey {
        /// Provider name.
        provider: &'static str,
    },

    /// Key rejected.
    #[error("{provider}: unauthorized")]
    Unauthorized {
        /// Provider name.
        provider: &'static str,
    },

    /// Usage quota or rate limit exhausted.
    #[error("{provider}: quota exceeded")]
    QuotaExceeded {
        /// Provider name.
        provider: &'static str,
    },

    /// Provider exceeded its own timeout.
    #[error("{provider}: timed out after {secs}s")]
    Timeout {
        /// Provider name.
        provider: &'static str,
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// Network, status, or parse failure.
    #[error("{provider}: {message}")]
    Request {
        /// Provider name.
        provider: &'static str,
        /// Failure description.
        message: String,
    },
}

/// CLI command errors.
#[derive(Debug, ThisError)]
pub enum CommandError {
    /// Command failed to execute.
    #[error("{0}")]
    ExecutionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(401, ErrorKind::UpstreamAuthError ; "unauthorized")]
    #[test_case(403, ErrorKind::UpstreamAuthError ; "forbidden")]
    #[test_case(429, ErrorKind::UpstreamRateLimited ; "rate limited")]
    #[test_case(400, ErrorKind::UpstreamUnknownError ; "bad request")]
    #[test_case(503, ErrorKind::UpstreamUnknownError ; "unavailable")]
    fn test_from_status_kind(status: u16, kind: ErrorKind) {
        let err = UpstreamError::from_status("groq", status, "boom".to_string());
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn test_transient_classification() {
        let timeout = UpstreamError::Timeout {
            provider: "groq",
            secs: 60,
        };
        assert!(timeout.is_transient());
        assert!(UpstreamError::from_status("gemini", 502, String::new()).is_transient());
        assert!(!UpstreamError::from_status("gemini", 400, String::new()).is_transient());
        assert!(!UpstreamError::from_status("gemini", 401, String::new()).is_transient());
        assert!(!UpstreamError::from_status("gemini", 429, String::new()).is_transient());

        let network = UpstreamError::network("groq", "connection reset".to_string());
        assert!(network.is_transient());
        let malformed = UpstreamError::malformed("groq", "missing candidates".to_string());
        assert!(!malformed.is_transient());
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = AgentError::MissingCredential {
            provider: Provider::Tavily,
        };
        assert!(err.to_string().contains("TAVILY_API_KEY"));
    }

    #[test]
    fn test_search_unavailable_lists_attempts() {
        let err = AgentError::SearchUnavailable {
            attempts: vec!["tavily: unauthorized".to_string(), "duckduckgo: timed out".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("tavily: unauthorized"));
        assert!(msg.contains("duckduckgo"));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::UpstreamRateLimited).unwrap_or_default();
        assert_eq!(json, "\"UpstreamRateLimited\"");
        assert_eq!(ErrorKind::UpstreamTimeout.to_string(), "upstream_timeout");
    }
}
