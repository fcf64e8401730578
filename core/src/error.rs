use serde::Serialize;
use thiserror::Error;

/// Failure talking to the aggregation backend. Never shown verbatim to the
/// operator; the controller logs it and records a [`crate::Failure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend answered HTTP {status}")]
    Status { status: u16 },
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

/// An operation that is not valid in the controller's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no candidate list is awaiting a selection")]
    NotDisambiguating,
    #[error("candidate is not part of the current result list")]
    UnknownCandidate,
}

/// Invalid client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("API base URL is not set")]
    MissingBaseUrl,
    #[error("API key is not set")]
    MissingApiKey,
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("could not read config file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Structured error written by front ends, meant to be read by operators
/// and by scripts alike.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable code, one of [`codes`].
    pub error: String,
    pub message: String,
    /// Hint about how to fix or retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            docs_hint: None,
        }
    }

    pub fn with_docs_hint(mut self, hint: impl Into<String>) -> Self {
        self.docs_hint = Some(hint.into());
        self
    }
}

/// Error codes used across Beholder front ends
pub mod codes {
    pub const NO_MATCH: &str = "no_match";
    pub const CONNECTION_ERROR: &str = "connection_error";
    pub const DIAGNOSIS_ERROR: &str = "diagnosis_error";
    pub const AMBIGUOUS: &str = "ambiguous";
    pub const CONFIG_ERROR: &str = "config_error";
    pub const USAGE_ERROR: &str = "usage_error";
}
