//! Error types for canvas-forge operations.
//!
//! Defines error types for the subsystems that talk to the outside world:
//! - LLM API interactions (generation capability, credential checks)
//! - Canvas export (JSON snapshot, combined report)
//! - Log sink access
//!
//! Chain orchestration errors live in [`crate::chain::ChainError`] and
//! configuration errors in [`crate::config::ConfigError`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("Authentication failed ({code}): {message}")]
    Auth { code: u16, message: String },

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

impl LlmError {
    /// Returns true when the failure happened before or while talking to the
    /// API over the network, as opposed to an error reported by the API.
    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::RequestFailed(_))
    }
}

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid canvas JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Filesystem error at '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find a free file name for '{0}'")]
    NameExhausted(String),
}

impl ExportError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while opening or reading the log sink.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log file '{path}' is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}
