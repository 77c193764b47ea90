//! Error types for the prompt chain.

use thiserror::Error;

use super::types::ChainStep;
use crate::error::LlmError;

/// Errors that end a chain run.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Preconditions not met; no step was attempted.
    #[error("Chain configuration error: {0}")]
    Configuration(String),

    /// A step's generation call failed; later steps were not attempted.
    #[error("{step} step failed: {source}")]
    Generation {
        step: ChainStep,
        #[source]
        source: LlmError,
    },
}

impl ChainError {
    /// The step that failed, if the run got that far.
    pub fn step(&self) -> Option<ChainStep> {
        match self {
            ChainError::Configuration(_) => None,
            ChainError::Generation { step, .. } => Some(*step),
        }
    }

    /// Returns true for errors raised before any generation call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ChainError::Configuration(_))
    }
}

/// Result type alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
