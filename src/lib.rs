//! canvas-forge: business model canvas evaluation with an LLM prompt chain.
//!
//! A canvas of nine fields is turned into a labeled description, sent through
//! three streamed generation steps (build, critique, optimize) and exported as
//! JSON or as a combined text report.

pub mod canvas;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod logging;

pub use canvas::{CanvasDescription, CanvasField, CanvasInput};
pub use chain::{ChainError, ChainEvent, ChainRunner, ChainState, ChainStep, SessionContext};
pub use config::{AppConfig, ConfigError};
pub use error::{ExportError, LlmError, LogError};
