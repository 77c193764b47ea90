//! Build → critique → optimize prompt chain.
//!
//! The chain turns a canvas into three texts, one per step:
//! 1. Build - an initial canvas analysis from the canvas description
//! 2. Critique - a critical review of that analysis
//! 3. Optimize - an improved canvas addressing the critique
//!
//! Steps run strictly in sequence because each prompt embeds the previous
//! outputs. Results are kept in a [`SessionContext`] owned by the caller.
//!
//! ```ignore
//! use canvas_forge::chain::{ChainRunner, ChainSettings, SessionContext};
//! use std::sync::Arc;
//!
//! let runner = ChainRunner::new(Arc::new(client), ChainSettings::default());
//! let mut session = SessionContext::new();
//! runner.run(&mut session, &canvas).await?;
//! ```

mod error;
pub mod prompts;
pub mod render;
mod runner;
mod types;

pub use error::{ChainError, ChainResult};
pub use render::{format_output, StreamPrinter};
pub use runner::{ChainRunner, ChainSettings};
pub use types::{ChainEvent, ChainState, ChainStep, ChainStepResult, SessionContext};
