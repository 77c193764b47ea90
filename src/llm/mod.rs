//! LLM integration for canvas-forge.
//!
//! The prompt chain talks to a text-generation service through the
//! [`LlmProvider`] trait. [`GroqClient`] implements it against Groq's
//! OpenAI-compatible chat-completions endpoint, with streamed responses
//! decoded from server-sent events.
//!
//! ```ignore
//! use canvas_forge::llm::{GenerationRequest, GroqClient, LlmProvider, Message};
//! use futures::StreamExt;
//!
//! let client = GroqClient::from_env()?;
//! let request = GenerationRequest::new("", vec![Message::user("Hello")]);
//! let mut fragments = client.generate_stream(request).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! ```

pub mod groq;
pub mod sse;

pub use groq::{
    Choice, GenerationRequest, GenerationResponse, GroqClient, LlmProvider, Message, TextStream,
    Usage, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, GROQ_API_BASE,
};
