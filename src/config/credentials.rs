//! API key validation and persistence.

use std::path::Path;

use tokio::fs;
use tracing::{error, info, warn};

use super::ConfigError;
use crate::llm::{GenerationRequest, LlmProvider, Message};

/// Environment variable holding the Groq API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

const VALIDATION_PROMPT: &str = "Hello";
const VALIDATION_MAX_TOKENS: u32 = 10;

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The service accepted the key.
    Valid,
    /// The key was blank; no request was made.
    Empty,
    /// The request failed; carries the error message.
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// Checks that `llm` can complete a minimal request with `model`.
///
/// `llm` must already carry the key under test. A provider without a key is
/// reported as [`ValidationOutcome::Empty`] without touching the network.
pub async fn validate_api_key(llm: &dyn LlmProvider, model: &str) -> ValidationOutcome {
    if !llm.has_api_key() {
        warn!("API key validation skipped: key is empty");
        return ValidationOutcome::Empty;
    }

    info!("Attempting to validate API key");
    let request = GenerationRequest::new(model, vec![Message::user(VALIDATION_PROMPT)])
        .with_max_tokens(VALIDATION_MAX_TOKENS);

    match llm.generate(request).await {
        Ok(_) => {
            info!("API key validation successful");
            ValidationOutcome::Valid
        }
        Err(e) => {
            error!("API key validation failed: {}", e);
            ValidationOutcome::Rejected(e.to_string())
        }
    }
}

/// Writes `GROQ_API_KEY=<key>` into the env file at `path`.
///
/// An existing key line is replaced in place; every other line is kept.
/// The file is created when missing.
pub async fn persist_api_key(path: impl AsRef<Path>, api_key: &str) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: API_KEY_VAR.to_string(),
            message: "refusing to persist an empty key".to_string(),
        });
    }

    let existing = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let content = upsert_key_line(&existing, api_key);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;

    info!("Saved API key to {}", path.display());
    Ok(())
}

fn upsert_key_line(existing: &str, api_key: &str) -> String {
    let new_line = format!("{}={}", API_KEY_VAR, api_key);
    let mut replaced = false;

    let mut lines: Vec<String> = existing
        .lines()
        .filter_map(|line| {
            if !is_key_line(line) {
                return Some(line.to_string());
            }
            if replaced {
                None
            } else {
                replaced = true;
                Some(new_line.clone())
            }
        })
        .collect();

    if !replaced {
        lines.push(new_line);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

fn is_key_line(line: &str) -> bool {
    let line = line.trim_start();
    let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
    line.strip_prefix(API_KEY_VAR)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}
