//! Payloads of streamed chat completions.
//!
//! The API streams `data: {json}` events and ends with `data: [DONE]`.
//! Event framing is handled by `eventsource-stream`; this module only reads
//! the JSON carried by each event.

use serde::Deserialize;

use crate::error::LlmError;

/// Payload of the event that ends a completion stream.
pub const DONE_MARKER: &str = "[DONE]";

/// One streamed chunk of a chat completion.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorDetail {
    message: String,
}

/// Extracts the text fragment of a `data:` payload.
///
/// Returns `Ok(None)` for chunks that carry no text (role headers, usage,
/// finish markers).
pub fn parse_delta(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| LlmError::ParseError(format!("Invalid stream chunk: {} - {}", e, data)))?;

    if let Some(error) = chunk.error {
        return Err(LlmError::ApiError {
            code: 200,
            message: error.message,
        });
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|text| !text.is_empty()))
}
