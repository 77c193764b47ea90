//! Groq chat-completions client.
//!
//! Groq exposes an OpenAI-compatible API. This module provides the request
//! and response types shared by every provider, the [`LlmProvider`] trait the
//! prompt chain is written against, and [`GroqClient`], which implements it
//! over HTTP with both single-shot and streamed completions.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use super::sse::{parse_delta, DONE_MARKER};
use crate::error::LlmError;

/// Default Groq API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default model for chain requests.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default HTTP timeout for a single request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation. Empty means the client default.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0). Higher values = more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the top_p for this request.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Content of the system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }

    /// Content of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated choices/completions.
    pub choices: Vec<Choice>,
    /// Token usage statistics.
    pub usage: Usage,
}

impl GenerationResponse {
    /// Builds a single-choice response holding `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(text),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }

    /// Get the content of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// A single generated choice from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    pub finish_reason: String,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// Lazy, finite sequence of text fragments from a streamed completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Trait for LLM providers that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Whether a non-empty credential is configured.
    fn has_api_key(&self) -> bool;

    /// Generate a complete response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;

    /// Generate a response as a stream of text fragments.
    ///
    /// The default implementation performs a single-shot request and yields
    /// its content as one fragment.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream, LlmError> {
        let response = self.generate(request).await?;
        let content = response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| LlmError::ParseError("No content in LLM response".to_string()))?;
        Ok(Box::pin(futures::stream::once(async move { Ok(content) })))
    }
}

/// Client for the Groq chat-completions API.
pub struct GroqClient {
    /// Base URL for the API.
    api_base: String,
    /// API key for authentication.
    api_key: Option<String>,
    /// Default model to use for requests.
    default_model: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl GroqClient {
    /// Create a new Groq client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the API (e.g., "https://api.groq.com/openai/v1")
    /// * `api_key` - API key; `None` or blank leaves the client unauthenticated
    /// * `default_model` - Model used when a request leaves `model` empty
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Self::with_timeout(
            api_base,
            api_key,
            default_model,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Like [`GroqClient::new`] with an explicit request timeout.
    pub fn with_timeout(
        api_base: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            default_model: default_model.into(),
            http_client,
        })
    }

    /// Create a client against the public Groq endpoint with the default model.
    pub fn new_with_defaults(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(GROQ_API_BASE, Some(api_key.into()), DEFAULT_MODEL)
    }

    /// Create a new client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `GROQ_API_KEY`: API key for authentication (required)
    /// - `GROQ_API_BASE`: Base URL (defaults to the public Groq endpoint)
    /// - `CANVAS_CHAIN_MODEL`: Default model (defaults to [`DEFAULT_MODEL`])
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `GROQ_API_KEY` is not set or blank.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;
        let api_base = env::var("GROQ_API_BASE").unwrap_or_else(|_| GROQ_API_BASE.to_string());
        let default_model =
            env::var("CANVAS_CHAIN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new(api_base, Some(api_key), default_model)
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the default model.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn build_api_request(&self, request: GenerationRequest, stream: bool) -> ApiRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };

        ApiRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            stream,
        }
    }

    /// Sends the request and turns non-success statuses into errors.
    async fn send(&self, api_request: &ApiRequest) -> Result<reqwest::Response, LlmError> {
        tracing::debug!(
            model = %api_request.model,
            stream = api_request.stream,
            messages = api_request.messages.len(),
            "Sending chat completion request"
        );

        let mut http_request = self
            .http_client
            .post(self.api_url())
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();
        if status.is_success() {
            return Ok(http_response);
        }

        let error_text = http_response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());

        Err(error_from_status(status.as_u16(), &error_text))
    }
}

/// Maps a non-success HTTP status and body to an [`LlmError`].
fn error_from_status(status_code: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status_code {
        401 | 403 => LlmError::Auth {
            code: status_code,
            message,
        },
        429 => LlmError::RateLimited(message),
        _ => LlmError::ApiError {
            code: status_code,
            message,
        },
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    stream: bool,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    index: u32,
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl From<ApiResponse> for GenerationResponse {
    fn from(api_response: ApiResponse) -> Self {
        let choices = api_response
            .choices
            .into_iter()
            .map(|choice| Choice {
                index: choice.index,
                message: Message {
                    role: choice.message.role,
                    content: choice.message.content.unwrap_or_default(),
                },
                finish_reason: choice.finish_reason.unwrap_or_default(),
            })
            .collect();

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        GenerationResponse {
            id: api_response.id,
            model: api_response.model,
            choices,
            usage,
        }
    }
}

#[async_trait]
impl LlmProvider for GroqClient {
    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let api_request = self.build_api_request(request, false);
        let http_response = self.send(&api_request).await?;

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        Ok(api_response.into())
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream, LlmError> {
        let api_request = self.build_api_request(request, true);
        let http_response = self.send(&api_request).await?;
        let mut events = Box::pin(http_response.bytes_stream().eventsource());

        let fragments = try_stream! {
            while let Some(event) = events.next().await {
                let event = event
                    .map_err(|e| LlmError::RequestFailed(format!("Stream read error: {}", e)))?;

                let data = event.data.trim();
                if data == DONE_MARKER {
                    break;
                }
                if data.is_empty() {
                    continue;
                }
                if let Some(text) = parse_delta(data)? {
                    yield text;
                }
            }
        };

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are helpful.");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "You are helpful.");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");

        let assistant = Message::assistant("Hi there!");
        assert_eq!(assistant.role, "assistant");
    }

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new(
            "llama-3.1-8b-instant",
            vec![Message::system("sys"), Message::user("first"), Message::user("second")],
        )
        .with_temperature(1.0)
        .with_max_tokens(1024)
        .with_top_p(1.0);

        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert_eq!(request.temperature, Some(1.0));
        assert_eq!(request.max_tokens, Some(1024));
        assert_eq!(request.top_p, Some(1.0));
        assert_eq!(request.system_prompt(), Some("sys"));
        assert_eq!(request.user_prompt(), Some("second"));
    }

    #[test]
    fn test_client_blank_key_counts_as_missing() {
        let client = GroqClient::new("http://localhost:4000", Some("  ".to_string()), "m")
            .expect("client builds");
        assert!(!client.has_api_key());

        let client = GroqClient::new_with_defaults("gsk_test").expect("client builds");
        assert!(client.has_api_key());
        assert_eq!(client.api_base(), GROQ_API_BASE);
        assert_eq!(client.default_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let client = GroqClient::new("http://localhost:4000/v1/", None, "m").expect("builds");
        assert_eq!(client.api_url(), "http://localhost:4000/v1/chat/completions");
    }

    #[test]
    fn test_api_request_uses_default_model_and_stream_flag() {
        let client = GroqClient::new("http://localhost:4000", None, "fallback").expect("builds");
        let request = GenerationRequest::new("", vec![Message::user("hi")]).with_max_tokens(10);

        let api_request = client.build_api_request(request, true);
        let json = serde_json::to_string(&api_request).expect("serialization should succeed");
        assert!(json.contains("\"model\":\"fallback\""));
        assert!(json.contains("\"stream\":true"));
        assert!(json.contains("\"max_tokens\":10"));
        assert!(!json.contains("top_p"));
    }

    #[test]
    fn test_error_from_status() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert!(matches!(
            error_from_status(401, body),
            LlmError::Auth { code: 401, ref message } if message == "Invalid API Key"
        ));
        assert!(matches!(
            error_from_status(429, body),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            error_from_status(503, "upstream down"),
            LlmError::ApiError { code: 503, ref message } if message == "upstream down"
        ));
    }

    #[test]
    fn test_api_response_conversion_tolerates_nulls() {
        let raw = r#"{"id":"chatcmpl-1","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":null}]}"#;
        let api_response: ApiResponse = serde_json::from_str(raw).expect("parses");
        let response: GenerationResponse = api_response.into();

        assert_eq!(response.first_content(), Some(""));
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[tokio::test]
    async fn test_generate_connection_error() {
        let client = GroqClient::new(
            "http://localhost:65535", // Use a port that's unlikely to have a server
            Some("key".to_string()),
            "m",
        )
        .expect("builds");

        let request = GenerationRequest::new("m", vec![Message::user("test")]);
        let err = client
            .generate(request.clone())
            .await
            .expect_err("no server is listening");
        assert!(err.is_transport());

        let err = match client.generate_stream(request).await {
            Ok(_) => panic!("stream should fail to connect"),
            Err(e) => e,
        };
        assert!(err.is_transport());
    }

    mod over_http {
        use super::*;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const STREAM_BODY: &str = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data:{\"choices\":[{\"delta\":{\"content\":\"lo •\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"AFTER\"}}]}\n\n",
        );

        fn client_for(server: &MockServer) -> GroqClient {
            GroqClient::new(server.uri(), Some("gsk_test".to_string()), "m").expect("builds")
        }

        fn request() -> GenerationRequest {
            GenerationRequest::new("", vec![Message::user("Hello")])
        }

        async fn collect(stream: TextStream) -> Vec<String> {
            stream
                .map(|fragment| fragment.expect("fragment should decode"))
                .collect()
                .await
        }

        #[tokio::test]
        async fn test_stream_yields_fragments_until_done() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(header("Authorization", "Bearer gsk_test"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_raw(STREAM_BODY, "text/event-stream"),
                )
                .expect(1)
                .mount(&server)
                .await;

            let stream = client_for(&server)
                .generate_stream(request())
                .await
                .expect("stream opens");
            assert_eq!(collect(stream).await, vec!["Hel".to_string(), "lo •".to_string()]);

            let received = server.received_requests().await.expect("recording enabled");
            let body: serde_json::Value =
                serde_json::from_slice(&received[0].body).expect("json body");
            assert_eq!(body["stream"], serde_json::Value::Bool(true));
            assert_eq!(body["model"], "m");
        }

        #[tokio::test]
        async fn test_stream_without_done_ends_with_body() {
            let server = MockServer::start().await;
            let body = "data: {\"choices\":[{\"delta\":{\"content\":\"only\"}}]}\n\n";
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .mount(&server)
                .await;

            let stream = client_for(&server)
                .generate_stream(request())
                .await
                .expect("stream opens");
            assert_eq!(collect(stream).await, vec!["only".to_string()]);
        }

        #[tokio::test]
        async fn test_malformed_chunk_fails_the_stream() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_raw("data: {not json\n\n", "text/event-stream"),
                )
                .mount(&server)
                .await;

            let mut stream = client_for(&server)
                .generate_stream(request())
                .await
                .expect("stream opens");
            assert!(matches!(stream.next().await, Some(Err(LlmError::ParseError(_)))));
        }

        #[tokio::test]
        async fn test_status_codes_map_to_errors() {
            let cases: [(u16, &str); 3] = [
                (401, r#"{"error":{"message":"Invalid API Key"}}"#),
                (429, r#"{"error":{"message":"Rate limit reached"}}"#),
                (500, "internal"),
            ];

            for (status, body) in cases {
                let server = MockServer::start().await;
                Mock::given(method("POST"))
                    .and(path("/chat/completions"))
                    .respond_with(ResponseTemplate::new(status).set_body_string(body))
                    .mount(&server)
                    .await;
                let client = client_for(&server);

                let streamed = match client.generate_stream(request()).await {
                    Ok(_) => panic!("status {status} should fail before streaming"),
                    Err(e) => e,
                };
                let single = client
                    .generate(request())
                    .await
                    .expect_err("non-success status");

                for err in [streamed, single] {
                    match (status, err) {
                        (401, LlmError::Auth { code, message }) => {
                            assert_eq!(code, 401);
                            assert_eq!(message, "Invalid API Key");
                        }
                        (429, LlmError::RateLimited(message)) => {
                            assert_eq!(message, "Rate limit reached");
                        }
                        (500, LlmError::ApiError { code, message }) => {
                            assert_eq!(code, 500);
                            assert_eq!(message, "internal");
                        }
                        (status, other) => panic!("status {status} mapped to {other:?}"),
                    }
                }
            }
        }

        #[tokio::test]
        async fn test_generate_parses_completion() {
            let server = MockServer::start().await;
            let body = serde_json::json!({
                "id": "chatcmpl-1",
                "model": "m",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hi"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
            });
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let response = client_for(&server)
                .generate(request())
                .await
                .expect("completion parses");
            assert_eq!(response.first_content(), Some("Hi"));
            assert_eq!(response.usage.total_tokens, 4);
        }
    }
}
