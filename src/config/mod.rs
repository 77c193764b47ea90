//! Application configuration.
//!
//! Values come from environment variables (usually loaded from `.env` at
//! start-up) with CLI flags applied on top by the command handlers.

pub mod credentials;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::chain::ChainSettings;
use crate::error::LlmError;
use crate::llm::{GroqClient, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, GROQ_API_BASE};

pub use credentials::{persist_api_key, validate_api_key, ValidationOutcome, API_KEY_VAR};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// IO error while reading or writing configuration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime configuration for the canvas tool.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Credential
    /// Groq API key; may be empty until validated or supplied on the command line.
    pub api_key: String,
    /// Base URL of the chat-completions API.
    pub api_base: String,

    // Models and sampling
    /// Model used for the three chain steps.
    pub chain_model: String,
    /// Model used for the credential check.
    pub validation_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub request_timeout: Duration,

    // Files
    /// Directory receiving exported canvases.
    pub export_dir: PathBuf,
    /// Append-only activity log.
    pub log_file: PathBuf,
    /// Env file the validated key is persisted to.
    pub env_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: GROQ_API_BASE.to_string(),

            chain_model: DEFAULT_MODEL.to_string(),
            validation_model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),

            export_dir: PathBuf::from("."),
            log_file: PathBuf::from("log.txt"),
            env_file: PathBuf::from(".env"),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GROQ_API_KEY`: API key (default: empty)
    /// - `GROQ_API_BASE`: API base URL (default: public Groq endpoint)
    /// - `CANVAS_CHAIN_MODEL`: Chain model (default: llama-3.1-8b-instant)
    /// - `CANVAS_VALIDATION_MODEL`: Key check model (default: llama-3.1-8b-instant)
    /// - `CANVAS_TEMPERATURE`: Sampling temperature (default: 1.0)
    /// - `CANVAS_MAX_TOKENS`: Tokens per step (default: 1024)
    /// - `CANVAS_TOP_P`: Nucleus sampling (default: 1.0)
    /// - `CANVAS_REQUEST_TIMEOUT_SECS`: HTTP timeout (default: 120)
    /// - `CANVAS_EXPORT_DIR`: Export directory (default: .)
    /// - `CANVAS_LOG_FILE`: Log file (default: log.txt)
    /// - `CANVAS_ENV_FILE`: Env file for key persistence (default: .env)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup(API_KEY_VAR) {
            config.api_key = val.trim().to_string();
        }

        if let Some(val) = lookup("GROQ_API_BASE") {
            config.api_base = val;
        }

        // Models and sampling
        if let Some(val) = lookup("CANVAS_CHAIN_MODEL") {
            config.chain_model = val;
        }

        if let Some(val) = lookup("CANVAS_VALIDATION_MODEL") {
            config.validation_model = val;
        }

        if let Some(val) = lookup("CANVAS_TEMPERATURE") {
            config.temperature = parse_env_value(&val, "CANVAS_TEMPERATURE")?;
        }

        if let Some(val) = lookup("CANVAS_MAX_TOKENS") {
            config.max_tokens = parse_env_value(&val, "CANVAS_MAX_TOKENS")?;
        }

        if let Some(val) = lookup("CANVAS_TOP_P") {
            config.top_p = parse_env_value(&val, "CANVAS_TOP_P")?;
        }

        if let Some(val) = lookup("CANVAS_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "CANVAS_REQUEST_TIMEOUT_SECS")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        // Files
        if let Some(val) = lookup("CANVAS_EXPORT_DIR") {
            config.export_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("CANVAS_LOG_FILE") {
            config.log_file = PathBuf::from(val);
        }

        if let Some(val) = lookup("CANVAS_ENV_FILE") {
            config.env_file = PathBuf::from(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// An empty API key is accepted here; the chain runner refuses to start
    /// without one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "api_base cannot be empty".to_string(),
            ));
        }

        if self.chain_model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "chain_model cannot be empty".to_string(),
            ));
        }

        if self.validation_model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "validation_model cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::ValidationFailed(
                "top_p must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.request_timeout.as_secs() == 0 {
            return Err(ConfigError::ValidationFailed(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into().trim().to_string();
        self
    }

    pub fn with_chain_model(mut self, model: impl Into<String>) -> Self {
        self.chain_model = model.into();
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Sampling parameters for the chain steps.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings::new(self.chain_model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_top_p(self.top_p)
    }

    /// Builds a Groq client for the configured endpoint and key.
    pub fn groq_client(&self) -> Result<GroqClient, LlmError> {
        let api_key = self.has_api_key().then(|| self.api_key.clone());
        GroqClient::with_timeout(
            self.api_base.clone(),
            api_key,
            self.chain_model.clone(),
            self.request_timeout,
        )
    }
}

/// Parse an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_key, "");
        assert_eq!(config.api_base, GROQ_API_BASE);
        assert_eq!(config.chain_model, "llama-3.1-8b-instant");
        assert_eq!(config.validation_model, "llama-3.1-8b-instant");
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.top_p, 1.0);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.log_file, PathBuf::from("log.txt"));
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", "  gsk_test  "),
            ("CANVAS_CHAIN_MODEL", "llama-3.3-70b-versatile"),
            ("CANVAS_TEMPERATURE", "0.4"),
            ("CANVAS_MAX_TOKENS", "2048"),
            ("CANVAS_TOP_P", "0.9"),
            ("CANVAS_REQUEST_TIMEOUT_SECS", "30"),
            ("CANVAS_EXPORT_DIR", "out"),
        ]))
        .expect("valid configuration");

        assert_eq!(config.api_key, "gsk_test");
        assert!(config.has_api_key());
        assert_eq!(config.chain_model, "llama-3.3-70b-versatile");
        assert_eq!(config.validation_model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.4);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.top_p, 0.9);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.export_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_unparsable_value_names_the_key() {
        let err = AppConfig::from_lookup(lookup_from(&[("CANVAS_MAX_TOKENS", "lots")]))
            .expect_err("non-numeric max tokens");
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "CANVAS_MAX_TOKENS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let cases = [
            ("CANVAS_TEMPERATURE", "2.5"),
            ("CANVAS_TEMPERATURE", "-0.1"),
            ("CANVAS_TOP_P", "1.5"),
            ("CANVAS_MAX_TOKENS", "0"),
            ("CANVAS_REQUEST_TIMEOUT_SECS", "0"),
            ("CANVAS_CHAIN_MODEL", " "),
        ];
        for (key, value) in cases {
            let result = AppConfig::from_lookup(lookup_from(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::ValidationFailed(_))),
                "{key}={value} should fail validation"
            );
        }
    }

    #[test]
    fn test_chain_settings_follow_config() {
        let mut config = AppConfig::new().with_chain_model("custom-model");
        config.temperature = 0.2;
        config.max_tokens = 256;
        config.top_p = 0.5;

        let settings = config.chain_settings();
        assert_eq!(settings.model, "custom-model");
        assert_eq!(settings.temperature, 0.2);
        assert_eq!(settings.max_tokens, 256);
        assert_eq!(settings.top_p, 0.5);
    }

    #[test]
    fn test_groq_client_without_key_is_unauthenticated() {
        let client = AppConfig::new().groq_client().expect("client builds");
        assert!(!client.has_api_key());

        let client = AppConfig::new()
            .with_api_key("gsk_live")
            .groq_client()
            .expect("client builds");
        assert!(client.has_api_key());
        assert_eq!(client.default_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_empty_environment_is_not_an_error() {
        let config = AppConfig::from_lookup(lookup_from(&[])).expect("nothing is required");
        assert!(!config.has_api_key());
        assert_eq!(config.chain_model, DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }
}
