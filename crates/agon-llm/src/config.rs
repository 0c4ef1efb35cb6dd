//! Configuration management for Agon
//!
//! Handles provider selection, API keys and runtime settings read from
//! the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::mock::MockProvider;
use crate::openai::OpenAiCompatibleProvider;
use crate::provider::LlmProvider;
use crate::retry::{RetryConfig, RetryingProvider};

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `mock` or `openai` (env: AGON_PROVIDER)
    pub provider: String,
    /// API key (env: AGON_API_KEY)
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint (env: AGON_BASE_URL)
    pub base_url: String,
    /// Default model (env: AGON_MODEL)
    pub model: String,
    /// Attempts per call before a transient error surfaces (env: AGON_MAX_RETRIES)
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_attempts: 3,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: env::var("AGON_PROVIDER").unwrap_or(defaults.provider),
            api_key: env::var("AGON_API_KEY").ok(),
            base_url: env::var("AGON_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("AGON_MODEL").unwrap_or(defaults.model),
            max_attempts: env::var("AGON_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }
}

/// Full Agon configuration
#[derive(Debug, Clone)]
pub struct AgonConfig {
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Root directory for match storage
    pub data_dir: PathBuf,
    /// Default concurrency cap for topic execution
    pub max_concurrency: Option<usize>,
    /// Enable debug logging
    pub debug: bool,
}

impl Default for AgonConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            data_dir: PathBuf::from("matches"),
            max_concurrency: None,
            debug: false,
        }
    }
}

impl AgonConfig {
    /// Load from environment
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            data_dir: env::var("AGON_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("matches")),
            max_concurrency: env::var("AGON_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok()),
            debug: env::var("AGON_DEBUG")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false),
        }
    }
}

/// Construct the configured provider, wrapped with transparent retries
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    let retry = RetryConfig {
        max_attempts: config.max_attempts.max(1),
        ..RetryConfig::default()
    };
    match config.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::smart())),
        "openai" => {
            let key = config
                .api_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingEnvVar("AGON_API_KEY".to_string()))?;
            let provider = OpenAiCompatibleProvider::new(key, &config.base_url, &config.model);
            Ok(Arc::new(RetryingProvider::new(provider, retry)))
        }
        other => Err(ConfigError::Invalid(format!("unknown provider '{}'", other))),
    }
}
