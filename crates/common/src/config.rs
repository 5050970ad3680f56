use crate::error::AssistError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest timeout a generation may be given (heavy prompts)
pub const MAX_TIMEOUT_MS: u64 = 60_000;

/// Default generation timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// llmassist application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the dashboard server hosting the LLM plugin
    pub base_url: String,

    /// LLM plugin id
    pub plugin_id: String,

    /// Optional bearer token (service account token)
    pub api_token: Option<String>,

    /// Model class ("base" or "large")
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Generation timeout in milliseconds
    pub timeout_ms: u64,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            plugin_id: "grafana-llm-app".to_string(),
            api_token: None,
            model: "base".to_string(),
            temperature: 1.0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, AssistError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            base_url: std::env::var("LLMASSIST_BASE_URL").unwrap_or(defaults.base_url),
            plugin_id: std::env::var("LLMASSIST_PLUGIN_ID").unwrap_or(defaults.plugin_id),
            api_token: std::env::var("LLMASSIST_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            model: std::env::var("LLMASSIST_MODEL").unwrap_or(defaults.model),
            temperature: Self::get_env_parsed("LLMASSIST_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            timeout_ms: Self::get_env_parsed("LLMASSIST_TIMEOUT_MS")?
                .unwrap_or(defaults.timeout_ms),
            log_dir: std::env::var("LLMASSIST_LOG_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: std::env::var("LLMASSIST_LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse a numeric environment variable, rejecting malformed values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AssistError> {
        match std::env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| AssistError::config(format!("{} has an invalid value: {}", key, raw))),
            Err(_) => Ok(None),
        }
    }

    /// Generation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Plugin resource root
    fn plugin_resources_url(&self) -> String {
        format!(
            "{}/api/plugins/{}/resources",
            self.base_url.trim_end_matches('/'),
            self.plugin_id
        )
    }

    /// Health probe endpoint
    pub fn health_url(&self) -> String {
        format!("{}/health", self.plugin_resources_url())
    }

    /// Streaming chat completions endpoint
    pub fn chat_completions_url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.plugin_resources_url())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AssistError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(AssistError::config(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.plugin_id.trim().is_empty() {
            return Err(AssistError::config("Plugin id cannot be empty"));
        }

        if !matches!(self.model.as_str(), "base" | "large") {
            return Err(AssistError::config(format!(
                "Unknown model '{}', expected 'base' or 'large'",
                self.model
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AssistError::config("Temperature must be between 0 and 2"));
        }

        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(AssistError::config(format!(
                "Timeout must be between 1 and {} ms",
                MAX_TIMEOUT_MS
            )));
        }

        Ok(())
    }
}
