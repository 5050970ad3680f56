use std::time::Duration;

/// llmassist error types
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// LLM related error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM plugin is not installed, not configured or failed its health check
    #[error("LLM plugin disabled: {0}")]
    PluginDisabled(String),

    /// Failure while a completion stream was open
    #[error("Stream error: {0}")]
    Stream(String),

    /// No terminal stream event arrived in time
    #[error("LLM stream timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssistError {
    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create plugin disabled error
    pub fn plugin_disabled<S: Into<String>>(msg: S) -> Self {
        Self::PluginDisabled(msg.into())
    }

    /// Create stream error
    pub fn stream<S: Into<String>>(msg: S) -> Self {
        Self::Stream(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}
