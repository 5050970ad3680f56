use llmassist_common::AssistError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One prompt unit sent to the LLM
///
/// Order matters: system instructions go first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Model class exposed by the plugin
///
/// The plugin maps the class onto whatever provider model the admin configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    #[default]
    Base,
    Large,
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Base => f.write_str("base"),
            Model::Large => f.write_str("large"),
        }
    }
}

impl FromStr for Model {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(Model::Base),
            "large" => Ok(Model::Large),
            other => Err(AssistError::invalid_input(format!("unknown model: {}", other))),
        }
    }
}

/// Streaming chat completions request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionsRequest {
    /// Model class
    pub model: Model,

    /// Sampling temperature
    pub temperature: f32,

    /// Prompt messages, system first
    pub messages: Vec<Message>,

    /// Always true for this client
    pub stream: bool,
}

impl ChatCompletionsRequest {
    /// Create new streaming request
    pub fn new(model: Model, temperature: f32, messages: Vec<Message>) -> Self {
        Self {
            model,
            temperature,
            messages,
            stream: true,
        }
    }
}

/// Plugin health probe response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthReport {
    /// Overall status; false means the feature must stay hidden
    pub ok: bool,

    /// Per-subsystem details
    #[serde(default)]
    pub details: Option<HealthDetails>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            ok: true,
            details: None,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            ok: false,
            details: None,
        }
    }
}

/// Health details reported by the plugin
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetails {
    #[serde(default, alias = "openAI")]
    pub llm_provider: Option<ProviderHealth>,

    #[serde(default)]
    pub version: Option<String>,
}

/// LLM provider health
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderHealth {
    #[serde(default)]
    pub configured: bool,

    #[serde(default)]
    pub ok: bool,

    #[serde(default)]
    pub error: Option<String>,
}

/// One server-sent chunk of a chat completion
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    #[serde(default)]
    pub error: Option<ChunkError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChunkError {
    #[serde(default)]
    pub message: String,
}
