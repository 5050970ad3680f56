//! llmassist LLM Integration
//!
//! LLM plugin client, streaming decoder, health cache and prompt helpers

mod client;
mod health;
mod llm_trait;
mod prompts;
mod sse;
mod types;

pub use client::LlmPluginClient;
pub use health::HealthCache;
pub use llm_trait::{ChunkStream, LlmPlugin};
pub use prompts::{feedback_message, feedback_messages, sanitize_reply, QuickFeedback};
pub use sse::{decode_body, SseDecoder, SseFrame};
pub use types::{
    ChatCompletionsRequest, HealthDetails, HealthReport, Message, Model, ProviderHealth, Role,
};
