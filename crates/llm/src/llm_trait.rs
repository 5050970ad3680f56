use crate::types::{ChatCompletionsRequest, HealthReport};
use async_trait::async_trait;
use futures::stream::BoxStream;
use llmassist_common::Result;

/// Content deltas of one completion, in emission order
pub type ChunkStream = BoxStream<'static, Result<String>>;

/// Common trait for LLM plugin backends
#[async_trait]
pub trait LlmPlugin: Send + Sync {
    /// Identifier used to key the health cache
    fn plugin_id(&self) -> &str;

    /// Probe whether the plugin is installed and its provider configured
    async fn health(&self) -> Result<HealthReport>;

    /// Open a streaming chat completion
    ///
    /// The stream ends after the last delta; an `Err` item terminates it.
    async fn stream_chat_completions(&self, request: ChatCompletionsRequest) -> Result<ChunkStream>;
}
