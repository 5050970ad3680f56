use async_trait::async_trait;
use llmassist_common::{AppConfig, AssistError, Result};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, info};

use crate::llm_trait::{ChunkStream, LlmPlugin};
use crate::sse::decode_body;
use crate::types::{ChatCompletionsRequest, HealthReport};

/// HTTP client for the LLM plugin's resource API
#[derive(Debug, Clone)]
pub struct LlmPluginClient {
    plugin_id: String,
    health_url: String,
    completions_url: String,
    api_token: Option<String>,
    health_timeout: Duration,
    client: Client,
}

impl LlmPluginClient {
    /// Create new plugin client
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        // Streams are bounded by the caller's deadline; health checks get their own
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AssistError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "LLM plugin client initialized: {} ({})",
            config.base_url, config.plugin_id
        );
        Ok(Self {
            plugin_id: config.plugin_id.clone(),
            health_url: config.health_url(),
            completions_url: config.chat_completions_url(),
            api_token: config.api_token.clone(),
            health_timeout: config.timeout(),
            client,
        })
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl LlmPlugin for LlmPluginClient {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    async fn health(&self) -> Result<HealthReport> {
        debug!("Probing LLM plugin health: {}", self.health_url);

        let response = self
            .authorize(self.client.get(&self.health_url))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to reach LLM plugin: {}", e)))?;

        // A missing plugin answers 404; that is "disabled", not a transport failure
        if !response.status().is_success() {
            debug!("LLM plugin health returned {}", response.status());
            return Ok(HealthReport::unhealthy());
        }

        response
            .json::<HealthReport>()
            .await
            .map_err(|e| AssistError::serialization(format!("Failed to parse health response: {}", e)))
    }

    async fn stream_chat_completions(&self, request: ChatCompletionsRequest) -> Result<ChunkStream> {
        debug!(
            "Opening completion stream - Model: {}, Messages: {}",
            request.model,
            request.messages.len()
        );

        let response = self
            .authorize(self.client.post(&self.completions_url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to send completion request: {}", e)))?
            .error_for_status()
            .map_err(|e| AssistError::network(format!("LLM plugin API error: {}", e)))?;

        Ok(decode_body(response.bytes_stream()))
    }
}
