//! Single-flight streaming completion hook
//!
//! An [`LlmStream`] owns the lifecycle of one completion at a time:
//! `Idle -> Generating -> Completed | Error`, with cancellation through
//! [`LlmStream::stop_generation`] and a per-attempt deadline.

use futures::StreamExt;
use llmassist_common::{AppConfig, AssistError, Result, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};
use llmassist_llm::{sanitize_reply, ChatCompletionsRequest, HealthCache, LlmPlugin, Message, Model};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Lifecycle state of the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Error,
}

/// Request settings shared by every generation of one stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    pub model: Model,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            model: Model::Base,
            temperature: 1.0,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl StreamOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::default()
            .with_model(config.model.parse()?)
            .with_temperature(config.temperature)
            .with_timeout(config.timeout()))
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the deadline for a terminal stream event, capped at 60 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(Duration::from_millis(MAX_TIMEOUT_MS));
        self
    }
}

/// Observable state of a stream
#[derive(Debug, Clone, Default)]
pub struct StreamSnapshot {
    pub status: StreamStatus,

    /// Accumulated text; sanitized once the stream completes
    pub reply: String,

    /// Failure of the last attempt
    pub error: Option<Arc<AssistError>>,

    /// Health check result, `None` until probed
    pub enabled: Option<bool>,
}

impl StreamSnapshot {
    pub fn is_generating(&self) -> bool {
        self.status == StreamStatus::Generating
    }
}

/// Result of one generation attempt
#[derive(Debug, Clone)]
pub enum Generation {
    /// Sanitized final reply
    Completed(String),
    /// Cancelled before completion
    Stopped,
    /// Plugin disabled; no request was sent
    Disabled,
    Failed(Arc<AssistError>),
    /// Another generation is already in flight
    Busy,
    /// Nothing to send
    Empty,
}

impl Generation {
    pub fn reply(&self) -> Option<&str> {
        match self {
            Generation::Completed(reply) => Some(reply),
            _ => None,
        }
    }
}

/// Rejected re-entrant submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a generation is already in flight")]
pub struct Busy;

type ResponseCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Holder of the single-flight slot
struct InFlight {
    id: Uuid,
    token: CancellationToken,
}

struct StreamShared {
    plugin: Arc<dyn LlmPlugin>,
    health: Arc<HealthCache>,
    options: StreamOptions,
    on_response: Mutex<Option<ResponseCallback>>,
    in_flight: Mutex<Option<InFlight>>,
    state: watch::Sender<StreamSnapshot>,
}

impl StreamShared {
    fn slot(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the slot if `id` still holds it
    fn release(&self, id: Uuid) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(in_flight) if in_flight.id == id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

/// Streaming completion hook
///
/// Clones share state; use [`LlmStream::fork`] for an independent instance.
#[derive(Clone)]
pub struct LlmStream {
    shared: Arc<StreamShared>,
}

impl std::fmt::Debug for LlmStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmStream")
            .field("plugin_id", &self.shared.plugin.plugin_id())
            .field("options", &self.shared.options)
            .field("status", &self.shared.state.borrow().status)
            .finish()
    }
}

impl LlmStream {
    pub fn new(plugin: Arc<dyn LlmPlugin>, health: Arc<HealthCache>, options: StreamOptions) -> Self {
        let (state, _) = watch::channel(StreamSnapshot::default());
        Self {
            shared: Arc::new(StreamShared {
                plugin,
                health,
                options,
                on_response: Mutex::new(None),
                in_flight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Independent stream with the same plugin, health cache and options
    pub fn fork(&self) -> Self {
        Self::new(
            Arc::clone(&self.shared.plugin),
            Arc::clone(&self.shared.health),
            self.shared.options,
        )
    }

    /// Called with the sanitized reply once per successful generation
    pub fn set_on_response(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        let mut slot = self
            .shared
            .on_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(callback));
    }

    pub fn options(&self) -> StreamOptions {
        self.shared.options
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Whether a generation currently holds the single-flight slot
    pub fn is_generating(&self) -> bool {
        self.shared.slot().is_some()
    }

    /// Probe (or reuse the memoized) plugin health
    ///
    /// A health check that outlasts the configured timeout counts as disabled.
    pub async fn is_enabled(&self) -> bool {
        let timeout = self.shared.options.timeout;
        match tokio::time::timeout(timeout, self.probe_health()).await {
            Ok(enabled) => enabled,
            Err(_) => {
                warn!("LLM plugin health check timed out after {}ms", timeout.as_millis());
                self.shared.state.send_modify(|s| s.enabled = Some(false));
                false
            }
        }
    }

    async fn probe_health(&self) -> bool {
        let enabled = self.shared.health.is_enabled(self.shared.plugin.as_ref()).await;
        self.shared.state.send_modify(|s| s.enabled = Some(enabled));
        enabled
    }

    /// Claim the single-flight slot
    ///
    /// The returned ticket must be run (or dropped) to release the slot.
    pub fn begin(&self) -> std::result::Result<Ticket, Busy> {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        {
            let mut slot = self.shared.slot();
            if slot.is_some() {
                return Err(Busy);
            }
            *slot = Some(InFlight {
                id,
                token: token.clone(),
            });
        }

        self.shared.state.send_modify(|s| {
            s.status = StreamStatus::Generating;
            s.reply.clear();
            s.error = None;
        });

        Ok(Ticket {
            stream: self.clone(),
            token,
            id,
        })
    }

    /// Claim and run in one step
    pub async fn generate(&self, messages: Vec<Message>) -> Generation {
        if messages.is_empty() {
            return Generation::Empty;
        }
        match self.begin() {
            Ok(ticket) => ticket.run(messages).await,
            Err(Busy) => {
                debug!("Ignoring re-entrant generate call");
                Generation::Busy
            }
        }
    }

    /// Cancel the in-flight generation, if any
    pub fn stop_generation(&self) -> bool {
        match self.shared.slot().as_ref() {
            Some(in_flight) => {
                in_flight.token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Claimed right to run one generation
pub struct Ticket {
    stream: LlmStream,
    token: CancellationToken,
    id: Uuid,
}

impl Ticket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run the generation to its terminal state
    pub async fn run(self, messages: Vec<Message>) -> Generation {
        let options = self.stream.shared.options;
        let span = info_span!(
            "generation",
            id = %self.id,
            model = %options.model,
            messages = messages.len()
        );
        self.execute(messages).instrument(span).await
    }

    async fn execute(&self, messages: Vec<Message>) -> Generation {
        if messages.is_empty() {
            self.finish(StreamStatus::Idle, None);
            return Generation::Empty;
        }

        // One deadline covers the health probe and the stream
        let timeout = self.stream.shared.options.timeout;
        let deadline = Instant::now() + timeout;

        let enabled = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                self.finish(StreamStatus::Idle, None);
                return Generation::Stopped;
            }
            _ = tokio::time::sleep_until(deadline) => {
                return self.fail(AssistError::Timeout(timeout));
            }
            enabled = self.stream.probe_health() => enabled,
        };

        if !enabled {
            info!("LLM plugin is disabled, skipping generation");
            self.finish(StreamStatus::Idle, None);
            return Generation::Disabled;
        }

        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            _ = tokio::time::sleep_until(deadline) => Some(Err(AssistError::Timeout(timeout))),
            result = self.consume(messages) => Some(result),
        };

        // A stop that raced the last chunk still wins
        let result = match result {
            Some(result) if !self.token.is_cancelled() => result,
            _ => {
                info!("Generation stopped");
                self.finish(StreamStatus::Idle, None);
                return Generation::Stopped;
            }
        };

        match result {
            Ok(raw) => {
                let reply = sanitize_reply(&raw);
                info!("Generation completed - Length: {}", reply.len());
                self.stream
                    .shared
                    .state
                    .send_modify(|s| s.reply = reply.clone());
                self.finish(StreamStatus::Completed, None);

                let callback = self
                    .stream
                    .shared
                    .on_response
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                if let Some(callback) = callback {
                    callback(&reply);
                }
                Generation::Completed(reply)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, e: AssistError) -> Generation {
        warn!("Generation failed: {}", e);
        let error = Arc::new(e);
        self.finish(StreamStatus::Error, Some(Arc::clone(&error)));
        Generation::Failed(error)
    }

    async fn consume(&self, messages: Vec<Message>) -> Result<String> {
        let options = self.stream.shared.options;
        let request = ChatCompletionsRequest::new(options.model, options.temperature, messages);
        let mut chunks = self.stream.shared.plugin.stream_chat_completions(request).await?;

        let mut reply = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            reply.push_str(&chunk);
            self.stream
                .shared
                .state
                .send_modify(|s| s.reply.push_str(&chunk));
        }

        debug!("Completion stream ended - Raw length: {}", reply.len());
        Ok(reply)
    }

    /// Release the slot, then publish the terminal state
    fn finish(&self, status: StreamStatus, error: Option<Arc<AssistError>>) {
        self.stream.shared.release(self.id);
        self.stream.shared.state.send_modify(|s| {
            s.status = status;
            s.error = error;
        });
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.stream.shared.release(self.id) {
            // Dropped mid-run (or never run)
            self.token.cancel();
            self.stream.shared.state.send_if_modified(|s| {
                if s.status == StreamStatus::Generating {
                    s.status = StreamStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }
}
