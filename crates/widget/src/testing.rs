//! Scripted plugin used by the widget tests

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use futures::stream::{self, StreamExt};
use llmassist_common::{AssistError, Result};
use llmassist_llm::{ChatCompletionsRequest, ChunkStream, HealthReport, LlmPlugin, Message};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Behaviour of one opened stream
pub enum Script {
    /// Emit these deltas, then complete
    Chunks(Vec<String>),
    /// Never emit a terminal event
    Hang,
    /// Fail mid-stream
    Fail(String),
    /// Deltas pushed by the test
    Channel(mpsc::UnboundedReceiver<Result<String>>),
}

impl Script {
    pub fn chunks(parts: &[&str]) -> Self {
        Script::Chunks(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn reply(text: &str) -> Self {
        Script::Chunks(vec![text.to_string()])
    }
}

pub struct ScriptedPlugin {
    healthy: AtomicBool,
    health_hangs: AtomicBool,
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatCompletionsRequest>>,
    health_probes: AtomicUsize,
    stream_opens: AtomicUsize,
}

impl ScriptedPlugin {
    pub fn healthy(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
            health_hangs: AtomicBool::new(false),
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
            health_probes: AtomicUsize::new(0),
            stream_opens: AtomicUsize::new(0),
        })
    }

    pub fn unhealthy() -> Arc<Self> {
        let plugin = Self::healthy(Vec::new());
        plugin.healthy.store(false, Ordering::SeqCst);
        plugin
    }

    /// Plugin that accepts health probes but never answers them
    pub fn hanging_health(scripts: Vec<Script>) -> Arc<Self> {
        let plugin = Self::healthy(scripts);
        plugin.health_hangs.store(true, Ordering::SeqCst);
        plugin
    }

    /// Plugin whose next stream is fed through the returned sender
    pub fn with_channel() -> (Arc<Self>, UnboundedSender<Result<String>>) {
        let (tx, rx) = mpsc::unbounded();
        (Self::healthy(vec![Script::Channel(rx)]), tx)
    }

    pub fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn health_probes(&self) -> usize {
        self.health_probes.load(Ordering::SeqCst)
    }

    pub fn stream_opens(&self) -> usize {
        self.stream_opens.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatCompletionsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmPlugin for ScriptedPlugin {
    fn plugin_id(&self) -> &str {
        "scripted-llm"
    }

    async fn health(&self) -> Result<HealthReport> {
        self.health_probes.fetch_add(1, Ordering::SeqCst);
        if self.health_hangs.load(Ordering::SeqCst) {
            return futures::future::pending().await;
        }
        Ok(HealthReport {
            ok: self.healthy.load(Ordering::SeqCst),
            details: None,
        })
    }

    async fn stream_chat_completions(&self, request: ChatCompletionsRequest) -> Result<ChunkStream> {
        self.stream_opens.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AssistError::llm("no script left"))?;

        Ok(match script {
            Script::Chunks(parts) => stream::iter(parts.into_iter().map(Ok)).boxed(),
            Script::Hang => stream::pending().boxed(),
            Script::Fail(message) => stream::iter(vec![
                Ok("partial".to_string()),
                Err(AssistError::stream(message)),
            ])
            .boxed(),
            Script::Channel(rx) => rx.boxed(),
        })
    }
}

pub fn hello_messages() -> Vec<Message> {
    vec![Message::system("Reply with a greeting")]
}
