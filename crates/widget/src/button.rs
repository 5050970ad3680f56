//! Generate button state machine
//!
//! ```text
//! Idle --click--> Generating --complete--> HasHistory --click--> (history panel)
//!                  |   |
//!                  |   +--fail/timeout--> Errored --click--> Generating (same messages)
//!                  +--click--> Idle/HasHistory (stopped, nothing recorded)
//! ```
//!
//! A disabled plugin puts the button in `Hidden`, which renders nothing.

use llmassist_common::AssistError;
use llmassist_llm::Message;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::history::HistoryPanel;
use crate::interaction::{report_interaction, EventTrackingSrc, Interaction};
use crate::stream::{Generation, LlmStream, Ticket};

pub const DEFAULT_TEXT: &str = "Auto generate";

pub const ERROR_TOOLTIP: &str = "Failed to generate content using the LLM plugin. \
    Please try again or, if the problem persists, contact your organization admin.";

pub type MessagesThunk = Arc<dyn Fn() -> Vec<Message> + Send + Sync>;
pub(crate) type TextCallback = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type HistoryCallback = Arc<dyn Fn(&[String]) + Send + Sync>;
type ClickHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonState {
    /// Nothing generated yet
    Idle,
    Generating,
    /// Last attempt failed; clicking retries it
    Errored { message: String },
    /// At least one reply recorded; clicking opens the history panel
    HasHistory,
    /// Plugin disabled
    Hidden,
}

/// What a click did
pub enum ClickOutcome {
    Started,
    Stopped,
    Retried,
    OpenedHistory(HistoryPanel),
    Ignored,
}

impl std::fmt::Debug for ClickOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickOutcome::Started => f.write_str("Started"),
            ClickOutcome::Stopped => f.write_str("Stopped"),
            ClickOutcome::Retried => f.write_str("Retried"),
            ClickOutcome::OpenedHistory(_) => f.write_str("OpenedHistory"),
            ClickOutcome::Ignored => f.write_str("Ignored"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Ai,
    Spinner,
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Secondary,
    Destructive,
}

/// Everything needed to draw the button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub icon: Icon,
    pub variant: Variant,
    pub tooltip: Option<String>,
    pub disabled: bool,
}

struct Attempt {
    id: Uuid,
    token: CancellationToken,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PanelState {
    pub(crate) open: bool,
    /// 1-based
    pub(crate) index: usize,
}

pub(crate) struct ButtonInner {
    pub(crate) state: ButtonState,
    /// Most recent first
    pub(crate) history: Vec<String>,
    pub(crate) last_messages: Vec<Message>,
    pub(crate) panel: PanelState,
    pub(crate) unmounted: bool,
    attempt: Option<Attempt>,
}

pub(crate) struct ButtonShared {
    pub(crate) stream: LlmStream,
    pub(crate) panel_stream: LlmStream,
    pub(crate) on_generate: Option<TextCallback>,
    pub(crate) src: EventTrackingSrc,
    messages: MessagesThunk,
    text: String,
    on_click: Option<ClickHook>,
    on_history_change: Option<HistoryCallback>,
    disabled: bool,
    tooltip: Option<String>,
    inner: Mutex<ButtonInner>,
    state_tx: watch::Sender<ButtonState>,
}

impl ButtonShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, ButtonInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, inner: &mut ButtonInner, state: ButtonState) {
        if inner.state != state {
            debug!("Button state {:?} -> {:?}", inner.state, state);
        }
        inner.state = state.clone();
        self.state_tx.send_replace(state);
    }

    fn resting_state(inner: &ButtonInner) -> ButtonState {
        if inner.history.is_empty() {
            ButtonState::Idle
        } else {
            ButtonState::HasHistory
        }
    }

    /// Prepend a reply; returns the history to hand to `on_history_change`
    pub(crate) fn record(inner: &mut ButtonInner, reply: String) -> Vec<String> {
        inner.history.insert(0, reply);
        inner.panel.index = 1;
        inner.history.clone()
    }

    pub(crate) fn notify_history(&self, history: &[String]) {
        if let Some(callback) = &self.on_history_change {
            callback(history);
        }
    }

    /// Apply the terminal outcome of a button-issued attempt
    fn settle(&self, attempt_id: Uuid, outcome: Generation) {
        let mut inner = self.lock();
        let current = inner.attempt.as_ref().map(|a| a.id) == Some(attempt_id);
        if !current || inner.unmounted {
            // Stopped by a click or by unmount; the click already moved the state
            return;
        }
        inner.attempt = None;

        match outcome {
            Generation::Completed(reply) => {
                let history = Self::record(&mut inner, reply.clone());
                self.set_state(&mut inner, ButtonState::HasHistory);
                drop(inner);

                if let Some(on_generate) = &self.on_generate {
                    on_generate(&reply);
                }
                self.notify_history(&history);
            }
            Generation::Disabled => self.set_state(&mut inner, ButtonState::Hidden),
            Generation::Failed(error) => {
                warn!("Generation attempt failed: {}", error);
                self.set_state(
                    &mut inner,
                    ButtonState::Errored {
                        message: error.to_string(),
                    },
                );
            }
            Generation::Stopped | Generation::Busy | Generation::Empty => {
                let state = Self::resting_state(&inner);
                self.set_state(&mut inner, state);
            }
        }
    }

    fn unmount(&self) {
        let mut inner = self.lock();
        inner.unmounted = true;
        inner.panel.open = false;
        if let Some(attempt) = inner.attempt.take() {
            attempt.token.cancel();
        }
        drop(inner);

        self.stream.stop_generation();
        self.panel_stream.stop_generation();
    }
}

pub struct GenAiButtonBuilder {
    stream: LlmStream,
    messages: MessagesThunk,
    text: String,
    on_click: Option<ClickHook>,
    on_generate: Option<TextCallback>,
    on_history_change: Option<HistoryCallback>,
    src: EventTrackingSrc,
    disabled: bool,
    tooltip: Option<String>,
}

impl GenAiButtonBuilder {
    /// Label shown before anything was generated
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Hook fired before the first submit
    pub fn on_click(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(hook));
        self
    }

    /// Receives each sanitized reply, and applied history entries
    pub fn on_generate(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_generate = Some(Arc::new(callback));
        self
    }

    /// Receives the full history after every new entry
    pub fn on_history_change(mut self, callback: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.on_history_change = Some(Arc::new(callback));
        self
    }

    pub fn event_source(mut self, src: EventTrackingSrc) -> Self {
        self.src = src;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Probe plugin health and create the button
    pub async fn mount(self) -> GenAiButton {
        let enabled = self.stream.is_enabled().await;
        let state = if enabled {
            ButtonState::Idle
        } else {
            ButtonState::Hidden
        };
        let (state_tx, _) = watch::channel(state.clone());

        GenAiButton {
            shared: Arc::new(ButtonShared {
                panel_stream: self.stream.fork(),
                stream: self.stream,
                on_generate: self.on_generate,
                src: self.src,
                messages: self.messages,
                text: self.text,
                on_click: self.on_click,
                on_history_change: self.on_history_change,
                disabled: self.disabled,
                tooltip: self.tooltip,
                inner: Mutex::new(ButtonInner {
                    state,
                    history: Vec::new(),
                    last_messages: Vec::new(),
                    panel: PanelState {
                        open: false,
                        index: 1,
                    },
                    unmounted: false,
                    attempt: None,
                }),
                state_tx,
            }),
        }
    }
}

/// AI generate button
///
/// Dropping the button unmounts it: in-flight generations are cancelled and
/// their results never reach the callbacks.
pub struct GenAiButton {
    shared: Arc<ButtonShared>,
}

impl GenAiButton {
    /// `messages` is evaluated lazily, each time a new generation is submitted
    pub fn builder(
        stream: LlmStream,
        messages: impl Fn() -> Vec<Message> + Send + Sync + 'static,
    ) -> GenAiButtonBuilder {
        GenAiButtonBuilder {
            stream,
            messages: Arc::new(messages),
            text: DEFAULT_TEXT.to_string(),
            on_click: None,
            on_generate: None,
            on_history_change: None,
            src: EventTrackingSrc::Unknown,
            disabled: false,
            tooltip: None,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.shared.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ButtonState> {
        self.shared.state_tx.subscribe()
    }

    /// Most recent first
    pub fn history(&self) -> Vec<String> {
        self.shared.lock().history.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.shared.lock().state == ButtonState::Generating
    }

    /// Underlying stream, for partial reply text
    pub fn stream(&self) -> &LlmStream {
        &self.shared.stream
    }

    pub fn error(&self) -> Option<Arc<AssistError>> {
        match self.shared.lock().state {
            ButtonState::Errored { .. } => self.shared.stream.snapshot().error,
            _ => None,
        }
    }

    /// Handle to the history panel while it is open
    pub fn history_panel(&self) -> Option<HistoryPanel> {
        if self.shared.lock().panel.open {
            Some(HistoryPanel::new(Arc::clone(&self.shared)))
        } else {
            None
        }
    }

    /// Re-probe plugin health, showing or hiding the button
    pub async fn refresh(&self) -> bool {
        let enabled = self.shared.stream.is_enabled().await;
        let mut inner = self.shared.lock();
        let current = inner.state.clone();
        match (current, enabled) {
            (ButtonState::Hidden, true) => {
                let state = ButtonShared::resting_state(&inner);
                self.shared.set_state(&mut inner, state);
            }
            (ButtonState::Generating, _) => {}
            (_, false) => self.shared.set_state(&mut inner, ButtonState::Hidden),
            _ => {}
        }
        enabled
    }

    /// Handle a click; must be called from within a Tokio runtime
    pub fn click(&self) -> ClickOutcome {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.unmounted || shared.disabled {
            return ClickOutcome::Ignored;
        }

        match inner.state.clone() {
            ButtonState::Hidden => ClickOutcome::Ignored,
            ButtonState::Generating => {
                if let Some(attempt) = inner.attempt.take() {
                    attempt.token.cancel();
                }
                let state = ButtonShared::resting_state(&inner);
                shared.set_state(&mut inner, state);
                drop(inner);

                shared.stream.stop_generation();
                report_interaction(Interaction::StopGeneration, shared.src);
                ClickOutcome::Stopped
            }
            ButtonState::HasHistory => {
                inner.panel = PanelState {
                    open: true,
                    index: 1,
                };
                drop(inner);

                report_interaction(Interaction::HistoryOpened, shared.src);
                ClickOutcome::OpenedHistory(HistoryPanel::new(Arc::clone(shared)))
            }
            ButtonState::Errored { .. } => {
                let messages = inner.last_messages.clone();
                let Some(ticket) = self.claim(&mut inner) else {
                    return ClickOutcome::Ignored;
                };
                drop(inner);

                report_interaction(Interaction::Retry, shared.src);
                self.launch(ticket, messages);
                ClickOutcome::Retried
            }
            ButtonState::Idle => {
                let Some(ticket) = self.claim(&mut inner) else {
                    return ClickOutcome::Ignored;
                };
                drop(inner);

                if let Some(hook) = &shared.on_click {
                    hook();
                }
                report_interaction(Interaction::AutogenerateClicked, shared.src);

                let messages = (shared.messages)();
                if messages.is_empty() {
                    debug!("No messages to send");
                    let mut inner = shared.lock();
                    if inner.attempt.as_ref().map(|a| a.id) == Some(ticket.id()) {
                        inner.attempt = None;
                        let state = ButtonShared::resting_state(&inner);
                        shared.set_state(&mut inner, state);
                    }
                    return ClickOutcome::Ignored;
                }

                shared.lock().last_messages = messages.clone();
                self.launch(ticket, messages);
                ClickOutcome::Started
            }
        }
    }

    /// Take the stream's single-flight slot and enter `Generating`
    fn claim(&self, inner: &mut ButtonInner) -> Option<Ticket> {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("GenAiButton clicked outside of a Tokio runtime");
            return None;
        }

        let ticket = match self.shared.stream.begin() {
            Ok(ticket) => ticket,
            Err(busy) => {
                debug!("Click ignored: {}", busy);
                return None;
            }
        };
        inner.attempt = Some(Attempt {
            id: ticket.id(),
            token: ticket.cancellation(),
        });
        self.shared.set_state(inner, ButtonState::Generating);
        Some(ticket)
    }

    fn launch(&self, ticket: Ticket, messages: Vec<Message>) {
        let shared = Arc::clone(&self.shared);
        let attempt_id = ticket.id();
        tokio::spawn(async move {
            let outcome = ticket.run(messages).await;
            shared.settle(attempt_id, outcome);
        });
    }

    /// View model; `None` means render nothing
    pub fn render(&self) -> Option<ButtonView> {
        let shared = &self.shared;
        let inner = shared.lock();

        let (label, icon, variant, tooltip) = match &inner.state {
            ButtonState::Hidden => return None,
            ButtonState::Idle => (
                shared.text.clone(),
                Icon::Ai,
                Variant::Secondary,
                shared.tooltip.clone(),
            ),
            ButtonState::Generating => (
                "Generating".to_string(),
                Icon::Spinner,
                Variant::Secondary,
                Some("Stop generating".to_string()),
            ),
            ButtonState::Errored { .. } => (
                "Retry".to_string(),
                Icon::Retry,
                Variant::Destructive,
                Some(ERROR_TOOLTIP.to_string()),
            ),
            ButtonState::HasHistory => (
                "Improve".to_string(),
                Icon::Ai,
                Variant::Secondary,
                shared.tooltip.clone(),
            ),
        };

        Some(ButtonView {
            label,
            icon,
            variant,
            tooltip,
            disabled: shared.disabled,
        })
    }
}

impl Drop for GenAiButton {
    fn drop(&mut self) {
        self.shared.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{StreamOptions, StreamStatus};
    use crate::testing::{hello_messages, Script, ScriptedPlugin};
    use llmassist_llm::HealthCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Recorder {
        generated: Arc<Mutex<Vec<String>>>,
        histories: Arc<Mutex<Vec<Vec<String>>>>,
        clicks: Arc<AtomicUsize>,
    }

    async fn mount_with(plugin: &Arc<ScriptedPlugin>, timeout: Duration) -> (GenAiButton, Recorder) {
        let stream = LlmStream::new(
            plugin.clone(),
            Arc::new(HealthCache::new()),
            StreamOptions::default().with_timeout(timeout),
        );
        let recorder = Recorder {
            generated: Arc::new(Mutex::new(Vec::new())),
            histories: Arc::new(Mutex::new(Vec::new())),
            clicks: Arc::new(AtomicUsize::new(0)),
        };
        let generated = Arc::clone(&recorder.generated);
        let histories = Arc::clone(&recorder.histories);
        let clicks = Arc::clone(&recorder.clicks);

        let button = GenAiButton::builder(stream, hello_messages)
            .event_source(EventTrackingSrc::DashboardTitle)
            .on_click(move || {
                clicks.fetch_add(1, Ordering::SeqCst);
            })
            .on_generate(move |reply| generated.lock().unwrap().push(reply.to_string()))
            .on_history_change(move |history| histories.lock().unwrap().push(history.to_vec()))
            .mount()
            .await;
        (button, recorder)
    }

    async fn settled(button: &GenAiButton) -> ButtonState {
        let mut rx = button.subscribe();
        let state = rx
            .wait_for(|s| *s != ButtonState::Generating)
            .await
            .unwrap()
            .clone();
        state
    }

    #[tokio::test]
    async fn test_click_generates_and_records_history() {
        let plugin = ScriptedPlugin::healthy(vec![Script::reply("Hello")]);
        let (button, recorder) = mount_with(&plugin, Duration::from_secs(10)).await;

        assert!(matches!(button.click(), ClickOutcome::Started));
        assert_eq!(settled(&button).await, ButtonState::HasHistory);

        assert_eq!(*recorder.generated.lock().unwrap(), vec!["Hello".to_string()]);
        assert_eq!(button.history(), vec!["Hello".to_string()]);
        assert_eq!(
            *recorder.histories.lock().unwrap(),
            vec![vec!["Hello".to_string()]]
        );
        assert_eq!(recorder.clicks.load(Ordering::SeqCst), 1);
        assert_eq!(plugin.requests()[0].messages, hello_messages());
        assert_eq!(button.render().unwrap().label, "Improve");
    }

    #[tokio::test]
    async fn test_disabled_plugin_renders_nothing() {
        let plugin = ScriptedPlugin::unhealthy();
        let (button, recorder) = mount_with(&plugin, Duration::from_secs(10)).await;

        assert_eq!(button.state(), ButtonState::Hidden);
        assert!(button.render().is_none());
        assert!(matches!(button.click(), ClickOutcome::Ignored));
        assert_eq!(plugin.stream_opens(), 0);
        assert_eq!(recorder.clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_gives_up_on_unanswered_health_check() {
        let plugin = ScriptedPlugin::hanging_health(Vec::new());
        let mounting = mount_with(&plugin, Duration::from_secs(10));
        let (button, _recorder) = tokio::time::timeout(Duration::from_secs(600), mounting)
            .await
            .expect("mount outlived the health timeout");

        assert_eq!(button.state(), ButtonState::Hidden);
        assert!(button.render().is_none());
    }

    #[tokio::test]
    async fn test_click_while_generating_stops_without_reply() {
        let (plugin, sender) = ScriptedPlugin::with_channel();
        let (button, recorder) = mount_with(&plugin, Duration::from_secs(10)).await;

        assert!(matches!(button.click(), ClickOutcome::Started));
        assert_eq!(button.state(), ButtonState::Generating);
        assert_eq!(button.render().unwrap().icon, Icon::Spinner);

        sender.unbounded_send(Ok("Hel".to_string())).unwrap();
        let mut rx = button.stream().subscribe();
        rx.wait_for(|s| s.reply == "Hel").await.unwrap();

        // Second click maps to stop, never to a second submit
        assert!(matches!(button.click(), ClickOutcome::Stopped));
        assert_eq!(button.state(), ButtonState::Idle);

        let mut rx = button.stream().subscribe();
        rx.wait_for(|s| s.status != StreamStatus::Generating).await.unwrap();
        let _ = sender.unbounded_send(Ok("lo".to_string()));

        assert!(recorder.generated.lock().unwrap().is_empty());
        assert!(button.history().is_empty());
        assert_eq!(plugin.stream_opens(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shows_retry_and_retry_resubmits_same_messages() {
        let plugin = ScriptedPlugin::healthy(vec![Script::Hang, Script::reply("\"Second try\"")]);
        let (button, recorder) = mount_with(&plugin, Duration::from_millis(10_000)).await;

        button.click();
        let state = settled(&button).await;
        assert!(matches!(state, ButtonState::Errored { .. }));
        assert!(button.error().is_some());

        let view = button.render().unwrap();
        assert_eq!(view.label, "Retry");
        assert_eq!(view.variant, Variant::Destructive);
        assert!(view.tooltip.unwrap().contains("contact your organization admin"));

        assert!(matches!(button.click(), ClickOutcome::Retried));
        assert_eq!(settled(&button).await, ButtonState::HasHistory);

        let requests = plugin.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages, requests[1].messages);
        // The pre-click hook only fires for a fresh submit
        assert_eq!(recorder.clicks.load(Ordering::SeqCst), 1);
        assert_eq!(*recorder.generated.lock().unwrap(), vec!["Second try".to_string()]);
    }

    #[tokio::test]
    async fn test_click_with_history_opens_panel_instead_of_sending() {
        let plugin = ScriptedPlugin::healthy(vec![Script::reply("First")]);
        let (button, _recorder) = mount_with(&plugin, Duration::from_secs(10)).await;

        button.click();
        settled(&button).await;

        match button.click() {
            ClickOutcome::OpenedHistory(panel) => {
                assert!(panel.is_open());
                assert_eq!(panel.current_index(), 1);
                assert_eq!(panel.current().as_deref(), Some("First"));
            }
            other => panic!("expected history panel, got {:?}", other),
        }
        assert!(button.history_panel().is_some());
        assert_eq!(plugin.stream_opens(), 1);
    }

    #[tokio::test]
    async fn test_messages_are_evaluated_at_submit_time() {
        let plugin = ScriptedPlugin::healthy(vec![Script::reply("ok")]);
        let stream = LlmStream::new(plugin.clone(), Arc::new(HealthCache::new()), StreamOptions::default());
        let title = Arc::new(Mutex::new("before".to_string()));
        let source = Arc::clone(&title);

        let button = GenAiButton::builder(stream, move || {
            vec![Message::user(source.lock().unwrap().clone())]
        })
        .mount()
        .await;

        *title.lock().unwrap() = "after".to_string();
        button.click();
        settled(&button).await;

        assert_eq!(plugin.requests()[0].messages, vec![Message::user("after")]);
    }

    #[tokio::test]
    async fn test_empty_messages_leave_button_idle() {
        let plugin = ScriptedPlugin::healthy(vec![]);
        let stream = LlmStream::new(plugin.clone(), Arc::new(HealthCache::new()), StreamOptions::default());
        let button = GenAiButton::builder(stream, Vec::new).mount().await;

        assert!(matches!(button.click(), ClickOutcome::Ignored));
        assert_eq!(button.state(), ButtonState::Idle);
        assert!(!button.stream().is_generating());
        assert_eq!(plugin.stream_opens(), 0);
    }

    #[tokio::test]
    async fn test_unmount_cancels_in_flight_generation() {
        let (plugin, sender) = ScriptedPlugin::with_channel();
        let (button, recorder) = mount_with(&plugin, Duration::from_secs(10)).await;
        let stream = button.stream().clone();

        button.click();
        drop(button);

        let mut rx = stream.subscribe();
        rx.wait_for(|s| s.status != StreamStatus::Generating).await.unwrap();
        let _ = sender.unbounded_send(Ok("late".to_string()));

        assert!(recorder.generated.lock().unwrap().is_empty());
        assert!(recorder.histories.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_button_ignores_clicks() {
        let plugin = ScriptedPlugin::healthy(vec![Script::reply("never")]);
        let stream = LlmStream::new(plugin.clone(), Arc::new(HealthCache::new()), StreamOptions::default());
        let button = GenAiButton::builder(stream, hello_messages)
            .disabled(true)
            .tooltip("Add panel titles first")
            .mount()
            .await;

        let view = button.render().unwrap();
        assert!(view.disabled);
        assert_eq!(view.label, DEFAULT_TEXT);
        assert_eq!(view.tooltip.as_deref(), Some("Add panel titles first"));
        assert!(matches!(button.click(), ClickOutcome::Ignored));
        assert_eq!(plugin.stream_opens(), 0);
    }
}
