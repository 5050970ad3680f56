//! History and feedback panel of a generate button

use llmassist_common::AssistError;
use llmassist_llm::{feedback_messages, QuickFeedback};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::button::ButtonShared;
use crate::interaction::{report_interaction, Interaction};
use crate::stream::{Busy, Generation, StreamSnapshot};

/// Shown in place of a failed revision
pub const FEEDBACK_ERROR_MESSAGE: &str =
    "Sorry, I was unable to complete your request. Please try again.";

/// Handle to the panel opened from a button with history
///
/// Pagination is 1-based; index 1 is the most recent entry. Revisions run on
/// the panel's own stream, so they never race the button's generation.
#[derive(Clone)]
pub struct HistoryPanel {
    shared: Arc<ButtonShared>,
}

impl HistoryPanel {
    pub(crate) fn new(shared: Arc<ButtonShared>) -> Self {
        Self { shared }
    }

    pub fn is_open(&self) -> bool {
        let inner = self.shared.lock();
        inner.panel.open && !inner.unmounted
    }

    pub fn close(&self) {
        self.shared.lock().panel.open = false;
    }

    pub fn len(&self) -> usize {
        self.shared.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<String> {
        self.shared.lock().history.clone()
    }

    pub fn current_index(&self) -> usize {
        self.shared.lock().panel.index
    }

    /// Entry at the current index
    pub fn current(&self) -> Option<String> {
        let inner = self.shared.lock();
        inner.history.get(inner.panel.index - 1).cloned()
    }

    /// Move to `index`, clamped to `[1, len]`
    pub fn go_to(&self, index: usize) -> usize {
        let mut inner = self.shared.lock();
        let last = inner.history.len().max(1);
        inner.panel.index = index.clamp(1, last);
        inner.panel.index
    }

    /// Older entry; holds at the last one
    pub fn next(&self) -> usize {
        let index = self.current_index();
        self.go_to(index.saturating_add(1))
    }

    /// Newer entry; holds at the first one
    pub fn previous(&self) -> usize {
        let index = self.current_index();
        self.go_to(index.saturating_sub(1))
    }

    pub fn has_next(&self) -> bool {
        let inner = self.shared.lock();
        inner.panel.index < inner.history.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current_index() > 1
    }

    /// Hand the current entry to the consumer and close the panel
    pub fn apply(&self) -> Option<String> {
        let entry = {
            let mut inner = self.shared.lock();
            if inner.unmounted {
                return None;
            }
            let entry = inner.history.get(inner.panel.index - 1).cloned()?;
            inner.panel.open = false;
            entry
        };

        report_interaction(Interaction::ApplySuggestion, self.shared.src);
        if let Some(on_generate) = &self.shared.on_generate {
            on_generate(&entry);
        }
        Some(entry)
    }

    /// Feedback controls are disabled while this is true
    pub fn is_generating(&self) -> bool {
        self.shared.panel_stream.is_generating()
    }

    pub fn stop_generation(&self) -> bool {
        self.shared.panel_stream.stop_generation()
    }

    /// Panel stream state, for the partial revision text
    pub fn snapshot(&self) -> StreamSnapshot {
        self.shared.panel_stream.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.shared.panel_stream.subscribe()
    }

    pub fn error(&self) -> Option<Arc<AssistError>> {
        self.shared.panel_stream.snapshot().error
    }

    /// Revise the current entry with a canned instruction
    pub async fn quick_feedback(&self, feedback: QuickFeedback) -> Generation {
        report_interaction(Interaction::QuickFeedback(feedback), self.shared.src);
        self.regenerate(feedback.feedback()).await
    }

    /// Revise the current entry with free-text feedback
    pub async fn submit_feedback(&self, feedback: &str) -> Generation {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Generation::Empty;
        }
        report_interaction(Interaction::CustomFeedback, self.shared.src);
        self.regenerate(feedback).await
    }

    async fn regenerate(&self, feedback: &str) -> Generation {
        let (ticket, messages) = {
            let inner = self.shared.lock();
            if inner.unmounted {
                return Generation::Stopped;
            }
            let Some(previous) = inner.history.get(inner.panel.index - 1) else {
                return Generation::Empty;
            };
            let ticket = match self.shared.panel_stream.begin() {
                Ok(ticket) => ticket,
                Err(Busy) => {
                    debug!("Feedback ignored while a revision is generating");
                    return Generation::Busy;
                }
            };
            (ticket, feedback_messages(&inner.last_messages, previous, feedback))
        };

        let outcome = ticket.run(messages).await;

        if let Generation::Completed(reply) = &outcome {
            let history = {
                let mut inner = self.shared.lock();
                if inner.unmounted {
                    return Generation::Stopped;
                }
                ButtonShared::record(&mut inner, reply.clone())
            };
            info!("Revision recorded - History length: {}", history.len());
            self.shared.notify_history(&history);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::{ClickOutcome, GenAiButton};
    use crate::stream::{LlmStream, StreamOptions};
    use crate::testing::{hello_messages, Script, ScriptedPlugin};
    use llmassist_llm::{HealthCache, Role};
    use std::sync::Mutex;

    struct Fixture {
        button: GenAiButton,
        panel: HistoryPanel,
        plugin: Arc<ScriptedPlugin>,
        generated: Arc<Mutex<Vec<String>>>,
        histories: Arc<Mutex<Vec<Vec<String>>>>,
    }

    /// Button with `replies` already generated (oldest first) and its panel open
    async fn fixture(replies: &[&str]) -> Fixture {
        let plugin = ScriptedPlugin::healthy(vec![Script::reply(replies[0])]);
        let stream = LlmStream::new(plugin.clone(), Arc::new(HealthCache::new()), StreamOptions::default());
        let generated = Arc::new(Mutex::new(Vec::new()));
        let histories = Arc::new(Mutex::new(Vec::new()));
        let generated_sink = Arc::clone(&generated);
        let history_sink = Arc::clone(&histories);

        let button = GenAiButton::builder(stream, hello_messages)
            .on_generate(move |reply| generated_sink.lock().unwrap().push(reply.to_string()))
            .on_history_change(move |history| history_sink.lock().unwrap().push(history.to_vec()))
            .mount()
            .await;

        button.click();
        let mut rx = button.subscribe();
        rx.wait_for(|s| *s == crate::button::ButtonState::HasHistory)
            .await
            .unwrap();

        let panel = match button.click() {
            ClickOutcome::OpenedHistory(panel) => panel,
            other => panic!("expected history panel, got {:?}", other),
        };
        for reply in &replies[1..] {
            plugin.push(Script::reply(reply));
            let outcome = panel.quick_feedback(QuickFeedback::Regenerate).await;
            assert_eq!(outcome.reply(), Some(*reply));
        }

        Fixture {
            button,
            panel,
            plugin,
            generated,
            histories,
        }
    }

    #[tokio::test]
    async fn test_pagination_is_clamped() {
        let f = fixture(&["one", "two", "three"]).await;
        let panel = &f.panel;

        assert_eq!(panel.len(), 3);
        assert_eq!(panel.current_index(), 1);
        assert_eq!(panel.current().as_deref(), Some("three"));
        assert!(!panel.has_previous());

        assert_eq!(panel.previous(), 1);
        assert_eq!(panel.next(), 2);
        assert_eq!(panel.next(), 3);
        assert_eq!(panel.next(), 3);
        assert_eq!(panel.next(), 3);
        assert!(!panel.has_next());
        assert_eq!(panel.current().as_deref(), Some("one"));

        assert_eq!(panel.go_to(0), 1);
        assert_eq!(panel.go_to(99), 3);
    }

    #[tokio::test]
    async fn test_feedback_prepends_revision_and_resets_index() {
        let f = fixture(&["Old title"]).await;
        f.plugin.push(Script::reply("\"Short\""));

        let outcome = f.panel.quick_feedback(QuickFeedback::Shorter).await;

        assert_eq!(outcome.reply(), Some("Short"));
        assert_eq!(f.button.history(), vec!["Short".to_string(), "Old title".to_string()]);
        assert_eq!(f.panel.current_index(), 1);
        assert_eq!(
            f.histories.lock().unwrap().last().unwrap(),
            &vec!["Short".to_string(), "Old title".to_string()]
        );
        // Revisions are applied explicitly, not pushed to the consumer
        assert_eq!(*f.generated.lock().unwrap(), vec!["Old title".to_string()]);

        let request = f.plugin.requests().pop().unwrap();
        let (last, original) = request.messages.split_last().unwrap();
        assert_eq!(original, &hello_messages()[..]);
        assert_eq!(last.role, Role::System);
        assert!(last.content.contains("Old title"));
        assert!(last.content.contains(QuickFeedback::Shorter.feedback()));
    }

    #[tokio::test]
    async fn test_custom_feedback_refers_to_selected_entry() {
        let f = fixture(&["first", "second"]).await;
        f.panel.next();
        f.plugin.push(Script::reply("third"));

        let outcome = f.panel.submit_feedback("  mention latency  ").await;

        assert_eq!(outcome.reply(), Some("third"));
        let request = f.plugin.requests().pop().unwrap();
        let feedback = &request.messages.last().unwrap().content;
        assert!(feedback.contains("first"));
        assert!(feedback.contains("mention latency"));
    }

    #[tokio::test]
    async fn test_blank_feedback_is_ignored() {
        let f = fixture(&["first"]).await;
        let opens = f.plugin.stream_opens();

        assert!(matches!(f.panel.submit_feedback("   ").await, Generation::Empty));
        assert_eq!(f.plugin.stream_opens(), opens);
    }

    #[tokio::test]
    async fn test_apply_hands_entry_to_consumer_and_closes() {
        let f = fixture(&["first", "second"]).await;
        f.panel.next();

        assert_eq!(f.panel.apply().as_deref(), Some("first"));
        assert!(!f.panel.is_open());
        assert!(f.button.history_panel().is_none());
        assert_eq!(
            *f.generated.lock().unwrap(),
            vec!["first".to_string(), "first".to_string()]
        );
    }

    #[tokio::test]
    async fn test_concurrent_feedback_is_rejected() {
        let f = fixture(&["first"]).await;
        let (tx, rx) = futures::channel::mpsc::unbounded();
        f.plugin.push(Script::Channel(rx));

        let panel = f.panel.clone();
        let running = tokio::spawn(async move { panel.quick_feedback(QuickFeedback::MoreDescriptive).await });

        let mut state = f.panel.subscribe();
        state.wait_for(|s| s.is_generating()).await.unwrap();
        assert!(f.panel.is_generating());
        assert!(matches!(
            f.panel.quick_feedback(QuickFeedback::Shorter).await,
            Generation::Busy
        ));

        tx.unbounded_send(Ok("richer".to_string())).unwrap();
        drop(tx);
        assert_eq!(running.await.unwrap().reply(), Some("richer"));
        assert_eq!(f.panel.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_revision_keeps_history() {
        let f = fixture(&["first"]).await;
        f.plugin.push(Script::Fail("provider unavailable".to_string()));

        let outcome = f.panel.quick_feedback(QuickFeedback::Regenerate).await;

        assert!(matches!(outcome, Generation::Failed(_)));
        assert!(f.panel.error().is_some());
        assert_eq!(f.panel.entries(), vec!["first".to_string()]);
    }
}
