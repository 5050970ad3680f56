//! llmassist generation widget
//!
//! Framework-agnostic model of an AI "generate" button: a single-flight
//! streaming hook, the button state machine, and its history/feedback panel.

pub mod button;
pub mod dashboard;
pub mod history;
pub mod interaction;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use button::{
    ButtonState, ButtonView, ClickOutcome, GenAiButton, GenAiButtonBuilder, Icon, Variant,
    DEFAULT_TEXT, ERROR_TOOLTIP,
};
pub use dashboard::{DashboardSummary, PanelSummary, NEED_PANEL_CONTEXT_MESSAGE};
pub use history::{HistoryPanel, FEEDBACK_ERROR_MESSAGE};
pub use interaction::{report_interaction, EventTrackingSrc, Interaction};
pub use stream::{Busy, Generation, LlmStream, StreamOptions, StreamSnapshot, StreamStatus, Ticket};
