//! Usage reporting for the generation controls
//!
//! Interactions are emitted as structured `tracing` events on the
//! `llmassist::interaction` target so a subscriber can route them to an
//! analytics sink.

use llmassist_llm::QuickFeedback;
use serde::Serialize;
use tracing::info;

/// Where a generation control is embedded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventTrackingSrc {
    #[default]
    Unknown,
    DashboardChanges,
    DashboardTitle,
    DashboardDescription,
    PanelTitle,
    PanelDescription,
}

impl EventTrackingSrc {
    pub fn as_str(self) -> &'static str {
        match self {
            EventTrackingSrc::Unknown => "unknown",
            EventTrackingSrc::DashboardChanges => "dashboard-changes",
            EventTrackingSrc::DashboardTitle => "dashboard-title",
            EventTrackingSrc::DashboardDescription => "dashboard-description",
            EventTrackingSrc::PanelTitle => "panel-title",
            EventTrackingSrc::PanelDescription => "panel-description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    AutogenerateClicked,
    Retry,
    StopGeneration,
    HistoryOpened,
    QuickFeedback(QuickFeedback),
    CustomFeedback,
    ApplySuggestion,
}

impl Interaction {
    /// Reported item name
    pub fn item(self) -> &'static str {
        match self {
            Interaction::AutogenerateClicked => "autogenerate-button",
            Interaction::Retry => "retry-button",
            Interaction::StopGeneration => "stop-generating-button",
            Interaction::HistoryOpened => "history-toggletip",
            Interaction::QuickFeedback(_) => "quick-feedback",
            Interaction::CustomFeedback => "custom-feedback",
            Interaction::ApplySuggestion => "apply-suggestion",
        }
    }
}

pub fn report_interaction(interaction: Interaction, src: EventTrackingSrc) {
    match interaction {
        Interaction::QuickFeedback(kind) => info!(
            target: "llmassist::interaction",
            item = interaction.item(),
            src = src.as_str(),
            feedback = kind.label(),
            "genai interaction"
        ),
        _ => info!(
            target: "llmassist::interaction",
            item = interaction.item(),
            src = src.as_str(),
            "genai interaction"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_src_serializes_like_as_str() {
        for src in [
            EventTrackingSrc::Unknown,
            EventTrackingSrc::DashboardTitle,
            EventTrackingSrc::PanelDescription,
        ] {
            let json = serde_json::to_value(src).unwrap();
            assert_eq!(json, src.as_str());
        }
    }
}
