//! Reply cleanup and feedback prompt construction

use crate::types::Message;
use std::fmt;
use std::str::FromStr;

use llmassist_common::AssistError;

/// Strip one wrapping `"` from each end of a reply
///
/// Models often answer title-style prompts with a quoted string.
pub fn sanitize_reply(reply: &str) -> String {
    let reply = reply.strip_prefix('"').unwrap_or(reply);
    let reply = reply.strip_suffix('"').unwrap_or(reply);
    reply.to_string()
}

/// Canned feedback offered next to the history entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFeedback {
    Shorter,
    MoreDescriptive,
    Regenerate,
}

impl QuickFeedback {
    pub const ALL: [QuickFeedback; 3] = [
        QuickFeedback::Shorter,
        QuickFeedback::MoreDescriptive,
        QuickFeedback::Regenerate,
    ];

    /// Button label
    pub fn label(self) -> &'static str {
        match self {
            QuickFeedback::Shorter => "Even shorter",
            QuickFeedback::MoreDescriptive => "More descriptive",
            QuickFeedback::Regenerate => "Regenerate",
        }
    }

    /// Feedback sentence sent to the model
    pub fn feedback(self) -> &'static str {
        match self {
            QuickFeedback::Shorter => "Make it even shorter.",
            QuickFeedback::MoreDescriptive => "Make it more descriptive.",
            QuickFeedback::Regenerate => "Please, regenerate it.",
        }
    }
}

impl fmt::Display for QuickFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuickFeedback {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "shorter" | "even-shorter" => Ok(QuickFeedback::Shorter),
            "more-descriptive" | "descriptive" => Ok(QuickFeedback::MoreDescriptive),
            "regenerate" => Ok(QuickFeedback::Regenerate),
            other => Err(AssistError::invalid_input(format!(
                "unknown quick feedback: {}",
                other
            ))),
        }
    }
}

/// System message asking the model to revise its previous reply
pub fn feedback_message(previous_reply: &str, feedback: &str) -> Message {
    Message::system(format!(
        "Your previous response was: {}. The user has provided the following feedback: {}. \
         Re-generate your response according to the provided feedback.",
        previous_reply, feedback
    ))
}

/// Original prompt followed by the revision request
pub fn feedback_messages(original: &[Message], previous_reply: &str, feedback: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(original.len() + 1);
    messages.extend_from_slice(original);
    messages.push(feedback_message(previous_reply, feedback));
    messages
}
