//! JSON frames exchanged over the call WebSocket.
//!
//! Every frame is an object tagged by its `type` field.

use serde::{Deserialize, Serialize};

use crate::conversation::observer::SessionEvent;
use crate::conversation::state::ConversationState;
use crate::models::{CompletionStatus, JobSummary, SuggestedQuestion};

fn default_is_final() -> bool {
    true
}

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// One speech-to-text fragment.
    Transcript {
        text: String,
        #[serde(default)]
        speaker: Option<String>,
        #[serde(default = "default_is_final")]
        is_final: bool,
    },
    /// The last suggestion is now on screen.
    QuestionShown,
    /// Manual trigger.
    GenerateQuestion,
    GetCompletionStatus,
    /// Produce the summary for the whole call.
    EndCall,
    /// Reset the session.
    Clear,
}

/// Frames sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    StateChange { state: ConversationState },
    Suggestion { data: SuggestedQuestion },
    Summary { data: JobSummary },
    CompletionStatus { data: CompletionStatus },
    Cleared,
    Error { message: String, code: String },
}

impl OutgoingMessage {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.to_string(),
        }
    }
}

impl From<SessionEvent> for OutgoingMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::StateChange(state) => Self::StateChange { state },
            SessionEvent::Suggestion(data) => Self::Suggestion { data },
            SessionEvent::Summary(data) => Self::Summary { data },
            SessionEvent::Error { code, message } => Self::Error { message, code },
        }
    }
}
