//! Conversation states and the transitions between them.

use serde::{Deserialize, Serialize};

/// Where a session is in the listen / suggest / answer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Collecting driving-party speech until a turn closes.
    #[default]
    Listening,
    /// A suggestion is being generated.
    Generating,
    /// A suggestion is on screen; the next driving speech is its answer.
    QuestionShown,
    /// An answer was captured and its follow-up is being generated.
    ProcessingAnswer,
}

impl ConversationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Listening => "listening",
            Self::Generating => "generating",
            Self::QuestionShown => "question_shown",
            Self::ProcessingAnswer => "processing_answer",
        }
    }

    /// A generation owns the gate in this state.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Generating | Self::ProcessingAnswer)
    }

    /// What a new driving fragment does in this state.
    pub fn on_fragment(self) -> FragmentAction {
        match self {
            Self::Listening => FragmentAction::QueueAndDebounce,
            Self::Generating | Self::ProcessingAnswer => FragmentAction::Queue,
            Self::QuestionShown => FragmentAction::DispatchAnswer,
        }
    }

    /// State after a generation finishes.
    pub fn after_generation(produced_question: bool) -> Self {
        if produced_question {
            Self::QuestionShown
        } else {
            Self::Listening
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reaction to an accepted driving-party fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentAction {
    /// Queue it and restart the silence timer.
    QueueAndDebounce,
    /// Queue it; the in-flight generation will drain it.
    Queue,
    /// Cancel the timer and dispatch immediately as an answer.
    DispatchAnswer,
}
