//! Outbound notifications from a session.
//!
//! The session never knows about sockets. It reports through a
//! [`SessionObserver`] supplied at construction; transports adapt that to
//! whatever they speak.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::state::ConversationState;
use crate::models::{JobSummary, SuggestedQuestion};

/// Receives session notifications.
///
/// Methods are called synchronously from session tasks and must not block.
pub trait SessionObserver: Send + Sync {
    fn on_state_change(&self, state: ConversationState);
    fn on_suggestion(&self, question: &SuggestedQuestion);
    fn on_summary(&self, summary: &JobSummary);
    fn on_error(&self, code: &str, message: &str);
}

/// A notification as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChange(ConversationState),
    Suggestion(SuggestedQuestion),
    Summary(JobSummary),
    Error { code: String, message: String },
}

/// Forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// An observer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("session event dropped, receiver closed");
        }
    }
}

impl SessionObserver for ChannelObserver {
    fn on_state_change(&self, state: ConversationState) {
        self.send(SessionEvent::StateChange(state));
    }

    fn on_suggestion(&self, question: &SuggestedQuestion) {
        self.send(SessionEvent::Suggestion(question.clone()));
    }

    fn on_summary(&self, summary: &JobSummary) {
        self.send(SessionEvent::Summary(summary.clone()));
    }

    fn on_error(&self, code: &str, message: &str) {
        self.send(SessionEvent::Error {
            code: code.to_string(),
            message: message.to_string(),
        });
    }
}

/// Calls an observer, containing and logging any panic it raises.
#[derive(Clone)]
pub(crate) struct Notifier {
    inner: Arc<dyn SessionObserver>,
}

impl Notifier {
    pub(crate) fn new(inner: Arc<dyn SessionObserver>) -> Self {
        Self { inner }
    }

    fn guarded(&self, what: &'static str, call: impl FnOnce(&dyn SessionObserver)) {
        let observer = self.inner.as_ref();
        if catch_unwind(AssertUnwindSafe(|| call(observer))).is_err() {
            tracing::error!(callback = what, "session observer panicked");
        }
    }

    pub(crate) fn state(&self, state: ConversationState) {
        self.guarded("on_state_change", |o| o.on_state_change(state));
    }

    pub(crate) fn suggestion(&self, question: &SuggestedQuestion) {
        self.guarded("on_suggestion", |o| o.on_suggestion(question));
    }

    pub(crate) fn summary(&self, summary: &JobSummary) {
        self.guarded("on_summary", |o| o.on_summary(summary));
    }

    pub(crate) fn error(&self, code: &str, message: &str) {
        self.guarded("on_error", |o| o.on_error(code, message));
    }
}
