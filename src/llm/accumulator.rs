//! Folds an [`LlmEvent`] stream into one finished turn.
//!
//! ```
//! use recruiter_copilot::llm::accumulator::StreamAccumulator;
//! use recruiter_copilot::llm::events::{FinishReason, LlmEvent};
//!
//! let mut acc = StreamAccumulator::new();
//! acc.push(LlmEvent::ToolCallStart { call_id: "c1".into(), function_name: "suggest_question".into() });
//! acc.push(LlmEvent::ToolCallArgsDelta { call_id: "c1".into(), args_fragment: "{}".into() });
//! acc.push(LlmEvent::StreamEnd { finish_reason: FinishReason::ToolCalls });
//!
//! let turn = acc.finish();
//! assert_eq!(turn.tool_calls[0].arguments_json, "{}");
//! ```

use futures_util::{Stream, StreamExt};

use super::events::{FinishReason, LlmEvent};

/// A tool call with its arguments fully reassembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedToolCall {
    pub call_id: String,
    pub function_name: String,
    pub arguments_json: String,
}

/// Everything one provider round-trip produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedTurn {
    pub text: String,
    /// Calls in the order they started.
    pub tool_calls: Vec<AccumulatedToolCall>,
    pub finish_reason: FinishReason,
    /// Set when the stream reported an error.
    pub error: Option<String>,
}

impl AccumulatedTurn {
    /// First call to the named function, if the model made one.
    pub fn first_call(&self, function_name: &str) -> Option<&AccumulatedToolCall> {
        self.tool_calls
            .iter()
            .find(|c| c.function_name == function_name)
    }
}

#[derive(Debug)]
struct PendingCall {
    call: AccumulatedToolCall,
    closed: bool,
}

/// Collects events with [`push`](Self::push), then [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    calls: Vec<PendingCall>,
    finish_reason: Option<FinishReason>,
    error: Option<String>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: LlmEvent) {
        match event {
            LlmEvent::StreamStart { .. } => {}
            LlmEvent::TextDelta { text } => self.text.push_str(&text),
            LlmEvent::ToolCallStart {
                call_id,
                function_name,
            } => self.calls.push(PendingCall {
                call: AccumulatedToolCall {
                    call_id,
                    function_name,
                    arguments_json: String::new(),
                },
                closed: false,
            }),
            LlmEvent::ToolCallArgsDelta {
                call_id,
                args_fragment,
            } => {
                if let Some(pending) = self.open_call(&call_id) {
                    pending.call.arguments_json.push_str(&args_fragment);
                }
            }
            LlmEvent::ToolCallEnd { call_id } => {
                if let Some(pending) = self.open_call(&call_id) {
                    pending.closed = true;
                }
            }
            LlmEvent::StreamEnd { finish_reason } => self.finish_reason = Some(finish_reason),
            LlmEvent::StreamError { error } => self.error = Some(error),
        }
    }

    fn open_call(&mut self, call_id: &str) -> Option<&mut PendingCall> {
        self.calls
            .iter_mut()
            .rev()
            .find(|p| !p.closed && p.call.call_id == call_id)
    }

    /// Finish the turn. Calls that never saw an end event are kept with
    /// whatever arguments arrived.
    pub fn finish(self) -> AccumulatedTurn {
        AccumulatedTurn {
            text: self.text,
            tool_calls: self.calls.into_iter().map(|p| p.call).collect(),
            finish_reason: self.finish_reason.unwrap_or(FinishReason::Other),
            error: self.error,
        }
    }

    /// Drain a whole stream into a turn.
    pub async fn collect<S>(mut stream: S) -> AccumulatedTurn
    where
        S: Stream<Item = LlmEvent> + Unpin,
    {
        let mut acc = Self::new();
        while let Some(event) = stream.next().await {
            acc.push(event);
        }
        acc.finish()
    }
}
