//! Normalized streaming events produced by provider adapters.
//!
//! A suggestion round-trip normally looks like:
//!
//! ```text
//! StreamStart → TextDelta* → ToolCallStart → ToolCallArgsDelta* → ToolCallEnd → StreamEnd
//! ```

/// One event from a provider stream, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    /// First event of every stream.
    StreamStart {
        /// Provider request id (or a placeholder).
        request_id: String,
        /// Model that serves the request.
        model: String,
    },

    /// Free-form assistant text. The copilot ignores it apart from history.
    TextDelta { text: String },

    /// A tool call has begun.
    ToolCallStart {
        /// Links every event of this call.
        call_id: String,
        function_name: String,
    },

    /// A fragment of the tool call's JSON arguments.
    ToolCallArgsDelta {
        call_id: String,
        args_fragment: String,
    },

    /// The tool call's arguments are complete.
    ToolCallEnd { call_id: String },

    /// Normal end of stream.
    StreamEnd { finish_reason: FinishReason },

    /// The stream failed part-way.
    StreamError { error: String },
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

impl FinishReason {
    /// Map an OpenAI-style `finish_reason` string.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" | "function_call" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::Length => write!(f, "length"),
            Self::ToolCalls => write!(f, "tool_calls"),
            Self::ContentFilter => write!(f, "content_filter"),
            Self::Other => write!(f, "other"),
        }
    }
}
