//! Error types for the copilot.

use crate::llm::error::LlmError;

/// Error codes sent to clients in `error` frames.
pub mod codes {
    pub const GENERATION_ERROR: &str = "GENERATION_ERROR";
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";
    pub const SUMMARY_ERROR: &str = "SUMMARY_ERROR";
    pub const PROCESSING_ERROR: &str = "PROCESSING_ERROR";
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
}

/// Top-level error type for the copilot.
#[derive(Debug, thiserror::Error)]
pub enum CopilotError {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The language model round-trip failed.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A manual trigger found neither queued text nor a driving-party entry.
    #[error("nothing to generate from yet")]
    NothingToGenerate,

    /// The model produced no usable summary.
    #[error("could not generate summary: {0}")]
    SummaryUnavailable(String),

    /// WebSocket or HTTP transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CopilotError {
    /// Code used when this error is reported to a client.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Llm(LlmError::TimeoutError(_)) => codes::TIMEOUT_ERROR,
            Self::Llm(_) | Self::NothingToGenerate => codes::GENERATION_ERROR,
            Self::SummaryUnavailable(_) => codes::SUMMARY_ERROR,
            Self::Config(_) | Self::Transport(_) | Self::Io(_) => codes::PROCESSING_ERROR,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CopilotError>;
