//! Errors raised while talking to the hosted language model.
//!
//! Every variant maps to a stable SCREAMING_SNAKE_CASE code returned by
//! [`LlmError::code()`] and embedded in the Display output as `[CODE] message`.

/// Stable error codes for the LLM client layer.
pub mod error_codes {
    /// Invalid or missing client configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The provider rejected the API key.
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// The HTTP request could not be completed.
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// The streaming body broke off or reported an error.
    pub const STREAM_FAILED: &str = "STREAM_FAILED";

    /// A tool call payload failed to decode or validate.
    pub const TOOL_FAILED: &str = "TOOL_FAILED";

    /// The call exceeded its deadline.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Any other provider-side failure (5xx, unexpected status).
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";
}

/// Failure of a single generator round-trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    /// Invalid or missing client configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// The provider rejected the API key.
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    AuthError(String),

    /// The HTTP request could not be completed.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    RequestError(String),

    /// The streaming body broke off or reported an error.
    #[error("[{}] {}", error_codes::STREAM_FAILED, .0)]
    StreamError(String),

    /// A tool call payload failed to decode or validate.
    #[error("[{}] {}", error_codes::TOOL_FAILED, .0)]
    ToolError(String),

    /// The call exceeded its deadline.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    TimeoutError(String),

    /// Any other provider-side failure.
    #[error("[{}] {}", error_codes::PROVIDER_ERROR, .0)]
    ProviderError(String),
}

impl LlmError {
    /// Stable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::AuthError(_) => error_codes::AUTH_FAILED,
            Self::RequestError(_) => error_codes::REQUEST_FAILED,
            Self::StreamError(_) => error_codes::STREAM_FAILED,
            Self::ToolError(_) => error_codes::TOOL_FAILED,
            Self::TimeoutError(_) => error_codes::TIMEOUT_ERROR,
            Self::ProviderError(_) => error_codes::PROVIDER_ERROR,
        }
    }

    /// The message without the `[CODE]` prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::AuthError(m)
            | Self::RequestError(m)
            | Self::StreamError(m)
            | Self::ToolError(m)
            | Self::TimeoutError(m)
            | Self::ProviderError(m) => m,
        }
    }

    /// Whether a later attempt could plausibly succeed.
    ///
    /// Configuration, auth and malformed tool output will fail the same way
    /// again; network, stream, timeout and provider hiccups may not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConfigError(_) | Self::AuthError(_) | Self::ToolError(_) => false,
            Self::RequestError(_)
            | Self::StreamError(_)
            | Self::TimeoutError(_)
            | Self::ProviderError(_) => true,
        }
    }
}

/// Convenience alias for LLM client results.
pub type Result<T> = std::result::Result<T, LlmError>;
