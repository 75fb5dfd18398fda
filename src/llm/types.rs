//! Generation parameters shared by every provider adapter.

use serde::{Deserialize, Serialize};

/// Options controlling a single completion request.
///
/// # Examples
///
/// ```
/// use recruiter_copilot::llm::types::RequestOptions;
///
/// let opts = RequestOptions::new()
///     .with_max_tokens(4096)
///     .with_temperature(0.3)
///     .with_forced_tool("generate_summary");
///
/// assert_eq!(opts.max_tokens, Some(4096));
/// assert_eq!(opts.tool_choice.as_deref(), Some("generate_summary"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Maximum tokens to generate. `None` leaves it to the provider.
    pub max_tokens: Option<usize>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Whether to request a streamed response.
    pub stream: bool,
    /// Force the model to call this tool instead of choosing freely.
    pub tool_choice: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(1024),
            temperature: Some(0.7),
            stream: true,
            tool_choice: None,
        }
    }
}

impl RequestOptions {
    /// Request options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set whether to stream the response.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Require a call to the named tool.
    pub fn with_forced_tool(mut self, name: impl Into<String>) -> Self {
        self.tool_choice = Some(name.into());
        self
    }
}
