//! The seam between the copilot and a concrete LLM backend.
//!
//! Adapters turn a provider's wire format into the shared
//! [`LlmEvent`](super::events::LlmEvent) stream.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::events::LlmEvent;
use super::message::Message;
use super::types::RequestOptions;

/// A function the model may call, described by a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A boxed stream of normalized events.
pub type LlmEventStream = Pin<Box<dyn Stream<Item = LlmEvent> + Send>>;

/// A streaming LLM backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Start a request and return its event stream.
    ///
    /// Errors that happen before the first byte (HTTP status, connection)
    /// are returned here; failures mid-stream arrive as
    /// [`LlmEvent::StreamError`].
    async fn send(
        &self,
        messages: &[Message],
        options: &RequestOptions,
        tools: &[ToolDefinition],
    ) -> Result<LlmEventStream, LlmError>;
}
