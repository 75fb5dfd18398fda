//! Streaming client for hosted chat models.
//!
//! Provider adapters normalize their wire format into [`LlmEvent`]s;
//! [`StreamAccumulator`] folds those into an [`AccumulatedTurn`] with text
//! and reassembled tool calls.

pub mod accumulator;
pub mod error;
pub mod events;
pub mod message;
pub mod provider;
pub mod providers;
pub mod types;

pub use accumulator::{AccumulatedToolCall, AccumulatedTurn, StreamAccumulator};
pub use error::LlmError;
pub use events::{FinishReason, LlmEvent};
pub use message::{Message, Role};
pub use provider::{LlmEventStream, ProviderAdapter, ToolDefinition};
pub use providers::{OpenAiAdapter, OpenAiConfig};
pub use types::RequestOptions;
