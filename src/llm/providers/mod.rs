//! Concrete provider adapters.

pub mod openai;
pub mod sse;

pub use openai::{OpenAiAdapter, OpenAiConfig};
