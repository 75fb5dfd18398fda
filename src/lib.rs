//! Recruiter copilot: live-call question suggestions for intake meetings.
//!
//! A speech-to-text client streams transcript fragments of a recruiter and
//! hiring-manager call. The copilot waits for the hiring manager to finish
//! speaking, then suggests one clarifying question with answer options.
//!
//! # Architecture
//!
//! - **Conversation**: per-call state machine, silence-based turn detection
//!   and a single-flight generation gate
//! - **LLM**: streaming OpenAI-compatible client with tool calls
//! - **Server**: WebSocket transport that adapts sessions to JSON frames

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod server;
pub mod tools;

pub use config::CopilotConfig;
pub use conversation::{ConversationState, Generator, LlmGenerator, Session, SessionObserver};
pub use error::{CopilotError, Result};
pub use models::{CompletionStatus, JobSummary, SuggestedQuestion};
