//! Turn pacing for a live call.
//!
//! A [`Session`] listens to speech-to-text fragments, waits for the driving
//! party to finish a turn, and asks a [`Generator`] for at most one
//! clarifying question at a time. Results reach the outside world through a
//! [`SessionObserver`].

pub mod context;
pub mod filler;
pub mod gate;
pub mod generator;
pub mod observer;
pub mod session;
pub mod state;
pub mod transcript;
pub mod turn;

pub use context::{AskedQuestions, build_context_message};
pub use filler::is_filler;
pub use gate::{GenerationGate, PendingQueue};
pub use generator::{Exchange, GenerationRequest, Generator, LlmGenerator};
pub use observer::{ChannelObserver, SessionEvent, SessionObserver};
pub use session::Session;
pub use state::{ConversationState, FragmentAction};
pub use transcript::{RollingTranscript, TranscriptEntry};
pub use turn::TurnDetector;
