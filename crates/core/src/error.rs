//! Error types shared by the providers and the round state machine.

use crate::{question::QuestionError, state::Screen};
use thiserror::Error;

/// A failure reported by a question or audio provider.
///
/// These never reach the player: the session logs them and either retries
/// (question fetch) or carries on without sound (audio).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("provider produced an invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),

    #[error("audio unavailable: {0}")]
    Audio(String),

    #[error("provider is unavailable")]
    Unavailable,
}

impl ProviderError {
    pub fn request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }

    pub fn audio(err: impl std::fmt::Display) -> Self {
        Self::Audio(err.to_string())
    }
}

/// An operation was invoked while its preconditions did not hold.
///
/// The machine rejects the event and leaves its state untouched. The session
/// treats every variant as a no-op.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidTransition {
    #[error("`{event}` is not accepted on the {screen:?} screen")]
    WrongScreen { event: &'static str, screen: Screen },

    #[error("`{0}` ignored while audio is playing")]
    AudioBusy(&'static str),

    #[error("`{0}` needs a current question")]
    NoQuestion(&'static str),

    #[error("no instruction prompt to replay")]
    NoPrompt,

    /// A timer or provider completion issued for a round that has since moved on.
    #[error("stale `{event}` from epoch {epoch}")]
    Stale { event: &'static str, epoch: u64 },
}
