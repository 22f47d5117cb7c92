//! Contracts for the collaborators that supply question content and sound.
//!
//! The round machine only sees these traits. Implementations may be a static
//! table, a generative model, a speech engine or a no-op; none of them retry
//! internally, since retry policy belongs to the session.

use crate::{audio::AudioHandle, error::ProviderError, question::Question};
use async_trait::async_trait;

/// Produces the next question to ask.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn fetch_question(&self) -> Result<Question, ProviderError>;
}

/// Produces and plays the spoken parts of a round.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioProvider: Send + Sync {
    /// Returns the instruction audio together with the prompt text it was
    /// made from, so the instruction can be replayed without the question.
    async fn fetch_instruction_audio(
        &self,
        question: &Question,
    ) -> Result<(AudioHandle, String), ProviderError>;

    async fn fetch_feedback_audio(&self, was_correct: bool) -> Result<AudioHandle, ProviderError>;

    /// Renders a previously returned prompt again.
    async fn synthesize(&self, prompt: &str) -> Result<AudioHandle, ProviderError>;

    /// Resolves once playback has finished.
    async fn play(&self, handle: &AudioHandle) -> Result<(), ProviderError>;
}
