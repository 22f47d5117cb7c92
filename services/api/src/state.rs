//! Shared Application State
//!
//! Provider clients are built once at startup. Each connection gets its own
//! game session on top of them.

use crate::{
    config::Config,
    ws::{playback::ClientPlayback, protocol::ServerMessage},
};
use bigsmall_core::{
    catalog::PairCatalog,
    provider::{AudioProvider, QuestionProvider},
    voice::{SilentAudio, Speaker, VoiceAudio},
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Shared question generator. `None` means every session draws from its own catalog.
    pub generated_questions: Option<Arc<dyn QuestionProvider>>,
    /// `None` plays every round silently.
    pub speaker: Option<Arc<dyn Speaker>>,
}

impl AppState {
    pub fn question_provider(&self) -> Arc<dyn QuestionProvider> {
        match &self.generated_questions {
            Some(provider) => provider.clone(),
            None => Arc::new(PairCatalog::new()),
        }
    }

    /// Audio for one connection, delivered through its outbox.
    pub fn audio_provider(
        &self,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Arc<dyn AudioProvider> {
        match &self.speaker {
            Some(speaker) => Arc::new(VoiceAudio::new(
                speaker.clone(),
                Arc::new(ClientPlayback::new(outbox)),
            )),
            None => Arc::new(SilentAudio),
        }
    }
}
