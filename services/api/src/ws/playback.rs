//! Plays clips by streaming them to the browser.

use super::protocol::ServerMessage;
use async_trait::async_trait;
use bigsmall_core::{ProviderError, audio::AudioHandle, voice::Playback};
use tokio::sync::mpsc;
use tracing::debug;

/// Sends each clip to the connection's outbox, then waits out its length so
/// the session knows when the browser is done playing it.
pub struct ClientPlayback {
    outbox: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientPlayback {
    pub fn new(outbox: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl Playback for ClientPlayback {
    async fn play(&self, handle: &AudioHandle) -> Result<(), ProviderError> {
        let Some(clip) = &handle.clip else {
            return Ok(());
        };
        self.outbox
            .send(ServerMessage::Audio {
                text: handle.text.clone(),
                cue: handle.cue,
                sample_rate: clip.sample_rate,
                data: clip.to_base64(),
            })
            .map_err(|_| ProviderError::audio("client connection closed"))?;

        let duration = clip.duration();
        debug!(text = %handle.text, ?duration, "Clip sent to client");
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
