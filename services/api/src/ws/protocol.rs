//! Defines the WebSocket message protocol between the browser client and the API server.

use bigsmall_core::{Choice, RoundState, audio::AudioCue, session::Input, view::View};
use serde::{Deserialize, Serialize};

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts a game from the welcome or game-over screen.
    Start,
    /// Picks the object in slot `1` or `2`.
    Select { choice: Choice },
    /// Picks by size directly.
    Answer { choice_is_big: bool },
    ReplayInstruction,
}

impl From<ClientMessage> for Input {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Start => Input::Start,
            ClientMessage::Select { choice } => Input::Select(choice),
            ClientMessage::Answer { choice_is_big } => Input::Answer { choice_is_big },
            ClientMessage::ReplayInstruction => Input::ReplayInstruction,
        }
    }
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full game state and what to draw for it. Sent on every change.
    Snapshot { state: RoundState, view: View },
    /// A clip to play now (base64 encoded PCM16, mono).
    Audio {
        text: String,
        cue: AudioCue,
        sample_rate: u32,
        data: String,
    },
    /// Reports a message the server could not understand.
    Error { message: String },
}
