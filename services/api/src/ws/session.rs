//! Manages the WebSocket connection lifecycle for one game.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::Result;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use bigsmall_core::{GameSession, RoundState, view};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Runs one game for the lifetime of the connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    let span = tracing::info_span!("game_session", %session_id);
    async move {
        info!("New WebSocket connection.");
        if let Err(e) = run_game_session(socket, state).await {
            error!(error = ?e, "Game session terminated with error.");
        }
        info!("Game session finished.");
    }
    .instrument(span)
    .await
}

/// The main event loop for an active connection.
///
/// Client messages become session inputs. Every state change is pushed as a
/// snapshot, and clips queued by the playback are forwarded as they arrive.
async fn run_game_session(socket: WebSocket, state: Arc<AppState>) -> Result<()> {
    let (mut socket_tx, mut socket_rx) = socket.split();
    let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();

    let game = GameSession::spawn(
        state.config.game,
        state.question_provider(),
        state.audio_provider(outbox_tx),
    );
    let mut updates = game.subscribe();
    send_snapshot(&mut socket_tx, &mut updates).await?;

    let result = session_loop(
        &game,
        &mut socket_tx,
        &mut socket_rx,
        &mut updates,
        &mut outbox_rx,
    )
    .await;

    game.shutdown();
    info!("WebSocket connection closed and game session stopped.");
    result
}

async fn session_loop(
    game: &GameSession,
    socket_tx: &mut SplitSink<WebSocket, Message>,
    socket_rx: &mut SplitStream<WebSocket>,
    updates: &mut watch::Receiver<RoundState>,
    outbox_rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<()> {
    loop {
        tokio::select! {
            // Handle messages from the client WebSocket.
            msg_result = socket_rx.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => {
                                debug!(?msg, "Client message");
                                game.send(msg.into());
                            }
                            Err(e) => {
                                warn!(error = %e, "Ignoring malformed client message.");
                                send_msg(socket_tx, ServerMessage::Error { message: e.to_string() }).await?;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => warn!("Ignoring unexpected binary message."),
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Client closed the connection.");
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Err(e)) => {
                        error!("Error receiving from client WebSocket: {:?}", e);
                        break;
                    }
                }
            },
            // Push every state change to the client.
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Game session stopped unexpectedly.");
                    break;
                }
                send_snapshot(socket_tx, updates).await?;
            },
            Some(msg) = outbox_rx.recv() => {
                send_msg(socket_tx, msg).await?;
            },
        }
    }
    Ok(())
}

async fn send_snapshot(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    updates: &mut watch::Receiver<RoundState>,
) -> Result<()> {
    let state = updates.borrow_and_update().clone();
    let view = view::render(&state);
    send_msg(socket_tx, ServerMessage::Snapshot { state, view }).await
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
