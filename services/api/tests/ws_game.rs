//! Plays a game over a real WebSocket against the served router.

use bigsmall_api::{
    config::{Config, LlmProvider, QuestionSource, VoiceKind},
    router::create_router,
    state::AppState,
};
use bigsmall_core::{GameConfig, voice::ToneSpeaker};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        question_source: QuestionSource::Static,
        voice: VoiceKind::Tone,
        llm_provider: LlmProvider::OpenAI,
        openai_api_key: None,
        gemini_api_key: None,
        chat_model: "gpt-4o-mini".to_string(),
        tts_model: "gpt-4o-mini-tts".to_string(),
        tts_voice: "nova".to_string(),
        game: GameConfig {
            total_rounds: 1,
            retry_backoff: Duration::from_millis(10),
            feedback_delay: Duration::from_millis(200),
        },
        log_level: tracing::Level::INFO,
    }
}

async fn serve() -> SocketAddr {
    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        generated_questions: None,
        speaker: Some(Arc::new(ToneSpeaker)),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

/// Next JSON text frame from the server, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(READ_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for the server")
            .expect("connection ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Reads until `done` matches, returning every message seen including the last.
async fn read_until(client: &mut Client, done: impl Fn(&Value) -> bool) -> Vec<Value> {
    let mut seen = Vec::new();
    loop {
        let msg = next_json(client).await;
        let finished = done(&msg);
        seen.push(msg);
        if finished {
            return seen;
        }
    }
}

fn is_snapshot(msg: &Value, screen: &str) -> bool {
    msg["type"] == "snapshot" && msg["state"]["screen"] == screen
}

fn has_audio(seen: &[Value], cue: &str) -> bool {
    seen.iter().any(|m| m["type"] == "audio" && m["cue"] == cue)
}

async fn send(client: &mut Client, raw: &str) {
    client.send(Message::text(raw)).await.unwrap();
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = serve().await;
    let body = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_initial_snapshot_on_connect() {
    let addr = serve().await;
    let mut client = connect(addr).await;

    let msg = next_json(&mut client).await;
    assert!(is_snapshot(&msg, "welcome"));
    assert_eq!(msg["state"]["totalRounds"], 1);
    assert_eq!(msg["view"]["screen"], "welcome");
    assert_eq!(msg["view"]["title"], "大小大挑战");
}

#[tokio::test]
async fn test_full_game_over_websocket() {
    let addr = serve().await;
    let mut client = connect(addr).await;
    assert!(is_snapshot(&next_json(&mut client).await, "welcome"));

    // A message the server does not understand is reported, not fatal.
    send(&mut client, r#"{"type":"dance"}"#).await;
    let error = next_json(&mut client).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].is_string());

    send(&mut client, r#"{"type":"start"}"#).await;
    let seen = read_until(&mut client, |m| {
        is_snapshot(m, "playing") && m["state"]["audioBusy"] == false
    })
    .await;
    assert!(seen.iter().any(|m| is_snapshot(m, "loading")));
    assert!(has_audio(&seen, "instruction"));
    let instruction = seen.iter().find(|m| m["type"] == "audio").unwrap();
    assert_eq!(instruction["sample_rate"], 24_000);
    assert!(!instruction["data"].as_str().unwrap().is_empty());

    let playing = seen.last().unwrap();
    assert_eq!(playing["view"]["inputEnabled"], true);
    assert_eq!(playing["view"]["replayEnabled"], true);
    let target = playing["state"]["currentQuestion"]["targetAttribute"]
        .as_str()
        .unwrap();
    let answer = format!(r#"{{"type":"answer","choice_is_big":{}}}"#, target == "big");
    send(&mut client, &answer).await;

    let seen = read_until(&mut client, |m| is_snapshot(m, "game_over")).await;
    let success = seen.iter().find(|m| is_snapshot(m, "success")).unwrap();
    assert_eq!(success["state"]["score"], 1);
    assert_eq!(success["view"]["wasCorrect"], true);
    assert!(has_audio(&seen, "success"));

    let game_over = seen.last().unwrap();
    assert_eq!(game_over["view"]["medal"], "trophy");
    assert_eq!(game_over["view"]["score"], 1);
}

#[tokio::test]
async fn test_close_ends_the_session() {
    let addr = serve().await;
    let mut client = connect(addr).await;
    assert!(is_snapshot(&next_json(&mut client).await, "welcome"));

    client.send(Message::Close(None)).await.unwrap();

    // The server answers the close handshake and drops the connection.
    let ended = tokio::time::timeout(READ_TIMEOUT, async {
        while let Some(frame) = client.next().await {
            if frame.is_err() {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok());
}
