//! Main Entrypoint for the Big/Small API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the question and speech providers the configuration asks for.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use bigsmall_api::{
    config::{Config, LlmProvider, QuestionSource, VoiceKind},
    router::create_router,
    state::AppState,
};
use bigsmall_core::{
    llm_question::LlmQuestionProvider,
    provider::QuestionProvider,
    tts::{OpenAiSpeaker, parse_voice},
    voice::{Speaker, ToneSpeaker},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn openai_config(config: &Config) -> anyhow::Result<OpenAIConfig> {
    let api_key = config
        .openai_api_key
        .as_ref()
        .context("OPENAI_API_KEY is not set")?;
    Ok(OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(OPENAI_API_BASE))
}

fn question_generator(config: &Config) -> anyhow::Result<Option<Arc<dyn QuestionProvider>>> {
    if config.question_source == QuestionSource::Static {
        info!("Using the built-in pair catalog for questions.");
        return Ok(None);
    }
    let chat_config = match config.llm_provider {
        LlmProvider::OpenAI => {
            info!("Using OpenAI for question generation.");
            openai_config(config)?
        }
        LlmProvider::Gemini => {
            info!("Using Gemini for question generation.");
            let api_key = config
                .gemini_api_key
                .as_ref()
                .context("GEMINI_API_KEY is not set")?;
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(GEMINI_API_BASE)
        }
    };
    Ok(Some(Arc::new(LlmQuestionProvider::new(
        chat_config,
        config.chat_model.clone(),
    ))))
}

fn speaker(config: &Config) -> anyhow::Result<Option<Arc<dyn Speaker>>> {
    let speaker: Arc<dyn Speaker> = match config.voice {
        VoiceKind::Tone => Arc::new(ToneSpeaker),
        VoiceKind::Tts => Arc::new(OpenAiSpeaker::new(
            openai_config(config)?,
            config.tts_model.clone(),
            parse_voice(&config.tts_voice),
        )),
        VoiceKind::Silent => return Ok(None),
    };
    Ok(Some(speaker))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Providers ---
    let app_state = Arc::new(AppState {
        generated_questions: question_generator(&config)?,
        speaker: speaker(&config)?,
        config: Arc::new(config.clone()),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        questions = ?config.question_source,
        voice = ?config.voice,
        rounds = config.game.total_rounds,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
