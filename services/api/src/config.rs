use bigsmall_core::config::{DEFAULT_FEEDBACK_DELAY, DEFAULT_RETRY_BACKOFF, DEFAULT_TOTAL_ROUNDS};
use bigsmall_core::GameConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where questions come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
    /// The built-in pair catalog. Needs no network.
    Static,
    /// Pairs generated by a chat model.
    Llm,
}

/// How rounds sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceKind {
    Tone,
    Tts,
    Silent,
}

/// OpenAI-compatible backend used for question generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub question_source: QuestionSource,
    pub voice: VoiceKind,
    pub llm_provider: LlmProvider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub game: GameConfig,
    pub log_level: Level,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let source_str = var_or("QUESTION_SOURCE", "static");
        let question_source = match source_str.to_lowercase().as_str() {
            "static" => QuestionSource::Static,
            "llm" => QuestionSource::Llm,
            other => {
                return Err(ConfigError::InvalidValue(
                    "QUESTION_SOURCE".to_string(),
                    format!("'{other}' is not one of static, llm"),
                ));
            }
        };

        let voice_str = var_or("VOICE", "tone");
        let voice = match voice_str.to_lowercase().as_str() {
            "tone" => VoiceKind::Tone,
            "tts" => VoiceKind::Tts,
            "silent" => VoiceKind::Silent,
            other => {
                return Err(ConfigError::InvalidValue(
                    "VOICE".to_string(),
                    format!("'{other}' is not one of tone, tts, silent"),
                ));
            }
        };

        let provider_str = var_or("LLM_PROVIDER", "openai");
        let llm_provider = match provider_str.to_lowercase().as_str() {
            "gemini" => LlmProvider::Gemini,
            _ => LlmProvider::OpenAI,
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model = var_or("CHAT_MODEL", "gpt-4o");
        let tts_model = var_or("TTS_MODEL", "gpt-4o-mini-tts");
        let tts_voice = var_or("TTS_VOICE", "nova");

        let total_rounds = parse_var("TOTAL_ROUNDS", DEFAULT_TOTAL_ROUNDS)?;
        if total_rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "TOTAL_ROUNDS".to_string(),
                "a game needs at least one round".to_string(),
            ));
        }
        let retry_backoff = parse_var("RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF.as_millis() as u64)
            .map(Duration::from_millis)?;
        let feedback_delay =
            parse_var("FEEDBACK_DELAY_MS", DEFAULT_FEEDBACK_DELAY.as_millis() as u64)
                .map(Duration::from_millis)?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        if question_source == QuestionSource::Llm {
            match llm_provider {
                LlmProvider::OpenAI if openai_api_key.is_none() => {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'llm' questions from 'openai'".to_string(),
                    ));
                }
                LlmProvider::Gemini if gemini_api_key.is_none() => {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'llm' questions from 'gemini'".to_string(),
                    ));
                }
                _ => {}
            }
        }
        // Speech always goes to OpenAI; the Gemini compatibility layer has no speech endpoint.
        if voice == VoiceKind::Tts && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "OPENAI_API_KEY must be set for 'tts' voice".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            question_source,
            voice,
            llm_provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            tts_model,
            tts_voice,
            game: GameConfig {
                total_rounds,
                retry_backoff,
                feedback_delay,
            },
            log_level,
        })
    }
}
