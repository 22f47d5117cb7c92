//! Round logic for the big/small picture game.
//!
//! A pure round machine decides every transition and describes the work to
//! do as effects. [`session::GameSession`] owns one and runs those effects
//! against a question provider and an audio provider.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm_question;
pub(crate) mod machine;
pub mod provider;
pub mod question;
pub mod session;
pub mod state;
pub mod tts;
pub mod view;
pub mod voice;

pub use config::GameConfig;
pub use error::{InvalidTransition, ProviderError};
pub use question::{Choice, GameObject, Question, SizeTarget};
pub use session::GameSession;
pub use state::{RoundState, Screen};
