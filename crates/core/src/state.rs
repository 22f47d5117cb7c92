use crate::question::Question;
use serde::{Deserialize, Serialize};

/// Every screen the game can be on.
///
/// `Success` and `Failure` are the answered part of a round: they block
/// further selections while feedback plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Welcome,
    Loading,
    Playing,
    Success,
    Failure,
    GameOver,
}

impl Screen {
    pub fn is_answered(self) -> bool {
        matches!(self, Screen::Success | Screen::Failure)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub shown: bool,
    pub was_correct: bool,
}

/// Snapshot of one play session.
///
/// Only the round machine mutates this; everyone else receives clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundState {
    pub screen: Screen,
    pub round: u32,
    pub score: u32,
    pub total_rounds: u32,
    pub current_question: Option<Question>,
    pub feedback: Feedback,
    pub audio_busy: bool,
    /// An instruction prompt is stored for this round, so replay can work.
    pub replay_available: bool,
}

impl RoundState {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            screen: Screen::Welcome,
            round: 1,
            score: 0,
            total_rounds,
            current_question: None,
            feedback: Feedback::default(),
            audio_busy: false,
            replay_available: false,
        }
    }

    /// True when a selection would be judged right now.
    pub fn accepts_answer(&self) -> bool {
        self.screen == Screen::Playing && self.current_question.is_some() && !self.audio_busy
    }
}
