//! What each screen shows, derived from a [`RoundState`].
//!
//! Clients draw a `View` however they like; nothing here knows about layout.

use crate::{
    question::{Choice, GameObject, SizeTarget},
    state::{RoundState, Screen},
};
use serde::{Deserialize, Serialize};

pub const TITLE: &str = "大小大挑战";

const PERFECT_MESSAGE: &str = "哇！你是大小专家！";
const ENCOURAGING_MESSAGE: &str = "做得很棒，继续加油！";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Trophy,
    Star,
    Muscle,
}

impl Medal {
    pub fn for_score(score: u32, total: u32) -> Self {
        if score >= total {
            Medal::Trophy
        } else if score * 2 >= total {
            Medal::Star
        } else {
            Medal::Muscle
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Medal::Trophy => "🏆",
            Medal::Star => "⭐",
            Medal::Muscle => "💪",
        }
    }
}

/// One selectable object, tagged with its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub choice: Choice,
    #[serde(flatten)]
    pub object: GameObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum View {
    Welcome {
        title: String,
    },
    Loading {
        round: u32,
        total: u32,
        score: u32,
    },
    Playing {
        round: u32,
        total: u32,
        score: u32,
        target: SizeTarget,
        choices: Vec<ChoiceView>,
        #[serde(rename = "inputEnabled")]
        input_enabled: bool,
        #[serde(rename = "replayEnabled")]
        replay_enabled: bool,
    },
    /// Success or failure overlay on top of the answered question.
    Feedback {
        round: u32,
        total: u32,
        score: u32,
        #[serde(rename = "wasCorrect")]
        was_correct: bool,
        #[serde(rename = "correctChoice")]
        correct_choice: Choice,
        choices: Vec<ChoiceView>,
    },
    GameOver {
        score: u32,
        total: u32,
        medal: Medal,
        message: String,
    },
}

pub fn render(state: &RoundState) -> View {
    let (round, total, score) = (state.round, state.total_rounds, state.score);
    let question = match (state.screen, &state.current_question) {
        (Screen::Welcome, _) => {
            return View::Welcome {
                title: TITLE.to_string(),
            };
        }
        (Screen::GameOver, _) => {
            let message = if score >= total {
                PERFECT_MESSAGE
            } else {
                ENCOURAGING_MESSAGE
            };
            return View::GameOver {
                score,
                total,
                medal: Medal::for_score(score, total),
                message: message.to_string(),
            };
        }
        // Playing or answered without a question can't happen, but show loading.
        (Screen::Loading, _) | (_, None) => return View::Loading { round, total, score },
        (_, Some(question)) => question,
    };

    let choices = [Choice::First, Choice::Second]
        .into_iter()
        .map(|choice| ChoiceView {
            choice,
            object: question.object(choice).clone(),
        })
        .collect();

    if state.screen.is_answered() {
        View::Feedback {
            round,
            total,
            score,
            was_correct: state.feedback.was_correct,
            correct_choice: question.correct_choice(),
            choices,
        }
    } else {
        View::Playing {
            round,
            total,
            score,
            target: question.target_attribute(),
            choices,
            input_enabled: state.accepts_answer(),
            replay_enabled: state.replay_available && !state.audio_busy,
        }
    }
}
