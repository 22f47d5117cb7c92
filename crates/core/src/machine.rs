//! The round lifecycle as a pure state machine.
//!
//! [`RoundMachine::handle`] applies one [`Event`] and returns the [`Effect`]s
//! the caller must perform: fetch a question, play audio, arm a timer. Results
//! of that work come back as further events. The machine never awaits and
//! never touches a clock, so every transition can be driven directly in tests.
//!
//! Each `load_round` starts a new [`Epoch`]. Effects carry the epoch they were
//! issued in, and completions from an older epoch are rejected, so a late
//! timer or slow provider can not touch a round that has moved on.

use crate::{
    config::GameConfig,
    error::{InvalidTransition, ProviderError},
    question::{Choice, Question},
    state::{Feedback, RoundState, Screen},
};
use std::{fmt, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    fn next(self) -> Self {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything that can happen to a session.
#[derive(Debug, Clone)]
pub enum Event {
    // Player input.
    Start,
    Answer { choice_is_big: bool },
    Select(Choice),
    ReplayInstruction,

    // Completions of effects.
    QuestionFetched {
        epoch: Epoch,
        result: Result<Question, ProviderError>,
    },
    /// `prompt` is `None` when no instruction audio could be produced.
    InstructionFinished { epoch: Epoch, prompt: Option<String> },
    FeedbackFinished { epoch: Epoch },
    ReplayFinished { epoch: Epoch },
    RetryElapsed { epoch: Epoch },
    AdvanceElapsed { epoch: Epoch },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Answer { .. } => "submit_answer",
            Event::Select(_) => "select",
            Event::ReplayInstruction => "replay_instruction",
            Event::QuestionFetched { .. } => "question_fetched",
            Event::InstructionFinished { .. } => "instruction_finished",
            Event::FeedbackFinished { .. } => "feedback_finished",
            Event::ReplayFinished { .. } => "replay_finished",
            Event::RetryElapsed { .. } => "retry_elapsed",
            Event::AdvanceElapsed { .. } => "advance_elapsed",
        }
    }
}

/// Work the machine asks its driver to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchQuestion { epoch: Epoch },
    /// Fetch the instruction audio for `question`, play it, report the prompt.
    PlayInstruction { epoch: Epoch, question: Question },
    PlayFeedback { epoch: Epoch, was_correct: bool },
    Replay { epoch: Epoch, prompt: String },
    Retry { epoch: Epoch, after: Duration },
    Advance { epoch: Epoch, after: Duration },
}

impl Effect {
    pub fn epoch(&self) -> Epoch {
        match self {
            Effect::FetchQuestion { epoch }
            | Effect::PlayInstruction { epoch, .. }
            | Effect::PlayFeedback { epoch, .. }
            | Effect::Replay { epoch, .. }
            | Effect::Retry { epoch, .. }
            | Effect::Advance { epoch, .. } => *epoch,
        }
    }
}

type Transition = Result<Vec<Effect>, InvalidTransition>;

pub struct RoundMachine {
    config: GameConfig,
    state: RoundState,
    epoch: Epoch,
    /// Text of the current round's instruction, kept for replays.
    prompt: Option<String>,
}

impl RoundMachine {
    pub fn new(config: GameConfig) -> Self {
        let config = config.with_total_rounds(config.total_rounds);
        Self {
            state: RoundState::new(config.total_rounds),
            config,
            epoch: Epoch::default(),
            prompt: None,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    #[cfg(test)]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[cfg(test)]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Applies one event. On `Err` the state is unchanged.
    pub fn handle(&mut self, event: Event) -> Transition {
        match event {
            Event::Start => self.start(),
            Event::Answer { choice_is_big } => self.submit_answer(choice_is_big),
            Event::Select(choice) => self.select(choice),
            Event::ReplayInstruction => self.replay_instruction(),
            Event::QuestionFetched { epoch, result } => {
                self.current("question_fetched", epoch)?;
                self.question_fetched(result)
            }
            Event::InstructionFinished { epoch, prompt } => {
                self.current("instruction_finished", epoch)?;
                self.instruction_finished(prompt)
            }
            Event::FeedbackFinished { epoch } => {
                self.current("feedback_finished", epoch)?;
                self.audio_finished()
            }
            Event::ReplayFinished { epoch } => {
                self.current("replay_finished", epoch)?;
                self.audio_finished()
            }
            Event::RetryElapsed { epoch } => {
                self.current("retry_elapsed", epoch)?;
                self.expect_screen("retry_elapsed", &[Screen::Loading])?;
                info!(round = self.state.round, "Retrying question fetch");
                Ok(self.load_round())
            }
            Event::AdvanceElapsed { epoch } => {
                self.current("advance_elapsed", epoch)?;
                self.advance()
            }
        }
    }

    fn current(&self, event: &'static str, epoch: Epoch) -> Result<(), InvalidTransition> {
        if epoch == self.epoch {
            Ok(())
        } else {
            Err(InvalidTransition::Stale {
                event,
                epoch: epoch.0,
            })
        }
    }

    fn expect_screen(&self, event: &'static str, allowed: &[Screen]) -> Result<(), InvalidTransition> {
        if allowed.contains(&self.state.screen) {
            Ok(())
        } else {
            Err(InvalidTransition::WrongScreen {
                event,
                screen: self.state.screen,
            })
        }
    }

    fn start(&mut self) -> Transition {
        self.expect_screen("start", &[Screen::Welcome, Screen::GameOver])?;
        // A replay or long feedback clip may still be playing over GameOver.
        if self.state.audio_busy {
            return Err(InvalidTransition::AudioBusy("start"));
        }
        info!(total_rounds = self.state.total_rounds, "Starting game");
        self.state.round = 1;
        self.state.score = 0;
        self.prompt = None;
        Ok(self.load_round())
    }

    fn load_round(&mut self) -> Vec<Effect> {
        self.epoch = self.epoch.next();
        self.state.screen = Screen::Loading;
        self.state.feedback = Feedback::default();
        self.state.current_question = None;
        self.state.audio_busy = true;
        self.state.replay_available = false;
        self.prompt = None;
        debug!(round = self.state.round, epoch = %self.epoch, "Loading round");
        vec![Effect::FetchQuestion { epoch: self.epoch }]
    }

    fn question_fetched(&mut self, result: Result<Question, ProviderError>) -> Transition {
        self.expect_screen("question_fetched", &[Screen::Loading])?;
        match result {
            Ok(question) => {
                debug!(
                    round = self.state.round,
                    target = %question.target_attribute(),
                    object1 = %question.object1().name,
                    object2 = %question.object2().name,
                    "Question ready"
                );
                self.state.current_question = Some(question.clone());
                self.state.screen = Screen::Playing;
                Ok(vec![Effect::PlayInstruction {
                    epoch: self.epoch,
                    question,
                }])
            }
            Err(error) => {
                warn!(%error, round = self.state.round, backoff = ?self.config.retry_backoff, "Question fetch failed");
                self.state.audio_busy = false;
                Ok(vec![Effect::Retry {
                    epoch: self.epoch,
                    after: self.config.retry_backoff,
                }])
            }
        }
    }

    fn instruction_finished(&mut self, prompt: Option<String>) -> Transition {
        self.expect_screen("instruction_finished", &[Screen::Playing])?;
        self.state.replay_available = prompt.is_some();
        self.prompt = prompt;
        self.state.audio_busy = false;
        Ok(Vec::new())
    }

    fn audio_finished(&mut self) -> Transition {
        self.state.audio_busy = false;
        Ok(Vec::new())
    }

    fn select(&mut self, choice: Choice) -> Transition {
        self.expect_screen("select", &[Screen::Playing])?;
        let choice_is_big = self
            .state
            .current_question
            .as_ref()
            .map(|q| q.object(choice).is_big)
            .ok_or(InvalidTransition::NoQuestion("select"))?;
        self.submit_answer(choice_is_big)
    }

    fn submit_answer(&mut self, choice_is_big: bool) -> Transition {
        self.expect_screen("submit_answer", &[Screen::Playing])?;
        let question = self
            .state
            .current_question
            .as_ref()
            .ok_or(InvalidTransition::NoQuestion("submit_answer"))?;
        if self.state.audio_busy {
            return Err(InvalidTransition::AudioBusy("submit_answer"));
        }

        let was_correct = question.is_correct(choice_is_big);
        if was_correct {
            self.state.score += 1;
            self.state.screen = Screen::Success;
        } else {
            self.state.screen = Screen::Failure;
        }
        self.state.feedback = Feedback {
            shown: true,
            was_correct,
        };
        self.state.audio_busy = true;
        info!(round = self.state.round, was_correct, score = self.state.score, "Answer judged");

        Ok(vec![
            Effect::PlayFeedback {
                epoch: self.epoch,
                was_correct,
            },
            Effect::Advance {
                epoch: self.epoch,
                after: self.config.feedback_delay,
            },
        ])
    }

    fn advance(&mut self) -> Transition {
        self.expect_screen("advance_elapsed", &[Screen::Success, Screen::Failure])?;
        self.state.feedback.shown = false;
        if self.state.round < self.state.total_rounds {
            self.state.round += 1;
            Ok(self.load_round())
        } else {
            self.state.screen = Screen::GameOver;
            info!(score = self.state.score, total_rounds = self.state.total_rounds, "Game over");
            Ok(Vec::new())
        }
    }

    fn replay_instruction(&mut self) -> Transition {
        let prompt = self.prompt.clone().ok_or(InvalidTransition::NoPrompt)?;
        if self.state.audio_busy {
            return Err(InvalidTransition::AudioBusy("replay_instruction"));
        }
        self.state.audio_busy = true;
        Ok(vec![Effect::Replay {
            epoch: self.epoch,
            prompt,
        }])
    }
}
