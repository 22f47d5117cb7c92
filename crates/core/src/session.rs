//! Async driver for the round machine.
//!
//! A [`GameSession`] is a single actor task that owns its [`RoundMachine`].
//! Player input and effect completions are applied one at a time, in the
//! order they arrive, so no two transitions ever interleave. Effects run as
//! tasks in a `JoinSet`; dropping the session aborts the actor and, with it,
//! every pending provider call and timer.

use crate::{
    config::GameConfig,
    machine::{Effect, Event, RoundMachine},
    provider::{AudioProvider, QuestionProvider},
    question::Choice,
    state::RoundState,
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::{JoinHandle, JoinSet},
};
use tracing::{Instrument, debug, error, warn};

/// The operations a presentation layer may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start,
    Answer { choice_is_big: bool },
    Select(Choice),
    ReplayInstruction,
}

impl From<Input> for Event {
    fn from(input: Input) -> Self {
        match input {
            Input::Start => Event::Start,
            Input::Answer { choice_is_big } => Event::Answer { choice_is_big },
            Input::Select(choice) => Event::Select(choice),
            Input::ReplayInstruction => Event::ReplayInstruction,
        }
    }
}

/// Handle to a running play session.
///
/// All operations are fire-and-forget: requests that do not fit the current
/// state are dropped by the session. Watch [`GameSession::subscribe`] for the
/// resulting state.
pub struct GameSession {
    inputs: mpsc::UnboundedSender<Input>,
    state: watch::Receiver<RoundState>,
    task: JoinHandle<()>,
}

impl GameSession {
    /// Spawns the session actor on the current tokio runtime.
    pub fn spawn(
        config: GameConfig,
        questions: Arc<dyn QuestionProvider>,
        audio: Arc<dyn AudioProvider>,
    ) -> Self {
        let machine = RoundMachine::new(config);
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        let actor = Actor {
            machine,
            questions,
            audio,
            tasks: JoinSet::new(),
            state_tx,
        };
        let task = tokio::spawn(actor.run(input_rx).in_current_span());

        Self {
            inputs: input_tx,
            state: state_rx,
            task,
        }
    }

    pub fn start(&self) {
        self.send(Input::Start);
    }

    pub fn submit_answer(&self, choice_is_big: bool) {
        self.send(Input::Answer { choice_is_big });
    }

    /// Answers with the object in the given slot of the current question.
    pub fn select(&self, choice: Choice) {
        self.send(Input::Select(choice));
    }

    pub fn replay_instruction(&self) {
        self.send(Input::ReplayInstruction);
    }

    pub fn send(&self, input: Input) {
        if self.inputs.send(input).is_err() {
            warn!(?input, "Session has stopped; input dropped");
        }
    }

    pub fn snapshot(&self) -> RoundState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoundState> {
        self.state.clone()
    }

    /// Stops the session. Pending timers and provider calls are cancelled.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Actor {
    machine: RoundMachine,
    questions: Arc<dyn QuestionProvider>,
    audio: Arc<dyn AudioProvider>,
    tasks: JoinSet<Event>,
    state_tx: watch::Sender<RoundState>,
}

impl Actor {
    async fn run(mut self, mut inputs: mpsc::UnboundedReceiver<Input>) {
        loop {
            let event = tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => Event::from(input),
                    None => break,
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
                    Ok(event) => event,
                    Err(e) => {
                        if e.is_panic() {
                            error!(error = %e, "Session effect panicked");
                        }
                        continue;
                    }
                },
            };
            self.dispatch(event);
        }
        debug!("Session input closed; cancelling pending work");
    }

    fn dispatch(&mut self, event: Event) {
        let name = event.name();
        match self.machine.handle(event) {
            Ok(effects) => {
                for effect in effects {
                    self.perform(effect);
                }
                self.publish();
            }
            Err(reason) => debug!(event = name, %reason, "Event ignored"),
        }
    }

    fn publish(&self) {
        let next = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if current == next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }

    fn perform(&mut self, effect: Effect) {
        let epoch = effect.epoch();
        match effect {
            Effect::FetchQuestion { .. } => {
                let questions = self.questions.clone();
                self.spawn(async move {
                    let result = questions.fetch_question().await;
                    Event::QuestionFetched { epoch, result }
                });
            }
            Effect::PlayInstruction { question, .. } => {
                let audio = self.audio.clone();
                self.spawn(async move {
                    let prompt = match audio.fetch_instruction_audio(&question).await {
                        Ok((handle, prompt)) => {
                            if let Err(e) = audio.play(&handle).await {
                                warn!(error = %e, "Instruction playback failed");
                            }
                            Some(prompt)
                        }
                        Err(e) => {
                            warn!(error = %e, "Instruction audio unavailable");
                            None
                        }
                    };
                    Event::InstructionFinished { epoch, prompt }
                });
            }
            Effect::PlayFeedback { was_correct, .. } => {
                let audio = self.audio.clone();
                self.spawn(async move {
                    match audio.fetch_feedback_audio(was_correct).await {
                        Ok(handle) => {
                            if let Err(e) = audio.play(&handle).await {
                                warn!(error = %e, "Feedback playback failed");
                            }
                        }
                        Err(e) => warn!(error = %e, "Feedback audio unavailable"),
                    }
                    Event::FeedbackFinished { epoch }
                });
            }
            Effect::Replay { prompt, .. } => {
                let audio = self.audio.clone();
                self.spawn(async move {
                    let played = match audio.synthesize(&prompt).await {
                        Ok(handle) => audio.play(&handle).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = played {
                        warn!(error = %e, "Instruction replay failed");
                    }
                    Event::ReplayFinished { epoch }
                });
            }
            Effect::Retry { after, .. } => {
                self.spawn(async move {
                    tokio::time::sleep(after).await;
                    Event::RetryElapsed { epoch }
                });
            }
            Effect::Advance { after, .. } => {
                self.spawn(async move {
                    tokio::time::sleep(after).await;
                    Event::AdvanceElapsed { epoch }
                });
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        self.tasks.spawn(task.in_current_span());
    }
}
