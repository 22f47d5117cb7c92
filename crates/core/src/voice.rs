//! Audio providers built from a speech backend and a playback sink.
//!
//! [`VoiceAudio`] composes the lines a round needs (instruction prompt, praise,
//! encouragement), hands them to a [`Speaker`] and plays the result through a
//! [`Playback`]. [`SilentAudio`] satisfies the same contract without sound.

use crate::{
    audio::{AudioClip, AudioCue, AudioHandle, SPEECH_SAMPLE_RATE, beep, convert_f32_to_i16},
    error::ProviderError,
    provider::AudioProvider,
    question::Question,
};
use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const SUCCESS_PHRASES: [&str; 5] = ["太棒了！", "答对了！", "真聪明！", "好极了！", "做得对！"];

pub const FAILURE_PHRASES: [&str; 5] = [
    "哎呀，不对哦。",
    "不对，下次加油！",
    "那个不是哦。",
    "再试一次吧！",
    "好好想一下哦。",
];

/// The spoken instruction for a question.
pub fn instruction_prompt(question: &Question) -> String {
    format!(
        "请找出{}和{}中，{}的那个",
        question.object1().name,
        question.object2().name,
        question.target_attribute().label()
    )
}

/// Turns a line of text into a clip.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str, cue: AudioCue) -> Result<AudioHandle, ProviderError>;
}

/// Plays a clip and resolves once it has finished.
#[async_trait]
pub trait Playback: Send + Sync {
    async fn play(&self, handle: &AudioHandle) -> Result<(), ProviderError>;
}

/// Picks feedback phrases at random.
pub struct Phrasebook {
    rng: Mutex<StdRng>,
}

impl Phrasebook {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn feedback(&self, was_correct: bool) -> &'static str {
        let phrases: &[&'static str] = if was_correct {
            &SUCCESS_PHRASES
        } else {
            &FAILURE_PHRASES
        };
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        phrases.choose(&mut *rng).copied().unwrap_or(phrases[0])
    }
}

impl Default for Phrasebook {
    fn default() -> Self {
        Self::new()
    }
}

/// An `AudioProvider` that speaks through a `Speaker` and plays through a `Playback`.
pub struct VoiceAudio {
    speaker: Arc<dyn Speaker>,
    playback: Arc<dyn Playback>,
    phrases: Phrasebook,
}

impl VoiceAudio {
    pub fn new(speaker: Arc<dyn Speaker>, playback: Arc<dyn Playback>) -> Self {
        Self::with_phrasebook(speaker, playback, Phrasebook::new())
    }

    pub fn with_phrasebook(
        speaker: Arc<dyn Speaker>,
        playback: Arc<dyn Playback>,
        phrases: Phrasebook,
    ) -> Self {
        Self {
            speaker,
            playback,
            phrases,
        }
    }
}

#[async_trait]
impl AudioProvider for VoiceAudio {
    async fn fetch_instruction_audio(
        &self,
        question: &Question,
    ) -> Result<(AudioHandle, String), ProviderError> {
        let prompt = instruction_prompt(question);
        let handle = self.speaker.speak(&prompt, AudioCue::Instruction).await?;
        Ok((handle, prompt))
    }

    async fn fetch_feedback_audio(&self, was_correct: bool) -> Result<AudioHandle, ProviderError> {
        let phrase = self.phrases.feedback(was_correct);
        self.speaker
            .speak(phrase, AudioCue::feedback(was_correct))
            .await
    }

    async fn synthesize(&self, prompt: &str) -> Result<AudioHandle, ProviderError> {
        self.speaker.speak(prompt, AudioCue::Instruction).await
    }

    async fn play(&self, handle: &AudioHandle) -> Result<(), ProviderError> {
        self.playback.play(handle).await
    }
}

/// Renders each cue as a short beep. Needs no network.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneSpeaker;

impl ToneSpeaker {
    fn tone(cue: AudioCue) -> (f32, f32) {
        match cue {
            AudioCue::Instruction => (440.0, 0.5),
            AudioCue::Success => (523.25, 0.3),
            AudioCue::Failure => (349.23, 0.4),
        }
    }
}

#[async_trait]
impl Speaker for ToneSpeaker {
    async fn speak(&self, text: &str, cue: AudioCue) -> Result<AudioHandle, ProviderError> {
        let (frequency, seconds) = Self::tone(cue);
        let samples = convert_f32_to_i16(&beep(frequency, seconds, SPEECH_SAMPLE_RATE));
        Ok(AudioHandle {
            text: text.to_string(),
            cue,
            clip: Some(AudioClip::new(samples, SPEECH_SAMPLE_RATE)),
        })
    }
}

/// Waits for as long as each clip lasts, as a device would.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacedPlayback;

#[async_trait]
impl Playback for PacedPlayback {
    async fn play(&self, handle: &AudioHandle) -> Result<(), ProviderError> {
        let duration = handle.duration();
        debug!(text = %handle.text, ?duration, "Playing clip");
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

/// An `AudioProvider` that produces nothing and finishes instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

#[async_trait]
impl AudioProvider for SilentAudio {
    async fn fetch_instruction_audio(
        &self,
        question: &Question,
    ) -> Result<(AudioHandle, String), ProviderError> {
        let prompt = instruction_prompt(question);
        Ok((AudioHandle::silent(prompt.clone(), AudioCue::Instruction), prompt))
    }

    async fn fetch_feedback_audio(&self, was_correct: bool) -> Result<AudioHandle, ProviderError> {
        Ok(AudioHandle::silent("", AudioCue::feedback(was_correct)))
    }

    async fn synthesize(&self, prompt: &str) -> Result<AudioHandle, ProviderError> {
        Ok(AudioHandle::silent(prompt, AudioCue::Instruction))
    }

    async fn play(&self, _handle: &AudioHandle) -> Result<(), ProviderError> {
        Ok(())
    }
}
