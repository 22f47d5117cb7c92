//! Audio clips and PCM helpers.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::{f32::consts::PI, sync::Arc, time::Duration};

/// Sample rate used for synthesized tones and for speech from the TTS endpoint.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// What a clip is for. Speakers that can not render text use this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Instruction,
    Success,
    Failure,
}

impl AudioCue {
    pub fn feedback(was_correct: bool) -> Self {
        if was_correct {
            AudioCue::Success
        } else {
            AudioCue::Failure
        }
    }
}

/// Mono PCM16 samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Arc<[i16]>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    /// Interprets little-endian PCM16 bytes, dropping a trailing odd byte.
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.samples.len() as u64 * 1_000_000_000 / self.sample_rate as u64;
        Duration::from_nanos(nanos)
    }

    pub fn to_base64(&self) -> String {
        encode_i16(&self.samples)
    }
}

/// Something the audio provider can play.
///
/// `clip` is `None` when the backend produced no sound (silent mode, or a
/// speech engine that returned nothing); playback then completes at once.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioHandle {
    pub text: String,
    pub cue: AudioCue,
    pub clip: Option<AudioClip>,
}

impl AudioHandle {
    pub fn silent(text: impl Into<String>, cue: AudioCue) -> Self {
        Self {
            text: text.into(),
            cue,
            clip: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.clip
            .as_ref()
            .map(AudioClip::duration)
            .unwrap_or(Duration::ZERO)
    }
}

/// A decaying sine beep, the offline stand-in for speech.
pub fn beep(frequency: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    let rate = sample_rate as f32;
    (0..len)
        .map(|i| {
            let t = i as f32;
            (2.0 * PI * frequency * t / rate).sin() * 0.3 * 0.5f32.powf(t / (rate * seconds))
        })
        .collect()
}

/// Converts a slice of f32 samples to a vector of i16 samples.
pub fn convert_f32_to_i16(pcm32: &[f32]) -> Vec<i16> {
    pcm32
        .iter()
        .map(|&sample| (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Base64 of little-endian PCM16, the format the browser player expects.
pub fn encode_i16(pcm16: &[i16]) -> String {
    let bytes: Vec<u8> = pcm16
        .iter()
        .flat_map(|&sample| sample.to_le_bytes())
        .collect();
    base64::engine::general_purpose::STANDARD.encode(&bytes)
}
