//! Speech synthesis over an OpenAI-compatible `/audio/speech` endpoint.

use crate::{
    audio::{AudioClip, AudioCue, AudioHandle, SPEECH_SAMPLE_RATE},
    error::ProviderError,
    voice::Speaker,
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Slightly slow, so a young child can follow.
const SPEECH_SPEED: f32 = 0.85;

/// Maps a configured voice name to a known voice, defaulting to `nova`.
pub fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "ash" => Voice::Ash,
        "ballad" => Voice::Ballad,
        "coral" => Voice::Coral,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "sage" => Voice::Sage,
        "shimmer" => Voice::Shimmer,
        _ => Voice::Nova,
    }
}

/// Delivery style for each cue. Ignored by `tts-1` and `tts-1-hd`.
pub fn speaking_style(cue: AudioCue) -> &'static str {
    match cue {
        AudioCue::Instruction => "Say cheerfully and slowly in Chinese",
        AudioCue::Success => "Say enthusiastically in Chinese",
        AudioCue::Failure => "Say gently and encouragingly in Chinese",
    }
}

/// A `Speaker` backed by a text-to-speech model. Output is raw PCM16 at 24 kHz.
pub struct OpenAiSpeaker {
    client: Client<OpenAIConfig>,
    model: String,
    voice: Voice,
}

impl OpenAiSpeaker {
    pub fn new(config: OpenAIConfig, model: String, voice: Voice) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            voice,
        }
    }
}

#[async_trait]
impl Speaker for OpenAiSpeaker {
    #[instrument(name = "tts", skip(self), fields(model = %self.model))]
    async fn speak(&self, text: &str, cue: AudioCue) -> Result<AudioHandle, ProviderError> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(SpeechModel::Other(self.model.clone()))
            .voice(self.voice.clone())
            .instructions(speaking_style(cue))
            .response_format(SpeechResponseFormat::Pcm)
            .speed(SPEECH_SPEED)
            .build()
            .map_err(ProviderError::request)?;

        let response = self
            .client
            .audio()
            .speech(request)
            .await
            .map_err(ProviderError::audio)?;

        if response.bytes.is_empty() {
            return Err(ProviderError::Audio("speech endpoint returned no audio".to_string()));
        }
        let clip = AudioClip::from_le_bytes(&response.bytes, SPEECH_SAMPLE_RATE);
        debug!(samples = clip.samples.len(), duration = ?clip.duration(), "Synthesized speech");
        Ok(AudioHandle {
            text: text.to_string(),
            cue,
            clip: Some(clip),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice() {
        assert_eq!(parse_voice("Shimmer"), Voice::Shimmer);
        assert_eq!(parse_voice("alloy"), Voice::Alloy);
        assert_eq!(parse_voice("coral"), Voice::Coral);
        assert_eq!(parse_voice("SAGE"), Voice::Sage);
        assert_eq!(parse_voice("ash"), Voice::Ash);
        assert_eq!(parse_voice("ballad"), Voice::Ballad);
        assert_eq!(parse_voice("unknown"), Voice::Nova);
    }

    #[test]
    fn test_speaking_style_per_cue() {
        assert_eq!(
            speaking_style(AudioCue::Instruction),
            "Say cheerfully and slowly in Chinese"
        );
        assert_eq!(
            speaking_style(AudioCue::Success),
            "Say enthusiastically in Chinese"
        );
        assert_eq!(
            speaking_style(AudioCue::Failure),
            "Say gently and encouragingly in Chinese"
        );
    }

    #[test]
    fn test_speech_request_carries_style() {
        let request = CreateSpeechRequestArgs::default()
            .input("很好")
            .model(SpeechModel::Other("gpt-4o-mini-tts".to_string()))
            .voice(Voice::Nova)
            .instructions(speaking_style(AudioCue::Success))
            .build()
            .unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["instructions"], "Say enthusiastically in Chinese");
        assert_eq!(value["voice"], "nova");
    }
}
