//! Speech adapter composed of Whisper (speech-to-text) and ElevenLabs
//! (text-to-speech).

use super::{ProviderError, SpeechProvider};
use async_trait::async_trait;
use elevenlabs::ElevenLabs;
use openai::OpenAi;

/// Filename hint sent with transcription uploads; browser recordings arrive
/// as webm/opus clips.
const AUDIO_FILENAME: &str = "speech.webm";

/// Two-service speech stack: OpenAI Whisper in, ElevenLabs out.
///
/// Text-to-speech is optional; without it, synthesis fails and the
/// conversation agent simply drops the audio.
#[derive(Clone)]
pub struct VoiceGateway {
    stt: OpenAi,
    tts: Option<ElevenLabs>,
}

impl VoiceGateway {
    pub fn new(stt: OpenAi, tts: Option<ElevenLabs>) -> Self {
        Self { stt, tts }
    }
}

#[async_trait]
impl SpeechProvider for VoiceGateway {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, ProviderError> {
        Ok(self.stt.transcribe(audio, AUDIO_FILENAME).await?)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError> {
        let tts = self
            .tts
            .as_ref()
            .ok_or_else(|| ProviderError::Other("text-to-speech not configured".into()))?;
        Ok(tts.synthesize(text).await?)
    }
}
