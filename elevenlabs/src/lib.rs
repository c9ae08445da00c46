//! Minimal ElevenLabs text-to-speech API client.
//!
//! Wraps the single endpoint the story engine uses: synthesizing a short
//! spoken reply from text.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use thiserror::Error;

const API_BASE: &str = "https://api.elevenlabs.io/v1";
const DEFAULT_MODEL: &str = "eleven_multilingual_v2";
// "Rachel" - a calm, clear voice that works well for young listeners.
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Errors that can occur when using the ElevenLabs client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// ElevenLabs API client.
#[derive(Clone)]
pub struct ElevenLabs {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
    model: String,
}

impl ElevenLabs {
    /// Create a new ElevenLabs client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create an ElevenLabs client from the ELEVENLABS_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the voice for this client.
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    /// Set the model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Synthesize speech for the given text, returning encoded audio bytes
    /// (MP3 by default).
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, Error> {
        let api_request = ApiSpeechRequest {
            text: text.to_string(),
            model_id: self.model.clone(),
        };

        let response = self
            .client
            .post(format!("{API_BASE}/text-to-speech/{}", self.voice_id))
            .headers(self.build_headers()?)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "xi-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
struct ApiSpeechRequest {
    text: String,
    model_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ElevenLabs::new("test-key");
        assert_eq!(client.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(client.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_client_with_voice() {
        let client = ElevenLabs::new("test-key").with_voice("custom-voice");
        assert_eq!(client.voice_id, "custom-voice");
    }

    #[test]
    fn test_speech_request_serialization() {
        let request = ApiSpeechRequest {
            text: "Once upon a time".to_string(),
            model_id: DEFAULT_MODEL.to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "Once upon a time");
        assert_eq!(json["model_id"], DEFAULT_MODEL);
    }
}
