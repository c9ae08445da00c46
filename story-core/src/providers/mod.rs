//! Capability interfaces for the external AI services.
//!
//! Each agent depends on a narrow trait rather than a concrete SDK, with one
//! adapter per external service selected at construction time. All calls are
//! opaque request/response contracts; retry, fallback, and timeout policy
//! live in the agents, not here.

mod anthropic;
mod images;
mod voice;

pub use anthropic::ClaudeChat;
pub use images::DallE;
pub use voice::VoiceGateway;

use async_trait::async_trait;
use thiserror::Error;

/// Errors crossing a provider boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Anthropic error: {0}")]
    Anthropic(#[from] claude::Error),

    #[error("OpenAI error: {0}")]
    OpenAi(#[from] openai::Error),

    #[error("ElevenLabs error: {0}")]
    ElevenLabs(#[from] elevenlabs::Error),

    #[error("Provider call failed: {0}")]
    Other(String),
}

/// Produces a short conversational reply to the child.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    async fn reply(&self, system: &str, user_message: &str) -> Result<String, ProviderError>;
}

/// Produces raw structured-extraction output (intended as JSON) for a turn.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn extract(&self, system: &str, user_message: &str) -> Result<String, ProviderError>;
}

/// Renders a panel image for a prompt, returning a URL or data URI.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Speech-to-text and text-to-speech for voice turns.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Transcribe a recorded audio clip to text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, ProviderError>;

    /// Synthesize spoken audio (encoded bytes) for a reply.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ProviderError>;
}
