//! StorySession - the primary public API for running a story.
//!
//! Wraps configuration, provider wiring, and the orchestrator into a
//! single high-level type the HTTP layer (or any other caller) drives.

use crate::agents::{ConversationAgent, PanelIllustrator, StoryExtractor};
use crate::memory::StoryMemory;
use crate::orchestrator::{
    OrchestratorError, SessionState, StoryOrchestrator, TurnInput, TurnResponse, DEFAULT_MAX_TURNS,
};
use crate::providers::{ClaudeChat, DallE, SpeechProvider, VoiceGateway};
use crate::render::StoryboardRenderer;
use claude::Claude;
use elevenlabs::ElevenLabs;
use openai::OpenAi;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Greeting shown when a session starts.
pub const GREETING: &str =
    "Hi there! 👋 Let's create an amazing comic together! What's your story about?";

const CONVERSATION_TEMPERATURE: f32 = 0.9;
const EXTRACTION_TEMPERATURE: f32 = 0.7;

/// Errors from StorySession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No API key configured - set {0}")]
    NoApiKey(&'static str),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Resolved provider credentials for one session.
///
/// Callers may supply per-session keys (the start-session request accepts
/// them); anything missing falls back to the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    /// Optional; without it sessions run text-only replies (no synthesized
    /// speech), transcription still works.
    pub elevenlabs_api_key: Option<String>,
}

impl Credentials {
    /// Load all credentials from the environment.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::resolve(None, None, None)
    }

    /// Merge caller-supplied keys with environment fallbacks.
    pub fn resolve(
        anthropic: Option<String>,
        openai: Option<String>,
        elevenlabs: Option<String>,
    ) -> Result<Self, SessionError> {
        let anthropic_api_key = anthropic
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or(SessionError::NoApiKey("ANTHROPIC_API_KEY"))?;
        let openai_api_key = openai
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(SessionError::NoApiKey("OPENAI_API_KEY"))?;
        let elevenlabs_api_key = elevenlabs
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok());

        Ok(Self {
            anthropic_api_key,
            openai_api_key,
            elevenlabs_api_key,
        })
    }
}

/// Configuration for creating a new story session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Turns before the story completes.
    pub max_turns: usize,

    /// Chat model override for both language agents.
    pub chat_model: Option<String>,

    /// ElevenLabs voice override.
    pub voice: Option<String>,

    /// Directory the rendered comic is written to.
    pub output_dir: PathBuf,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            chat_model: None,
            voice: None,
            output_dir: PathBuf::from("output"),
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One ongoing story-creation conversation with its own isolated memory.
pub struct StorySession {
    id: String,
    orchestrator: StoryOrchestrator,
}

impl StorySession {
    /// Create a session wired to the real providers.
    pub fn new(config: SessionConfig, credentials: Credentials) -> Self {
        let mut chat_client = Claude::new(&credentials.anthropic_api_key);
        if let Some(ref model) = config.chat_model {
            chat_client = chat_client.with_model(model);
        }
        let openai_client = OpenAi::new(&credentials.openai_api_key);

        let tts = credentials.elevenlabs_api_key.as_ref().map(|key| {
            let mut client = ElevenLabs::new(key);
            if let Some(ref voice) = config.voice {
                client = client.with_voice(voice);
            }
            client
        });
        let speech: Arc<dyn SpeechProvider> =
            Arc::new(VoiceGateway::new(openai_client.clone(), tts));

        let conversation = ConversationAgent::new(Arc::new(ClaudeChat::new(
            chat_client.clone(),
            CONVERSATION_TEMPERATURE,
        )))
        .with_speech(Arc::clone(&speech));
        let extractor = StoryExtractor::new(Arc::new(ClaudeChat::new(
            chat_client,
            EXTRACTION_TEMPERATURE,
        )));
        let illustrator = PanelIllustrator::new(Arc::new(DallE::new(openai_client)));
        let renderer = Box::new(StoryboardRenderer::new(config.output_dir));

        let id = Uuid::new_v4().to_string();
        let orchestrator =
            StoryOrchestrator::new(&id, conversation, extractor, illustrator, renderer)
                .with_speech(speech)
                .with_max_turns(config.max_turns);

        Self { id, orchestrator }
    }

    /// Create a session using environment credentials.
    pub fn from_env(config: SessionConfig) -> Result<Self, SessionError> {
        Ok(Self::new(config, Credentials::from_env()?))
    }

    /// Wrap a pre-built orchestrator (used by tests and embedders).
    pub fn with_orchestrator(id: impl Into<String>, orchestrator: StoryOrchestrator) -> Self {
        Self {
            id: id.into(),
            orchestrator,
        }
    }

    /// The opaque session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Process one user turn.
    pub async fn submit(&mut self, input: TurnInput) -> Result<TurnResponse, SessionError> {
        Ok(self.orchestrator.handle_turn(input).await?)
    }

    /// The session's story memory.
    pub fn memory(&self) -> &StoryMemory {
        self.orchestrator.memory()
    }

    /// The session's current state.
    pub fn state(&self) -> SessionState {
        self.orchestrator.state()
    }

    /// Reset the session back to an empty active state.
    pub fn reset(&mut self) {
        self.orchestrator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new()
            .with_max_turns(3)
            .with_chat_model("claude-3-haiku")
            .with_output_dir("/tmp/comics");

        assert_eq!(config.max_turns, 3);
        assert_eq!(config.chat_model.as_deref(), Some("claude-3-haiku"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/comics"));
    }

    #[test]
    fn test_credentials_prefer_supplied_keys() {
        let credentials = Credentials::resolve(
            Some("anthropic-key".to_string()),
            Some("openai-key".to_string()),
            Some("eleven-key".to_string()),
        )
        .unwrap();

        assert_eq!(credentials.anthropic_api_key, "anthropic-key");
        assert_eq!(credentials.openai_api_key, "openai-key");
        assert_eq!(credentials.elevenlabs_api_key.as_deref(), Some("eleven-key"));
    }

    #[test]
    fn test_credentials_ignore_empty_strings() {
        // Empty strings from a request body must not shadow real keys.
        let result = Credentials::resolve(
            Some(String::new()),
            Some("openai-key".to_string()),
            Some(String::new()),
        );

        // Without an environment fallback the missing Anthropic key is an error.
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            assert!(matches!(result, Err(SessionError::NoApiKey(_))));
        }
    }
}
