//! Session orchestrator - the per-turn state machine.
//!
//! Sequences one user turn through transcription, the conversation and
//! extraction agents, and the illustrator, then commits the resulting panel
//! to story memory. Owns the turn-count completion policy and hands the
//! finished panel list to the document renderer.

use crate::agents::{ConversationAgent, PanelIllustrator, StoryExtractor};
use crate::memory::{Panel, StoryMemory};
use crate::providers::SpeechProvider;
use crate::render::{DocumentRenderer, RenderError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

/// Default number of turns before the story completes.
pub const DEFAULT_MAX_TURNS: usize = 5;

const TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal reply once the comic has been rendered.
const STORY_READY_MESSAGE: &str = "🎉 Your amazing comic is ready!";

/// User-facing prompt after a failed or empty transcription. The turn is
/// aborted without touching story memory.
pub const RETRY_PROMPT: &str = "I couldn't quite hear that - can you say it again?";

/// Errors from the orchestrator.
///
/// Per-agent failures are recovered locally with fallback values; rendering
/// during finalize is the one path where failure propagates, since there is
/// no sensible placeholder for the finished comic.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// The orchestrator's two states. Completion is reached strictly by turn
/// count; only an explicit reset returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Complete,
}

/// One turn's worth of user input.
#[derive(Debug, Clone)]
pub enum TurnInput {
    /// Typed text.
    Text(String),
    /// A recorded audio clip, to be transcribed first.
    Audio(Vec<u8>),
}

/// The per-turn result returned to the caller.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    /// The conversational reply to show (and speak) to the child.
    pub reply_text: String,

    /// Synthesized speech for the reply, when available.
    pub reply_audio: Option<Vec<u8>>,

    /// The committed panel's image reference; `None` on retry or completion.
    pub image_ref: Option<String>,

    /// The committed panel's theme label; `None` on retry or completion.
    pub theme: Option<String>,

    /// Whether the story is complete.
    pub is_done: bool,

    /// Reference to the rendered artifact, present only when `is_done`.
    pub final_artifact: Option<String>,
}

/// The session state machine tying the agents together per user turn.
pub struct StoryOrchestrator {
    memory: StoryMemory,
    conversation: ConversationAgent,
    extractor: StoryExtractor,
    illustrator: PanelIllustrator,
    speech: Option<Arc<dyn SpeechProvider>>,
    renderer: Box<dyn DocumentRenderer>,
    max_turns: usize,
}

impl StoryOrchestrator {
    pub fn new(
        session_id: impl Into<String>,
        conversation: ConversationAgent,
        extractor: StoryExtractor,
        illustrator: PanelIllustrator,
        renderer: Box<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            memory: StoryMemory::new(session_id),
            conversation,
            extractor,
            illustrator,
            speech: None,
            renderer,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Enable audio input transcription through the given speech provider.
    pub fn with_speech(mut self, speech: Arc<dyn SpeechProvider>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Override the completion turn count.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// The current state, derived from the turn counter.
    pub fn state(&self) -> SessionState {
        if self.memory.turn_count() >= self.max_turns {
            SessionState::Complete
        } else {
            SessionState::Active
        }
    }

    /// The session's story memory.
    pub fn memory(&self) -> &StoryMemory {
        &self.memory
    }

    /// Process one user turn.
    ///
    /// In the `Complete` state this skips all agent calls, re-renders the
    /// comic, and returns a terminal response. Otherwise it runs the
    /// conversation and extraction agents concurrently, illustrates the
    /// extracted prompt, and commits exactly one panel. A failed or empty
    /// transcription aborts the turn with [`RETRY_PROMPT`] and no state
    /// change.
    pub async fn handle_turn(
        &mut self,
        input: TurnInput,
    ) -> Result<TurnResponse, OrchestratorError> {
        if self.state() == SessionState::Complete {
            let artifact = self.finalize().await?;
            return Ok(TurnResponse {
                reply_text: STORY_READY_MESSAGE.to_string(),
                reply_audio: None,
                image_ref: None,
                theme: None,
                is_done: true,
                final_artifact: Some(artifact),
            });
        }

        let user_text = match input {
            TurnInput::Text(text) => text,
            TurnInput::Audio(audio) => match self.transcribe(audio).await {
                Some(text) => text,
                None => {
                    return Ok(TurnResponse {
                        reply_text: RETRY_PROMPT.to_string(),
                        reply_audio: None,
                        image_ref: None,
                        theme: None,
                        is_done: false,
                        final_artifact: None,
                    });
                }
            },
        };

        // No data dependency between the reply and the extraction; run both
        // at once to cut turn latency.
        let (reply, story) = tokio::join!(
            self.conversation.chat(&user_text, &self.memory),
            self.extractor.extract(&user_text, &self.memory),
        );

        let image_ref = self.illustrator.illustrate(&story.image_prompt).await;

        let panel = Panel {
            narration: story.narration,
            image_ref: image_ref.clone(),
            user_input: user_text,
            theme: story.theme.clone(),
        };
        let turn = self.memory.commit_turn(panel);
        info!(
            session = self.memory.session_id(),
            turn,
            "panel committed"
        );

        Ok(TurnResponse {
            reply_text: reply.text,
            reply_audio: reply.audio,
            image_ref: Some(image_ref),
            theme: Some(story.theme),
            is_done: false,
            final_artifact: None,
        })
    }

    /// Render the accumulated panels into the final artifact.
    ///
    /// Called automatically once the turn limit is reached; each call
    /// re-renders and may produce a new artifact instance.
    pub async fn finalize(&self) -> Result<String, OrchestratorError> {
        let artifact = self.renderer.render(self.memory.panels()).await?;
        info!(
            session = self.memory.session_id(),
            panels = self.memory.panels().len(),
            artifact = %artifact,
            "story finalized"
        );
        Ok(artifact)
    }

    /// Reset the session back to an empty `Active` state.
    pub fn reset(&mut self) {
        self.memory.reset();
    }

    async fn transcribe(&self, audio: Vec<u8>) -> Option<String> {
        let speech = match &self.speech {
            Some(speech) => speech,
            None => {
                warn!("audio input received but no speech provider is configured");
                return None;
            }
        };

        match timeout(TRANSCRIPTION_TIMEOUT, speech.transcribe(audio)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                warn!("transcription yielded empty text, asking the child to repeat");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "transcription failed, asking the child to repeat");
                None
            }
            Err(_) => {
                warn!("transcription timed out, asking the child to repeat");
                None
            }
        }
    }
}
