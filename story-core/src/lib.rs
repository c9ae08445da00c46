//! Collaborative kids' comic engine.
//!
//! A child co-authors a short illustrated story through voice or text turns
//! with an AI partner, producing a paginated comic. This crate provides:
//! - Story memory and the per-turn orchestration state machine
//! - Conversation, extraction, and illustration agents with graceful
//!   degradation on provider failure
//! - Capability provider traits with Claude / DALL-E / Whisper / ElevenLabs
//!   adapters
//! - Document rendering of the finished panel list
//! - A session registry for the HTTP layer
//!
//! # Quick Start
//!
//! ```ignore
//! use story_core::{SessionConfig, StorySession, TurnInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = StorySession::from_env(SessionConfig::new())?;
//!
//!     let response = session
//!         .submit(TurnInput::Text("a dragon who loves cupcakes".into()))
//!         .await?;
//!     println!("{}", response.reply_text);
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod memory;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod render;
pub mod session;
pub mod testing;

// Primary public API
pub use memory::{Panel, StoryMemory};
pub use orchestrator::{
    OrchestratorError, SessionState, StoryOrchestrator, TurnInput, TurnResponse,
    DEFAULT_MAX_TURNS, RETRY_PROMPT,
};
pub use registry::{SessionHandle, SessionRegistry};
pub use render::{DocumentRenderer, RenderError, StoryboardRenderer};
pub use session::{Credentials, SessionConfig, SessionError, StorySession, GREETING};
pub use testing::TestHarness;
