//! The per-turn storytelling agents.
//!
//! Three agents sit between the orchestrator and the providers:
//! - [`ConversationAgent`] - short encouraging reply, optionally spoken
//! - [`StoryExtractor`] - structured narration/image-prompt/theme data
//! - [`PanelIllustrator`] - rendered panel image reference
//!
//! Every agent recovers provider failures locally with a documented fallback;
//! a broken service degrades the turn, it never aborts it.

mod conversation;
mod extraction;
mod illustrator;

pub use conversation::{ChatReply, ConversationAgent, FALLBACK_REPLY};
pub use extraction::{StoryData, StoryExtractor};
pub use illustrator::{PanelIllustrator, PLACEHOLDER_IMAGE};
