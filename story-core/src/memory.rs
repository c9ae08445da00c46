//! Story Memory - one session's accumulated narrative state.
//!
//! Holds the ordered panel history, the turn counter, and the cumulative
//! context string that serves as conversational memory for the agents.
//! Panels and counter only ever change together through [`StoryMemory::commit_turn`],
//! so `panels.len() == turn_count` holds structurally.

use serde::{Deserialize, Serialize};

/// One unit of the comic: narration, an image reference, and the input
/// that produced it. Immutable once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    /// Child-facing sentence describing what happened in this part of the story.
    pub narration: String,

    /// Remote URL or self-contained data URI for the rendered panel image.
    /// Opaque to the orchestrator; passed through to the renderer.
    pub image_ref: String,

    /// The raw (transcribed, if spoken) text that produced this panel.
    pub user_input: String,

    /// Short label summarizing the scene; empty when unknown. Used as a
    /// caption fallback by the renderer.
    pub theme: String,
}

/// Per-session narrative state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMemory {
    session_id: String,
    panels: Vec<Panel>,
    turn_count: usize,
    context: String,
}

impl StoryMemory {
    /// Create an empty memory for the given session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            panels: Vec::new(),
            turn_count: 0,
            context: String::new(),
        }
    }

    /// Commit one completed turn: append the panel, extend the context,
    /// and advance the turn counter as a single state transition.
    ///
    /// Returns the new turn count.
    pub fn commit_turn(&mut self, panel: Panel) -> usize {
        if !self.context.is_empty() {
            self.context.push('\n');
        }
        self.context
            .push_str(&format!("Panel {}: {}", self.turn_count + 1, panel.narration));
        self.panels.push(panel);
        self.turn_count += 1;
        self.turn_count
    }

    /// The full ordered panel sequence.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Number of completed turns.
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// The cumulative story context: `"Panel {i}: {narration}"` fragments
    /// in panel order, newline-separated. Grows without bound.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The owning session's identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Clear panels, counter, and context back to the initial empty state.
    /// The session identifier is preserved.
    pub fn reset(&mut self) {
        self.panels.clear();
        self.turn_count = 0;
        self.context.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(narration: &str) -> Panel {
        Panel {
            narration: narration.to_string(),
            image_ref: "https://example.com/img.png".to_string(),
            user_input: "input".to_string(),
            theme: String::new(),
        }
    }

    #[test]
    fn test_empty_memory() {
        let memory = StoryMemory::new("s1");
        assert_eq!(memory.turn_count(), 0);
        assert!(memory.panels().is_empty());
        assert!(memory.context().is_empty());
        assert_eq!(memory.session_id(), "s1");
    }

    #[test]
    fn test_commit_turn_keeps_counts_in_step() {
        let mut memory = StoryMemory::new("s1");

        for i in 1..=4 {
            let count = memory.commit_turn(panel(&format!("Event {i}")));
            assert_eq!(count, i);
            assert_eq!(memory.panels().len(), memory.turn_count());
        }
    }

    #[test]
    fn test_context_is_ordered_concatenation() {
        let mut memory = StoryMemory::new("s1");
        memory.commit_turn(panel("A dragon appears"));
        memory.commit_turn(panel("The dragon bakes cupcakes"));
        memory.commit_turn(panel("Everyone has a picnic"));

        assert_eq!(
            memory.context(),
            "Panel 1: A dragon appears\n\
             Panel 2: The dragon bakes cupcakes\n\
             Panel 3: Everyone has a picnic"
        );
    }

    #[test]
    fn test_reset_clears_state_preserves_id() {
        let mut memory = StoryMemory::new("s1");
        memory.commit_turn(panel("Something happened"));
        memory.reset();

        assert_eq!(memory.turn_count(), 0);
        assert!(memory.panels().is_empty());
        assert!(memory.context().is_empty());
        assert_eq!(memory.session_id(), "s1");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut memory = StoryMemory::new("s1");
        memory.commit_turn(panel("Something happened"));

        memory.reset();
        let after_once = memory.clone();
        memory.reset();

        assert_eq!(memory.turn_count(), after_once.turn_count());
        assert_eq!(memory.context(), after_once.context());
        assert_eq!(memory.panels().len(), after_once.panels().len());
    }
}
