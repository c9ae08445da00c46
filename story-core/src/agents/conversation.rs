//! Conversation agent - the encouraging voice the child talks to.

use crate::memory::StoryMemory;
use crate::providers::{ConversationProvider, SpeechProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Reply used when the chat model itself fails; the child-facing turn must
/// never break mid-story.
pub const FALLBACK_REPLY: &str = "Wow, I love it! What happens next in your story?";

const CHAT_TIMEOUT: Duration = Duration::from_secs(30);
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

const FIRST_TURN_PROMPT: &str = include_str!("prompts/conversation_first.txt");
const NEXT_TURN_PROMPT: &str = include_str!("prompts/conversation_next.txt");

/// A conversational reply, optionally with synthesized speech.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub audio: Option<Vec<u8>>,
}

/// Turns the child's input into a short, encouraging reply.
pub struct ConversationAgent {
    provider: Arc<dyn ConversationProvider>,
    speech: Option<Arc<dyn SpeechProvider>>,
}

impl ConversationAgent {
    pub fn new(provider: Arc<dyn ConversationProvider>) -> Self {
        Self {
            provider,
            speech: None,
        }
    }

    /// Enable spoken replies through the given speech provider.
    pub fn with_speech(mut self, speech: Arc<dyn SpeechProvider>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Produce a reply for the child's latest input.
    ///
    /// The prompt framing differs only by whether this is the first turn.
    /// Chat failure falls back to [`FALLBACK_REPLY`]; synthesis failure
    /// drops the audio and keeps the text.
    pub async fn chat(&self, user_text: &str, memory: &StoryMemory) -> ChatReply {
        let system = if memory.turn_count() == 0 {
            FIRST_TURN_PROMPT
        } else {
            NEXT_TURN_PROMPT
        };

        let user_message = format!(
            "Context: {}\n\nKid says: {}",
            memory.context(),
            user_text
        );

        let text = match timeout(CHAT_TIMEOUT, self.provider.reply(system, &user_message)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("conversation provider returned empty reply, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Ok(Err(e)) => {
                warn!(error = %e, "conversation provider failed, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                warn!("conversation provider timed out, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        };

        let audio = match &self.speech {
            Some(speech) => match timeout(SYNTHESIS_TIMEOUT, speech.synthesize(&text)).await {
                Ok(Ok(bytes)) if !bytes.is_empty() => Some(bytes),
                Ok(Ok(_)) => None,
                Ok(Err(e)) => {
                    warn!(error = %e, "speech synthesis failed, continuing without audio");
                    None
                }
                Err(_) => {
                    warn!("speech synthesis timed out, continuing without audio");
                    None
                }
            },
            None => None,
        };

        ChatReply { text, audio }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConversation, MockSpeech};

    #[tokio::test]
    async fn test_chat_returns_provider_reply() {
        let agent = ConversationAgent::new(Arc::new(MockConversation::scripted(vec![
            "That sounds amazing!".to_string(),
        ])));
        let memory = StoryMemory::new("s1");

        let reply = agent.chat("a dragon", &memory).await;
        assert_eq!(reply.text, "That sounds amazing!");
        assert!(reply.audio.is_none());
    }

    #[tokio::test]
    async fn test_chat_failure_uses_fallback() {
        let agent = ConversationAgent::new(Arc::new(MockConversation::failing()));
        let memory = StoryMemory::new("s1");

        let reply = agent.chat("a dragon", &memory).await;
        assert_eq!(reply.text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_text() {
        let agent = ConversationAgent::new(Arc::new(MockConversation::scripted(vec![
            "Tell me more!".to_string(),
        ])))
        .with_speech(Arc::new(MockSpeech::new("ignored").failing_synthesis()));
        let memory = StoryMemory::new("s1");

        let reply = agent.chat("a dragon", &memory).await;
        assert_eq!(reply.text, "Tell me more!");
        assert!(reply.audio.is_none());
    }

    #[tokio::test]
    async fn test_synthesis_success_attaches_audio() {
        let agent = ConversationAgent::new(Arc::new(MockConversation::scripted(vec![
            "Tell me more!".to_string(),
        ])))
        .with_speech(Arc::new(MockSpeech::new("ignored")));
        let memory = StoryMemory::new("s1");

        let reply = agent.chat("a dragon", &memory).await;
        assert!(reply.audio.is_some());
    }
}
