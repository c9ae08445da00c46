//! Claude-backed conversation and extraction adapters.

use super::{ConversationProvider, ExtractionProvider, ProviderError};
use async_trait::async_trait;
use claude::{Claude, Message, Request};

/// A Claude chat completion adapter.
///
/// The same adapter type backs both conversation and extraction; the two
/// agents construct separate instances with their own temperatures.
#[derive(Clone)]
pub struct ClaudeChat {
    client: Claude,
    temperature: f32,
    max_tokens: usize,
}

impl ClaudeChat {
    pub fn new(client: Claude, temperature: f32) -> Self {
        Self {
            client,
            temperature,
            max_tokens: 1024,
        }
    }

    async fn complete(&self, system: &str, user_message: &str) -> Result<String, ProviderError> {
        let request = Request::new(vec![Message::user(user_message)])
            .with_system(system)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        let response = self.client.complete(request).await?;
        Ok(response.text)
    }
}

#[async_trait]
impl ConversationProvider for ClaudeChat {
    async fn reply(&self, system: &str, user_message: &str) -> Result<String, ProviderError> {
        self.complete(system, user_message).await
    }
}

#[async_trait]
impl ExtractionProvider for ClaudeChat {
    async fn extract(&self, system: &str, user_message: &str) -> Result<String, ProviderError> {
        self.complete(system, user_message).await
    }
}
