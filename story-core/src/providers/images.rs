//! DALL-E image generation adapter.

use super::{ImageProvider, ProviderError};
use async_trait::async_trait;
use openai::{ImageRequest, OpenAi};

/// OpenAI DALL-E adapter producing 1024x1024 panel images.
#[derive(Clone)]
pub struct DallE {
    client: OpenAi,
}

impl DallE {
    pub fn new(client: OpenAi) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageProvider for DallE {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let image_ref = self.client.generate_image(ImageRequest::new(prompt)).await?;
        Ok(image_ref.into())
    }
}
