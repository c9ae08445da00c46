//! Panel illustrator agent - one image per committed panel.

use crate::providers::ImageProvider;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Well-known reference substituted when image generation fails. A broken
/// image must never block story progression.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/1024x1024?text=Comic+Panel";

const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns extracted image prompts into rendered panel references.
pub struct PanelIllustrator {
    provider: Arc<dyn ImageProvider>,
}

impl PanelIllustrator {
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self { provider }
    }

    /// Generate an image for the prompt.
    ///
    /// Any provider failure or timeout yields [`PLACEHOLDER_IMAGE`].
    pub async fn illustrate(&self, prompt: &str) -> String {
        match timeout(IMAGE_TIMEOUT, self.provider.generate(prompt)).await {
            Ok(Ok(image_ref)) if !image_ref.is_empty() => image_ref,
            Ok(Ok(_)) => {
                warn!("image provider returned empty reference, using placeholder");
                PLACEHOLDER_IMAGE.to_string()
            }
            Ok(Err(e)) => {
                warn!(error = %e, "image generation failed, using placeholder");
                PLACEHOLDER_IMAGE.to_string()
            }
            Err(_) => {
                warn!("image generation timed out, using placeholder");
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }

    /// Generate images for several prompts as independent parallel calls.
    /// Results are in prompt order; there is no shared state between them.
    pub async fn illustrate_many(&self, prompts: &[String]) -> Vec<String> {
        join_all(prompts.iter().map(|p| self.illustrate(p))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockImage;

    #[tokio::test]
    async fn test_illustrate_returns_reference() {
        let illustrator = PanelIllustrator::new(Arc::new(MockImage::new()));
        let image_ref = illustrator.illustrate("a dragon").await;
        assert!(image_ref.starts_with("https://"));
        assert_ne!(image_ref, PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_failure_yields_placeholder() {
        let illustrator = PanelIllustrator::new(Arc::new(MockImage::failing()));
        let image_ref = illustrator.illustrate("a dragon").await;
        assert_eq!(image_ref, PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_illustrate_many_preserves_order() {
        let illustrator = PanelIllustrator::new(Arc::new(MockImage::new()));
        let prompts = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let refs = illustrator.illustrate_many(&prompts).await;
        assert_eq!(refs.len(), 3);
    }
}
