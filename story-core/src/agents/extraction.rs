//! Story extraction agent - turns raw input into structured panel data.

use crate::memory::StoryMemory;
use crate::providers::ExtractionProvider;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);
const EXTRACTION_PROMPT: &str = include_str!("prompts/extraction.txt");

/// Fixed style template wrapped around every image prompt.
const IMAGE_STYLE_PREFIX: &str =
    "Children's book illustration, colorful, friendly, comic panel style";

/// Structured narrative data for one panel.
#[derive(Debug, Clone)]
pub struct StoryData {
    pub narration: String,
    pub image_prompt: String,
    pub theme: String,
}

/// Extracts narration, an image prompt, and a theme from the child's input.
///
/// The underlying model is asked for a JSON object; malformed or
/// non-structured responses degrade gracefully and never abort the turn.
pub struct StoryExtractor {
    provider: Arc<dyn ExtractionProvider>,
}

impl StoryExtractor {
    pub fn new(provider: Arc<dyn ExtractionProvider>) -> Self {
        Self { provider }
    }

    /// Build panel data for the latest input.
    ///
    /// On provider failure, timeout, or unparseable output the fallback is
    /// the verbatim user input as narration, a style-template wrap of the
    /// input as image prompt, and an empty theme.
    pub async fn extract(&self, user_text: &str, memory: &StoryMemory) -> StoryData {
        let user_message = format!(
            "Context: {}\n\nNew input: {}\n\nGenerate narration and a kid-friendly comic image prompt.",
            memory.context(),
            user_text
        );

        let raw = match timeout(
            EXTRACTION_TIMEOUT,
            self.provider.extract(EXTRACTION_PROMPT, &user_message),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "extraction provider failed, falling back to verbatim input");
                return fallback(user_text);
            }
            Err(_) => {
                warn!("extraction provider timed out, falling back to verbatim input");
                return fallback(user_text);
            }
        };

        match parse_extraction(&raw) {
            Some(parsed) => StoryData {
                narration: non_empty_or(parsed.narration, user_text),
                image_prompt: wrap_image_prompt(&non_empty_or(parsed.image_prompt, user_text)),
                theme: parsed.theme.unwrap_or_default(),
            },
            None => {
                warn!("extraction response was not valid JSON, falling back to verbatim input");
                fallback(user_text)
            }
        }
    }
}

fn fallback(user_text: &str) -> StoryData {
    StoryData {
        narration: user_text.to_string(),
        image_prompt: wrap_image_prompt(user_text),
        theme: String::new(),
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Wrap a scene description in the fixed illustration style template.
pub(crate) fn wrap_image_prompt(prompt: &str) -> String {
    format!("{IMAGE_STYLE_PREFIX}: {prompt}")
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    narration: Option<String>,
    #[serde(rename = "imagePrompt")]
    image_prompt: Option<String>,
    theme: Option<String>,
}

/// Parse the model's response as JSON, tolerating surrounding prose or
/// markdown code fences by trying the outermost brace-delimited slice.
fn parse_extraction(raw: &str) -> Option<RawExtraction> {
    if let Ok(parsed) = serde_json::from_str::<RawExtraction>(raw.trim()) {
        return Some(parsed);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<RawExtraction>(&raw[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExtraction;

    #[tokio::test]
    async fn test_extracts_structured_fields() {
        let extractor = StoryExtractor::new(Arc::new(MockExtraction::scripted(vec![
            r#"{"narration": "The dragon found a cupcake.", "imagePrompt": "a dragon with a cupcake", "theme": "discovery"}"#
                .to_string(),
        ])));
        let memory = StoryMemory::new("s1");

        let data = extractor.extract("dragon cupcake", &memory).await;
        assert_eq!(data.narration, "The dragon found a cupcake.");
        assert!(data.image_prompt.contains("a dragon with a cupcake"));
        assert!(data.image_prompt.starts_with(IMAGE_STYLE_PREFIX));
        assert_eq!(data.theme, "discovery");
    }

    #[tokio::test]
    async fn test_tolerates_fenced_json() {
        let extractor = StoryExtractor::new(Arc::new(MockExtraction::scripted(vec![
            "Here you go!\n```json\n{\"narration\": \"A castle rose.\", \"imagePrompt\": \"a castle\", \"theme\": \"wonder\"}\n```"
                .to_string(),
        ])));
        let memory = StoryMemory::new("s1");

        let data = extractor.extract("a castle", &memory).await;
        assert_eq!(data.narration, "A castle rose.");
        assert_eq!(data.theme, "wonder");
    }

    #[tokio::test]
    async fn test_non_json_falls_back_to_verbatim_input() {
        let extractor = StoryExtractor::new(Arc::new(MockExtraction::scripted(vec![
            "once upon a time there was no JSON here".to_string(),
        ])));
        let memory = StoryMemory::new("s1");

        let data = extractor.extract("a brave mouse", &memory).await;
        assert_eq!(data.narration, "a brave mouse");
        assert_eq!(data.image_prompt, wrap_image_prompt("a brave mouse"));
        assert_eq!(data.theme, "");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let extractor = StoryExtractor::new(Arc::new(MockExtraction::failing()));
        let memory = StoryMemory::new("s1");

        let data = extractor.extract("a brave mouse", &memory).await;
        assert_eq!(data.narration, "a brave mouse");
        assert_eq!(data.theme, "");
    }

    #[tokio::test]
    async fn test_missing_fields_use_input() {
        let extractor = StoryExtractor::new(Arc::new(MockExtraction::scripted(vec![
            r#"{"narration": "", "theme": "fun"}"#.to_string(),
        ])));
        let memory = StoryMemory::new("s1");

        let data = extractor.extract("a tiny robot", &memory).await;
        assert_eq!(data.narration, "a tiny robot");
        assert_eq!(data.image_prompt, wrap_image_prompt("a tiny robot"));
        assert_eq!(data.theme, "fun");
    }
}
