//! Minimal OpenAI API client.
//!
//! Covers the two endpoints the story engine consumes:
//! - Image generation (`/v1/images/generations`, DALL-E)
//! - Audio transcription (`/v1/audio/transcriptions`, Whisper)

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Errors that can occur when using the OpenAI client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Response contained no image data")]
    NoImage,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    image_model: String,
    transcription_model: String,
}

impl OpenAi {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }

    /// Create an OpenAI client from the OPENAI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the image model for this client.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Set the transcription model for this client.
    pub fn with_transcription_model(mut self, model: impl Into<String>) -> Self {
        self.transcription_model = model.into();
        self
    }

    /// Generate a single image and return a reference to it.
    ///
    /// The reference is either a hosted URL or a self-contained data URI,
    /// depending on which form the API returns.
    pub async fn generate_image(&self, request: ImageRequest) -> Result<ImageRef, Error> {
        let api_request = ApiImageRequest {
            model: self.image_model.clone(),
            prompt: request.prompt,
            n: 1,
            size: request.size,
            quality: request.quality,
        };

        let response = self
            .client
            .post(format!("{API_BASE}/images/generations"))
            .headers(self.build_headers()?)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiImageResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let image = api_response.data.into_iter().next().ok_or(Error::NoImage)?;
        match (image.url, image.b64_json) {
            (Some(url), _) => Ok(ImageRef::Url(url)),
            (None, Some(b64)) => Ok(ImageRef::DataUri(format!("data:image/png;base64,{b64}"))),
            (None, None) => Err(Error::NoImage),
        }
    }

    /// Transcribe recorded audio to text.
    ///
    /// `audio` is the raw bytes of a recorded clip; `filename` tells the API
    /// which container format to expect (e.g. "speech.webm").
    pub async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, Error> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| Error::Config(format!("Invalid audio part: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{API_BASE}/audio/transcriptions"))
            .headers(self.build_headers()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiTranscription = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(api_response.text)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// An image generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: String,
    pub quality: String,
}

impl ImageRequest {
    /// Create a request with the default 1024x1024 standard-quality settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }
}

/// A reference to a generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A hosted URL (typically short-lived).
    Url(String),
    /// A self-contained `data:image/...` URI.
    DataUri(String),
}

impl ImageRef {
    /// The reference as a plain string, whichever form it takes.
    pub fn as_str(&self) -> &str {
        match self {
            ImageRef::Url(s) | ImageRef::DataUri(s) => s,
        }
    }
}

impl From<ImageRef> for String {
    fn from(image_ref: ImageRef) -> Self {
        match image_ref {
            ImageRef::Url(s) | ImageRef::DataUri(s) => s,
        }
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiImageRequest {
    model: String,
    prompt: String,
    n: u8,
    size: String,
    quality: String,
}

#[derive(Debug, Deserialize)]
struct ApiImageResponse {
    data: Vec<ApiImageData>,
}

#[derive(Debug, Deserialize)]
struct ApiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTranscription {
    text: String,
}
