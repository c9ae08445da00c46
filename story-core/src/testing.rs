//! Testing utilities for the story engine.
//!
//! Provides scripted mock providers, a [`TestHarness`] for running turn
//! scenarios without network calls, and assertion helpers for verifying
//! the memory invariants.

use crate::agents::{ConversationAgent, PanelIllustrator, StoryExtractor};
use crate::memory::Panel;
use crate::orchestrator::{StoryOrchestrator, TurnInput, TurnResponse};
use crate::providers::{
    ConversationProvider, ExtractionProvider, ImageProvider, ProviderError, SpeechProvider,
};
use crate::render::{DocumentRenderer, RenderError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Default reply returned once scripted replies run out.
pub const DEFAULT_MOCK_REPLY: &str = "That's wonderful! What happens next?";

/// Default extraction payload returned once scripted payloads run out.
pub const DEFAULT_MOCK_EXTRACTION: &str =
    r#"{"narration": "The story continued.", "imagePrompt": "the story continuing", "theme": "adventure"}"#;

// ============================================================================
// Mock providers
// ============================================================================

/// Scripted conversation provider.
pub struct MockConversation {
    replies: Mutex<VecDeque<String>>,
    fail: bool,
}

impl MockConversation {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fail: true,
        }
    }

    /// Queue a reply to return on a later call.
    pub fn queue(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("mock lock poisoned")
            .push_back(reply.into());
    }
}

impl Default for MockConversation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationProvider for MockConversation {
    async fn reply(&self, _system: &str, _user_message: &str) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Other("scripted conversation failure".into()));
        }
        Ok(self
            .replies
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| DEFAULT_MOCK_REPLY.to_string()))
    }
}

/// Scripted extraction provider returning raw (possibly invalid) payloads.
pub struct MockExtraction {
    payloads: Mutex<VecDeque<String>>,
    fail: bool,
}

impl MockExtraction {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(payloads: Vec<String>) -> Self {
        Self {
            payloads: Mutex::new(payloads.into()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            payloads: Mutex::new(VecDeque::new()),
            fail: true,
        }
    }

    /// Queue a raw payload to return on a later call.
    pub fn queue(&self, payload: impl Into<String>) {
        self.payloads
            .lock()
            .expect("mock lock poisoned")
            .push_back(payload.into());
    }
}

impl Default for MockExtraction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionProvider for MockExtraction {
    async fn extract(&self, _system: &str, _user_message: &str) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Other("scripted extraction failure".into()));
        }
        Ok(self
            .payloads
            .lock()
            .expect("mock lock poisoned")
            .pop_front()
            .unwrap_or_else(|| DEFAULT_MOCK_EXTRACTION.to_string()))
    }
}

/// Image provider returning numbered fake URLs, or always failing.
pub struct MockImage {
    counter: AtomicUsize,
    fail: bool,
}

impl MockImage {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            counter: AtomicUsize::new(0),
            fail: true,
        }
    }
}

impl Default for MockImage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for MockImage {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Other("scripted image failure".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://images.test/panel-{n}.png"))
    }
}

/// Speech provider with a fixed transcript and canned audio bytes.
pub struct MockSpeech {
    transcript: String,
    fail_transcription: bool,
    fail_synthesis: bool,
}

impl MockSpeech {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            fail_transcription: false,
            fail_synthesis: false,
        }
    }

    pub fn failing_transcription(mut self) -> Self {
        self.fail_transcription = true;
        self
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String, ProviderError> {
        if self.fail_transcription {
            return Err(ProviderError::Other("scripted transcription failure".into()));
        }
        Ok(self.transcript.clone())
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, ProviderError> {
        if self.fail_synthesis {
            return Err(ProviderError::Other("scripted synthesis failure".into()));
        }
        Ok(vec![0x1d, 0x2e, 0x3f])
    }
}

/// Renderer that records how many panels each render call received.
pub struct MockRenderer {
    calls: Arc<Mutex<Vec<usize>>>,
    fail: bool,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Shared handle to the per-call panel counts.
    pub fn call_log(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRenderer for MockRenderer {
    async fn render(&self, panels: &[Panel]) -> Result<String, RenderError> {
        if self.fail {
            return Err(RenderError::Io(std::io::Error::other(
                "scripted renderer failure",
            )));
        }
        let mut calls = self.calls.lock().expect("mock lock poisoned");
        calls.push(panels.len());
        Ok(format!("memory://comic-{}.html", calls.len()))
    }
}

// ============================================================================
// Test harness
// ============================================================================

/// Harness wiring an orchestrator to scripted mocks for turn scenarios.
pub struct TestHarness {
    /// The orchestrator under test.
    pub orchestrator: StoryOrchestrator,
    conversation: Arc<MockConversation>,
    extraction: Arc<MockExtraction>,
    renderer_calls: Arc<Mutex<Vec<usize>>>,
}

impl TestHarness {
    /// Happy-path harness: working mocks, transcripts of "a story idea".
    pub fn new() -> Self {
        Self::build(MockImage::new(), MockSpeech::new("a story idea"))
    }

    /// Harness whose image provider always fails.
    pub fn with_failing_images() -> Self {
        Self::build(MockImage::failing(), MockSpeech::new("a story idea"))
    }

    /// Harness whose speech provider transcribes to the given text.
    pub fn with_transcript(transcript: impl Into<String>) -> Self {
        Self::build(MockImage::new(), MockSpeech::new(transcript))
    }

    /// Harness whose speech provider fails to transcribe.
    pub fn with_failing_transcription() -> Self {
        Self::build(
            MockImage::new(),
            MockSpeech::new("unused").failing_transcription(),
        )
    }

    /// Harness whose conversation provider always fails.
    pub fn with_failing_conversation() -> Self {
        let extraction = Arc::new(MockExtraction::new());
        let speech: Arc<dyn SpeechProvider> = Arc::new(MockSpeech::new("a story idea"));
        let renderer = MockRenderer::new();
        let renderer_calls = renderer.call_log();

        let orchestrator = StoryOrchestrator::new(
            "test-session",
            ConversationAgent::new(Arc::new(MockConversation::failing())),
            StoryExtractor::new(Arc::clone(&extraction) as Arc<dyn ExtractionProvider>),
            PanelIllustrator::new(Arc::new(MockImage::new())),
            Box::new(renderer),
        )
        .with_speech(speech);

        Self {
            orchestrator,
            conversation: Arc::new(MockConversation::new()),
            extraction,
            renderer_calls,
        }
    }

    /// Harness whose renderer always fails.
    pub fn with_failing_renderer() -> Self {
        let mut harness = Self::new();
        let conversation = Arc::clone(&harness.conversation);
        let extraction = Arc::clone(&harness.extraction);
        let speech: Arc<dyn SpeechProvider> = Arc::new(MockSpeech::new("a story idea"));

        harness.orchestrator = StoryOrchestrator::new(
            "test-session",
            ConversationAgent::new(conversation as Arc<dyn ConversationProvider>),
            StoryExtractor::new(extraction as Arc<dyn ExtractionProvider>),
            PanelIllustrator::new(Arc::new(MockImage::new())),
            Box::new(MockRenderer::failing()),
        )
        .with_speech(speech);
        harness
    }

    fn build(image: MockImage, speech: MockSpeech) -> Self {
        let conversation = Arc::new(MockConversation::new());
        let extraction = Arc::new(MockExtraction::new());
        let speech: Arc<dyn SpeechProvider> = Arc::new(speech);
        let renderer = MockRenderer::new();
        let renderer_calls = renderer.call_log();

        let orchestrator = StoryOrchestrator::new(
            "test-session",
            ConversationAgent::new(Arc::clone(&conversation) as Arc<dyn ConversationProvider>)
                .with_speech(Arc::clone(&speech)),
            StoryExtractor::new(Arc::clone(&extraction) as Arc<dyn ExtractionProvider>),
            PanelIllustrator::new(Arc::new(image)),
            Box::new(renderer),
        )
        .with_speech(speech);

        Self {
            orchestrator,
            conversation,
            extraction,
            renderer_calls,
        }
    }

    /// Override the completion turn count.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.orchestrator = self.orchestrator.with_max_turns(max_turns);
        self
    }

    /// Queue a scripted conversational reply.
    pub fn expect_reply(&self, reply: impl Into<String>) {
        self.conversation.queue(reply);
    }

    /// Queue a scripted raw extraction payload.
    pub fn expect_extraction(&self, payload: impl Into<String>) {
        self.extraction.queue(payload);
    }

    /// Submit a text turn.
    pub async fn input(&mut self, text: &str) -> TurnResponse {
        self.orchestrator
            .handle_turn(TurnInput::Text(text.to_string()))
            .await
            .expect("turn failed")
    }

    /// Submit an audio turn.
    pub async fn input_audio(&mut self, audio: Vec<u8>) -> TurnResponse {
        self.orchestrator
            .handle_turn(TurnInput::Audio(audio))
            .await
            .expect("turn failed")
    }

    /// Panel counts seen by the renderer, one entry per render call.
    pub fn rendered_panel_counts(&self) -> Vec<usize> {
        self.renderer_calls
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert the memory invariants: panel count matches the turn counter and
/// the context is the ordered concatenation of panel fragments.
#[track_caller]
pub fn assert_memory_invariants(harness: &TestHarness) {
    let memory = harness.orchestrator.memory();
    assert_eq!(
        memory.panels().len(),
        memory.turn_count(),
        "panels.len() must equal turn_count"
    );

    let expected = memory
        .panels()
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Panel {}: {}", i + 1, p.narration))
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(
        memory.context(),
        expected,
        "context must be the ordered concatenation of panel fragments"
    );
}

/// Assert the session has committed exactly `count` panels.
#[track_caller]
pub fn assert_panel_count(harness: &TestHarness, count: usize) {
    assert_eq!(
        harness.orchestrator.memory().panels().len(),
        count,
        "unexpected panel count"
    );
}
