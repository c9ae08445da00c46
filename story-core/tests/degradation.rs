//! Graceful-degradation scenarios: broken providers must degrade the turn,
//! never abort it.

use story_core::agents::{FALLBACK_REPLY, PLACEHOLDER_IMAGE};
use story_core::testing::{assert_memory_invariants, TestHarness};

#[tokio::test]
async fn image_failure_substitutes_placeholder() {
    let mut harness = TestHarness::with_failing_images();
    harness.expect_extraction(
        r#"{"narration": "A rocket zoomed past the moon.", "imagePrompt": "rocket past moon", "theme": "space"}"#,
    );

    let response = harness.input("a rocket goes to the moon").await;

    assert!(!response.is_done);
    assert_eq!(response.image_ref.as_deref(), Some(PLACEHOLDER_IMAGE));

    // The panel was still committed, with the placeholder reference.
    let memory = harness.orchestrator.memory();
    assert_eq!(memory.turn_count(), 1);
    assert_eq!(memory.panels()[0].image_ref, PLACEHOLDER_IMAGE);
    assert_eq!(memory.panels()[0].narration, "A rocket zoomed past the moon.");
    assert_memory_invariants(&harness);
}

#[tokio::test]
async fn non_json_extraction_falls_back_to_verbatim_input() {
    let mut harness = TestHarness::new();
    harness.expect_extraction("sure! here's a fun story about a mouse...");

    let response = harness.input("a brave little mouse").await;

    assert!(!response.is_done);
    assert_eq!(response.theme.as_deref(), Some(""));

    let panel = &harness.orchestrator.memory().panels()[0];
    assert_eq!(panel.narration, "a brave little mouse");
    assert_eq!(panel.theme, "");
    assert_memory_invariants(&harness);
}

#[tokio::test]
async fn conversation_failure_still_completes_turn() {
    let mut harness = TestHarness::with_failing_conversation();
    harness.expect_extraction(
        r#"{"narration": "The mouse found a sword.", "imagePrompt": "mouse with sword", "theme": "courage"}"#,
    );

    let response = harness.input("the mouse finds a sword").await;

    assert_eq!(response.reply_text, FALLBACK_REPLY);
    assert_eq!(harness.orchestrator.memory().turn_count(), 1);
    assert_eq!(
        harness.orchestrator.memory().panels()[0].narration,
        "The mouse found a sword."
    );
}

#[tokio::test]
async fn degraded_turns_still_count_toward_completion() {
    let mut harness = TestHarness::with_failing_images().with_max_turns(2);

    harness.input("one").await;
    harness.input("two").await;

    let response = harness.input("three").await;
    assert!(response.is_done);
    assert_eq!(harness.rendered_panel_counts(), vec![2]);
}
