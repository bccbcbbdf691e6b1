//! Pipeline component integration tests
//!
//! Exercises the turn pipeline's pieces without audio hardware or network
//! access: chunking, reply parsing, routing, archival, and WAV encoding.

use lyra_assistant::chunk::{ChunkPolicy, chunk_text, split_into_sentences};
use lyra_assistant::llm::{CompletionClient, parse_run_status, RunStatus};
use lyra_assistant::reply::AssistantReply;
use lyra_assistant::router::{
    ComplexityRouter, ModelTier, RoutingPolicy, contains_think_hard,
};
use lyra_assistant::voice::{AudioCapture, CHANNELS, SAMPLE_RATE, samples_to_wav};
use lyra_assistant::ResponseArchive;

/// Router with an unroutable endpoint; only paths that never reach the
/// network may be exercised with expectations of success.
fn offline_router(policy: RoutingPolicy) -> ComplexityRouter {
    let client =
        CompletionClient::new("test-key".to_string(), "http://127.0.0.1:1".to_string()).unwrap();
    ComplexityRouter::new(client, policy, "gpt-4o-mini".to_string())
}

// ---- chunking ----

#[test]
fn flat_chunking_of_long_text() {
    let text = "x".repeat(12_000);
    let chunks = chunk_text(&text, ChunkPolicy::flat());

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 10_000);
    assert_eq!(chunks[1].len(), 2_000);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn sentence_chunks_respect_budget_and_rejoin() {
    let text = "The pipeline has nine components. Each one owns a single stage. \
                Errors at any stage abort the turn. The user hears a short message instead. \
                Then the assistant goes back to idle and waits for the next trigger press.";

    let chunks = chunk_text(text, ChunkPolicy::sentences());
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.len() <= 250, "chunk over budget: {chunk:?}");
    }
    assert_eq!(chunks.join(" "), text);
}

#[test]
fn oversized_sentence_is_never_split_by_sentence_policy() {
    let long_sentence = format!("This single sentence rambles on {} and never stops.", "and on ".repeat(60));
    let text = format!("Short intro. {long_sentence} Short outro.");

    let chunks = chunk_text(&text, ChunkPolicy::sentences());
    assert!(chunks.contains(&long_sentence.clone()));
}

#[test]
fn sentence_splitting_matches_terminators() {
    let sentences = split_into_sentences("One. Two! Three? Four");
    assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
}

// ---- reply parsing ----

#[test]
fn structured_reply_speaks_final_resolution() {
    let raw = r#"{"steps":[],"final_resolution":"Yes!","confidence":0.9}"#;
    assert_eq!(AssistantReply::parse(raw).speakable(), "Yes!");
}

#[test]
fn freeform_reply_is_spoken_verbatim() {
    let raw = "Quantum gravity is still an open problem.";
    assert_eq!(AssistantReply::parse(raw).speakable(), raw);
}

#[test]
fn json_that_misses_the_schema_is_freeform() {
    let raw = r#"{"final": "nope"}"#;
    assert_eq!(AssistantReply::parse(raw).speakable(), raw);
}

// ---- routing ----

#[test]
fn think_hard_phrases_are_case_insensitive() {
    assert!(contains_think_hard("Deep Think about quantum gravity"));
    assert!(contains_think_hard("THINK HARD please"));
    assert!(!contains_think_hard("What's 2+2?"));
}

#[tokio::test]
async fn think_hard_selects_deepest_tier_without_network() {
    // The router endpoint is unroutable; the phrase check must run first
    // and short-circuit classification entirely.
    let router = offline_router(RoutingPolicy::Binary);
    let selection = router
        .classify("Deep Think about quantum gravity")
        .await
        .unwrap();

    assert_eq!(selection.tier, ModelTier::DeepReasoning);
    assert!(selection.deep_reasoning);
}

#[tokio::test]
async fn binary_policy_fails_open_to_simple() {
    let router = offline_router(RoutingPolicy::Binary);
    let selection = router.classify("What's 2+2?").await.unwrap();

    assert_eq!(selection.tier, ModelTier::Simple);
    assert_eq!(selection.tier.max_tokens(), 1_000);
}

#[tokio::test]
async fn tiered_policy_does_not_fail_open() {
    let router = offline_router(RoutingPolicy::Tiered);
    assert!(router.classify("What's 2+2?").await.is_err());
}

// ---- run status lifecycle ----

#[test]
fn run_status_terminal_states() {
    assert_eq!(parse_run_status("completed"), RunStatus::Completed);
    assert_eq!(parse_run_status("failed"), RunStatus::Failed);
    assert_eq!(parse_run_status("expired"), RunStatus::Failed);
    assert_eq!(parse_run_status("queued"), RunStatus::Queued);
    assert_eq!(parse_run_status("in_progress"), RunStatus::InProgress);
    assert_eq!(parse_run_status("somethingelse"), RunStatus::Other);
}

// ---- archival ----

#[test]
fn archive_writes_sanitized_unique_files() {
    let dir = tempfile::tempdir().unwrap();
    let archive = ResponseArchive::new(dir.path().join("responses"));

    let path = archive
        .save("It compiles.", "does: my/code? work")
        .unwrap();

    assert!(path.exists());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "It compiles.");

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    for forbidden in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
        assert!(!name.contains(forbidden), "{forbidden:?} in {name:?}");
    }
    assert!(name.ends_with(".txt"));
}

// ---- audio encoding ----

#[test]
fn samples_encode_to_valid_wav() {
    let samples: Vec<f32> = (0..4_410)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();

    let wav = samples_to_wav(&samples, SAMPLE_RATE, CHANNELS).unwrap();

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, CHANNELS);
}

// ---- recording session (skipped without hardware) ----

#[test]
fn double_start_leaves_one_active_session() {
    // Headless machines have no input device; the session contract can
    // only be exercised where capture hardware exists.
    let Ok(mut capture) = AudioCapture::new() else {
        return;
    };

    if capture.start().is_err() {
        return;
    }
    assert!(capture.is_recording());

    // Second start without an intervening stop is a no-op
    capture.start().unwrap();
    assert!(capture.is_recording());

    // One session's worth of samples comes back, then the session is idle
    assert!(capture.stop().is_some());
    assert!(!capture.is_recording());
    assert!(capture.stop().is_none());
}
