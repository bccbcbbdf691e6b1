//! Lyra - push-to-talk voice assistant
//!
//! This library provides the voice-interaction pipeline:
//! - Audio capture (push-to-talk recording session)
//! - Speech-to-text transcription
//! - Complexity routing to a model tier
//! - Response generation (stateless completion or assistant thread)
//! - Structured/freeform reply parsing
//! - Text chunking, speech synthesis, and sequential playback
//!
//! # Architecture
//!
//! ```text
//! trigger down ──▶ AudioCapture.start
//! trigger up  ──▶ AudioCapture.stop ─▶ SpeechToText ─▶ ComplexityRouter
//!                                                           │
//!                    AssistantReply ◀─ ResponseGenerator ◀──┘
//!                          │
//!                    chunk_text ─▶ (TextToSpeech ─▶ AudioPlayback)* ─▶ idle
//! ```

pub mod archive;
pub mod chunk;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod reply;
pub mod router;
pub mod voice;

pub use archive::ResponseArchive;
pub use chunk::{ChunkPolicy, chunk_text};
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{AssistantClient, AssistantIds, CompletionClient, ResponseGenerator};
pub use pipeline::{Pipeline, TurnOutcome, TurnStage};
pub use reply::{AssistantReply, FALLBACK_APOLOGY, StructuredReply};
pub use router::{ComplexityRouter, ModelSelection, ModelTier, RoutingPolicy, contains_think_hard};
