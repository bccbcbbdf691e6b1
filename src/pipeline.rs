//! Turn orchestration
//!
//! Wires capture, transcription, routing, generation, parsing, chunking,
//! synthesis, and playback into the end-to-end turn cycle. Stages run
//! linearly; an empty transcript or any stage failure returns straight to
//! idle with a one-line user-facing message. At most one turn is in flight,
//! and a new recording cannot start while a prior turn is still speaking.

use crate::archive::ResponseArchive;
use crate::chunk::{ChunkPolicy, chunk_text};
use crate::config::{Config, TtsProviderKind};
use crate::llm::{AssistantClient, AssistantIds, CompletionClient, ResponseGenerator};
use crate::reply::{AssistantReply, FALLBACK_APOLOGY};
use crate::router::ComplexityRouter;
use crate::voice::{AudioCapture, AudioPlayback, SAMPLE_RATE, SpeechToText, TextToSpeech, samples_to_wav};
use crate::{Error, Result};

/// Pipeline stage for the turn in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    /// Waiting for the push-to-talk trigger
    Idle,
    /// Microphone buffer filling
    Recording,
    /// Speech-to-text in progress
    Transcribing,
    /// Selecting a model tier
    Routing,
    /// Waiting on the model reply
    Generating,
    /// Resolving the reply shape
    Parsing,
    /// Synthesizing and playing chunks
    Speaking,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply was spoken to completion
    Completed {
        /// The speakable text that was played
        spoken: String,
        /// Number of synthesized chunks
        chunks: usize,
    },
    /// The trigger was released with nothing recorded
    NothingRecorded,
    /// Transcription returned an empty result
    NoSpeech,
    /// A stage failed; the turn was abandoned
    Aborted {
        /// One-line user-facing message
        message: String,
    },
}

impl TurnOutcome {
    /// One-line message to show the user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Completed { spoken, .. } => format!("Lyra: {spoken}"),
            Self::NothingRecorded => "No recording to process.".to_string(),
            Self::NoSpeech => {
                "No speech detected or transcription failed. Please try again.".to_string()
            }
            Self::Aborted { message } => message.clone(),
        }
    }
}

/// The end-to-end voice pipeline
pub struct Pipeline {
    capture: AudioCapture,
    stt: SpeechToText,
    router: ComplexityRouter,
    generator: ResponseGenerator,
    tts: TextToSpeech,
    playback: AudioPlayback,
    chunking: ChunkPolicy,
    archive: ResponseArchive,
    stage: TurnStage,
}

impl Pipeline {
    /// Build the pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if audio devices are unavailable or required
    /// credentials are missing
    pub fn new(config: &Config) -> Result<Self> {
        let openai_key = config.openai_key();
        let api_base = config.generation.api_base.clone();

        let capture = AudioCapture::new()?;
        let playback = AudioPlayback::new()?;

        let stt = SpeechToText::new(
            openai_key.clone(),
            config.voice.stt_model.clone(),
            api_base.clone(),
        )?;

        let router = ComplexityRouter::new(
            CompletionClient::new(openai_key.clone(), api_base.clone())?,
            config.routing.policy,
            config.routing.classifier_model.clone(),
        );

        let generator = ResponseGenerator::new(
            CompletionClient::new(openai_key.clone(), api_base.clone())?,
            AssistantClient::new(
                openai_key.clone(),
                api_base,
                config.generation.poll_interval,
                config.generation.max_poll_attempts,
            )?,
            AssistantIds {
                simple: config.generation.assistant_id_simple.clone(),
                complex: config.generation.assistant_id_complex.clone(),
            },
            config.generation.persona.clone(),
        );

        let tts = match config.voice.tts_provider {
            TtsProviderKind::ElevenLabs => TextToSpeech::new_elevenlabs(
                config.api_keys.elevenlabs.clone().unwrap_or_default(),
                config.voice.tts_voice.clone(),
                config.voice.tts_model.clone(),
                config.voice.tts_streaming,
            )?,
            TtsProviderKind::OpenAI => TextToSpeech::new_openai(
                openai_key,
                config.voice.tts_voice.clone(),
                config.voice.tts_model.clone(),
            )?,
        };

        Ok(Self {
            capture,
            stt,
            router,
            generator,
            tts,
            playback,
            chunking: config.chunking,
            archive: ResponseArchive::new(config.output_dir.clone()),
            stage: TurnStage::Idle,
        })
    }

    /// Current pipeline stage
    #[must_use]
    pub const fn stage(&self) -> TurnStage {
        self.stage
    }

    /// Start recording a new turn. No-op while already recording; refused
    /// while a prior turn is still being processed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Capture` if the input device cannot be acquired; the
    /// session stays idle so the next attempt can proceed.
    pub fn start_recording(&mut self) -> Result<()> {
        match self.stage {
            TurnStage::Idle => {
                self.capture.start()?;
                self.stage = TurnStage::Recording;
                Ok(())
            }
            TurnStage::Recording => Ok(()),
            _ => {
                tracing::warn!(stage = ?self.stage, "turn in flight, ignoring start");
                Ok(())
            }
        }
    }

    /// Stop recording and run the rest of the turn to completion.
    ///
    /// Every stage failure is caught here, logged, and folded into the
    /// returned outcome; the pipeline is idle again when this returns.
    #[allow(clippy::future_not_send)]
    pub async fn finish_turn(&mut self) -> TurnOutcome {
        let Some(samples) = self.capture.stop() else {
            self.stage = TurnStage::Idle;
            return TurnOutcome::NothingRecorded;
        };

        if samples.is_empty() {
            tracing::warn!("recording produced no samples");
            self.stage = TurnStage::Idle;
            return TurnOutcome::NothingRecorded;
        }

        self.stage = TurnStage::Transcribing;
        let wav = match samples_to_wav(&samples, SAMPLE_RATE, self.capture.channels()) {
            Ok(wav) => wav,
            Err(e) => return self.abort(&e),
        };
        // The capture buffer is gone at this point; only the encoded audio
        // survives to transcription
        drop(samples);

        let transcript = match self.stt.transcribe(wav).await {
            Ok(text) => text,
            Err(e) => return self.abort(&e),
        };

        if transcript.is_empty() {
            tracing::info!("no speech detected, returning to idle");
            self.stage = TurnStage::Idle;
            return TurnOutcome::NoSpeech;
        }

        tracing::info!(transcript = %transcript, "user said");

        self.stage = TurnStage::Routing;
        let selection = match self.router.classify(&transcript).await {
            Ok(selection) => selection,
            Err(e) => return self.abort(&e),
        };

        self.stage = TurnStage::Generating;
        let raw_reply = match self.generator.generate(&transcript, selection).await {
            Ok(reply) => reply,
            Err(e) => return self.abort(&e),
        };

        self.stage = TurnStage::Parsing;
        let reply = AssistantReply::parse(&raw_reply);
        let speakable = match reply.speakable().trim() {
            "" => {
                tracing::warn!("reply yielded no speakable text, using fallback");
                FALLBACK_APOLOGY
            }
            text => text,
        };

        // Archival failures are logged but never abort playback
        if let Err(e) = self.archive.save(speakable, &transcript) {
            tracing::warn!(error = %e, "failed to archive response");
        }

        self.stage = TurnStage::Speaking;
        let chunks = chunk_text(speakable, self.chunking);
        tracing::debug!(chunks = chunks.len(), "speaking response");

        for (index, chunk) in chunks.iter().enumerate() {
            let audio = match self.tts.synthesize(chunk).await {
                Ok(audio) => audio,
                Err(e) => return self.abort(&e),
            };

            tracing::debug!(chunk = index + 1, total = chunks.len(), "playing chunk");
            if let Err(e) = self.playback.play_mp3(&audio).await {
                return self.abort(&e);
            }
        }

        self.stage = TurnStage::Idle;
        TurnOutcome::Completed {
            spoken: speakable.to_string(),
            chunks: chunks.len(),
        }
    }

    /// Log a stage failure and fold it into an outcome; the pipeline
    /// returns to idle.
    fn abort(&mut self, error: &Error) -> TurnOutcome {
        tracing::error!(stage = ?self.stage, error = %error, "turn aborted");
        self.stage = TurnStage::Idle;
        TurnOutcome::Aborted {
            message: user_facing_message(error).to_string(),
        }
    }
}

/// One-line message for a stage failure
fn user_facing_message(error: &Error) -> &'static str {
    match error {
        Error::Capture(_) => "Sorry, something went wrong with the microphone.",
        Error::Transcription(_) => "Sorry, I couldn't transcribe that. Please try again.",
        Error::Classification(_) => "Sorry, I couldn't decide how to handle that request.",
        Error::Generation(_) | Error::GenerationTimeout(_) => {
            "I'm sorry, I encountered an error while processing your request."
        }
        Error::Synthesis(_) | Error::Playback(_) => "Sorry, I couldn't speak the response.",
        _ => "I'm sorry, an unexpected error occurred.",
    }
}
