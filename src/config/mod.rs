//! Configuration management
//!
//! Settings resolve env > TOML file > default. Required credentials are
//! validated up front and reported together, so a missing key fails startup
//! with one actionable message instead of a mid-turn surprise.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::chunk::ChunkPolicy;
use crate::router::RoutingPolicy;
use crate::{Error, Result};

/// Default API base for transcription, completion, and assistant calls
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default assistant persona instruction
const DEFAULT_PERSONA: &str = "Act as Lyra, a friendly AI assistant who is creative, logical, and engaging. \
     Respond in the first person, using a warm and enthusiastic voice. \
     Use problem-solving skills to work through issues step by step. \
     If 'no chit chat' is mentioned, just provide direct answers.";

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API keys for external services
    pub api_keys: ApiKeys,

    /// Voice processing configuration
    pub voice: VoiceConfig,

    /// Model routing configuration
    pub routing: RoutingConfig,

    /// Response generation configuration
    pub generation: GenerationConfig,

    /// Chunking policy for synthesis
    pub chunking: ChunkPolicy,

    /// Directory for archived responses
    pub output_dir: PathBuf,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (transcription, completion, assistants, TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (TTS)
    pub elevenlabs: Option<String>,
}

/// TTS provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProviderKind {
    /// ElevenLabs voices
    #[default]
    ElevenLabs,
    /// `OpenAI` speech endpoint
    OpenAI,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS provider
    pub tts_provider: TtsProviderKind,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// Stream synthesis responses (ElevenLabs only)
    pub tts_streaming: bool,
}

/// Model routing configuration
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Classification policy
    pub policy: RoutingPolicy,

    /// Model used for classification calls
    pub classifier_model: String,
}

/// Response generation configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// API base URL
    pub api_base: String,

    /// Fixed assistant persona instruction
    pub persona: String,

    /// Assistant id for the simple tier (enables thread dispatch)
    pub assistant_id_simple: Option<String>,

    /// Assistant id for the complex tier (enables thread dispatch)
    pub assistant_id_complex: Option<String>,

    /// Run status poll interval
    pub poll_interval: Duration,

    /// Maximum run status checks before timing out
    pub max_poll_attempts: u32,
}

impl Config {
    /// Load configuration: env > TOML file > default.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming every missing required credential
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            elevenlabs: std::env::var("ELEVENLABS_API_KEY")
                .ok()
                .or(fc.api_keys.elevenlabs),
        };

        let tts_provider = std::env::var("LYRA_TTS_PROVIDER")
            .ok()
            .or(fc.voice.tts_provider)
            .map_or(Ok(TtsProviderKind::default()), |value| {
                parse_tts_provider(&value)
            })?;

        let tts_streaming = std::env::var("LYRA_TTS_STREAMING")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .or(fc.voice.tts_streaming)
            .unwrap_or(false);

        let voice = VoiceConfig {
            stt_model: std::env::var("LYRA_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_provider,
            tts_model: std::env::var("LYRA_TTS_MODEL")
                .ok()
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| default_tts_model(tts_provider).to_string()),
            tts_voice: std::env::var("LYRA_TTS_VOICE")
                .ok()
                .or_else(|| std::env::var("ELEVENLABS_VOICE_ID").ok())
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| default_tts_voice(tts_provider).to_string()),
            tts_streaming,
        };

        let routing = RoutingConfig {
            policy: std::env::var("LYRA_ROUTING_POLICY")
                .ok()
                .or(fc.routing.policy)
                .map_or(Ok(RoutingPolicy::default()), |value| {
                    parse_routing_policy(&value)
                })?,
            classifier_model: std::env::var("LYRA_CLASSIFIER_MODEL")
                .ok()
                .or(fc.routing.classifier_model)
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
        };

        let generation = GenerationConfig {
            api_base: std::env::var("LYRA_API_BASE")
                .ok()
                .or(fc.generation.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            persona: std::env::var("LYRA_PERSONA")
                .ok()
                .or(fc.generation.persona)
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            assistant_id_simple: std::env::var("LYRA_ASSISTANT_ID_SIMPLE")
                .ok()
                .or(fc.generation.assistant_id_simple),
            assistant_id_complex: std::env::var("LYRA_ASSISTANT_ID_COMPLEX")
                .ok()
                .or(fc.generation.assistant_id_complex),
            poll_interval: Duration::from_millis(
                std::env::var("LYRA_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .or(fc.generation.poll_interval_ms)
                    .unwrap_or(1_000),
            ),
            max_poll_attempts: std::env::var("LYRA_MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(fc.generation.max_poll_attempts)
                .unwrap_or(300),
        };

        // Streamed synthesis wants small chunks for low latency to first
        // audio; buffered synthesis takes whole payloads
        let default_chunking = if voice.tts_streaming {
            ChunkPolicy::sentences()
        } else {
            ChunkPolicy::flat()
        };
        let chunking = match std::env::var("LYRA_CHUNK_POLICY").ok().as_deref() {
            Some("flat") => ChunkPolicy::flat(),
            Some("sentences") => ChunkPolicy::sentences(),
            Some(other) => {
                return Err(Error::Config(format!("unknown chunk policy: {other:?}")));
            }
            None => default_chunking,
        };

        let output_dir = std::env::var("LYRA_OUTPUT_DIR")
            .ok()
            .or(fc.output_dir)
            .map_or_else(|| PathBuf::from("responses"), PathBuf::from);

        let config = Self {
            api_keys,
            voice,
            routing,
            generation,
            chunking,
            output_dir,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every required credential is present, reporting all
    /// missing ones together.
    fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();

        if self.api_keys.openai.as_deref().unwrap_or_default().is_empty() {
            missing.push("OPENAI_API_KEY");
        }

        if self.voice.tts_provider == TtsProviderKind::ElevenLabs {
            if self
                .api_keys
                .elevenlabs
                .as_deref()
                .unwrap_or_default()
                .is_empty()
            {
                missing.push("ELEVENLABS_API_KEY");
            }
            if self.voice.tts_voice.is_empty() {
                missing.push("ELEVENLABS_VOICE_ID");
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }

    /// The `OpenAI` API key; validated present at load time
    #[must_use]
    pub fn openai_key(&self) -> String {
        self.api_keys.openai.clone().unwrap_or_default()
    }
}

/// Default TTS model for a provider
const fn default_tts_model(provider: TtsProviderKind) -> &'static str {
    match provider {
        TtsProviderKind::ElevenLabs => "eleven_multilingual_v2",
        TtsProviderKind::OpenAI => "tts-1",
    }
}

/// Default TTS voice for a provider. ElevenLabs voices are account-specific
/// so there is no usable default; the missing id is caught by validation.
const fn default_tts_voice(provider: TtsProviderKind) -> &'static str {
    match provider {
        TtsProviderKind::ElevenLabs => "",
        TtsProviderKind::OpenAI => "alloy",
    }
}

fn parse_tts_provider(value: &str) -> Result<TtsProviderKind> {
    match value.to_lowercase().as_str() {
        "elevenlabs" => Ok(TtsProviderKind::ElevenLabs),
        "openai" => Ok(TtsProviderKind::OpenAI),
        other => Err(Error::Config(format!("unknown TTS provider: {other:?}"))),
    }
}

fn parse_routing_policy(value: &str) -> Result<RoutingPolicy> {
    match value.to_lowercase().as_str() {
        "binary" => Ok(RoutingPolicy::Binary),
        "tiered" => Ok(RoutingPolicy::Tiered),
        other => Err(Error::Config(format!("unknown routing policy: {other:?}"))),
    }
}
