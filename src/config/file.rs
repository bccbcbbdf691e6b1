//! TOML configuration file loading
//!
//! Supports `~/.config/lyra/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of
//! defaults, and environment variables override both.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct LyraConfigFile {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Model routing configuration
    #[serde(default)]
    pub routing: RoutingFileConfig,

    /// Response generation configuration
    #[serde(default)]
    pub generation: GenerationFileConfig,

    /// Directory for archived responses
    pub output_dir: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS provider ("elevenlabs" or "openai")
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "eleven_multilingual_v2", "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier
    pub tts_voice: Option<String>,

    /// Stream synthesis responses (ElevenLabs only)
    pub tts_streaming: Option<bool>,
}

/// Model routing configuration
#[derive(Debug, Default, Deserialize)]
pub struct RoutingFileConfig {
    /// Classification policy ("binary" or "tiered")
    pub policy: Option<String>,

    /// Model used for classification calls
    pub classifier_model: Option<String>,
}

/// Response generation configuration
#[derive(Debug, Default, Deserialize)]
pub struct GenerationFileConfig {
    /// API base URL override
    pub api_base: Option<String>,

    /// Assistant persona instruction
    pub persona: Option<String>,

    /// Assistant id for the simple tier (enables thread dispatch)
    pub assistant_id_simple: Option<String>,

    /// Assistant id for the complex tier (enables thread dispatch)
    pub assistant_id_complex: Option<String>,

    /// Run status poll interval in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Maximum run status checks before timing out
    pub max_poll_attempts: Option<u32>,
}

/// Load the TOML config file from the standard path
///
/// Returns `LyraConfigFile::default()` if the file doesn't exist or can't
/// be parsed.
#[must_use]
pub fn load_config_file() -> LyraConfigFile {
    let Some(path) = config_file_path() else {
        return LyraConfigFile::default();
    };

    if !path.exists() {
        return LyraConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                LyraConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LyraConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/lyra/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("lyra").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_missing_with_none() {
        let config: LyraConfigFile = toml::from_str(
            r#"
            [voice]
            tts_voice = "nova"

            [routing]
            policy = "tiered"
            "#,
        )
        .unwrap();

        assert_eq!(config.voice.tts_voice.as_deref(), Some("nova"));
        assert_eq!(config.routing.policy.as_deref(), Some("tiered"));
        assert!(config.api_keys.openai.is_none());
        assert!(config.generation.persona.is_none());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: LyraConfigFile = toml::from_str("").unwrap();
        assert!(config.voice.stt_model.is_none());
        assert!(config.routing.classifier_model.is_none());
    }
}
