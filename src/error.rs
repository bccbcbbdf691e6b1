//! Error types for the Lyra assistant

use thiserror::Error;

/// Result type alias for Lyra operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credentials, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio capture error (device acquisition, stream failure)
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech-to-text error
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Model routing error (invalid classifier output under strict policy)
    #[error("classification error: {0}")]
    Classification(String),

    /// LLM dispatch error (completion or assistant thread)
    #[error("generation error: {0}")]
    Generation(String),

    /// Assistant run did not reach a terminal state within the poll budget
    #[error("generation timed out after {0} status checks")]
    GenerationTimeout(u32),

    /// Reply parsing error
    #[error("parse error: {0}")]
    Parse(String),

    /// Text-to-speech error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Audio playback error
    #[error("playback error: {0}")]
    Playback(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
