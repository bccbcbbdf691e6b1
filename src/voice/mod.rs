//! Voice processing: capture, transcription, synthesis, playback

pub mod capture;
pub mod playback;
pub mod stt;
pub mod tts;

pub use capture::{AudioCapture, CHANNELS, MAX_RECORD_SECS, SAMPLE_RATE, SessionState, samples_to_wav};
pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
