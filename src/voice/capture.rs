//! Audio capture from microphone
//!
//! Owns the single recording session. Holding the push-to-talk trigger fills
//! an in-memory buffer from the default input device; releasing it hands the
//! buffer to transcription and resets the session.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for recording
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count for recording
pub const CHANNELS: u16 = 2;

/// Upper bound on a single recording
pub const MAX_RECORD_SECS: u32 = 50;

/// Recording session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session active
    Idle,
    /// Stream open, buffer filling
    Recording,
    /// Capture halted, buffer about to be surrendered
    Stopped,
}

/// Captures audio from the default input device.
///
/// At most one session is active at a time: `start` while recording is a
/// no-op, `stop` while idle returns nothing.
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
    state: SessionState,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if no input device is available or no supported
    /// configuration matches the recording format
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Capture("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Capture(e.to_string()))?
            .find(|c| {
                c.channels() == CHANNELS
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: mono input
                device.supported_input_configs().ok()?.find(|c| {
                    c.channels() == 1
                        && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Capture("no suitable input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            state: SessionState::Idle,
        })
    }

    /// Start a recording session. No-op if one is already active.
    ///
    /// # Errors
    ///
    /// Returns `Error::Capture` if the input device cannot be acquired; the
    /// session stays idle so the next `start` can proceed.
    pub fn start(&mut self) -> Result<()> {
        if self.state == SessionState::Recording {
            tracing::debug!("recording already in progress, ignoring start");
            return Ok(());
        }

        let buffer = Arc::clone(&self.buffer);
        let max_samples = max_buffer_samples(&self.config);

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Capture("no input device".to_string()))?;

        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        let room = max_samples.saturating_sub(buf.len());
                        let take = room.min(data.len());
                        buf.extend_from_slice(&data[..take]);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Capture(e.to_string()))?;

        stream.play().map_err(|e| Error::Capture(e.to_string()))?;
        self.stream = Some(stream);
        self.state = SessionState::Recording;

        tracing::info!("recording started");
        Ok(())
    }

    /// Stop the active session and return the captured samples, trimmed to
    /// however much the stream delivered. Returns `None` when no session is
    /// active. The session is idle again afterwards either way.
    pub fn stop(&mut self) -> Option<Vec<f32>> {
        if self.state != SessionState::Recording {
            tracing::debug!("no recording to stop");
            return None;
        }

        self.state = SessionState::Stopped;
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }

        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        self.state = SessionState::Idle;
        tracing::info!(samples = samples.len(), "recording stopped");

        Some(samples)
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a session is active
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording)
    }

    /// Channel count of the capture configuration
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.config.channels
    }
}

/// Buffer cap in samples for the fixed maximum recording duration
fn max_buffer_samples(config: &StreamConfig) -> usize {
    SAMPLE_RATE as usize * MAX_RECORD_SECS as usize * config.channels as usize
}

/// Convert f32 samples to 16-bit PCM WAV bytes for the transcription API.
///
/// The encoding happens entirely in memory; nothing touches disk.
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::Capture(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Capture(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Capture(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_encoding_produces_riff_header() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE, CHANNELS).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert!(wav.len() > 44);
    }

    #[test]
    fn wav_roundtrip_preserves_sample_count() {
        let samples = vec![0.1f32; 128];
        let wav = samples_to_wav(&samples, SAMPLE_RATE, 1).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.channels, 1);

        let decoded: Vec<i16> = reader.samples::<i16>().map(std::result::Result::unwrap).collect();
        assert_eq!(decoded.len(), samples.len());
    }

    #[test]
    fn wav_clamps_out_of_range_samples() {
        let samples = vec![2.0f32, -2.0];
        let wav = samples_to_wav(&samples, SAMPLE_RATE, 1).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(std::result::Result::unwrap).collect();
        assert_eq!(decoded[0], i16::MAX);
        assert_eq!(decoded[1], i16::MIN);
    }
}
