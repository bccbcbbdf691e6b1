//! Audio playback to speakers
//!
//! Plays one synthesized MP3 payload at a time, blocking until the audio
//! finishes. The payload is staged through a scoped temporary file that is
//! removed on every exit path, success or error.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Plays audio on the default output device
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Playback("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Play an MP3 payload to completion.
    ///
    /// Blocks until playback finishes; the next chunk must not start before
    /// this returns. The temporary staging file is deleted unconditionally
    /// when this function returns.
    ///
    /// # Errors
    ///
    /// Returns error if staging, decoding, or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_mp3(&mut self, mp3_data: &[u8]) -> Result<()> {
        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(mp3_data)?;
        temp.flush()?;
        tracing::debug!(path = %temp.path().display(), bytes = mp3_data.len(), "staged audio chunk");

        let file = temp.reopen()?;
        let (samples, sample_rate) = decode_mp3(file)?;

        // temp is dropped (and the file deleted) whether playback succeeds
        // or not
        self.play_samples_blocking(&samples, sample_rate)
    }

    /// Play raw mono f32 samples at the given rate, blocking until done.
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn play_raw(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        self.play_samples_blocking(samples, sample_rate)
    }

    /// Play mono f32 samples, blocking until the cursor is exhausted.
    fn play_samples_blocking(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let config = self.output_config(sample_rate)?;
        let channels = config.channels as usize;

        let samples = Arc::new(samples.to_vec());
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));

        let samples_cb = Arc::clone(&samples);
        let position_cb = Arc::clone(&position);
        let finished_cb = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut pos) = position_cb.lock() else {
                        return;
                    };

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples_cb.len() {
                            samples_cb[*pos]
                        } else {
                            if let Ok(mut done) = finished_cb.lock() {
                                *done = true;
                            }
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if *pos < samples_cb.len() {
                            *pos += 1;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Playback(e.to_string()))?;

        stream.play().map_err(|e| Error::Playback(e.to_string()))?;

        let duration_ms = (samples.len() as u64 * 1000) / u64::from(config.sample_rate.0.max(1));
        let timeout = std::time::Duration::from_millis(duration_ms + 500);
        let start = std::time::Instant::now();

        while !finished.lock().map(|done| *done).unwrap_or(true) {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = samples.len(), "playback complete");

        Ok(())
    }

    /// Find an output configuration for the decoded sample rate, preferring
    /// mono, then stereo, then whatever the device defaults to.
    fn output_config(&self, sample_rate: u32) -> Result<StreamConfig> {
        let at_rate = |channels: u16| {
            self.device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
        };

        if let Some(config) = at_rate(1).or_else(|| at_rate(2)) {
            return Ok(config.with_sample_rate(SampleRate(sample_rate)).config());
        }

        let default = self
            .device
            .default_output_config()
            .map_err(|e| Error::Playback(e.to_string()))?;
        tracing::warn!(
            wanted = sample_rate,
            using = default.sample_rate().0,
            "no output config at decoded rate, using device default"
        );
        Ok(default.config())
    }
}

/// Decode MP3 data to mono f32 samples plus the stream's sample rate
fn decode_mp3<R: Read>(reader: R) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(reader);
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or(44_100);
                }

                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Playback("no audio frames in MP3 payload".to_string()));
    }

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode_mp3(std::io::Cursor::new(vec![0u8; 64]));
        assert!(matches!(result, Err(Error::Playback(_))));
    }
}
