//! Text-to-speech (TTS) processing
//!
//! One request per chunk. The ElevenLabs provider can stream the response
//! body, assembling the full payload from segments as they arrive; callers
//! see identical full audio bytes either way — streaming only shortens the
//! time to first byte.

use futures::StreamExt;

use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    ElevenLabs,
    OpenAI,
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    model: String,
    provider: TtsProvider,
    streaming: bool,
}

impl TextToSpeech {
    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if the API key or voice id is missing
    pub fn new_elevenlabs(
        api_key: String,
        voice_id: String,
        model: String,
        streaming: bool,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }
        if voice_id.is_empty() {
            return Err(Error::Config(
                "ElevenLabs voice id required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice_id,
            model,
            provider: TtsProvider::ElevenLabs,
            streaming,
        })
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new_openai(api_key: String, voice: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            model,
            provider: TtsProvider::OpenAI,
            streaming: false,
        })
    }

    /// Synthesize one text chunk into MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Synthesis` if the vendor rejects the request
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
        }
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        let url = if self.streaming {
            format!(
                "https://api.elevenlabs.io/v1/text-to-speech/{}/stream",
                self.voice
            )
        } else {
            format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice)
        };

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "ElevenLabs TTS error {status}: {body}"
            )));
        }

        if self.streaming {
            // Concatenate body segments as they arrive; the result is the
            // same full payload as the buffered path
            let mut audio = Vec::new();
            let mut stream = response.bytes_stream();
            while let Some(segment) = stream.next().await {
                audio.extend_from_slice(&segment?);
            }
            tracing::debug!(bytes = audio.len(), "streamed synthesis complete");
            Ok(audio)
        } else {
            let audio = response.bytes().await?;
            tracing::debug!(bytes = audio.len(), "synthesis complete");
            Ok(audio.to_vec())
        }
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        let request = OpenAiTtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "OpenAI TTS error {status}: {body}"
            )));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[derive(serde::Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(serde::Serialize)]
struct OpenAiTtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elevenlabs_key_is_rejected() {
        let result = TextToSpeech::new_elevenlabs(
            String::new(),
            "voice".to_string(),
            "eleven_multilingual_v2".to_string(),
            false,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_voice_id_is_rejected() {
        let result = TextToSpeech::new_elevenlabs(
            "key".to_string(),
            String::new(),
            "eleven_multilingual_v2".to_string(),
            true,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_openai_key_is_rejected() {
        let result =
            TextToSpeech::new_openai(String::new(), "alloy".to_string(), "tts-1".to_string());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
