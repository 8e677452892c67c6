//! Text-to-speech via the OpenAI speech API

use crate::config::VoiceConfig;
use crate::{Error, Result};

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

/// Synthesizes MP3 speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
}

impl TextToSpeech {
    /// Create a client from voice settings
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &VoiceConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: config.tts_voice.clone(),
            speed: config.tts_speed,
            model: config.tts_model.clone(),
        })
    }

    /// Synthesize `text` to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        tracing::debug!(chars = text.len(), voice = %self.voice, "synthesizing speech");

        let response = self
            .client
            .post(SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
