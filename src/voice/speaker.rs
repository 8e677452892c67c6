//! Spoken responses: synthesis plus playback

use async_trait::async_trait;

use super::{AudioPlayback, SpeechOutput, TextToSpeech};
use crate::Result;

/// Speaks text through the default output device
pub struct Speaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl Speaker {
    /// Open the output device
    ///
    /// # Errors
    ///
    /// Returns error if there is no usable output device
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl SpeechOutput for Speaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio)
    }
}
