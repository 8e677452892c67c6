//! Microphone-backed speech input

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{
    AudioCapture, SAMPLE_RATE, SpeechInput, SpeechToText, VoiceActivityDetector, samples_to_wav,
};
use crate::Result;

/// How often the capture buffer is drained while listening
pub const LISTEN_CHUNK: Duration = Duration::from_millis(100);

/// Drained chunks longer than this (3 s) piled up while nobody was listening
pub const MAX_BACKLOG: usize = SAMPLE_RATE as usize * 3;

/// Feed one drained chunk to the detector
///
/// A chunk over [`MAX_BACKLOG`] is audio from while the loop was busy,
/// usually including the companion's own voice. It is dropped together
/// with any partial utterance.
pub fn segment(vad: &mut VoiceActivityDetector, samples: &[f32]) -> Option<Vec<f32>> {
    if samples.len() > MAX_BACKLOG {
        tracing::debug!(samples = samples.len(), "dropping stale microphone backlog");
        vad.reset();
        return None;
    }
    vad.process(samples)
}

/// Listens on the default microphone and transcribes utterances
///
/// The microphone keeps streaming between calls, and an utterance that is
/// still in progress when a call times out is picked up by the next one.
/// [`SpeechInput::flush`] discards what was heard while the loop was busy.
pub struct MicListener {
    capture: AudioCapture,
    vad: VoiceActivityDetector,
    stt: SpeechToText,
}

impl MicListener {
    /// Open the microphone and start streaming
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened
    pub fn new(stt: SpeechToText) -> Result<Self> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        Ok(Self {
            capture,
            vad: VoiceActivityDetector::new(),
            stt,
        })
    }

    async fn transcribe(&self, utterance: &[f32]) -> Result<Option<String>> {
        let wav = samples_to_wav(utterance, SAMPLE_RATE)?;
        let text = self.stt.transcribe(&wav).await?;
        let text = text.trim();

        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

#[async_trait(?Send)]
impl SpeechInput for MicListener {
    async fn listen(&mut self, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            tokio::time::sleep(remaining.min(LISTEN_CHUNK)).await;

            let samples = self.capture.drain();
            if let Some(utterance) = segment(&mut self.vad, &samples) {
                return self.transcribe(&utterance).await;
            }
        }
    }

    fn flush(&mut self) {
        self.capture.clear();
        self.vad.reset();
    }
}

impl Drop for MicListener {
    fn drop(&mut self) {
        self.capture.stop();
    }
}
