//! Voice input and output
//!
//! Microphone capture, energy-based utterance segmentation, Whisper
//! transcription, speech synthesis, and playback. The control loop only
//! sees the [`SpeechInput`] and [`SpeechOutput`] seams.
//!
//! cpal streams are not `Send`, so both seams produce non-`Send` futures
//! and are driven from the single-threaded runtime.

mod activity;
mod capture;
mod listener;
mod playback;
mod speaker;
mod stt;
mod tts;

use std::time::Duration;

use async_trait::async_trait;

pub use activity::{ActivityState, VoiceActivityDetector, rms_energy};
pub use capture::{AudioCapture, BUFFER_CAPACITY, SAMPLE_RATE, SampleBuffer, samples_to_wav};
pub use listener::{LISTEN_CHUNK, MAX_BACKLOG, MicListener, segment};
pub use playback::{AudioPlayback, decode_mp3};
pub use speaker::Speaker;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

use crate::Result;

/// Bounded speech capture
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Wait up to `timeout` for one utterance
    ///
    /// Returns `None` when nothing was said in time.
    ///
    /// # Errors
    ///
    /// Returns error if capture or transcription fails
    async fn listen(&mut self, timeout: Duration) -> Result<Option<String>>;

    /// Forget audio heard so far, including any partial utterance
    ///
    /// Called after the companion has spoken or waited out a cooldown so
    /// that audio from that time is not taken as a question.
    fn flush(&mut self) {}
}

/// Spoken responses
#[async_trait(?Send)]
pub trait SpeechOutput {
    /// Say `text` out loud
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&mut self, text: &str) -> Result<()>;
}
