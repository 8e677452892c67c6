//! Voice activity detection
//!
//! Splits a continuous sample stream into utterances using RMS energy.
//! An utterance is at least 0.3 s of audio followed by 0.5 s of silence.

use super::SAMPLE_RATE;

/// RMS energy above which a chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length (0.3 s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = (SAMPLE_RATE as usize * 3) / 10;

/// Trailing silence that ends an utterance (0.5 s at 16kHz)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// Where the detector is in an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Speaking,
}

/// Segments audio into utterances
#[derive(Debug)]
pub struct VoiceActivityDetector {
    state: ActivityState,
    speech_buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for VoiceActivityDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceActivityDetector {
    /// Create an idle detector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ActivityState::Idle,
            speech_buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns the finished utterance once enough trailing silence has been
    /// seen; the detector is idle again afterwards.
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = rms_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            ActivityState::Idle => {
                if is_speech {
                    self.state = ActivityState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            ActivityState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter >= SILENCE_SAMPLES
                    && self.speech_samples >= MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    let utterance = std::mem::take(&mut self.speech_buffer);
                    self.reset();
                    return Some(utterance);
                }

                // Blip followed by a long pause
                if self.silence_counter >= SILENCE_SAMPLES * 2 {
                    tracing::trace!("speech too short, resetting");
                    self.reset();
                }

                None
            }
        }
    }

    /// Drop any partial utterance
    pub fn reset(&mut self) {
        self.state = ActivityState::Idle;
        self.speech_buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ActivityState {
        self.state
    }

    /// Whether an utterance is in progress
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state == ActivityState::Speaking
    }

    /// Samples buffered for the utterance in progress
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.speech_buffer.len()
    }
}

/// RMS energy of a chunk
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
