//! Microphone capture
//!
//! The cpal callback appends into a [`SampleBuffer`] that the listener
//! drains on each poll. The buffer is bounded so a loop that stops polling
//! (long playback, cooldown) holds at most [`BUFFER_CAPACITY`] samples.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture sample rate (16kHz mono, what Whisper expects)
pub const SAMPLE_RATE: u32 = 16000;

/// Most samples held between drains (10 s)
pub const BUFFER_CAPACITY: usize = SAMPLE_RATE as usize * 10;

/// Bounded sample queue; the oldest samples go first when full
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    capacity: usize,
    overflowed: usize,
}

impl SampleBuffer {
    /// Empty buffer holding at most `capacity` samples
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::new(),
            capacity,
            overflowed: 0,
        }
    }

    /// Append samples, discarding the oldest beyond capacity
    pub fn push(&mut self, data: &[f32]) {
        self.samples.extend_from_slice(data);
        if self.samples.len() > self.capacity {
            let excess = self.samples.len() - self.capacity;
            self.samples.drain(..excess);
            self.overflowed += excess;
        }
    }

    /// Take everything buffered
    pub fn drain(&mut self) -> Vec<f32> {
        if self.overflowed > 0 {
            tracing::trace!(samples = self.overflowed, "microphone buffer overflowed");
            self.overflowed = 0;
        }
        std::mem::take(&mut self.samples)
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.samples.clear();
        self.overflowed = 0;
    }

    /// Samples currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Streams the default input device into a shared [`SampleBuffer`]
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: Arc<Mutex<SampleBuffer>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if there is no input device or it cannot do 16kHz mono
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;
        let config = mono_config(&device)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            buffer: Arc::new(Mutex::new(SampleBuffer::with_capacity(BUFFER_CAPACITY))),
            stream: None,
        })
    }

    /// Start streaming; a no-op when already running
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let sink = Arc::clone(&self.buffer);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buffer) = sink.lock() {
                        buffer.push(data);
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        self.stream = Some(stream);
        tracing::debug!("microphone capture started");
        Ok(())
    }

    /// Stop streaming
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("microphone capture stopped");
        }
    }

    /// Samples captured since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buffer| buffer.drain())
            .unwrap_or_default()
    }

    /// Discard whatever has been captured so far
    pub fn clear(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }
}

fn mono_config(device: &Device) -> Result<StreamConfig> {
    let rate = SampleRate(SAMPLE_RATE);
    device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| c.channels() == 1 && (c.min_sample_rate()..=c.max_sample_rate()).contains(&rate))
        .map(|c| c.with_sample_rate(rate).config())
        .ok_or_else(|| Error::Audio("no 16kHz mono input config".to_string()))
}

/// Encode samples as 16-bit mono WAV
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(pcm)
            .map_err(|e| Error::Audio(e.to_string()))?;
    }
    writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;

    Ok(cursor.into_inner())
}
