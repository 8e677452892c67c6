//! Pixel-statistics event detection
//!
//! No model involved. A death in VALORANT greys the screen out, so a frame
//! that is bright enough to be gameplay but almost colorless is read as
//! `player_died`. Kills and round ends have no cheap pixel signature and
//! are always reported false.

use async_trait::async_trait;
use image::GenericImageView;

use super::EventDetector;
use crate::Result;
use crate::events::EventFlags;

/// Frames are downscaled to at most this many pixels wide before sampling
const SAMPLE_WIDTH: u32 = 160;
const SAMPLE_HEIGHT: u32 = 90;

/// Mean HSV saturation and value of a frame, both in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub saturation: f32,
    pub value: f32,
}

impl FrameStats {
    /// Compute stats for an encoded image
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a decodable image
    pub fn from_encoded(frame: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(frame)?;
        Ok(Self::from_image(&image))
    }

    /// Compute stats for a decoded image
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let sampled = if width > SAMPLE_WIDTH || height > SAMPLE_HEIGHT {
            image.thumbnail(SAMPLE_WIDTH, SAMPLE_HEIGHT)
        } else {
            image.clone()
        };
        let rgb = sampled.to_rgb8();

        let mut saturation = 0.0f32;
        let mut value = 0.0f32;
        let mut count = 0usize;

        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0;
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);

            value += f32::from(max) / 255.0;
            if max > 0 {
                saturation += f32::from(max - min) / f32::from(max);
            }
            count += 1;
        }

        if count == 0 {
            return Self {
                saturation: 0.0,
                value: 0.0,
            };
        }

        Self {
            saturation: saturation / count as f32,
            value: value / count as f32,
        }
    }
}

/// Flags deaths from greyed-out frames
#[derive(Debug, Clone, Copy)]
pub struct HeuristicDetector {
    max_saturation: f32,
    min_value: f32,
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self {
            max_saturation: 0.08,
            min_value: 0.15,
        }
    }
}

impl HeuristicDetector {
    /// Create a detector with the default thresholds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify precomputed stats
    #[must_use]
    pub fn classify(&self, stats: FrameStats) -> EventFlags {
        EventFlags {
            death: stats.saturation < self.max_saturation && stats.value > self.min_value,
            ..EventFlags::none()
        }
    }
}

#[async_trait]
impl EventDetector for HeuristicDetector {
    async fn detect(&self, frame: &[u8]) -> Result<EventFlags> {
        let stats = FrameStats::from_encoded(frame)?;
        tracing::trace!(
            saturation = stats.saturation,
            value = stats.value,
            "frame stats"
        );
        Ok(self.classify(stats))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::Error;
    use crate::events::GameEventKind;

    fn png(width: u32, height: u32, f: impl Fn(u32, u32) -> Rgb<u8>) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, f);
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[tokio::test]
    async fn grey_frame_is_a_death() {
        let frame = png(320, 180, |_, _| Rgb([128, 128, 128]));
        let flags = HeuristicDetector::new().detect(&frame).await.unwrap();
        assert_eq!(flags, EventFlags::with(&[GameEventKind::Death]));
    }

    #[tokio::test]
    async fn colorful_frame_is_nothing() {
        let frame = png(64, 64, |x, _| {
            if x % 2 == 0 {
                Rgb([200, 40, 40])
            } else {
                Rgb([40, 160, 220])
            }
        });
        let flags = HeuristicDetector::new().detect(&frame).await.unwrap();
        assert_eq!(flags, EventFlags::none());
    }

    #[tokio::test]
    async fn black_frame_is_nothing() {
        let frame = png(32, 32, |_, _| Rgb([0, 0, 0]));
        let flags = HeuristicDetector::new().detect(&frame).await.unwrap();
        assert!(!flags.any());
    }

    #[tokio::test]
    async fn undecodable_frame_is_an_error() {
        let result = HeuristicDetector::new().detect(b"not an image").await;
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn stats_of_pure_red() {
        let frame = png(8, 8, |_, _| Rgb([255, 0, 0]));
        let stats = FrameStats::from_encoded(&frame).unwrap();
        assert!((stats.saturation - 1.0).abs() < f32::EPSILON);
        assert!((stats.value - 1.0).abs() < f32::EPSILON);
    }
}
