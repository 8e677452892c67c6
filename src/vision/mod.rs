//! Screen watching
//!
//! Grabs frames from the desktop and turns them into [`EventFlags`].
//! Capture shells out to whatever screenshot tool the platform has; the
//! detector is either a local pixel heuristic or a vision-capable model.

mod capture;
mod detector;
mod heuristic;

use async_trait::async_trait;

pub use capture::{CommandCapture, KNOWN_TOOLS};
pub use detector::{VisionEventDetector, parse_detection};
pub use heuristic::{FrameStats, HeuristicDetector};

use crate::Result;
use crate::events::EventFlags;

/// Source of screen frames
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    /// Capture the current screen as encoded image bytes
    ///
    /// # Errors
    ///
    /// Returns error if the capture tool fails
    async fn capture(&self) -> Result<Vec<u8>>;
}

/// Turns a frame into event flags
#[async_trait]
pub trait EventDetector: Send + Sync {
    /// Evaluate every event kind on `frame`
    ///
    /// # Errors
    ///
    /// Returns error if the frame cannot be analyzed
    async fn detect(&self, frame: &[u8]) -> Result<EventFlags>;
}
