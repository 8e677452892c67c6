//! Model-backed event detection

use std::sync::Arc;

use async_trait::async_trait;

use super::EventDetector;
use crate::events::EventFlags;
use crate::llm::{GenerationRequest, TextGeneration, extract_json_object};
use crate::{Error, Result};

const DETECTION_PROMPT: &str = r#"You are watching a VALORANT match. Look at this screenshot and report which of these events are visible right now:

- "round_ended": the round-end banner or scoreboard is on screen
- "player_killed_enemy": a kill notification for the player is on screen
- "player_died": the player is dead (greyed-out view, death recap, or spectating)

Answer false when unsure.

Return ONLY JSON: {"round_ended": false, "player_killed_enemy": false, "player_died": false}"#;

/// Asks a vision-capable model which events a frame shows
///
/// The frame's MIME type is sniffed from its magic bytes unless overridden;
/// unrecognized data is sent as PNG.
pub struct VisionEventDetector {
    llm: Arc<dyn TextGeneration>,
    mime_type: Option<String>,
}

impl VisionEventDetector {
    #[must_use]
    pub fn new(llm: Arc<dyn TextGeneration>) -> Self {
        Self {
            llm,
            mime_type: None,
        }
    }

    /// Always send frames as `mime_type`
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    fn mime_type_of(&self, frame: &[u8]) -> String {
        self.mime_type.clone().unwrap_or_else(|| {
            image::guess_format(frame)
                .map_or("image/png", |format| format.to_mime_type())
                .to_string()
        })
    }
}

#[async_trait]
impl EventDetector for VisionEventDetector {
    async fn detect(&self, frame: &[u8]) -> Result<EventFlags> {
        let request = GenerationRequest::text(DETECTION_PROMPT)
            .json()
            .with_image(frame.to_vec(), self.mime_type_of(frame));

        let reply = self.llm.generate(&request).await?;
        let flags = parse_detection(&reply)?;

        tracing::debug!(?flags, "frame analyzed");
        Ok(flags)
    }
}

/// Parse a detection reply into flags
///
/// Missing keys are `false` and unknown keys are ignored.
///
/// # Errors
///
/// Returns [`Error::Vision`] if the reply holds no parseable JSON object
pub fn parse_detection(reply: &str) -> Result<EventFlags> {
    let json = extract_json_object(reply)
        .ok_or_else(|| Error::Vision(format!("no JSON object in detector reply: {reply}")))?;

    serde_json::from_str(json).map_err(|e| Error::Vision(format!("bad detector reply: {e}")))
}
