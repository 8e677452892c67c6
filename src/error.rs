//! Error types for the Sky companion

use thiserror::Error;

/// Result type alias for Sky operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Sky companion
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Text generation backend error
    #[error("llm error: {0}")]
    Llm(String),

    /// Visual event detection error
    #[error("vision error: {0}")]
    Vision(String),

    /// Screen capture error
    #[error("capture error: {0}")]
    Capture(String),

    /// Responder agent error
    #[error("agent error: {0}")]
    Agent(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Image decoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
