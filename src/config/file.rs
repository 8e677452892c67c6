//! TOML configuration file loading
//!
//! Supports `~/.config/sky/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct SkyConfigFile {
    /// Text generation backend
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Screen watching configuration
    #[serde(default)]
    pub vision: VisionFileConfig,

    /// Control loop tuning
    #[serde(default, rename = "loop")]
    pub control: LoopFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// OpenAI-compatible base URL (e.g. "http://localhost:11434/v1")
    pub base_url: Option<String>,

    /// Model identifier (e.g. "llama3.2:1b")
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Bearer token for the backend, if it needs one
    pub api_key: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Speak responses aloud
    pub tts_enabled: Option<bool>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Bounded listen window per loop iteration
    pub listen_timeout_ms: Option<u64>,
}

/// Screen watching configuration
#[derive(Debug, Default, Deserialize)]
pub struct VisionFileConfig {
    /// Detector backend ("heuristic" or "vision")
    pub detector: Option<String>,

    /// Explicit screenshot tool (e.g. "grim")
    pub capture_command: Option<String>,

    /// Vision model for the "vision" detector
    pub model: Option<String>,
}

/// Control loop configuration
#[derive(Debug, Default, Deserialize)]
pub struct LoopFileConfig {
    /// Suppression window after an event dispatch
    pub cooldown_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `SkyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> SkyConfigFile {
    let Some(path) = config_file_path() else {
        return SkyConfigFile::default();
    };

    if !path.exists() {
        return SkyConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            SkyConfigFile::default()
        }
    }
}

/// Load a TOML config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<SkyConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/sky/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("sky").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_partial_file() {
        let parsed: SkyConfigFile = toml::from_str(
            r#"
            [llm]
            model = "llama3.1:8b"

            [loop]
            cooldown_secs = 8
            "#,
        )
        .unwrap();

        assert_eq!(parsed.llm.model.as_deref(), Some("llama3.1:8b"));
        assert!(parsed.llm.base_url.is_none());
        assert_eq!(parsed.control.cooldown_secs, Some(8));
        assert!(parsed.voice.tts_enabled.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        let parsed: SkyConfigFile = toml::from_str("").unwrap();
        assert!(parsed.vision.detector.is_none());
        assert!(parsed.api_keys.openai.is_none());
    }

    #[test]
    fn explicit_path_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[voice\ntts_enabled = ").unwrap();

        let result = load_config_file_from(file.path());
        assert!(matches!(result, Err(crate::Error::Toml(_))));
    }

    #[test]
    fn explicit_path_loads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[vision]\ndetector = \"vision\"").unwrap();

        let parsed = load_config_file_from(file.path()).unwrap();
        assert_eq!(parsed.vision.detector.as_deref(), Some("vision"));
    }
}
