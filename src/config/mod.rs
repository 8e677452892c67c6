//! Configuration management for the Sky companion

pub mod file;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Default OpenAI-compatible endpoint (local Ollama)
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:11434/v1";

/// Default text generation model
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:1b";

/// Default bounded listen window
pub const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_millis(500);

/// Default event cooldown window
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Sky companion configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Text generation backend
    pub llm: LlmConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Screen watching configuration
    pub vision: VisionConfig,

    /// Control loop configuration
    pub control: LoopConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Text generation backend configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Optional bearer token
    pub api_key: Option<String>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// Speak responses aloud when a speech output is available
    pub tts_enabled: bool,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Bounded listen window per loop iteration
    pub listen_timeout: Duration,
}

/// Which visual event detector backs the watch step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    /// Local pixel statistics
    Heuristic,
    /// Vision-capable LLM
    Vision,
}

impl FromStr for DetectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "vision" | "vlm" => Ok(Self::Vision),
            other => Err(Error::Config(format!("unknown detector: {other}"))),
        }
    }
}

/// Screen watching configuration
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Detector backend
    pub detector: DetectorKind,

    /// Explicit screenshot tool; auto-detected when unset
    pub capture_command: Option<String>,

    /// Model used by the vision detector
    pub model: String,
}

/// Control loop configuration
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Suppression window after an event dispatch
    pub cooldown: Duration,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper and TTS)
    pub openai: Option<String>,
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded or the
    /// resulting configuration is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(p) => file::load_config_file_from(p)?,
            None => file::load_config_file(),
        };

        let config = Self::from_sources(fc, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be interpreted
    pub fn from_sources(
        fc: file::SkyConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let llm_model = env("SKY_LLM_MODEL")
            .or(fc.llm.model)
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let llm = LlmConfig {
            base_url: env("SKY_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: llm_model.clone(),
            temperature: fc.llm.temperature.unwrap_or(0.0),
            api_key: env("SKY_LLM_API_KEY").or(fc.llm.api_key),
        };

        let listen_timeout = env("SKY_LISTEN_TIMEOUT_MS")
            .and_then(|s| s.parse().ok())
            .or(fc.voice.listen_timeout_ms)
            .map_or(DEFAULT_LISTEN_TIMEOUT, Duration::from_millis);

        let voice = VoiceConfig {
            stt_model: env("SKY_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_enabled: fc.voice.tts_enabled.unwrap_or(true),
            tts_model: env("SKY_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: fc.voice.tts_voice.unwrap_or_else(|| "alloy".to_string()),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0),
            listen_timeout,
        };

        let detector = env("SKY_DETECTOR")
            .or(fc.vision.detector)
            .map_or(Ok(DetectorKind::Heuristic), |s| s.parse())?;

        let vision = VisionConfig {
            detector,
            capture_command: env("SKY_CAPTURE_COMMAND").or(fc.vision.capture_command),
            model: env("SKY_VISION_MODEL")
                .or(fc.vision.model)
                .unwrap_or(llm_model),
        };

        let control = LoopConfig {
            cooldown: fc
                .control
                .cooldown_secs
                .map_or(DEFAULT_COOLDOWN, Duration::from_secs),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
        };

        Ok(Self {
            llm,
            voice,
            vision,
            control,
            api_keys,
        })
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.voice.listen_timeout.is_zero() {
            return Err(Error::Config("listen timeout must be positive".to_string()));
        }

        if self.control.cooldown.is_zero() {
            return Err(Error::Config("cooldown must be positive".to_string()));
        }

        if !(0.25..=4.0).contains(&self.voice.tts_speed) {
            return Err(Error::Config(format!(
                "tts speed {} outside 0.25..=4.0",
                self.voice.tts_speed
            )));
        }

        if self.llm.base_url.is_empty() {
            return Err(Error::Config("llm base url is empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::file::SkyConfigFile;
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_sources() {
        let config = Config::from_sources(SkyConfigFile::default(), env_from(&[])).unwrap();

        assert_eq!(config.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.vision.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.vision.detector, DetectorKind::Heuristic);
        assert_eq!(config.voice.listen_timeout, Duration::from_millis(500));
        assert_eq!(config.control.cooldown, Duration::from_secs(5));
        assert!(config.voice.tts_enabled);
        assert!(config.api_keys.openai.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file() {
        let fc: SkyConfigFile = toml::from_str(
            r#"
            [llm]
            model = "from-file"
            base_url = "http://file:1234/v1/"

            [api_keys]
            openai = "sk-file"
            "#,
        )
        .unwrap();

        let config = Config::from_sources(
            fc,
            env_from(&[("SKY_LLM_MODEL", "from-env"), ("OPENAI_API_KEY", "sk-env")]),
        )
        .unwrap();

        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.base_url, "http://file:1234/v1");
        assert_eq!(config.api_keys.openai.as_deref(), Some("sk-env"));
    }

    #[test]
    fn unknown_detector_is_rejected() {
        let result = Config::from_sources(
            SkyConfigFile::default(),
            env_from(&[("SKY_DETECTOR", "telepathy")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn detector_names_parse() {
        assert_eq!("Vision".parse::<DetectorKind>().unwrap(), DetectorKind::Vision);
        assert_eq!("vlm".parse::<DetectorKind>().unwrap(), DetectorKind::Vision);
        assert_eq!(
            " heuristic ".parse::<DetectorKind>().unwrap(),
            DetectorKind::Heuristic
        );
    }

    #[test]
    fn validate_rejects_out_of_range_speed() {
        let mut config = Config::from_sources(SkyConfigFile::default(), env_from(&[])).unwrap();
        config.voice.tts_speed = 9.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cooldown() {
        let fc: SkyConfigFile = toml::from_str("[loop]\ncooldown_secs = 0").unwrap();
        let config = Config::from_sources(fc, env_from(&[])).unwrap();
        assert!(config.validate().is_err());
    }
}
