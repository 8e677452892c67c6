//! Sky - voice and vision companion for competitive games
//!
//! This library provides the core of the Sky companion:
//! - Query routing between a live-decision and a retrospective responder
//! - Autonomous reactions to game events detected on screen
//! - Voice input and output (Whisper STT, OpenAI TTS)
//! - The single-threaded listen/watch control loop
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Companion loop                    │
//! │      listen (voice)      │      watch (vision)       │
//! └────────────┬─────────────┴─────────────┬────────────┘
//!              │ ask                        │ handle_event
//! ┌────────────▼────────────────────────────▼───────────┐
//! │                    Orchestrator                      │
//! │   Router  │  Data provider  │  Mid-game │ Post-game  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        OpenAI-compatible LLM (Ollama, OpenAI)        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod companion;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod llm;
pub mod orchestrator;
pub mod router;
pub mod vision;
pub mod voice;

pub use companion::{Clock, Companion, Cooldown, SystemClock, Tick};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventFlags, GameEventKind};
pub use orchestrator::Orchestrator;
pub use router::{Classification, RouteDecision, Router, Target};
