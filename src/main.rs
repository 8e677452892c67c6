use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use sky_companion::agent::{MidGameAgent, PostGameAgent};
use sky_companion::config::DetectorKind;
use sky_companion::data::SimulatedDataProvider;
use sky_companion::llm::{LlmClient, TextGeneration};
use sky_companion::vision::{
    CommandCapture, EventDetector, HeuristicDetector, ScreenCapture, VisionEventDetector,
};
use sky_companion::voice::{
    AudioCapture, MicListener, SAMPLE_RATE, SpeechOutput, SpeechToText, Speaker, TextToSpeech,
    rms_energy,
};
use sky_companion::{Companion, Config, Orchestrator, Router};

/// Sky - voice and vision companion for VALORANT
#[derive(Parser)]
#[command(name = "sky", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/sky/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the answer
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Run the event detector on an image file
    Detect {
        /// PNG or JPEG screenshot
        image: PathBuf,
    },
    /// React to a game event by label (round_ended, player_killed_enemy, player_died)
    Event {
        /// Event label
        name: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is Sky. Good luck this round.")]
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,sky_companion=info",
        1 => "info,sky_companion=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Ask { text }) => ask(&config, &text.join(" ")).await,
        Some(Command::Detect { image }) => detect(&config, &image).await,
        Some(Command::Event { name }) => event(&config, &name).await,
        Some(Command::TestMic { duration }) => test_mic(duration).await,
        Some(Command::TestTts { text }) => test_tts(&config, &text).await,
        None => run_loop(&config).await,
    }
}

/// Run the listen/watch loop until Ctrl+C
#[allow(clippy::future_not_send)]
async fn run_loop(config: &Config) -> anyhow::Result<()> {
    println!("--- Sky: VALORANT decision support ---");

    let orchestrator = build_orchestrator(config)?;
    let detector = build_detector(config)?;
    let capture: Arc<dyn ScreenCapture> = Arc::new(build_capture(config)?);
    let listener = build_listener(config)?;
    let speaker = build_speaker(config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut companion = Companion::new(
        orchestrator,
        Box::new(listener),
        capture,
        detector,
        shutdown_rx,
    )
    .with_output(speaker)
    .with_cooldown(config.control.cooldown)
    .with_listen_timeout(config.voice.listen_timeout);

    tracing::info!(
        speech_output = companion.can_speak(),
        detector = ?config.vision.detector,
        model = %config.llm.model,
        "companion ready"
    );
    println!("Sky is listening for your questions and watching for game events.");
    println!("Press Ctrl+C to exit.");

    companion.run().await;

    println!("Exiting Sky. Good luck in your games!");
    Ok(())
}

fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let llm: Arc<dyn TextGeneration> = Arc::new(LlmClient::new(&config.llm)?);

    Ok(Orchestrator::new(
        Router::new(Arc::clone(&llm)),
        Arc::new(SimulatedDataProvider::new()),
        Arc::new(MidGameAgent::new(Arc::clone(&llm))),
        Arc::new(PostGameAgent::new(llm)),
    ))
}

fn build_detector(config: &Config) -> anyhow::Result<Arc<dyn EventDetector>> {
    Ok(match config.vision.detector {
        DetectorKind::Heuristic => Arc::new(HeuristicDetector::new()),
        DetectorKind::Vision => {
            let llm = LlmClient::new(&config.llm)?.with_model(config.vision.model.clone());
            tracing::debug!(model = llm.model(), "using vision detector");
            Arc::new(VisionEventDetector::new(Arc::new(llm)))
        }
    })
}

fn build_capture(config: &Config) -> anyhow::Result<CommandCapture> {
    let capture = match &config.vision.capture_command {
        Some(program) => CommandCapture::with_program(program)?,
        None => CommandCapture::detect()?,
    };
    tracing::debug!(program = capture.program(), "screen capture ready");
    Ok(capture)
}

fn openai_key(config: &Config, purpose: &str) -> anyhow::Result<String> {
    config
        .api_keys
        .openai
        .clone()
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required for {purpose}"))
}

fn build_listener(config: &Config) -> anyhow::Result<MicListener> {
    let stt = SpeechToText::new_whisper(
        openai_key(config, "speech recognition")?,
        config.voice.stt_model.clone(),
    )?;
    Ok(MicListener::new(stt)?)
}

fn build_speaker(config: &Config) -> Option<Box<dyn SpeechOutput>> {
    if !config.voice.tts_enabled {
        tracing::info!("speech output disabled");
        return None;
    }

    let speaker = openai_key(config, "speech output").and_then(|key| {
        let tts = TextToSpeech::new(key, &config.voice)?;
        Ok(Speaker::new(tts)?)
    });

    match speaker {
        Ok(speaker) => Some(Box::new(speaker)),
        Err(e) => {
            tracing::warn!(error = %e, "speech output unavailable, responses will be text only");
            None
        }
    }
}

/// Answer one question without the microphone
async fn ask(config: &Config, text: &str) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    println!("User: {text}");
    let response = orchestrator.ask(text).await?;
    println!("Sky: {response}");
    Ok(())
}

/// Run detection on a saved screenshot and print the flags
async fn detect(config: &Config, image: &Path) -> anyhow::Result<()> {
    let detector = build_detector(config)?;
    let frame = tokio::fs::read(image).await?;
    let flags = detector.detect(&frame).await?;
    println!("{}", serde_json::to_string_pretty(&flags)?);
    Ok(())
}

/// React to a named event
async fn event(config: &Config, name: &str) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    if let Some(response) = orchestrator.handle_event_named(name).await? {
        println!("Sky: {response}");
    }
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.drain();
        let energy = rms_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Synthesize and play a test phrase
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::new(openai_key(config, "speech output")?, &config.voice)?;
    let mut speaker = Speaker::new(tts)?;

    println!("Synthesizing and playing...");
    speaker.speak(text).await?;

    println!("\n---");
    println!("If you heard the phrase, speech output is working!");
    Ok(())
}
