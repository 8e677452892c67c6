//! The companion control loop
//!
//! Each iteration either answers one spoken question or watches the screen
//! once, never both. A dispatched event starts a cooldown window during
//! which further events are suppressed; the loop also sleeps through that
//! window before listening again. Audio heard while answering or cooling
//! down is flushed from the speech input.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::{DEFAULT_COOLDOWN, DEFAULT_LISTEN_TIMEOUT};
use crate::events::GameEventKind;
use crate::orchestrator::Orchestrator;
use crate::vision::{EventDetector, ScreenCapture};
use crate::voice::{SpeechInput, SpeechOutput};

/// Source of time for the loop
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Suppression window after an event dispatch
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    window: Duration,
    last_dispatch: Option<Instant>,
}

impl Cooldown {
    /// A cooldown that has never fired
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_dispatch: None,
        }
    }

    /// Length of the window
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Mark a dispatch at `now`
    pub const fn record(&mut self, now: Instant) {
        self.last_dispatch = Some(now);
    }

    /// Whether `now` is still inside the window
    #[must_use]
    pub fn is_active(&self, now: Instant) -> bool {
        self.last_dispatch
            .is_some_and(|last| now.saturating_duration_since(last) < self.window)
    }

    /// Time left in the window at `now`
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_dispatch.map_or(Duration::ZERO, |last| {
            self.window
                .saturating_sub(now.saturating_duration_since(last))
        })
    }
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// A question was heard and answered
    Answered { query: String, response: String },
    /// A question was heard but answering it failed
    Failed { query: String, error: String },
    /// An event was detected and reacted to
    Dispatched {
        kind: GameEventKind,
        response: String,
    },
    /// An event was detected inside the cooldown window
    Suppressed { kind: GameEventKind },
    /// Nothing heard, nothing seen
    Idle,
    /// Shutdown was requested
    Stopped,
}

/// Listens, watches, and reacts until told to stop
pub struct Companion {
    orchestrator: Orchestrator,
    input: Box<dyn SpeechInput>,
    output: Option<Box<dyn SpeechOutput>>,
    capture: Arc<dyn ScreenCapture>,
    detector: Arc<dyn EventDetector>,
    clock: Arc<dyn Clock>,
    cooldown: Cooldown,
    listen_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Companion {
    /// Assemble a companion with default timings, the system clock, and no
    /// speech output
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        input: Box<dyn SpeechInput>,
        capture: Arc<dyn ScreenCapture>,
        detector: Arc<dyn EventDetector>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            orchestrator,
            input,
            output: None,
            capture,
            detector,
            clock: Arc::new(SystemClock),
            cooldown: Cooldown::new(DEFAULT_COOLDOWN),
            listen_timeout: DEFAULT_LISTEN_TIMEOUT,
            shutdown,
        }
    }

    /// Speak responses through `output`; `None` runs text-only
    #[must_use]
    pub fn with_output(mut self, output: Option<Box<dyn SpeechOutput>>) -> Self {
        self.output = output;
        self
    }

    /// Use a different clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the cooldown window
    #[must_use]
    pub const fn with_cooldown(mut self, window: Duration) -> Self {
        self.cooldown = Cooldown::new(window);
        self
    }

    /// Set the bounded listen timeout
    #[must_use]
    pub const fn with_listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = timeout;
        self
    }

    /// Whether responses are spoken
    #[must_use]
    pub const fn can_speak(&self) -> bool {
        self.output.is_some()
    }

    /// Current cooldown state
    #[must_use]
    pub const fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Run until shutdown
    pub async fn run(&mut self) {
        loop {
            let tick = self.step().await;
            tracing::trace!(?tick, "loop iteration");
            if tick == Tick::Stopped {
                break;
            }
        }
        tracing::info!("companion loop stopped");
    }

    /// Run one iteration
    pub async fn step(&mut self) -> Tick {
        if *self.shutdown.borrow() {
            return Tick::Stopped;
        }

        let heard = tokio::select! {
            biased;
            () = shutdown_requested(&mut self.shutdown) => return Tick::Stopped,
            heard = self.input.listen(self.listen_timeout) => heard,
        };

        match heard {
            Ok(Some(query)) if !query.trim().is_empty() => self.answer(query).await,
            Ok(_) => self.watch().await,
            Err(e) => {
                tracing::warn!(error = %e, "listen failed");
                self.watch().await
            }
        }
    }

    async fn answer(&mut self, query: String) -> Tick {
        println!("User: {query}");

        let tick = match self.orchestrator.ask(&query).await {
            Ok(response) => {
                println!("Sky: {response}");
                self.speak(&response).await;
                Tick::Answered { query, response }
            }
            Err(e) => {
                tracing::error!(error = %e, query = %query, "failed to answer");
                println!("Sky: Sorry, I couldn't answer that ({e})");
                Tick::Failed {
                    query,
                    error: e.to_string(),
                }
            }
        };

        self.input.flush();
        tick
    }

    async fn watch(&mut self) -> Tick {
        let frame = match self.capture.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "screen capture failed");
                return Tick::Idle;
            }
        };

        let flags = match self.detector.detect(&frame).await {
            Ok(flags) => flags,
            Err(e) => {
                tracing::debug!(error = %e, "event detection failed");
                return Tick::Idle;
            }
        };

        let Some(kind) = flags.first_occurred() else {
            return Tick::Idle;
        };

        if self.cooldown.is_active(self.clock.now()) {
            tracing::debug!(event = %kind, "event suppressed by cooldown");
            return Tick::Suppressed { kind };
        }

        println!("Event detected: {kind}");

        let response = match self.orchestrator.handle_event(kind).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, event = %kind, "event handling failed");
                return Tick::Idle;
            }
        };

        println!("Sky: {response}");
        self.speak(&response).await;

        self.cooldown.record(self.clock.now());
        let window = self.cooldown.window();
        tokio::select! {
            biased;
            () = shutdown_requested(&mut self.shutdown) => {}
            () = self.clock.sleep(window) => {}
        }
        self.input.flush();

        Tick::Dispatched { kind, response }
    }

    async fn speak(&mut self, text: &str) {
        if let Some(output) = self.output.as_mut()
            && let Err(e) = output.speak(text).await
        {
            tracing::warn!(error = %e, "failed to speak response");
        }
    }
}

/// Resolves once the shutdown flag is set; never if the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
