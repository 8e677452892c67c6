//! Shared test utilities
//!
//! Hand-written collaborators that record what they were asked and replay
//! scripted answers. None of them touch the network or audio hardware.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;

use sky_companion::agent::{LiveDecisionResponder, RetrospectiveResponder};
use sky_companion::data::DataProvider;
use sky_companion::llm::{GenerationRequest, TextGeneration};
use sky_companion::vision::{EventDetector, ScreenCapture};
use sky_companion::voice::{SpeechInput, SpeechOutput};
use sky_companion::{Clock, Companion, Error, EventFlags, Orchestrator, Result, Router};

/// Classifier backend with one canned outcome
pub struct MockClassifier {
    reply: std::result::Result<String, String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockClassifier {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

#[async_trait]
impl TextGeneration for MockClassifier {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.reply.clone().map_err(Error::Llm)
    }
}

/// Data provider returning a fixed snapshot
pub struct MockData {
    snapshot: String,
    fail: bool,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl MockData {
    pub fn returning(snapshot: &str) -> Arc<Self> {
        Arc::new(Self {
            snapshot: snapshot.to_string(),
            fail: false,
            queries: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            snapshot: String::new(),
            fail: true,
            queries: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataProvider for MockData {
    async fn fetch(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(Error::Agent("data backend down".to_string()));
        }
        Ok(self.snapshot.clone())
    }
}

/// Live-decision responder recording `(round_data, question)` pairs
pub struct MockLive {
    answer: std::result::Result<String, String>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockLive {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LiveDecisionResponder for MockLive {
    async fn respond(&self, round_data: &str, question: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((round_data.to_string(), question.to_string()));
        self.answer.clone().map_err(Error::Agent)
    }
}

/// Retrospective responder recording claims
pub struct MockRetro {
    answer: std::result::Result<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockRetro {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrospectiveResponder for MockRetro {
    async fn review(&self, claim: &str) -> Result<String> {
        self.calls.lock().unwrap().push(claim.to_string());
        self.answer.clone().map_err(Error::Agent)
    }
}

/// Handles onto an orchestrator built from mocks
pub struct Harness {
    pub classifier: Arc<MockClassifier>,
    pub data: Arc<MockData>,
    pub live: Arc<MockLive>,
    pub retro: Arc<MockRetro>,
}

impl Harness {
    pub fn new(classifier: Arc<MockClassifier>, data: Arc<MockData>) -> Self {
        Self {
            classifier,
            data,
            live: MockLive::answering("Play for picks and save utility."),
            retro: MockRetro::answering("That eco was the right call."),
        }
    }

    #[must_use]
    pub fn with_live(mut self, live: Arc<MockLive>) -> Self {
        self.live = live;
        self
    }

    #[must_use]
    pub fn with_retro(mut self, retro: Arc<MockRetro>) -> Self {
        self.retro = retro;
        self
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Router::new(self.classifier.clone()),
            self.data.clone(),
            self.live.clone(),
            self.retro.clone(),
        )
    }
}

/// Speech input replaying a script, then silence
pub struct ScriptedInput {
    script: VecDeque<std::result::Result<Option<String>, String>>,
    pub timeouts: Arc<Mutex<Vec<Duration>>>,
    pub flushes: Arc<Mutex<usize>>,
}

impl ScriptedInput {
    pub fn new(script: Vec<std::result::Result<Option<String>, String>>) -> Self {
        Self {
            script: script.into(),
            timeouts: Arc::new(Mutex::new(Vec::new())),
            flushes: Arc::new(Mutex::new(0)),
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait(?Send)]
impl SpeechInput for ScriptedInput {
    async fn listen(&mut self, timeout: Duration) -> Result<Option<String>> {
        self.timeouts.lock().unwrap().push(timeout);
        match self.script.pop_front() {
            Some(Ok(heard)) => Ok(heard),
            Some(Err(message)) => Err(Error::Audio(message)),
            None => Ok(None),
        }
    }

    fn flush(&mut self) {
        *self.flushes.lock().unwrap() += 1;
    }
}

/// Speech input that never hears anything and never returns
pub struct HangingInput;

#[async_trait(?Send)]
impl SpeechInput for HangingInput {
    async fn listen(&mut self, _timeout: Duration) -> Result<Option<String>> {
        std::future::pending().await
    }
}

/// Speech output recording what it said
///
/// With a clock attached it also notes how many sleeps the clock had seen
/// at each utterance.
#[derive(Clone, Default)]
pub struct RecordingOutput {
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
    pub clock: Option<Arc<ManualClock>>,
    pub sleeps_before: Arc<Mutex<Vec<usize>>>,
}

impl RecordingOutput {
    pub fn observing(clock: Arc<ManualClock>) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn sleeps_before(&self) -> Vec<usize> {
        self.sleeps_before.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl SpeechOutput for RecordingOutput {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if let Some(clock) = &self.clock {
            self.sleeps_before.lock().unwrap().push(clock.sleeps().len());
        }
        if self.fail {
            return Err(Error::Tts("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

/// Screen capture returning a fixed frame
pub struct MockCapture {
    fail: bool,
    pub calls: Arc<Mutex<usize>>,
}

impl MockCapture {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ScreenCapture for MockCapture {
    async fn capture(&self) -> Result<Vec<u8>> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(Error::Capture("no display".to_string()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Detector replaying scripted flags, then nothing
pub struct ScriptedDetector {
    script: Mutex<VecDeque<std::result::Result<EventFlags, String>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<std::result::Result<EventFlags, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Arc::new(Mutex::new(0)),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EventDetector for ScriptedDetector {
    async fn detect(&self, _frame: &[u8]) -> Result<EventFlags> {
        *self.calls.lock().unwrap() += 1;
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(flags)) => Ok(flags),
            Some(Err(message)) => Err(Error::Vision(message)),
            None => Ok(EventFlags::none()),
        }
    }
}

/// Clock that only moves when told to
///
/// `sleep` records the requested duration and returns immediately; with
/// `advance_on_sleep` it also moves time forward by that amount.
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
    advance_on_sleep: bool,
    pub sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn frozen() -> Arc<Self> {
        Self::build(false)
    }

    pub fn advancing() -> Arc<Self> {
        Self::build(true)
    }

    fn build(advance_on_sleep: bool) -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            advance_on_sleep,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        if self.advance_on_sleep {
            self.advance(duration);
        }
    }
}

/// Companion over mocks, plus the shutdown sender keeping it alive
pub fn companion(
    harness: &Harness,
    input: impl SpeechInput + 'static,
    capture: Arc<MockCapture>,
    detector: Arc<ScriptedDetector>,
    clock: Arc<ManualClock>,
) -> (Companion, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let companion = Companion::new(
        harness.orchestrator(),
        Box::new(input),
        capture,
        detector,
        rx,
    )
    .with_clock(clock)
    .with_cooldown(Duration::from_secs(5));
    (companion, tx)
}
