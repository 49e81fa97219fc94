use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pitchroom_config::{AppConfig, SynthesisConfig};
use pitchroom_core::Speaker;
use pitchroom_replay::{
    AudioResolver, ReplayEvent, ReplaySession, Segment, SpeechSynthesizer, Timeline, VoiceMap,
};
use pitchroom_transcript::EventSource;
use tokio::sync::{Semaphore, broadcast, mpsc};

/// Installs a test tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Synthesizer stub that counts invocations and can be gated or failed.
pub struct FakeSynthesizer {
    pub calls: AtomicUsize,
    /// When set, `synthesize` waits for a permit before returning, so
    /// tests can hold resolutions in flight.
    gate: Option<Semaphore>,
    fail: bool,
}

impl FakeSynthesizer {
    pub fn instant() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: None,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: None,
            fail: true,
        })
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Some(Semaphore::new(0)),
            fail: false,
        })
    }

    /// Lets `n` gated syntheses complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &str) -> anyhow::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await?;
            permit.forget();
        }
        if self.fail {
            anyhow::bail!("synthesis unavailable");
        }
        Ok(text.as_bytes().to_vec())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// The two-segment timeline from the replay acceptance scenario:
/// user "Hi" at [0, 2), prospect "Hello" at [3, 5), duration 5.
pub fn scenario_timeline() -> Timeline {
    Timeline::new(vec![
        Segment::new(Speaker::User, "Hi", 0.0, 2.0),
        Segment::new(Speaker::Prospect, "Hello", 3.0, 2.0),
    ])
}

/// Builds a replay session over the scenario timeline with the given
/// synthesizer. The clock task is not spawned; tests tick manually
/// unless they call `spawn_clock` themselves.
pub fn scenario_session(
    synth: Arc<FakeSynthesizer>,
) -> (Arc<ReplaySession>, broadcast::Receiver<ReplayEvent>) {
    init_tracing();
    let config = AppConfig::default();
    let voices = VoiceMap::from_config(&SynthesisConfig::default());
    let resolver = AudioResolver::new(synth, voices);
    ReplaySession::new(scenario_timeline(), resolver, &config.replay)
}

/// Event source backed by an in-memory channel; tests push frames
/// through the returned sender. Single-use: the receiver is handed out
/// on the first `subscribe`.
pub struct ChannelEventSource {
    rx: std::sync::Mutex<Option<mpsc::Receiver<serde_json::Value>>>,
}

impl ChannelEventSource {
    pub fn new() -> (Arc<Self>, mpsc::Sender<serde_json::Value>) {
        let (tx, rx) = mpsc::channel(64);
        (
            Arc::new(Self {
                rx: std::sync::Mutex::new(Some(rx)),
            }),
            tx,
        )
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<serde_json::Value>> {
        self.rx
            .lock()
            .expect("receiver slot poisoned")
            .take()
            .ok_or_else(|| anyhow::anyhow!("event source already subscribed"))
    }
}
