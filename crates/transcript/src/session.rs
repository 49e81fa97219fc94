use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pitchroom_config::LiveConfig;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::event::{self, CallEvent};
use crate::merge::{MergeEngine, RenderEntry};

/// Guard that aborts a spawned task when dropped.
struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Source of raw live-call frames.
///
/// Injected into the session rather than reached through a process-wide
/// client, so its lifecycle is tied to the session's attach/detach.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Opens a subscription delivering raw JSON frames until the call
    /// ends or the receiver is dropped.
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<serde_json::Value>>;
}

/// Events emitted to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CallStarted,
    CallEnded,
    /// The merged transcript view changed.
    TranscriptChanged(Vec<RenderEntry>),
}

/// A live practice call: consumes the event source, keeps the merge
/// engine current and broadcasts view updates.
pub struct LiveCallSession {
    engine: Mutex<MergeEngine>,
    events: broadcast::Sender<SessionEvent>,
    consumer: Mutex<Option<AbortOnDrop>>,
    show_interim: bool,
}

impl LiveCallSession {
    pub fn new(config: &LiveConfig) -> (Arc<Self>, broadcast::Receiver<SessionEvent>) {
        let (events, events_rx) = broadcast::channel(config.event_buffer);
        let session = Arc::new(Self {
            engine: Mutex::new(MergeEngine::new()),
            events,
            consumer: Mutex::new(None),
            show_interim: config.show_interim,
        });
        (session, events_rx)
    }

    /// Returns a new receiver for session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current merged view.
    pub fn view(&self) -> Vec<RenderEntry> {
        self.engine
            .lock()
            .render(self.show_interim, chrono::Utc::now().timestamp_millis())
    }

    /// Attaches to an event source and starts consuming frames.
    /// Re-attaching replaces the previous consumer.
    pub async fn attach(self: &Arc<Self>, source: Arc<dyn EventSource>) -> anyhow::Result<()> {
        let mut frames = source.subscribe().await?;
        info!("Live call session attached");

        let session = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(raw) = frames.recv().await {
                session.handle_frame(&raw);
            }
            debug!("Event source closed, consumer exiting");
        });

        *self.consumer.lock() = Some(AbortOnDrop(handle));
        Ok(())
    }

    /// Detaches from the event source. Idempotent, and safe to call even
    /// if `attach` never ran or never completed.
    pub fn detach(&self) {
        if self.consumer.lock().take().is_some() {
            info!("Live call session detached");
        }
    }

    /// Decodes, classifies and applies one raw frame.
    fn handle_frame(&self, raw: &serde_json::Value) {
        let Some(frame) = event::decode(raw) else {
            return;
        };
        let Some(call_event) = event::classify(frame) else {
            return;
        };

        match call_event {
            CallEvent::CallStarted => {
                self.engine.lock().reset();
                let _ = self.events.send(SessionEvent::CallStarted);
            }
            CallEvent::CallEnded => {
                // Keep the merged transcript; the caller decides when to
                // detach.
                let _ = self.events.send(SessionEvent::CallEnded);
            }
            CallEvent::Transcript(update) => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                let view = {
                    let mut engine = self.engine.lock();
                    if update.is_final {
                        engine.apply_final(&update.text, update.speaker, &update.source, now_ms);
                    } else {
                        engine.apply_partial(&update.text, update.speaker, &update.source);
                    }
                    engine.render(self.show_interim, now_ms)
                };
                if self.events.send(SessionEvent::TranscriptChanged(view)).is_err() {
                    warn!("No live transcript subscribers");
                }
            }
        }
    }
}
