use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pitchroom_config::{AppConfig, ReplayConfig};
use pitchroom_core::CallId;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clock::{PlaybackClock, PlaybackState};
use crate::error::ReplayError;
use crate::resolver::{AudioHandle, AudioResolver};
use crate::scheduler::{SegmentScheduler, TickAction};
use crate::segment::{Segment, Timeline};
use crate::segmentation::segments_from_transcript;
use crate::store::ReplayStore;
use crate::synth::{SpeechSynthesizer, VoiceMap};

/// Guard that aborts a spawned task when dropped.
///
/// `tokio::spawn` returns a `JoinHandle` whose `Drop` impl detaches (does
/// NOT abort) the task, so the clock task must be aborted explicitly when
/// the session shuts down or is dropped.
struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Events emitted to the presentation layer over the session's broadcast
/// channel.
#[derive(Debug, Clone)]
pub enum ReplayEvent {
    /// Periodic progress update while the clock is running.
    Tick {
        current_time: f64,
        active_segment: Option<usize>,
    },
    /// A segment became active and its audio is ready (or `None` if
    /// synthesis failed and the segment plays silently). Always starts
    /// from the segment's own beginning.
    SegmentStarted {
        index: usize,
        audio: Option<AudioHandle>,
        volume: f64,
        rate: f64,
    },
    /// The clock left the active segment for a gap between segments; any
    /// playing audio must stop.
    SegmentEnded,
    Resumed,
    /// Playback paused; any playing audio must stop.
    Paused,
    Seeked { position: f64 },
    VolumeChanged(f64),
    RateChanged(f64),
    /// The clock reached the end of the timeline and paused itself.
    Finished,
}

/// One replay of one recorded call.
///
/// The spawned clock task is the only driver of scheduler state; ticks
/// are serialized by the scheduler mutex. Audio resolution runs on
/// spawned tasks and may overlap later ticks; the generation stamp on
/// each transition is the sole arbiter of whether a finished resolution
/// may still start playback.
pub struct ReplaySession {
    scheduler: Mutex<SegmentScheduler>,
    resolver: Arc<AudioResolver>,
    events: broadcast::Sender<ReplayEvent>,
    clock_task: Mutex<Option<AbortOnDrop>>,
    tick_interval: Duration,
    skip_step_secs: f64,
}

impl ReplaySession {
    /// Creates a session over an already-built timeline.
    ///
    /// Returns `(session, event_receiver)`. The clock does not run until
    /// [`ReplaySession::spawn_clock`]; tests drive [`ReplaySession::tick`]
    /// directly.
    pub fn new(
        timeline: Timeline,
        resolver: AudioResolver,
        config: &ReplayConfig,
    ) -> (Arc<Self>, broadcast::Receiver<ReplayEvent>) {
        let (events, events_rx) = broadcast::channel(config.event_buffer);
        let timeline = Arc::new(timeline);
        let clock = PlaybackClock::new(
            timeline.duration(),
            config.default_volume,
            config.default_rate,
        );

        info!(
            segments = timeline.len(),
            duration_secs = timeline.duration(),
            "Replay session created"
        );

        let session = Arc::new(Self {
            scheduler: Mutex::new(SegmentScheduler::new(timeline, clock)),
            resolver: Arc::new(resolver),
            events,
            clock_task: Mutex::new(None),
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            skip_step_secs: config.skip_step_secs,
        });

        (session, events_rx)
    }

    /// Loads a call record and builds the session from its persisted
    /// segments, falling back to deriving segments from the stored
    /// transcript text. Single attempt; failure is terminal.
    pub async fn load(
        store: &dyn ReplayStore,
        synth: Arc<dyn SpeechSynthesizer>,
        call_id: CallId,
        config: &AppConfig,
    ) -> Result<(Arc<Self>, broadcast::Receiver<ReplayEvent>), ReplayError> {
        let record = store.fetch_call(call_id).await?;

        let segments: Vec<Segment> = match (record.segments, record.transcript.as_deref()) {
            (Some(records), _) if !records.is_empty() => records
                .into_iter()
                .map(|r| Segment::new(r.speaker, r.text, r.start_offset, r.duration))
                .collect(),
            (_, Some(transcript)) => {
                debug!(%call_id, "No stored segments, deriving from transcript text");
                segments_from_transcript(transcript, &config.segmentation)
            }
            _ => return Err(ReplayError::NoReplayData(call_id)),
        };

        let voices = VoiceMap::from_config(&config.synthesis);
        let resolver = AudioResolver::new(synth, voices);
        Ok(Self::new(Timeline::new(segments), resolver, &config.replay))
    }

    /// Returns a new receiver for replay events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReplayEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current playback state.
    pub fn state(&self) -> PlaybackState {
        self.scheduler.lock().state().clone()
    }

    /// Starts the periodic clock task. Calling it again while the task is
    /// alive is a no-op.
    pub fn spawn_clock(self: &Arc<Self>) {
        let mut slot = self.clock_task.lock();
        if slot.is_some() {
            return;
        }

        let weak = Arc::downgrade(self);
        let tick_interval = self.tick_interval;
        let dt = tick_interval.as_secs_f64();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(session) = weak.upgrade() else { break };
                session.tick(dt);
            }
        });

        *slot = Some(AbortOnDrop(handle));
        debug!(interval = ?tick_interval, "Clock task started");
    }

    /// Advances the session by `dt` wall-clock seconds.
    ///
    /// Called by the clock task; exposed so tests can drive the session
    /// deterministically without timers.
    pub fn tick(self: &Arc<Self>, dt: f64) {
        let action = {
            let mut scheduler = self.scheduler.lock();
            scheduler.tick(dt)
        };

        match action {
            TickAction::None => {
                let state = self.state();
                if state.is_playing {
                    let _ = self.events.send(ReplayEvent::Tick {
                        current_time: state.current_time,
                        active_segment: state.active_segment,
                    });
                }
            }
            TickAction::Cleared => {
                let state = self.state();
                let _ = self.events.send(ReplayEvent::Tick {
                    current_time: state.current_time,
                    active_segment: state.active_segment,
                });
                let _ = self.events.send(ReplayEvent::SegmentEnded);
            }
            TickAction::Finished => {
                info!("Replay finished");
                let _ = self.events.send(ReplayEvent::Finished);
            }
            TickAction::Transition { index, generation } => {
                let state = self.state();
                let _ = self.events.send(ReplayEvent::Tick {
                    current_time: state.current_time,
                    active_segment: state.active_segment,
                });
                self.start_segment(index, generation);
            }
        }
    }

    /// Resolves a segment's audio off the tick path and starts it once
    /// ready, unless a newer transition (or a pause/seek) superseded this
    /// one in the meantime.
    fn start_segment(self: &Arc<Self>, index: usize, generation: u64) {
        let segment = {
            let scheduler = self.scheduler.lock();
            match scheduler.timeline().get(index) {
                Some(s) => s.clone(),
                None => return,
            }
        };

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let audio = session.resolver.resolve(index, &segment).await;

            let (stale, volume, rate) = {
                let scheduler = session.scheduler.lock();
                let state = scheduler.state();
                (
                    scheduler.current_generation() != generation
                        || !state.is_playing
                        || state.active_segment != Some(index),
                    state.volume,
                    state.rate,
                )
            };
            if stale {
                debug!(index, generation, "Resolution superseded, discarding");
                return;
            }

            if audio.is_none() {
                warn!(index, "No audio for segment, transcript-only playback");
            }
            let _ = session.events.send(ReplayEvent::SegmentStarted {
                index,
                audio,
                volume,
                rate,
            });
        });
    }

    // Playback controls, consumed by the presentation layer.

    pub fn play(&self) {
        self.scheduler.lock().clock_mut().play();
        let _ = self.events.send(ReplayEvent::Resumed);
    }

    pub fn pause(&self) {
        self.scheduler.lock().clock_mut().pause();
        let _ = self.events.send(ReplayEvent::Paused);
    }

    /// Seeks to `t` seconds, clamped to the timeline. The next tick
    /// re-evaluates the active segment from scratch.
    pub fn seek(&self, t: f64) {
        let position = {
            let mut scheduler = self.scheduler.lock();
            scheduler.clock_mut().seek(t);
            scheduler.state().current_time
        };
        let _ = self.events.send(ReplayEvent::Seeked { position });
    }

    pub fn set_volume(&self, v: f64) {
        let volume = {
            let mut scheduler = self.scheduler.lock();
            scheduler.clock_mut().set_volume(v);
            scheduler.state().volume
        };
        let _ = self.events.send(ReplayEvent::VolumeChanged(volume));
    }

    pub fn set_rate(&self, r: f64) {
        let rate = {
            let mut scheduler = self.scheduler.lock();
            scheduler.clock_mut().set_rate(r);
            scheduler.state().rate
        };
        let _ = self.events.send(ReplayEvent::RateChanged(rate));
    }

    pub fn skip_back(&self) {
        let target = self.state().current_time - self.skip_step_secs;
        self.seek(target);
    }

    pub fn skip_forward(&self) {
        let target = self.state().current_time + self.skip_step_secs;
        self.seek(target);
    }

    /// Tears the session down: stops the clock task, pauses playback and
    /// releases synthesized audio. Idempotent, and safe to call even if
    /// `spawn_clock` never ran. In-flight resolutions are not cancelled;
    /// their results fail the staleness check and are discarded.
    pub fn shutdown(&self) {
        let task = self.clock_task.lock().take();
        drop(task);
        self.scheduler.lock().clock_mut().pause();
        self.resolver.release_all();
        info!("Replay session shut down");
    }
}
