/// Lowest accepted playback rate; non-positive or tiny inputs clamp here.
const MIN_RATE: f64 = 0.25;
/// Highest accepted playback rate.
const MAX_RATE: f64 = 4.0;

/// Snapshot of the replay player's playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Virtual position on the timeline, seconds. Always within
    /// `0.0..=duration`.
    pub current_time: f64,
    pub duration: f64,
    /// 0.0..=1.0.
    pub volume: f64,
    /// Playback rate multiplier, `MIN_RATE..=MAX_RATE`.
    pub rate: f64,
    pub active_segment: Option<usize>,
}

/// What a single clock advance produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Clock not running; nothing moved.
    Idle,
    /// Clock moved within the timeline.
    Moved,
    /// Clock reached the end of the timeline and paused itself.
    Finished,
}

/// Virtual playback clock for a replay timeline.
///
/// Advancement is scaled by `rate` so the transcript position and the
/// audio playback speed stay proportional at non-1x rates.
#[derive(Debug)]
pub struct PlaybackClock {
    state: PlaybackState,
}

impl PlaybackClock {
    pub fn new(duration: f64, volume: f64, rate: f64) -> Self {
        Self {
            state: PlaybackState {
                is_playing: false,
                current_time: 0.0,
                duration: duration.max(0.0),
                volume: volume.clamp(0.0, 1.0),
                rate: rate.clamp(MIN_RATE, MAX_RATE),
                active_segment: None,
            },
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn play(&mut self) {
        // Replaying a finished timeline restarts from the top.
        if self.state.current_time >= self.state.duration {
            self.state.current_time = 0.0;
            self.state.active_segment = None;
        }
        self.state.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    /// Jumps to `t`, clamped to the timeline. The active-segment marker is
    /// cleared so the next tick re-evaluates from scratch instead of
    /// letting stale audio continue past the jump.
    pub fn seek(&mut self, t: f64) {
        self.state.current_time = t.clamp(0.0, self.state.duration);
        self.state.active_segment = None;
    }

    pub fn set_volume(&mut self, v: f64) {
        self.state.volume = v.clamp(0.0, 1.0);
    }

    pub fn set_rate(&mut self, r: f64) {
        self.state.rate = r.clamp(MIN_RATE, MAX_RATE);
    }

    pub(crate) fn set_active_segment(&mut self, index: Option<usize>) {
        self.state.active_segment = index;
    }

    /// Advances virtual time by `dt` wall-clock seconds scaled by the
    /// playback rate. Reaching the end pauses the clock.
    pub fn advance(&mut self, dt: f64) -> Advance {
        if !self.state.is_playing {
            return Advance::Idle;
        }

        let next = self.state.current_time + dt * self.state.rate;
        if next >= self.state.duration {
            self.state.current_time = self.state.duration;
            self.state.is_playing = false;
            return Advance::Finished;
        }

        self.state.current_time = next;
        Advance::Moved
    }
}
