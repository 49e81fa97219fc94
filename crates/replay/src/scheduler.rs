use std::sync::Arc;

use tracing::debug;

use crate::clock::{Advance, PlaybackClock, PlaybackState};
use crate::segment::Timeline;

/// What the session loop must do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing changed that needs a side effect.
    None,
    /// The active segment changed: stop current audio, resolve the new
    /// segment and start it once ready. The generation stamp identifies
    /// this transition; a resolution finishing under an older stamp has
    /// been superseded and must not start playback.
    Transition { index: usize, generation: u64 },
    /// The clock moved into a gap between segments: stop current audio,
    /// nothing new to start.
    Cleared,
    /// The clock ran off the end of the timeline and paused itself.
    Finished,
}

/// Maps virtual time onto the active segment and dedupes transitions.
///
/// Purely synchronous; the owning session drives it from a single tick
/// task, so a mutex around the scheduler is the only synchronization
/// needed.
pub struct SegmentScheduler {
    timeline: Arc<Timeline>,
    clock: PlaybackClock,
    generation: u64,
}

impl SegmentScheduler {
    pub fn new(timeline: Arc<Timeline>, clock: PlaybackClock) -> Self {
        Self {
            timeline,
            clock,
            generation: 0,
        }
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn state(&self) -> &PlaybackState {
        self.clock.state()
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// The generation of the most recent transition. Resolution results
    /// stamped with anything older are stale.
    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    /// Advances the clock by `dt` seconds and reports the required action.
    pub fn tick(&mut self, dt: f64) -> TickAction {
        match self.clock.advance(dt) {
            Advance::Idle => TickAction::None,
            Advance::Finished => {
                self.clock.set_active_segment(None);
                debug!("Timeline finished, clock paused");
                TickAction::Finished
            }
            Advance::Moved => self.reschedule(),
        }
    }

    /// Re-evaluates the active segment at the current time. A changed
    /// index is a transition; an unchanged one is not, even though the
    /// clock moved within the segment.
    fn reschedule(&mut self) -> TickAction {
        let t = self.clock.current_time();
        let active = self.timeline.active_index(t);
        if active == self.clock.state().active_segment {
            return TickAction::None;
        }

        self.clock.set_active_segment(active);
        match active {
            Some(index) => {
                self.generation += 1;
                debug!(index, t, "Segment transition");
                TickAction::Transition {
                    index,
                    generation: self.generation,
                }
            }
            // The index changed from Some to None: the clock left a
            // segment for a gap.
            None => {
                debug!(t, "Left segment for a gap");
                TickAction::Cleared
            }
        }
    }
}
