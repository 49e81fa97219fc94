use pitchroom_core::Speaker;
use serde::{Deserialize, Serialize};

/// One speaker's utterance on the replay timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: Speaker,
    pub text: String,
    /// Seconds from the start of the timeline.
    pub start_offset: f64,
    /// Seconds this utterance occupies.
    pub duration: f64,
}

impl Segment {
    pub fn new(speaker: Speaker, text: impl Into<String>, start_offset: f64, duration: f64) -> Self {
        Self {
            speaker,
            text: text.into(),
            start_offset,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start_offset + self.duration
    }

    /// Whether `t` falls inside this segment's half-open interval
    /// `[start_offset, start_offset + duration)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_offset && t < self.end()
    }
}

/// The ordered segment list for one recorded call.
///
/// Segments are sorted by `start_offset` at construction, so when source
/// intervals overlap the earliest-starting segment wins the active-lookup
/// tie rather than whichever happened to come first in storage.
#[derive(Debug, Clone)]
pub struct Timeline {
    segments: Vec<Segment>,
    duration: f64,
}

impl Timeline {
    pub fn new(mut segments: Vec<Segment>) -> Self {
        segments.sort_by(|a, b| {
            a.start_offset
                .partial_cmp(&b.start_offset)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let duration = segments.iter().map(Segment::end).fold(0.0, f64::max);
        Self { segments, duration }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total timeline duration: the latest segment end, in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Index of the segment whose interval contains `t`, first match in
    /// start order.
    pub fn active_index(&self, t: f64) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(t))
    }
}
