use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::segment::Segment;
use crate::synth::{SpeechSynthesizer, VoiceMap};

/// Cheaply cloneable handle to synthesized audio bytes.
#[derive(Debug, Clone)]
pub struct AudioHandle(Arc<[u8]>);

impl AudioHandle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves segments to playable audio, synthesizing on first use.
///
/// Results (including failures) are cached per segment index for the
/// session's lifetime: a failed synthesis is never retried, the segment
/// simply replays silently, matching the no-retry rule for this path.
/// Resolution is single-flight per index; concurrent callers await the
/// same in-flight synthesis instead of starting another.
pub struct AudioResolver {
    synth: Arc<dyn SpeechSynthesizer>,
    voices: VoiceMap,
    cache: DashMap<usize, Arc<OnceCell<Option<AudioHandle>>>>,
}

impl AudioResolver {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>, voices: VoiceMap) -> Self {
        Self {
            synth,
            voices,
            cache: DashMap::new(),
        }
    }

    /// Returns the audio for a segment, synthesizing it if this is the
    /// first request. `None` means the segment plays silently.
    pub async fn resolve(&self, index: usize, segment: &Segment) -> Option<AudioHandle> {
        // The cell is cloned out so the map shard is not held across the
        // synthesis await.
        let cell = self
            .cache
            .entry(index)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_init(|| async {
            let voice = self.voices.voice_for(segment.speaker);
            match self.synth.synthesize(&segment.text, voice).await {
                Ok(bytes) => {
                    debug!(index, bytes = bytes.len(), "Segment audio synthesized");
                    Some(AudioHandle::new(bytes))
                }
                Err(e) => {
                    warn!(index, backend = %self.synth.name(), %e, "Synthesis failed, segment will play silently");
                    None
                }
            }
        })
        .await
        .clone()
    }

    /// Drops every cached handle. Called once at session teardown.
    pub fn release_all(&self) {
        self.cache.clear();
    }

    #[cfg(test)]
    pub(crate) fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
